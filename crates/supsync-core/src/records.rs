//! Typed contact records
//!
//! Two families of types live here:
//!
//! - Raw API shapes (`Raw*`), decoded with serde at the API client
//!   boundary so malformed responses fail fast instead of leaking
//!   untyped data into the merge.
//! - Projected output records, whose serde names double as the CSV
//!   headers, fixing the documented column order.

use serde::{Deserialize, Serialize};

/// Output file name for the transactional table
pub const TRANSACTIONAL_FILE: &str = "transactional_contacts.csv";

/// Output file name for the marketing table
pub const MARKETING_FILE: &str = "marketing_contacts.csv";

/// Column carrying the first-seen-as-blacklisted timestamp
pub const BLACKLISTED_TIMESTAMP_COLUMN: &str = "blacklisted_timestamp";

/// A transactional blocked contact as written to
/// `transactional_contacts.csv`
///
/// Columns: `email, reason_message, reason_code, blockedAt, senderEmail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionalContact {
    /// Natural key
    pub email: String,
    pub reason_message: String,
    pub reason_code: String,
    #[serde(rename = "blockedAt")]
    pub blocked_at: String,
    #[serde(rename = "senderEmail")]
    pub sender_email: String,
}

/// A marketing contact as written to `marketing_contacts.csv`
///
/// Columns: `id, email, emailBlacklisted, smsBlacklisted, createdAt,
/// modifiedAt, blacklisted_timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketingContact {
    pub id: i64,
    /// Natural key
    pub email: String,
    #[serde(rename = "emailBlacklisted")]
    pub email_blacklisted: bool,
    #[serde(rename = "smsBlacklisted")]
    pub sms_blacklisted: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "modifiedAt")]
    pub modified_at: String,
    /// Assigned the first run an email is seen; carried forward after.
    /// `None` only while a prior table without the column is loaded.
    #[serde(default)]
    pub blacklisted_timestamp: Option<String>,
}

// --- Raw API shapes ---

/// Raw record from the transactional blocked-contacts endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlockedContact {
    /// Missing/empty emails are dropped during projection
    #[serde(default)]
    pub email: Option<String>,
    /// The block reason arrives as a nested object
    #[serde(default)]
    pub reason: Option<BlockReason>,
    #[serde(rename = "blockedAt", default)]
    pub blocked_at: Option<String>,
    #[serde(rename = "senderEmail", default)]
    pub sender_email: Option<String>,
}

/// Nested reason object on a blocked contact
#[derive(Debug, Clone, Deserialize)]
pub struct BlockReason {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Raw record from the marketing contacts endpoint
///
/// `id` is required: a contact without one means the response shape
/// changed and the decode fails at the client boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMarketingContact {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "emailBlacklisted", default)]
    pub email_blacklisted: bool,
    #[serde(rename = "smsBlacklisted", default)]
    pub sms_blacklisted: bool,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "modifiedAt", default)]
    pub modified_at: Option<String>,
}
