//! Field projection
//!
//! Pure functions mapping raw API records onto the fixed output column
//! sets. No I/O, deterministic, same input always yields the same
//! projected record. Records without an email (seen in practice on the
//! upstream API) are dropped here so the merge only ever sees keyed
//! rows.

use crate::records::{
    MarketingContact, RawBlockedContact, RawMarketingContact, TransactionalContact,
};

/// Project a raw blocked contact, flattening the nested reason object.
///
/// Returns `None` when the record has no usable email.
pub fn project_transactional(raw: RawBlockedContact) -> Option<TransactionalContact> {
    let email = raw.email.filter(|e| !e.is_empty())?;
    let (reason_message, reason_code) = match raw.reason {
        Some(reason) => (
            reason.message.unwrap_or_default(),
            reason.code.unwrap_or_default(),
        ),
        None => (String::new(), String::new()),
    };

    Some(TransactionalContact {
        email,
        reason_message,
        reason_code,
        blocked_at: raw.blocked_at.unwrap_or_default(),
        sender_email: raw.sender_email.unwrap_or_default(),
    })
}

/// Project a raw marketing contact.
///
/// `blacklisted_timestamp` stays unset; the merge engine assigns it.
/// Returns `None` when the record has no usable email.
pub fn project_marketing(raw: RawMarketingContact) -> Option<MarketingContact> {
    let email = raw.email.filter(|e| !e.is_empty())?;

    Some(MarketingContact {
        id: raw.id,
        email,
        email_blacklisted: raw.email_blacklisted,
        sms_blacklisted: raw.sms_blacklisted,
        created_at: raw.created_at.unwrap_or_default(),
        modified_at: raw.modified_at.unwrap_or_default(),
        blacklisted_timestamp: None,
    })
}

/// Project a whole fetched batch, dropping unkeyed records
pub fn project_transactional_batch(
    raw: Vec<RawBlockedContact>,
) -> Vec<TransactionalContact> {
    raw.into_iter().filter_map(project_transactional).collect()
}

/// Project a whole fetched batch, dropping unkeyed records
pub fn project_marketing_batch(raw: Vec<RawMarketingContact>) -> Vec<MarketingContact> {
    raw.into_iter().filter_map(project_marketing).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::BlockReason;

    fn raw_blocked(email: Option<&str>) -> RawBlockedContact {
        RawBlockedContact {
            email: email.map(String::from),
            reason: Some(BlockReason {
                message: Some("mailbox not found".to_string()),
                code: Some("hardBounce".to_string()),
            }),
            blocked_at: Some("2024-03-01T08:00:00Z".to_string()),
            sender_email: Some("news@sender.example".to_string()),
        }
    }

    #[test]
    fn flattens_nested_reason() {
        let projected = project_transactional(raw_blocked(Some("a@example.com"))).unwrap();
        assert_eq!(projected.email, "a@example.com");
        assert_eq!(projected.reason_code, "hardBounce");
        assert_eq!(projected.reason_message, "mailbox not found");
        assert_eq!(projected.blocked_at, "2024-03-01T08:00:00Z");
        assert_eq!(projected.sender_email, "news@sender.example");
    }

    #[test]
    fn missing_reason_becomes_empty_columns() {
        let mut raw = raw_blocked(Some("a@example.com"));
        raw.reason = None;
        let projected = project_transactional(raw).unwrap();
        assert_eq!(projected.reason_code, "");
        assert_eq!(projected.reason_message, "");
    }

    #[test]
    fn drops_records_without_email() {
        assert!(project_transactional(raw_blocked(None)).is_none());
        assert!(project_transactional(raw_blocked(Some(""))).is_none());

        let raw = RawMarketingContact {
            id: 1,
            email: None,
            email_blacklisted: true,
            sms_blacklisted: false,
            created_at: None,
            modified_at: None,
        };
        assert!(project_marketing(raw).is_none());
    }

    #[test]
    fn marketing_projection_leaves_timestamp_unset() {
        let raw = RawMarketingContact {
            id: 42,
            email: Some("b@example.com".to_string()),
            email_blacklisted: true,
            sms_blacklisted: true,
            created_at: Some("2023-11-05T10:00:00Z".to_string()),
            modified_at: Some("2024-01-12T09:30:00Z".to_string()),
        };
        let projected = project_marketing(raw).unwrap();
        assert_eq!(projected.id, 42);
        assert!(projected.blacklisted_timestamp.is_none());
    }

    #[test]
    fn batch_projection_is_deterministic_and_filters() {
        let batch = vec![
            raw_blocked(Some("a@example.com")),
            raw_blocked(None),
            raw_blocked(Some("b@example.com")),
        ];
        let projected = project_transactional_batch(batch);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0].email, "a@example.com");
        assert_eq!(projected[1].email, "b@example.com");
    }
}
