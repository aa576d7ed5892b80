// # CSV Table Store
//
// File-based implementation of TableStore over the two output files.
//
// ## Layout
//
// `<output_dir>/transactional_contacts.csv`
// `<output_dir>/marketing_contacts.csv`
//
// Column order and headers come from the record structs' serde names,
// so the writer is byte-stable for a given in-memory table.
//
// ## Atomicity
//
// Tables are serialized in memory, written to a `.tmp` sibling and
// renamed into place, so a crashed run never leaves a partial table
// and the previous output survives any failure before the rename.
//
// ## Schema checks
//
// Prior tables are decoded into the typed records at load. A missing
// `email` header or a row whose key/typed columns fail to decode (for
// example a non-numeric `id`) is a `SchemaMismatch`; a marketing file
// without the `blacklisted_timestamp` column loads fine and reports
// the column absent so the merge can backfill.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{Error, Result};
use crate::merge::PriorMarketingTable;
use crate::records::{
    BLACKLISTED_TIMESTAMP_COLUMN, MARKETING_FILE, MarketingContact, TRANSACTIONAL_FILE,
    TransactionalContact,
};
use crate::traits::table_store::TableStore;

/// Header row written for an empty transactional table
const TRANSACTIONAL_HEADERS: [&str; 5] =
    ["email", "reason_message", "reason_code", "blockedAt", "senderEmail"];

/// Header row written for an empty marketing table
const MARKETING_HEADERS: [&str; 7] = [
    "id",
    "email",
    "emailBlacklisted",
    "smsBlacklisted",
    "createdAt",
    "modifiedAt",
    BLACKLISTED_TIMESTAMP_COLUMN,
];

/// CSV-file table store rooted at an output directory
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    dir: PathBuf,
}

impl CsvTableStore {
    /// Create a store, creating the output directory if needed
    pub async fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create output directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(Self { dir })
    }

    /// Path of the transactional output file
    pub fn transactional_path(&self) -> PathBuf {
        self.dir.join(TRANSACTIONAL_FILE)
    }

    /// Path of the marketing output file
    pub fn marketing_path(&self) -> PathBuf {
        self.dir.join(MARKETING_FILE)
    }

    /// Read a file's contents, `Ok(None)` when it does not exist
    async fn read_table(path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            tracing::debug!("prior table does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Some(content))
    }

    /// Verify the key column exists before decoding rows
    fn check_headers(path: &Path, headers: &csv::StringRecord) -> Result<()> {
        if !headers.iter().any(|h| h == "email") {
            return Err(Error::schema_mismatch(format!(
                "{} has no email column (headers: {:?})",
                path.display(),
                headers
            )));
        }
        Ok(())
    }

    /// Decode all rows, mapping decode failures to a schema mismatch
    fn decode_rows<T: serde::de::DeserializeOwned>(
        path: &Path,
        content: &str,
    ) -> Result<(csv::StringRecord, Vec<T>)> {
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| {
                Error::schema_mismatch(format!("{}: unreadable headers: {}", path.display(), e))
            })?
            .clone();
        Self::check_headers(path, &headers)?;

        let mut rows = Vec::new();
        for record in reader.deserialize::<T>() {
            let row = record.map_err(|e| {
                Error::schema_mismatch(format!(
                    "{} is incompatible with the current schema: {}",
                    path.display(),
                    e
                ))
            })?;
            rows.push(row);
        }
        Ok((headers, rows))
    }

    /// Serialize rows with stable headers, even for an empty table
    fn encode_rows<T: serde::Serialize>(rows: &[T], empty_headers: &[&str]) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if rows.is_empty() {
            writer.write_record(empty_headers)?;
        } else {
            for row in rows {
                writer.serialize(row)?;
            }
        }
        writer
            .into_inner()
            .map_err(|e| Error::store(format!("Failed to flush CSV buffer: {}", e)))
    }

    /// Write bytes to a temporary sibling, then rename into place
    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut temp = path.to_path_buf();
        temp.set_extension("tmp");

        fs::write(&temp, bytes).await.map_err(|e| {
            Error::store(format!("Failed to write {}: {}", temp.display(), e))
        })?;

        fs::rename(&temp, path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp.display(),
                path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "table written");
        Ok(())
    }
}

#[async_trait]
impl TableStore for CsvTableStore {
    async fn load_transactional(&self) -> Result<Option<Vec<TransactionalContact>>> {
        let path = self.transactional_path();
        let Some(content) = Self::read_table(&path).await? else {
            return Ok(None);
        };

        let (_, rows) = Self::decode_rows::<TransactionalContact>(&path, &content)?;
        tracing::debug!(rows = rows.len(), "loaded prior transactional table");
        Ok(Some(rows))
    }

    async fn load_marketing(&self) -> Result<Option<PriorMarketingTable>> {
        let path = self.marketing_path();
        let Some(content) = Self::read_table(&path).await? else {
            return Ok(None);
        };

        let (headers, rows) = Self::decode_rows::<MarketingContact>(&path, &content)?;
        let had_timestamp_column = headers.iter().any(|h| h == BLACKLISTED_TIMESTAMP_COLUMN);
        tracing::debug!(
            rows = rows.len(),
            had_timestamp_column,
            "loaded prior marketing table"
        );
        Ok(Some(PriorMarketingTable {
            rows,
            had_timestamp_column,
        }))
    }

    async fn write_transactional(&self, rows: &[TransactionalContact]) -> Result<()> {
        let bytes = Self::encode_rows(rows, &TRANSACTIONAL_HEADERS)?;
        self.write_atomic(&self.transactional_path(), &bytes).await
    }

    async fn write_marketing(&self, rows: &[MarketingContact]) -> Result<()> {
        let bytes = Self::encode_rows(rows, &MARKETING_HEADERS)?;
        self.write_atomic(&self.marketing_path(), &bytes).await
    }
}
