//! `MigrationRecord` - rows of the `ledgerguard_migrations` state table

use crate::executor::StoreError;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    /// Migration version (timestamp: YYYYMMDDHHMMSS)
    pub version: i64,
    pub name: String,
    /// `SHA-256` checksum of the applied statements
    pub checksum: String,
    pub applied_at: NaiveDateTime,
    pub execution_time_ms: Option<i64>,
    pub success: bool,
}

impl MigrationRecord {
    /// Expected column order: `version`, `name`, `checksum`, `applied_at`,
    /// `execution_time_ms`, `success`
    pub fn from_row(row: &may_postgres::Row) -> Result<Self, StoreError> {
        let parse = |e: may_postgres::Error| StoreError::ParseError(e.to_string());
        Ok(Self {
            version: row.try_get(0).map_err(parse)?,
            name: row.try_get(1).map_err(parse)?,
            checksum: row.try_get(2).map_err(parse)?,
            applied_at: row.try_get(3).map_err(parse)?,
            execution_time_ms: row.try_get(4).map_err(parse)?,
            success: row.try_get(5).map_err(parse)?,
        })
    }
}
