//! Migration-specific error types

use crate::executor::StoreError;
use crate::transaction::TransactionError;

#[derive(Debug)]
pub enum MigrationError {
    /// Database execution error
    Database(StoreError),
    /// An applied migration's statements changed since it ran
    ChecksumMismatch {
        version: i64,
        name: String,
        stored: String,
        current: String,
    },
    /// Migration failed during execution
    ExecutionFailed {
        version: i64,
        name: String,
        error: String,
    },
    /// Two migrations share a version
    DuplicateVersion(i64),
    /// Recorded as applied but no longer registered
    MissingMigration { version: i64, name: String },
}

impl std::fmt::Display for MigrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationError::Database(e) => write!(f, "Database error: {e}"),
            MigrationError::ChecksumMismatch {
                version,
                name,
                stored,
                current,
            } => write!(
                f,
                "Migration '{name}' (version {version}) has been modified after being applied.\n\
                 Stored checksum: {stored}\n\
                 Current checksum: {current}"
            ),
            MigrationError::ExecutionFailed {
                version,
                name,
                error,
            } => write!(
                f,
                "Migration '{name}' (version {version}) failed during execution: {error}"
            ),
            MigrationError::DuplicateVersion(version) => {
                write!(f, "More than one migration has version {version}")
            }
            MigrationError::MissingMigration { version, name } => write!(
                f,
                "Applied migration '{name}' (version {version}) is not registered"
            ),
        }
    }
}

impl std::error::Error for MigrationError {}

impl From<StoreError> for MigrationError {
    fn from(error: StoreError) -> Self {
        MigrationError::Database(error)
    }
}

impl From<TransactionError> for MigrationError {
    fn from(error: TransactionError) -> Self {
        MigrationError::Database(error.into())
    }
}
