//! Checksums over the statements a migration applies

use super::error::MigrationError;
use super::migration::Migration;
use super::schema_manager::SchemaManager;
use sha2::{Digest, Sha256};

/// SHA-256 over the `up` statements of `migration`, one per line.
///
/// Applied migrations are checked against this so an edited migration is caught
/// before anything newer runs.
pub fn calculate_checksum(migration: &dyn Migration) -> Result<String, MigrationError> {
    let manager = SchemaManager::recording();
    migration.up(&manager)?;

    let mut hasher = Sha256::new();
    for statement in manager.statements() {
        hasher.update(statement.as_bytes());
        hasher.update(b"\n");
    }
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn validate_checksum(
    migration: &dyn Migration,
    stored: &str,
    current: &str,
) -> Result<(), MigrationError> {
    if stored == current {
        Ok(())
    } else {
        Err(MigrationError::ChecksumMismatch {
            version: migration.version(),
            name: migration.name().to_string(),
            stored: stored.to_string(),
            current: current.to_string(),
        })
    }
}
