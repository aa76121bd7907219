//! Migration trait definition

use super::error::MigrationError;
use super::schema_manager::SchemaManager;

/// A versioned schema change.
///
/// Migrations are synchronous; the executor handles coroutine scheduling internally.
pub trait Migration: Send + Sync {
    /// Human-readable identifier
    fn name(&self) -> &str;

    /// Timestamp version: `YYYYMMDDHHMMSS`
    fn version(&self) -> i64;

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError>;

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError>;
}
