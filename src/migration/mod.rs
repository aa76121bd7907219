//! Schema migrations
//!
//! Migrations are plain Rust values registered with a [`Migrator`], which records each
//! applied version in `ledgerguard_migrations` together with a SHA-256 checksum of the
//! statements it ran. Editing an applied migration is reported as
//! [`MigrationError::ChecksumMismatch`] on the next run.
//!
//! # Example
//!
//! ```rust,no_run
//! use ledgerguard::migration::{Migration, MigrationError, SchemaManager};
//! use sea_query::Table;
//!
//! pub struct CreateNotes;
//!
//! impl Migration for CreateNotes {
//!     fn name(&self) -> &str {
//!         "create_notes"
//!     }
//!
//!     fn version(&self) -> i64 {
//!         20240601090000
//!     }
//!
//!     fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
//!         manager.execute_sql("CREATE TABLE IF NOT EXISTS notes (id UUID PRIMARY KEY, body TEXT)")
//!     }
//!
//!     fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
//!         manager.drop_table(Table::drop().table("notes").if_exists().to_owned())
//!     }
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod migration;
pub mod migrator;
pub mod record;
pub mod schema_manager;
pub mod state_table;
pub mod status;

pub use checksum::{calculate_checksum, validate_checksum};
pub use error::MigrationError;
pub use migration::Migration;
pub use migrator::Migrator;
pub use record::MigrationRecord;
pub use schema_manager::SchemaManager;
pub use state_table::{initialize_state_table, STATE_TABLE};
pub use status::{MigrationStatus, PendingMigration};
