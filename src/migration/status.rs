//! Migration status tracking

use super::record::MigrationRecord;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub applied: Vec<MigrationRecord>,
    pub pending: Vec<PendingMigration>,
}

/// A registered migration that has not been applied yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMigration {
    pub version: i64,
    pub name: String,
    pub checksum: String,
}

impl MigrationStatus {
    pub fn new(applied: Vec<MigrationRecord>, pending: Vec<PendingMigration>) -> Self {
        Self { applied, pending }
    }

    pub fn total(&self) -> usize {
        self.applied.len() + self.pending.len()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn latest_applied_version(&self) -> Option<i64> {
        self.applied.iter().map(|m| m.version).max()
    }

    pub fn next_pending_version(&self) -> Option<i64> {
        self.pending.first().map(|m| m.version)
    }
}
