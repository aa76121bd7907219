//! Migrator - validates, applies and rolls back registered migrations

use super::checksum::{calculate_checksum, validate_checksum};
use super::error::MigrationError;
use super::migration::Migration;
use super::record::MigrationRecord;
use super::schema_manager::SchemaManager;
use super::state_table::initialize_state_table;
use super::status::{MigrationStatus, PendingMigration};
use crate::executor::{ErpExecutor, PgExecutor};
use std::collections::HashSet;
use std::time::Instant;

/// Session-level advisory lock key held while migrating
const LOCK_KEY: i64 = 0x6c65_6467_6572;

/// Runs a fixed set of migrations in version order.
///
/// Each migration and its state row are applied in one transaction, so a failed
/// migration leaves neither schema changes nor a record behind.
pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
}

impl Migrator {
    /// Sorts `migrations` by version; duplicate versions are rejected.
    pub fn new(mut migrations: Vec<Box<dyn Migration>>) -> Result<Self, MigrationError> {
        migrations.sort_by_key(|m| m.version());
        let mut seen = HashSet::new();
        for migration in &migrations {
            if !seen.insert(migration.version()) {
                return Err(MigrationError::DuplicateVersion(migration.version()));
            }
        }
        Ok(Self { migrations })
    }

    pub fn migrations(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    /// Applied vs pending, validating every applied checksum.
    pub fn status(&self, executor: &dyn ErpExecutor) -> Result<MigrationStatus, MigrationError> {
        initialize_state_table(executor)?;
        let applied = Self::query_applied_migrations(executor)?;
        self.compare(applied)
    }

    fn compare(&self, applied: Vec<MigrationRecord>) -> Result<MigrationStatus, MigrationError> {
        let registered: HashSet<i64> = self.migrations.iter().map(|m| m.version()).collect();
        if let Some(missing) = applied.iter().find(|r| !registered.contains(&r.version)) {
            return Err(MigrationError::MissingMigration {
                version: missing.version,
                name: missing.name.clone(),
            });
        }

        let mut applied_records = Vec::new();
        let mut pending = Vec::new();
        for migration in &self.migrations {
            let checksum = calculate_checksum(migration.as_ref())?;
            match applied.iter().find(|r| r.version == migration.version()) {
                Some(record) => {
                    validate_checksum(migration.as_ref(), &record.checksum, &checksum)?;
                    applied_records.push(record.clone());
                }
                None => pending.push(PendingMigration {
                    version: migration.version(),
                    name: migration.name().to_string(),
                    checksum,
                }),
            }
        }
        Ok(MigrationStatus::new(applied_records, pending))
    }

    /// Applies up to `steps` pending migrations (all when `None`); returns how many ran.
    pub fn up(&self, executor: &PgExecutor, steps: Option<usize>) -> Result<usize, MigrationError> {
        Self::with_lock(executor, || {
            let status = self.status(executor)?;
            let take = steps.unwrap_or(status.pending.len());
            let mut applied = 0;
            for pending in status.pending.iter().take(take) {
                let Some(migration) = self.find(pending.version) else {
                    continue;
                };
                let started = Instant::now();
                let transaction = executor.begin()?;
                let manager = SchemaManager::new(&transaction);
                if let Err(e) = migration.up(&manager) {
                    if let Err(rollback) = transaction.rollback() {
                        log::error!("rollback of {} failed: {rollback}", pending.name);
                    }
                    return Err(MigrationError::ExecutionFailed {
                        version: pending.version,
                        name: pending.name.clone(),
                        error: e.to_string(),
                    });
                }
                let record = MigrationRecord {
                    version: pending.version,
                    name: pending.name.clone(),
                    checksum: pending.checksum.clone(),
                    applied_at: chrono::Utc::now().naive_utc(),
                    execution_time_ms: Some(started.elapsed().as_millis() as i64),
                    success: true,
                };
                Self::record_migration(&transaction, &record)?;
                transaction.commit()?;
                log::info!(
                    "applied migration {} ({}) in {}ms",
                    record.version,
                    record.name,
                    record.execution_time_ms.unwrap_or_default()
                );
                applied += 1;
            }
            Ok(applied)
        })
    }

    /// Rolls back the newest `steps` applied migrations (one when `None`).
    pub fn down(
        &self,
        executor: &PgExecutor,
        steps: Option<usize>,
    ) -> Result<usize, MigrationError> {
        Self::with_lock(executor, || {
            let mut applied = self.status(executor)?.applied;
            applied.sort_by_key(|m| std::cmp::Reverse(m.version));
            let mut rolled_back = 0;
            for record in applied.iter().take(steps.unwrap_or(1)) {
                let Some(migration) = self.find(record.version) else {
                    continue;
                };
                let transaction = executor.begin()?;
                let manager = SchemaManager::new(&transaction);
                if let Err(e) = migration.down(&manager) {
                    if let Err(rollback) = transaction.rollback() {
                        log::error!("rollback of {} failed: {rollback}", record.name);
                    }
                    return Err(MigrationError::ExecutionFailed {
                        version: record.version,
                        name: record.name.clone(),
                        error: e.to_string(),
                    });
                }
                Self::remove_migration_record(&transaction, record.version)?;
                transaction.commit()?;
                log::info!("rolled back migration {} ({})", record.version, record.name);
                rolled_back += 1;
            }
            Ok(rolled_back)
        })
    }

    fn find(&self, version: i64) -> Option<&dyn Migration> {
        self.migrations
            .iter()
            .find(|m| m.version() == version)
            .map(|m| m.as_ref())
    }

    fn with_lock<T>(
        executor: &PgExecutor,
        op: impl FnOnce() -> Result<T, MigrationError>,
    ) -> Result<T, MigrationError> {
        executor.execute("SELECT pg_advisory_lock($1)", &[&LOCK_KEY])?;
        let result = op();
        if let Err(e) = executor.execute("SELECT pg_advisory_unlock($1)", &[&LOCK_KEY]) {
            log::warn!("failed to release migration lock: {e}");
        }
        result
    }

    fn query_applied_migrations(
        executor: &dyn ErpExecutor,
    ) -> Result<Vec<MigrationRecord>, MigrationError> {
        let sql = r#"
            SELECT version, name, checksum, applied_at, execution_time_ms, success
            FROM ledgerguard_migrations
            ORDER BY version ASC
        "#;
        let rows = executor.query_all(sql, &[])?;
        rows.iter()
            .map(|row| MigrationRecord::from_row(row).map_err(MigrationError::from))
            .collect()
    }

    fn record_migration(
        executor: &dyn ErpExecutor,
        record: &MigrationRecord,
    ) -> Result<(), MigrationError> {
        let sql = r#"
            INSERT INTO ledgerguard_migrations
                (version, name, checksum, applied_at, execution_time_ms, success)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#;
        executor.execute(
            sql,
            &[
                &record.version,
                &record.name,
                &record.checksum,
                &record.applied_at,
                &record.execution_time_ms,
                &record.success,
            ],
        )?;
        Ok(())
    }

    fn remove_migration_record(
        executor: &dyn ErpExecutor,
        version: i64,
    ) -> Result<(), MigrationError> {
        executor.execute(
            "DELETE FROM ledgerguard_migrations WHERE version = $1",
            &[&version],
        )?;
        Ok(())
    }
}
