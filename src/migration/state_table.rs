//! Migration state table management

use crate::executor::{ErpExecutor, StoreError};

pub const STATE_TABLE: &str = "ledgerguard_migrations";

/// Creates `ledgerguard_migrations` and its index when missing.
pub fn initialize_state_table(executor: &dyn ErpExecutor) -> Result<(), StoreError> {
    let sql = r#"
        CREATE TABLE IF NOT EXISTS ledgerguard_migrations (
            version BIGINT PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            checksum VARCHAR(64) NOT NULL,
            applied_at TIMESTAMP NOT NULL,
            execution_time_ms BIGINT,
            success BOOLEAN NOT NULL DEFAULT true
        )
    "#;
    executor.execute(sql, &[])?;

    let index_sql = r#"
        CREATE INDEX IF NOT EXISTS idx_ledgerguard_migrations_applied_at
        ON ledgerguard_migrations(applied_at)
    "#;
    executor.execute(index_sql, &[])?;
    Ok(())
}

