//! Chart of accounts, cost centers, journal entries and the general ledger projection.

use super::drop_tables;
use crate::migration::{Migration, MigrationError, SchemaManager};

pub struct CreateAccounting;

impl Migration for CreateAccounting {
    fn name(&self) -> &str {
        "create_accounting"
    }

    fn version(&self) -> i64 {
        20240101000001
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS account_types (
                id UUID PRIMARY KEY,
                code VARCHAR(50) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                is_debit BOOLEAN NOT NULL,
                category VARCHAR(20) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id UUID PRIMARY KEY,
                code VARCHAR(50) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                account_type_id UUID NOT NULL REFERENCES account_types(id) ON DELETE RESTRICT,
                parent_id UUID REFERENCES accounts(id) ON DELETE SET NULL,
                currency VARCHAR(3) NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;
        manager.execute_sql(
            "CREATE INDEX IF NOT EXISTS idx_accounts_account_type_id ON accounts(account_type_id)",
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS cost_centers (
                id UUID PRIMARY KEY,
                code VARCHAR(50) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                parent_id UUID REFERENCES cost_centers(id) ON DELETE SET NULL,
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS journal_entries (
                id UUID PRIMARY KEY,
                doc_num VARCHAR(50) NOT NULL UNIQUE,
                posting_date DATE NOT NULL,
                reference VARCHAR(255),
                remarks TEXT,
                currency VARCHAR(3) NOT NULL,
                total_debit NUMERIC(18, 2) NOT NULL DEFAULT 0,
                total_credit NUMERIC(18, 2) NOT NULL DEFAULT 0,
                is_posted BOOLEAN NOT NULL DEFAULT false,
                posting_version INTEGER NOT NULL DEFAULT 0,
                cost_center_id UUID REFERENCES cost_centers(id) ON DELETE SET NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;
        manager.execute_sql(
            "CREATE INDEX IF NOT EXISTS idx_journal_entries_posting_date ON journal_entries(posting_date)",
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS journal_entry_lines (
                id UUID PRIMARY KEY,
                journal_entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
                line_number INTEGER NOT NULL,
                account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE RESTRICT,
                debit_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
                credit_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (journal_entry_id, line_number),
                CHECK (debit_amount >= 0 AND credit_amount >= 0)
            )
            "#,
        )?;
        manager.execute_sql(
            "CREATE INDEX IF NOT EXISTS idx_journal_entry_lines_account_id ON journal_entry_lines(account_id)",
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS general_ledger (
                id UUID PRIMARY KEY,
                journal_entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
                account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE RESTRICT,
                line_number INTEGER NOT NULL,
                posting_date DATE NOT NULL,
                debit_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
                credit_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
                balance NUMERIC(18, 2) NOT NULL DEFAULT 0,
                currency VARCHAR(3) NOT NULL,
                cost_center_id UUID REFERENCES cost_centers(id) ON DELETE SET NULL,
                posting_version INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (journal_entry_id, line_number)
            )
            "#,
        )?;
        manager.execute_sql(
            "CREATE INDEX IF NOT EXISTS idx_general_ledger_account_date ON general_ledger(account_id, posting_date)",
        )?;
        Ok(())
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        drop_tables(
            manager,
            &[
                "general_ledger",
                "journal_entry_lines",
                "journal_entries",
                "cost_centers",
                "accounts",
                "account_types",
            ],
        )
    }
}
