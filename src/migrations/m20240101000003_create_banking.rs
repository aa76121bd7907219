//! Payment methods, payments and their account allocations.

use super::drop_tables;
use crate::migration::{Migration, MigrationError, SchemaManager};

pub struct CreateBanking;

impl Migration for CreateBanking {
    fn name(&self) -> &str {
        "create_banking"
    }

    fn version(&self) -> i64 {
        20240101000003
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS payment_methods (
                id UUID PRIMARY KEY,
                name VARCHAR(100) NOT NULL UNIQUE,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS payments (
                id UUID PRIMARY KEY,
                doc_num VARCHAR(50) NOT NULL UNIQUE,
                business_partner_id UUID NOT NULL REFERENCES business_partners(id) ON DELETE RESTRICT,
                payment_type VARCHAR(20) NOT NULL,
                amount NUMERIC(18, 6) NOT NULL,
                currency VARCHAR(3) NOT NULL,
                payment_date DATE NOT NULL,
                payment_method_id UUID NOT NULL REFERENCES payment_methods(id) ON DELETE RESTRICT,
                sales_order_id UUID REFERENCES sales_orders(id) ON DELETE SET NULL,
                reference VARCHAR(255),
                remarks TEXT,
                is_reconciled BOOLEAN NOT NULL DEFAULT false,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                CHECK (amount > 0)
            )
            "#,
        )?;
        manager.execute_sql(
            "CREATE INDEX IF NOT EXISTS idx_payments_sales_order_id ON payments(sales_order_id)",
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS payment_lines (
                id UUID PRIMARY KEY,
                payment_id UUID NOT NULL REFERENCES payments(id) ON DELETE CASCADE,
                account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE RESTRICT,
                amount NUMERIC(18, 6) NOT NULL,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;
        Ok(())
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        drop_tables(manager, &["payment_lines", "payments", "payment_methods"])
    }
}
