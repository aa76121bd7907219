//! Business partners, sales orders and their lines.

use super::drop_tables;
use crate::migration::{Migration, MigrationError, SchemaManager};

pub struct CreateSales;

impl Migration for CreateSales {
    fn name(&self) -> &str {
        "create_sales"
    }

    fn version(&self) -> i64 {
        20240101000002
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS business_partners (
                id UUID PRIMARY KEY,
                code VARCHAR(50) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                bp_type VARCHAR(20) NOT NULL,
                currency VARCHAR(3),
                credit_limit NUMERIC(18, 2) NOT NULL DEFAULT 0,
                balance NUMERIC(18, 2) NOT NULL DEFAULT 0,
                phone VARCHAR(50),
                email VARCHAR(255),
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;

        // Order amounts carry six decimal places
        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS sales_orders (
                id UUID PRIMARY KEY,
                document_no VARCHAR(50) NOT NULL UNIQUE,
                document_date DATE NOT NULL,
                delivery_date DATE,
                customer_id UUID NOT NULL REFERENCES business_partners(id) ON DELETE RESTRICT,
                currency VARCHAR(3) NOT NULL,
                discount_amount NUMERIC(18, 6) NOT NULL DEFAULT 0,
                tax_amount NUMERIC(18, 6) NOT NULL DEFAULT 0,
                total_amount NUMERIC(18, 6) NOT NULL DEFAULT 0,
                payable_amount NUMERIC(18, 6) NOT NULL DEFAULT 0,
                paid_amount NUMERIC(18, 6) NOT NULL DEFAULT 0,
                due_amount NUMERIC(18, 6) NOT NULL DEFAULT 0,
                payment_method VARCHAR(255),
                payment_reference VARCHAR(255),
                payment_date DATE,
                status VARCHAR(20) NOT NULL,
                remarks TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;
        manager.execute_sql(
            "CREATE INDEX IF NOT EXISTS idx_sales_orders_customer_id ON sales_orders(customer_id)",
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS sales_order_lines (
                id UUID PRIMARY KEY,
                order_id UUID NOT NULL REFERENCES sales_orders(id) ON DELETE CASCADE,
                item_code VARCHAR(100) NOT NULL,
                item_name VARCHAR(255) NOT NULL,
                quantity NUMERIC(18, 6) NOT NULL,
                unit_price NUMERIC(18, 6) NOT NULL,
                total_amount NUMERIC(18, 6) NOT NULL,
                uom VARCHAR(20),
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                CHECK (quantity > 0)
            )
            "#,
        )?;
        manager.execute_sql(
            "CREATE INDEX IF NOT EXISTS idx_sales_order_lines_order_id ON sales_order_lines(order_id)",
        )?;
        Ok(())
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        drop_tables(
            manager,
            &["sales_order_lines", "sales_orders", "business_partners"],
        )
    }
}
