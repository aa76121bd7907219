//! Employees, salary structures, leave, attendance and payroll.

use super::drop_tables;
use crate::migration::{Migration, MigrationError, SchemaManager};

pub struct CreateHrm;

impl Migration for CreateHrm {
    fn name(&self) -> &str {
        "create_hrm"
    }

    fn version(&self) -> i64 {
        20240101000004
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS employees (
                id UUID PRIMARY KEY,
                employee_code VARCHAR(50) NOT NULL UNIQUE,
                first_name VARCHAR(100) NOT NULL,
                last_name VARCHAR(100) NOT NULL,
                email VARCHAR(255),
                joining_date DATE NOT NULL,
                basic_salary NUMERIC(18, 2) NOT NULL DEFAULT 0,
                gross_salary NUMERIC(18, 2) NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS salary_components (
                id UUID PRIMARY KEY,
                code VARCHAR(50) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                component_type VARCHAR(20) NOT NULL,
                is_taxable BOOLEAN NOT NULL DEFAULT true,
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;

        // One structure per employee
        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS salary_structures (
                id UUID PRIMARY KEY,
                employee_id UUID NOT NULL UNIQUE REFERENCES employees(id) ON DELETE CASCADE,
                effective_date DATE NOT NULL,
                basic_salary NUMERIC(18, 2) NOT NULL,
                total_earnings NUMERIC(18, 2) NOT NULL DEFAULT 0,
                total_deductions NUMERIC(18, 2) NOT NULL DEFAULT 0,
                gross_salary NUMERIC(18, 2) NOT NULL DEFAULT 0,
                net_salary NUMERIC(18, 2) NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS structure_components (
                id UUID PRIMARY KEY,
                structure_id UUID NOT NULL REFERENCES salary_structures(id) ON DELETE CASCADE,
                component_id UUID NOT NULL REFERENCES salary_components(id) ON DELETE RESTRICT,
                amount NUMERIC(18, 2),
                percentage NUMERIC(9, 4),
                calculated_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (structure_id, component_id)
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS leave_types (
                id UUID PRIMARY KEY,
                code VARCHAR(50) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                paid BOOLEAN NOT NULL DEFAULT true,
                max_days_per_year INTEGER NOT NULL DEFAULT 0,
                carry_forward BOOLEAN NOT NULL DEFAULT false,
                max_carry_forward_days INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS leave_applications (
                id UUID PRIMARY KEY,
                employee_id UUID NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
                leave_type_id UUID NOT NULL REFERENCES leave_types(id) ON DELETE RESTRICT,
                start_date DATE NOT NULL,
                end_date DATE NOT NULL,
                reason TEXT NOT NULL,
                status VARCHAR(20) NOT NULL,
                approved_by UUID REFERENCES employees(id) ON DELETE SET NULL,
                approved_at TIMESTAMP,
                remarks TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                CHECK (end_date >= start_date)
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS leave_balances (
                id UUID PRIMARY KEY,
                employee_id UUID NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
                leave_type_id UUID NOT NULL REFERENCES leave_types(id) ON DELETE CASCADE,
                year INTEGER NOT NULL,
                total_days NUMERIC(8, 2) NOT NULL DEFAULT 0,
                used_days NUMERIC(8, 2) NOT NULL DEFAULT 0,
                pending_days NUMERIC(8, 2) NOT NULL DEFAULT 0,
                carried_forward_days NUMERIC(8, 2) NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (employee_id, leave_type_id, year)
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS attendance (
                id UUID PRIMARY KEY,
                employee_id UUID NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
                date DATE NOT NULL,
                status VARCHAR(20) NOT NULL,
                check_in TIMESTAMP,
                check_out TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (employee_id, date)
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS salary_months (
                id UUID PRIMARY KEY,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                is_generated BOOLEAN NOT NULL DEFAULT false,
                generated_at TIMESTAMP,
                is_paid BOOLEAN NOT NULL DEFAULT false,
                payment_date DATE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (year, month),
                CHECK (month BETWEEN 1 AND 12)
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS employee_salaries (
                id UUID PRIMARY KEY,
                salary_month_id UUID NOT NULL REFERENCES salary_months(id) ON DELETE CASCADE,
                employee_id UUID NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
                basic_salary NUMERIC(18, 2) NOT NULL,
                total_earnings NUMERIC(18, 2) NOT NULL,
                total_deductions NUMERIC(18, 2) NOT NULL,
                gross_salary NUMERIC(18, 2) NOT NULL,
                net_salary NUMERIC(18, 2) NOT NULL,
                working_days INTEGER NOT NULL,
                present_days NUMERIC(6, 1) NOT NULL DEFAULT 0,
                absent_days INTEGER NOT NULL DEFAULT 0,
                leave_days INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (salary_month_id, employee_id)
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS salary_details (
                id UUID PRIMARY KEY,
                employee_salary_id UUID NOT NULL REFERENCES employee_salaries(id) ON DELETE CASCADE,
                component_id UUID NOT NULL REFERENCES salary_components(id) ON DELETE RESTRICT,
                component_type VARCHAR(20) NOT NULL,
                amount NUMERIC(18, 2) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;
        Ok(())
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        drop_tables(
            manager,
            &[
                "salary_details",
                "employee_salaries",
                "salary_months",
                "attendance",
                "leave_balances",
                "leave_applications",
                "leave_types",
                "structure_components",
                "salary_structures",
                "salary_components",
                "employees",
            ],
        )
    }
}
