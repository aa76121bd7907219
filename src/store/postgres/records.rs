//! Row mapping between domain structs and their tables.
//!
//! Column names equal field names. Enum fields are stored as their text code.

use crate::accounting::model::{
    Account, AccountType, CostCenter, JournalEntry, JournalEntryLine, LedgerEntry,
};
use crate::banking::model::{Payment, PaymentLine, PaymentMethod};
use crate::devices::model::{ZkAttendanceLog, ZkDevice};
use crate::executor::StoreError;
use crate::hrm::model::{
    Attendance, Employee, EmployeeSalary, LeaveApplication, LeaveBalance, LeaveType,
    SalaryComponent, SalaryDetail, SalaryMonth, SalaryStructure, StructureComponent,
};
use crate::partners::BusinessPartner;
use crate::sales::model::{SalesOrder, SalesOrderLine};
use crate::store::StoreResult;
use may_postgres::types::FromSql;
use may_postgres::Row;
use sea_query::Value;
use std::str::FromStr;
use uuid::Uuid;

pub(crate) trait PgRecord: Sized {
    const TABLE: &'static str;
    /// `id` first
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Uuid;
    /// Bind values in `COLUMNS` order
    fn values(&self) -> Vec<Value>;
    fn from_row(row: &Row) -> StoreResult<Self>;
}

pub(crate) fn column<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> StoreResult<T> {
    row.try_get(name)
        .map_err(|e| StoreError::ParseError(format!("column {name}: {e}")))
}

fn text_column<T>(row: &Row, name: &str) -> StoreResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = column(row, name)?;
    raw.parse()
        .map_err(|e| StoreError::ParseError(format!("column {name}: {e}")))
}

macro_rules! pg_record {
    (
        $ty:ty => $table:literal {
            $($field:ident),+
            $(; text: $($tfield:ident),+)?
            $(;)?
        }
    ) => {
        impl PgRecord for $ty {
            const TABLE: &'static str = $table;
            const COLUMNS: &'static [&'static str] =
                &[$(stringify!($field)),+ $($(, stringify!($tfield))+)?];

            fn id(&self) -> Uuid {
                self.id
            }

            fn values(&self) -> Vec<Value> {
                vec![
                    $(Value::from(self.$field.clone())),+
                    $($(, Value::from(self.$tfield.as_str()))+)?
                ]
            }

            fn from_row(row: &Row) -> StoreResult<Self> {
                Ok(Self {
                    $($field: column(row, stringify!($field))?,)+
                    $($($tfield: text_column(row, stringify!($tfield))?,)+)?
                })
            }
        }
    };
}

pg_record! {
    AccountType => "account_types" {
        id, code, name, is_debit, created_at, updated_at;
        text: category
    }
}

pg_record! {
    Account => "accounts" {
        id, code, name, account_type_id, parent_id, currency, is_active, created_at, updated_at
    }
}

pg_record! {
    CostCenter => "cost_centers" {
        id, code, name, parent_id, is_active, created_at, updated_at
    }
}

pg_record! {
    JournalEntry => "journal_entries" {
        id, doc_num, posting_date, reference, remarks, currency, total_debit, total_credit,
        is_posted, posting_version, cost_center_id, created_at, updated_at
    }
}

pg_record! {
    JournalEntryLine => "journal_entry_lines" {
        id, journal_entry_id, line_number, account_id, debit_amount, credit_amount,
        description, created_at, updated_at
    }
}

pg_record! {
    LedgerEntry => "general_ledger" {
        id, journal_entry_id, account_id, line_number, posting_date, debit_amount,
        credit_amount, balance, currency, cost_center_id, posting_version, created_at
    }
}

pg_record! {
    BusinessPartner => "business_partners" {
        id, code, name, currency, credit_limit, balance, phone, email, is_active,
        created_at, updated_at;
        text: bp_type
    }
}

pg_record! {
    SalesOrder => "sales_orders" {
        id, document_no, document_date, delivery_date, customer_id, currency,
        discount_amount, tax_amount, total_amount, payable_amount, paid_amount, due_amount,
        payment_method, payment_reference, payment_date, remarks, created_at, updated_at;
        text: status
    }
}

pg_record! {
    SalesOrderLine => "sales_order_lines" {
        id, order_id, item_code, item_name, quantity, unit_price, total_amount, uom,
        is_active, created_at, updated_at
    }
}

pg_record! {
    PaymentMethod => "payment_methods" {
        id, name, description, created_at, updated_at
    }
}

pg_record! {
    Payment => "payments" {
        id, doc_num, business_partner_id, amount, currency, payment_date, payment_method_id,
        sales_order_id, reference, remarks, is_reconciled, created_at, updated_at;
        text: payment_type
    }
}

pg_record! {
    PaymentLine => "payment_lines" {
        id, payment_id, account_id, amount, description, created_at, updated_at
    }
}

pg_record! {
    Employee => "employees" {
        id, employee_code, first_name, last_name, email, joining_date, basic_salary,
        gross_salary, is_active, created_at, updated_at
    }
}

pg_record! {
    SalaryComponent => "salary_components" {
        id, code, name, is_taxable, is_active, created_at, updated_at;
        text: component_type
    }
}

pg_record! {
    SalaryStructure => "salary_structures" {
        id, employee_id, effective_date, basic_salary, total_earnings, total_deductions,
        gross_salary, net_salary, created_at, updated_at
    }
}

pg_record! {
    StructureComponent => "structure_components" {
        id, structure_id, component_id, amount, percentage, calculated_amount, is_active,
        created_at, updated_at
    }
}

pg_record! {
    LeaveType => "leave_types" {
        id, code, name, paid, max_days_per_year, carry_forward, max_carry_forward_days,
        created_at, updated_at
    }
}

pg_record! {
    LeaveApplication => "leave_applications" {
        id, employee_id, leave_type_id, start_date, end_date, reason, approved_by,
        approved_at, remarks, created_at, updated_at;
        text: status
    }
}

pg_record! {
    LeaveBalance => "leave_balances" {
        id, employee_id, leave_type_id, year, total_days, used_days, pending_days,
        carried_forward_days, created_at, updated_at
    }
}

pg_record! {
    Attendance => "attendance" {
        id, employee_id, date, check_in, check_out, created_at, updated_at;
        text: status
    }
}

pg_record! {
    SalaryMonth => "salary_months" {
        id, year, month, is_generated, generated_at, is_paid, payment_date, created_at,
        updated_at
    }
}

pg_record! {
    EmployeeSalary => "employee_salaries" {
        id, salary_month_id, employee_id, basic_salary, total_earnings, total_deductions,
        gross_salary, net_salary, working_days, present_days, absent_days, leave_days,
        created_at
    }
}

pg_record! {
    SalaryDetail => "salary_details" {
        id, employee_salary_id, component_id, amount, created_at;
        text: component_type
    }
}

pg_record! {
    ZkDevice => "zk_devices" {
        id, name, ip_address, port, device_id, is_active, last_sync, location,
        timeout_seconds, password, force_udp, created_at, updated_at
    }
}

pg_record! {
    ZkAttendanceLog => "zk_attendance_logs" {
        id, device_id, device_serial_no, user_id, timestamp, punch_type, status,
        verify_type, work_code, created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::model::AccountCategory;

    #[test]
    fn test_columns_start_with_id_and_match_values() {
        let now = chrono::Utc::now().naive_utc();
        let record = AccountType {
            id: Uuid::new_v4(),
            code: "AST".into(),
            name: "Assets".into(),
            is_debit: true,
            category: AccountCategory::Asset,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(AccountType::COLUMNS[0], "id");
        assert_eq!(AccountType::COLUMNS.last(), Some(&"category"));
        assert_eq!(record.values().len(), AccountType::COLUMNS.len());
        assert_eq!(
            record.values().last(),
            Some(&Value::from("asset"))
        );
    }

    #[test]
    fn test_every_table_keys_on_id() {
        for columns in [
            Account::COLUMNS,
            CostCenter::COLUMNS,
            JournalEntry::COLUMNS,
            LedgerEntry::COLUMNS,
            SalesOrder::COLUMNS,
            Payment::COLUMNS,
            EmployeeSalary::COLUMNS,
            ZkAttendanceLog::COLUMNS,
        ] {
            assert_eq!(columns[0], "id");
        }
    }
}
