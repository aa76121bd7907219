//! Persistence seam.
//!
//! Services are generic over [`Store`], which bundles one trait per module. Two
//! implementations ship with the crate:
//!
//! - [`PgStore`]: PostgreSQL through an [`ErpExecutor`](crate::executor::ErpExecutor),
//!   statements built with `sea-query`
//! - [`MemoryStore`]: in-process tables, used by tests and embedders without a database
//!
//! Store methods are plain row access: no business rules, no cascades beyond the
//! foreign-key `ON DELETE CASCADE` behaviour of the schema.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::accounting::filter::LedgerFilter;
use crate::accounting::model::{
    Account, AccountTotals, AccountType, CostCenter, JournalEntry, JournalEntryLine, LedgerEntry,
};
use crate::banking::model::{Payment, PaymentLine, PaymentMethod};
use crate::devices::model::{ZkAttendanceLog, ZkDevice};
use crate::error::ErpError;
use crate::executor::StoreError;
use crate::hrm::model::{
    Attendance, Employee, EmployeeSalary, LeaveApplication, LeaveBalance, LeaveType,
    SalaryComponent, SalaryDetail, SalaryMonth, SalaryStructure, StructureComponent,
};
use crate::partners::BusinessPartner;
use crate::sales::model::{PaymentSummary, SalesOrder, SalesOrderLine};
use chrono::{NaiveDate, NaiveDateTime, SubsecRound, Utc};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Current UTC time at the precision PostgreSQL `TIMESTAMP` keeps
pub fn timestamp() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

pub trait AccountingStore {
    fn insert_account_type(&self, value: &AccountType) -> StoreResult<()>;
    fn get_account_type(&self, id: Uuid) -> StoreResult<Option<AccountType>>;
    fn list_account_types(&self) -> StoreResult<Vec<AccountType>>;

    fn insert_account(&self, value: &Account) -> StoreResult<()>;
    fn update_account(&self, value: &Account) -> StoreResult<()>;
    fn delete_account(&self, id: Uuid) -> StoreResult<bool>;
    fn get_account(&self, id: Uuid) -> StoreResult<Option<Account>>;
    fn find_account_by_code(&self, code: &str) -> StoreResult<Option<Account>>;
    /// Ordered by code
    fn list_accounts(&self) -> StoreResult<Vec<Account>>;
    /// Whether journal lines, ledger rows, payment lines or child accounts reference it
    fn account_in_use(&self, id: Uuid) -> StoreResult<bool>;

    fn insert_cost_center(&self, value: &CostCenter) -> StoreResult<()>;
    fn update_cost_center(&self, value: &CostCenter) -> StoreResult<()>;
    fn get_cost_center(&self, id: Uuid) -> StoreResult<Option<CostCenter>>;
    fn find_cost_center_by_code(&self, code: &str) -> StoreResult<Option<CostCenter>>;
    fn list_cost_centers(&self) -> StoreResult<Vec<CostCenter>>;

    fn insert_journal_entry(&self, value: &JournalEntry) -> StoreResult<()>;
    fn update_journal_entry(&self, value: &JournalEntry) -> StoreResult<()>;
    /// Also removes the entry's lines and ledger rows
    fn delete_journal_entry(&self, id: Uuid) -> StoreResult<bool>;
    fn get_journal_entry(&self, id: Uuid) -> StoreResult<Option<JournalEntry>>;
    fn find_journal_entry_by_doc_num(&self, doc_num: &str) -> StoreResult<Option<JournalEntry>>;
    /// Ordered by posting date, then doc_num
    fn list_journal_entries(&self) -> StoreResult<Vec<JournalEntry>>;
    fn journal_doc_nums(&self, prefix: &str) -> StoreResult<Vec<String>>;

    fn insert_journal_line(&self, value: &JournalEntryLine) -> StoreResult<()>;
    fn update_journal_line(&self, value: &JournalEntryLine) -> StoreResult<()>;
    fn delete_journal_line(&self, id: Uuid) -> StoreResult<bool>;
    fn get_journal_line(&self, id: Uuid) -> StoreResult<Option<JournalEntryLine>>;
    /// Ordered by line number
    fn lines_for_entry(&self, journal_entry_id: Uuid) -> StoreResult<Vec<JournalEntryLine>>;

    /// Ordered by line number
    fn ledger_for_entry(&self, journal_entry_id: Uuid) -> StoreResult<Vec<LedgerEntry>>;
    /// Deletes the entry's ledger rows and inserts `rows` in their place
    fn replace_ledger_for_entry(
        &self,
        journal_entry_id: Uuid,
        rows: &[LedgerEntry],
    ) -> StoreResult<()>;
    fn delete_ledger_for_entry(&self, journal_entry_id: Uuid) -> StoreResult<u64>;
    /// Ordered by posting date, creation time, then line number
    fn query_ledger(&self, filter: &LedgerFilter) -> StoreResult<Vec<LedgerEntry>>;
    /// Debit/credit sums per account for the rows matching `filter`
    fn ledger_totals(&self, filter: &LedgerFilter) -> StoreResult<Vec<AccountTotals>>;
}

pub trait PartnerStore {
    fn insert_partner(&self, value: &BusinessPartner) -> StoreResult<()>;
    fn update_partner(&self, value: &BusinessPartner) -> StoreResult<()>;
    fn get_partner(&self, id: Uuid) -> StoreResult<Option<BusinessPartner>>;
    fn find_partner_by_code(&self, code: &str) -> StoreResult<Option<BusinessPartner>>;
    fn list_partners(&self) -> StoreResult<Vec<BusinessPartner>>;
}

pub trait SalesStore {
    fn insert_sales_order(&self, value: &SalesOrder) -> StoreResult<()>;
    fn update_sales_order(&self, value: &SalesOrder) -> StoreResult<()>;
    /// Writes only the payment summary columns and status
    fn save_payment_summary(&self, order_id: Uuid, summary: &PaymentSummary) -> StoreResult<()>;
    fn get_sales_order(&self, id: Uuid) -> StoreResult<Option<SalesOrder>>;
    fn find_sales_order_by_document_no(&self, document_no: &str)
        -> StoreResult<Option<SalesOrder>>;
    fn list_sales_orders(&self) -> StoreResult<Vec<SalesOrder>>;
    fn sales_order_numbers(&self, prefix: &str) -> StoreResult<Vec<String>>;

    fn insert_order_line(&self, value: &SalesOrderLine) -> StoreResult<()>;
    fn update_order_line(&self, value: &SalesOrderLine) -> StoreResult<()>;
    fn delete_order_line(&self, id: Uuid) -> StoreResult<bool>;
    fn get_order_line(&self, id: Uuid) -> StoreResult<Option<SalesOrderLine>>;
    fn lines_for_order(&self, order_id: Uuid) -> StoreResult<Vec<SalesOrderLine>>;
}

pub trait BankingStore {
    fn insert_payment_method(&self, value: &PaymentMethod) -> StoreResult<()>;
    fn get_payment_method(&self, id: Uuid) -> StoreResult<Option<PaymentMethod>>;
    fn find_payment_method_by_name(&self, name: &str) -> StoreResult<Option<PaymentMethod>>;
    fn list_payment_methods(&self) -> StoreResult<Vec<PaymentMethod>>;

    fn insert_payment(&self, value: &Payment) -> StoreResult<()>;
    fn update_payment(&self, value: &Payment) -> StoreResult<()>;
    /// Also removes the payment's lines
    fn delete_payment(&self, id: Uuid) -> StoreResult<bool>;
    fn get_payment(&self, id: Uuid) -> StoreResult<Option<Payment>>;
    fn find_payment_by_doc_num(&self, doc_num: &str) -> StoreResult<Option<Payment>>;
    /// Ordered by payment date, then doc_num
    fn list_payments(&self) -> StoreResult<Vec<Payment>>;
    /// All payments of either type referencing the order
    fn payments_for_order(&self, order_id: Uuid) -> StoreResult<Vec<Payment>>;
    fn payment_doc_nums(&self, prefix: &str) -> StoreResult<Vec<String>>;

    fn insert_payment_line(&self, value: &PaymentLine) -> StoreResult<()>;
    fn delete_payment_line(&self, id: Uuid) -> StoreResult<bool>;
    fn lines_for_payment(&self, payment_id: Uuid) -> StoreResult<Vec<PaymentLine>>;
}

pub trait HrmStore {
    fn insert_employee(&self, value: &Employee) -> StoreResult<()>;
    fn update_employee(&self, value: &Employee) -> StoreResult<()>;
    fn get_employee(&self, id: Uuid) -> StoreResult<Option<Employee>>;
    fn list_employees(&self) -> StoreResult<Vec<Employee>>;

    fn insert_salary_component(&self, value: &SalaryComponent) -> StoreResult<()>;
    fn get_salary_component(&self, id: Uuid) -> StoreResult<Option<SalaryComponent>>;
    fn list_salary_components(&self) -> StoreResult<Vec<SalaryComponent>>;

    fn insert_salary_structure(&self, value: &SalaryStructure) -> StoreResult<()>;
    fn update_salary_structure(&self, value: &SalaryStructure) -> StoreResult<()>;
    fn get_salary_structure(&self, id: Uuid) -> StoreResult<Option<SalaryStructure>>;
    fn find_structure_for_employee(&self, employee_id: Uuid)
        -> StoreResult<Option<SalaryStructure>>;

    fn insert_structure_component(&self, value: &StructureComponent) -> StoreResult<()>;
    fn update_structure_component(&self, value: &StructureComponent) -> StoreResult<()>;
    fn delete_structure_component(&self, id: Uuid) -> StoreResult<bool>;
    fn get_structure_component(&self, id: Uuid) -> StoreResult<Option<StructureComponent>>;
    fn components_for_structure(&self, structure_id: Uuid)
        -> StoreResult<Vec<StructureComponent>>;

    fn insert_leave_type(&self, value: &LeaveType) -> StoreResult<()>;
    fn get_leave_type(&self, id: Uuid) -> StoreResult<Option<LeaveType>>;

    fn insert_leave_application(&self, value: &LeaveApplication) -> StoreResult<()>;
    fn update_leave_application(&self, value: &LeaveApplication) -> StoreResult<()>;
    fn delete_leave_application(&self, id: Uuid) -> StoreResult<bool>;
    fn get_leave_application(&self, id: Uuid) -> StoreResult<Option<LeaveApplication>>;
    /// Ordered by start date
    fn leave_applications_for_employee(
        &self,
        employee_id: Uuid,
    ) -> StoreResult<Vec<LeaveApplication>>;

    fn find_leave_balance(
        &self,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> StoreResult<Option<LeaveBalance>>;
    fn insert_leave_balance(&self, value: &LeaveBalance) -> StoreResult<()>;
    fn update_leave_balance(&self, value: &LeaveBalance) -> StoreResult<()>;

    fn insert_attendance(&self, value: &Attendance) -> StoreResult<()>;
    fn update_attendance(&self, value: &Attendance) -> StoreResult<()>;
    /// Inclusive date range, ordered by date
    fn attendance_between(
        &self,
        employee_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Attendance>>;

    fn insert_salary_month(&self, value: &SalaryMonth) -> StoreResult<()>;
    fn update_salary_month(&self, value: &SalaryMonth) -> StoreResult<()>;
    fn find_salary_month(&self, year: i32, month: i32) -> StoreResult<Option<SalaryMonth>>;
    fn insert_employee_salary(&self, value: &EmployeeSalary) -> StoreResult<()>;
    fn salaries_for_month(&self, salary_month_id: Uuid) -> StoreResult<Vec<EmployeeSalary>>;
    /// Also removes the salaries' details
    fn delete_salaries_for_month(&self, salary_month_id: Uuid) -> StoreResult<u64>;
    fn insert_salary_detail(&self, value: &SalaryDetail) -> StoreResult<()>;
    fn details_for_salary(&self, employee_salary_id: Uuid) -> StoreResult<Vec<SalaryDetail>>;
}

pub trait DeviceStore {
    fn insert_device(&self, value: &ZkDevice) -> StoreResult<()>;
    fn update_device(&self, value: &ZkDevice) -> StoreResult<()>;
    fn get_device(&self, id: Uuid) -> StoreResult<Option<ZkDevice>>;
    fn list_devices(&self) -> StoreResult<Vec<ZkDevice>>;

    fn attendance_log_exists(
        &self,
        device_id: Uuid,
        user_id: &str,
        timestamp: NaiveDateTime,
        punch_type: Option<&str>,
    ) -> StoreResult<bool>;
    fn insert_attendance_log(&self, value: &ZkAttendanceLog) -> StoreResult<()>;
    /// Ordered by timestamp
    fn attendance_logs(&self, device_id: Option<Uuid>) -> StoreResult<Vec<ZkAttendanceLog>>;
}

/// Every module's storage plus transactions
pub trait Store:
    AccountingStore + PartnerStore + SalesStore + BankingStore + HrmStore + DeviceStore
{
    /// Runs `f` atomically: all of its writes become visible together, or none do when it
    /// returns an error. Calls nest.
    fn atomic<R, F>(&self, f: F) -> Result<R, ErpError>
    where
        F: FnOnce(&Self) -> Result<R, ErpError>;
}
