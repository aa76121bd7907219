//! In-process [`Store`] backed by ordered maps.
//!
//! Enforces the same unique constraints and delete cascades as the PostgreSQL schema.
//! `atomic` takes a snapshot of every table and restores it when the closure fails.

use super::{
    AccountingStore, BankingStore, DeviceStore, HrmStore, PartnerStore, SalesStore, Store,
    StoreResult,
};
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
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

type Table<T> = BTreeMap<Uuid, T>;

#[derive(Debug, Default, Clone)]
struct Tables {
    account_types: Table<AccountType>,
    accounts: Table<Account>,
    cost_centers: Table<CostCenter>,
    journal_entries: Table<JournalEntry>,
    journal_lines: Table<JournalEntryLine>,
    ledger: Table<LedgerEntry>,
    partners: Table<BusinessPartner>,
    sales_orders: Table<SalesOrder>,
    order_lines: Table<SalesOrderLine>,
    payment_methods: Table<PaymentMethod>,
    payments: Table<Payment>,
    payment_lines: Table<PaymentLine>,
    employees: Table<Employee>,
    salary_components: Table<SalaryComponent>,
    salary_structures: Table<SalaryStructure>,
    structure_components: Table<StructureComponent>,
    leave_types: Table<LeaveType>,
    leave_applications: Table<LeaveApplication>,
    leave_balances: Table<LeaveBalance>,
    attendance: Table<Attendance>,
    salary_months: Table<SalaryMonth>,
    employee_salaries: Table<EmployeeSalary>,
    salary_details: Table<SalaryDetail>,
    devices: Table<ZkDevice>,
    attendance_logs: Table<ZkAttendanceLog>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Other("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Other("memory store lock poisoned".to_string()))
    }
}

/// Fails when a row other than `id` already satisfies `clash`.
fn ensure_unique<T>(
    table: &Table<T>,
    id: Uuid,
    what: &str,
    clash: impl Fn(&T) -> bool,
) -> StoreResult<()> {
    match table.iter().find(|(key, row)| **key != id && clash(row)) {
        Some(_) => Err(StoreError::Conflict(format!("duplicate {what}"))),
        None => Ok(()),
    }
}

fn insert_row<T: Clone>(table: &mut Table<T>, id: Uuid, value: &T, entity: &str) -> StoreResult<()> {
    if table.contains_key(&id) {
        return Err(StoreError::Conflict(format!("{entity} {id} already exists")));
    }
    table.insert(id, value.clone());
    Ok(())
}

fn update_row<T: Clone>(table: &mut Table<T>, id: Uuid, value: &T, entity: &str) -> StoreResult<()> {
    match table.get_mut(&id) {
        Some(slot) => {
            *slot = value.clone();
            Ok(())
        }
        None => Err(StoreError::QueryError(format!("{entity} {id} does not exist"))),
    }
}

fn select<T: Clone>(table: &Table<T>, keep: impl Fn(&T) -> bool) -> Vec<T> {
    table.values().filter(|row| keep(row)).cloned().collect()
}

fn first<T: Clone>(table: &Table<T>, keep: impl Fn(&T) -> bool) -> Option<T> {
    table.values().find(|row| keep(row)).cloned()
}

fn with_prefix<'a>(values: impl Iterator<Item = &'a String>, prefix: &str) -> Vec<String> {
    let mut numbers: Vec<String> = values
        .filter(|value| value.starts_with(prefix))
        .cloned()
        .collect();
    numbers.sort();
    numbers
}

impl AccountingStore for MemoryStore {
    fn insert_account_type(&self, value: &AccountType) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.account_types, value.id, "account type code", |r| r.code == value.code)?;
        insert_row(&mut t.account_types, value.id, value, "account type")
    }

    fn get_account_type(&self, id: Uuid) -> StoreResult<Option<AccountType>> {
        Ok(self.read()?.account_types.get(&id).cloned())
    }

    fn list_account_types(&self) -> StoreResult<Vec<AccountType>> {
        let mut rows = select(&self.read()?.account_types, |_| true);
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    fn insert_account(&self, value: &Account) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.accounts, value.id, "account code", |r| r.code == value.code)?;
        insert_row(&mut t.accounts, value.id, value, "account")
    }

    fn update_account(&self, value: &Account) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.accounts, value.id, "account code", |r| r.code == value.code)?;
        update_row(&mut t.accounts, value.id, value, "account")
    }

    fn delete_account(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.write()?.accounts.remove(&id).is_some())
    }

    fn get_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    fn find_account_by_code(&self, code: &str) -> StoreResult<Option<Account>> {
        Ok(first(&self.read()?.accounts, |r| r.code == code))
    }

    fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let mut rows = select(&self.read()?.accounts, |_| true);
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    fn account_in_use(&self, id: Uuid) -> StoreResult<bool> {
        let t = self.read()?;
        Ok(t.journal_lines.values().any(|r| r.account_id == id)
            || t.ledger.values().any(|r| r.account_id == id)
            || t.payment_lines.values().any(|r| r.account_id == id)
            || t.accounts.values().any(|r| r.parent_id == Some(id)))
    }

    fn insert_cost_center(&self, value: &CostCenter) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.cost_centers, value.id, "cost center code", |r| r.code == value.code)?;
        insert_row(&mut t.cost_centers, value.id, value, "cost center")
    }

    fn update_cost_center(&self, value: &CostCenter) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.cost_centers, value.id, "cost center code", |r| r.code == value.code)?;
        update_row(&mut t.cost_centers, value.id, value, "cost center")
    }

    fn get_cost_center(&self, id: Uuid) -> StoreResult<Option<CostCenter>> {
        Ok(self.read()?.cost_centers.get(&id).cloned())
    }

    fn find_cost_center_by_code(&self, code: &str) -> StoreResult<Option<CostCenter>> {
        Ok(first(&self.read()?.cost_centers, |r| r.code == code))
    }

    fn list_cost_centers(&self) -> StoreResult<Vec<CostCenter>> {
        let mut rows = select(&self.read()?.cost_centers, |_| true);
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    fn insert_journal_entry(&self, value: &JournalEntry) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.journal_entries, value.id, "journal doc_num", |r| {
            r.doc_num == value.doc_num
        })?;
        insert_row(&mut t.journal_entries, value.id, value, "journal entry")
    }

    fn update_journal_entry(&self, value: &JournalEntry) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.journal_entries, value.id, "journal doc_num", |r| {
            r.doc_num == value.doc_num
        })?;
        update_row(&mut t.journal_entries, value.id, value, "journal entry")
    }

    fn delete_journal_entry(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.write()?;
        t.journal_lines.retain(|_, r| r.journal_entry_id != id);
        t.ledger.retain(|_, r| r.journal_entry_id != id);
        Ok(t.journal_entries.remove(&id).is_some())
    }

    fn get_journal_entry(&self, id: Uuid) -> StoreResult<Option<JournalEntry>> {
        Ok(self.read()?.journal_entries.get(&id).cloned())
    }

    fn find_journal_entry_by_doc_num(&self, doc_num: &str) -> StoreResult<Option<JournalEntry>> {
        Ok(first(&self.read()?.journal_entries, |r| r.doc_num == doc_num))
    }

    fn list_journal_entries(&self) -> StoreResult<Vec<JournalEntry>> {
        let mut rows = select(&self.read()?.journal_entries, |_| true);
        rows.sort_by(|a, b| {
            a.posting_date
                .cmp(&b.posting_date)
                .then_with(|| a.doc_num.cmp(&b.doc_num))
        });
        Ok(rows)
    }

    fn journal_doc_nums(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let t = self.read()?;
        Ok(with_prefix(t.journal_entries.values().map(|r| &r.doc_num), prefix))
    }

    fn insert_journal_line(&self, value: &JournalEntryLine) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.journal_entries.contains_key(&value.journal_entry_id) {
            return Err(StoreError::Conflict(format!(
                "journal entry {} does not exist",
                value.journal_entry_id
            )));
        }
        insert_row(&mut t.journal_lines, value.id, value, "journal line")
    }

    fn update_journal_line(&self, value: &JournalEntryLine) -> StoreResult<()> {
        update_row(&mut self.write()?.journal_lines, value.id, value, "journal line")
    }

    fn delete_journal_line(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.write()?.journal_lines.remove(&id).is_some())
    }

    fn get_journal_line(&self, id: Uuid) -> StoreResult<Option<JournalEntryLine>> {
        Ok(self.read()?.journal_lines.get(&id).cloned())
    }

    fn lines_for_entry(&self, journal_entry_id: Uuid) -> StoreResult<Vec<JournalEntryLine>> {
        let mut rows = select(&self.read()?.journal_lines, |r| {
            r.journal_entry_id == journal_entry_id
        });
        rows.sort_by_key(|r| (r.line_number, r.created_at));
        Ok(rows)
    }

    fn ledger_for_entry(&self, journal_entry_id: Uuid) -> StoreResult<Vec<LedgerEntry>> {
        let mut rows = select(&self.read()?.ledger, |r| r.journal_entry_id == journal_entry_id);
        rows.sort_by_key(|r| r.line_number);
        Ok(rows)
    }

    fn replace_ledger_for_entry(
        &self,
        journal_entry_id: Uuid,
        rows: &[LedgerEntry],
    ) -> StoreResult<()> {
        let mut t = self.write()?;
        t.ledger.retain(|_, r| r.journal_entry_id != journal_entry_id);
        for row in rows {
            insert_row(&mut t.ledger, row.id, row, "ledger entry")?;
        }
        Ok(())
    }

    fn delete_ledger_for_entry(&self, journal_entry_id: Uuid) -> StoreResult<u64> {
        let mut t = self.write()?;
        let before = t.ledger.len();
        t.ledger.retain(|_, r| r.journal_entry_id != journal_entry_id);
        Ok((before - t.ledger.len()) as u64)
    }

    fn query_ledger(&self, filter: &LedgerFilter) -> StoreResult<Vec<LedgerEntry>> {
        let t = self.read()?;
        let mut rows: Vec<LedgerEntry> = t
            .ledger
            .values()
            .filter(|row| filter.matches_row(row))
            .filter(|row| {
                filter.matches_search(
                    t.accounts.get(&row.account_id),
                    t.journal_entries
                        .get(&row.journal_entry_id)
                        .map(|e| e.doc_num.as_str()),
                )
            })
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.posting_date, r.created_at, r.line_number, r.id));
        Ok(rows)
    }

    fn ledger_totals(&self, filter: &LedgerFilter) -> StoreResult<Vec<AccountTotals>> {
        let mut sums: BTreeMap<Uuid, (Decimal, Decimal)> = BTreeMap::new();
        for row in self.query_ledger(filter)? {
            let entry = sums.entry(row.account_id).or_default();
            entry.0 += row.debit_amount;
            entry.1 += row.credit_amount;
        }
        Ok(sums
            .into_iter()
            .map(|(account_id, (debit, credit))| AccountTotals {
                account_id,
                debit,
                credit,
            })
            .collect())
    }
}

impl PartnerStore for MemoryStore {
    fn insert_partner(&self, value: &BusinessPartner) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.partners, value.id, "business partner code", |r| r.code == value.code)?;
        insert_row(&mut t.partners, value.id, value, "business partner")
    }

    fn update_partner(&self, value: &BusinessPartner) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.partners, value.id, "business partner code", |r| r.code == value.code)?;
        update_row(&mut t.partners, value.id, value, "business partner")
    }

    fn get_partner(&self, id: Uuid) -> StoreResult<Option<BusinessPartner>> {
        Ok(self.read()?.partners.get(&id).cloned())
    }

    fn find_partner_by_code(&self, code: &str) -> StoreResult<Option<BusinessPartner>> {
        Ok(first(&self.read()?.partners, |r| r.code == code))
    }

    fn list_partners(&self) -> StoreResult<Vec<BusinessPartner>> {
        let mut rows = select(&self.read()?.partners, |_| true);
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }
}

impl SalesStore for MemoryStore {
    fn insert_sales_order(&self, value: &SalesOrder) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.sales_orders, value.id, "sales order number", |r| {
            r.document_no == value.document_no
        })?;
        insert_row(&mut t.sales_orders, value.id, value, "sales order")
    }

    fn update_sales_order(&self, value: &SalesOrder) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.sales_orders, value.id, "sales order number", |r| {
            r.document_no == value.document_no
        })?;
        update_row(&mut t.sales_orders, value.id, value, "sales order")
    }

    fn save_payment_summary(&self, order_id: Uuid, summary: &PaymentSummary) -> StoreResult<()> {
        let mut t = self.write()?;
        match t.sales_orders.get_mut(&order_id) {
            Some(order) => {
                order.apply_payment_summary(summary);
                Ok(())
            }
            None => Err(StoreError::QueryError(format!(
                "sales order {order_id} does not exist"
            ))),
        }
    }

    fn get_sales_order(&self, id: Uuid) -> StoreResult<Option<SalesOrder>> {
        Ok(self.read()?.sales_orders.get(&id).cloned())
    }

    fn find_sales_order_by_document_no(
        &self,
        document_no: &str,
    ) -> StoreResult<Option<SalesOrder>> {
        Ok(first(&self.read()?.sales_orders, |r| r.document_no == document_no))
    }

    fn list_sales_orders(&self) -> StoreResult<Vec<SalesOrder>> {
        let mut rows = select(&self.read()?.sales_orders, |_| true);
        rows.sort_by(|a, b| {
            b.document_date
                .cmp(&a.document_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(rows)
    }

    fn sales_order_numbers(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let t = self.read()?;
        Ok(with_prefix(t.sales_orders.values().map(|r| &r.document_no), prefix))
    }

    fn insert_order_line(&self, value: &SalesOrderLine) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.sales_orders.contains_key(&value.order_id) {
            return Err(StoreError::Conflict(format!(
                "sales order {} does not exist",
                value.order_id
            )));
        }
        insert_row(&mut t.order_lines, value.id, value, "sales order line")
    }

    fn update_order_line(&self, value: &SalesOrderLine) -> StoreResult<()> {
        update_row(&mut self.write()?.order_lines, value.id, value, "sales order line")
    }

    fn delete_order_line(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.write()?.order_lines.remove(&id).is_some())
    }

    fn get_order_line(&self, id: Uuid) -> StoreResult<Option<SalesOrderLine>> {
        Ok(self.read()?.order_lines.get(&id).cloned())
    }

    fn lines_for_order(&self, order_id: Uuid) -> StoreResult<Vec<SalesOrderLine>> {
        let mut rows = select(&self.read()?.order_lines, |r| r.order_id == order_id);
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }
}

impl BankingStore for MemoryStore {
    fn insert_payment_method(&self, value: &PaymentMethod) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.payment_methods, value.id, "payment method name", |r| {
            r.name == value.name
        })?;
        insert_row(&mut t.payment_methods, value.id, value, "payment method")
    }

    fn get_payment_method(&self, id: Uuid) -> StoreResult<Option<PaymentMethod>> {
        Ok(self.read()?.payment_methods.get(&id).cloned())
    }

    fn find_payment_method_by_name(&self, name: &str) -> StoreResult<Option<PaymentMethod>> {
        Ok(first(&self.read()?.payment_methods, |r| r.name == name))
    }

    fn list_payment_methods(&self) -> StoreResult<Vec<PaymentMethod>> {
        let mut rows = select(&self.read()?.payment_methods, |_| true);
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn insert_payment(&self, value: &Payment) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.payments, value.id, "payment doc_num", |r| r.doc_num == value.doc_num)?;
        insert_row(&mut t.payments, value.id, value, "payment")
    }

    fn update_payment(&self, value: &Payment) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.payments, value.id, "payment doc_num", |r| r.doc_num == value.doc_num)?;
        update_row(&mut t.payments, value.id, value, "payment")
    }

    fn delete_payment(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.write()?;
        t.payment_lines.retain(|_, r| r.payment_id != id);
        Ok(t.payments.remove(&id).is_some())
    }

    fn get_payment(&self, id: Uuid) -> StoreResult<Option<Payment>> {
        Ok(self.read()?.payments.get(&id).cloned())
    }

    fn find_payment_by_doc_num(&self, doc_num: &str) -> StoreResult<Option<Payment>> {
        Ok(first(&self.read()?.payments, |r| r.doc_num == doc_num))
    }

    fn list_payments(&self) -> StoreResult<Vec<Payment>> {
        let mut rows = select(&self.read()?.payments, |_| true);
        rows.sort_by(|a, b| {
            a.payment_date
                .cmp(&b.payment_date)
                .then_with(|| a.doc_num.cmp(&b.doc_num))
        });
        Ok(rows)
    }

    fn payments_for_order(&self, order_id: Uuid) -> StoreResult<Vec<Payment>> {
        let mut rows = select(&self.read()?.payments, |r| r.sales_order_id == Some(order_id));
        rows.sort_by(|a, b| {
            a.payment_date
                .cmp(&b.payment_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(rows)
    }

    fn payment_doc_nums(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let t = self.read()?;
        Ok(with_prefix(t.payments.values().map(|r| &r.doc_num), prefix))
    }

    fn insert_payment_line(&self, value: &PaymentLine) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.payments.contains_key(&value.payment_id) {
            return Err(StoreError::Conflict(format!(
                "payment {} does not exist",
                value.payment_id
            )));
        }
        insert_row(&mut t.payment_lines, value.id, value, "payment line")
    }

    fn delete_payment_line(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.write()?.payment_lines.remove(&id).is_some())
    }

    fn lines_for_payment(&self, payment_id: Uuid) -> StoreResult<Vec<PaymentLine>> {
        let mut rows = select(&self.read()?.payment_lines, |r| r.payment_id == payment_id);
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }
}

impl HrmStore for MemoryStore {
    fn insert_employee(&self, value: &Employee) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.employees, value.id, "employee code", |r| {
            r.employee_code == value.employee_code
        })?;
        insert_row(&mut t.employees, value.id, value, "employee")
    }

    fn update_employee(&self, value: &Employee) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.employees, value.id, "employee code", |r| {
            r.employee_code == value.employee_code
        })?;
        update_row(&mut t.employees, value.id, value, "employee")
    }

    fn get_employee(&self, id: Uuid) -> StoreResult<Option<Employee>> {
        Ok(self.read()?.employees.get(&id).cloned())
    }

    fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let mut rows = select(&self.read()?.employees, |_| true);
        rows.sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
        Ok(rows)
    }

    fn insert_salary_component(&self, value: &SalaryComponent) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.salary_components, value.id, "salary component code", |r| {
            r.code == value.code
        })?;
        insert_row(&mut t.salary_components, value.id, value, "salary component")
    }

    fn get_salary_component(&self, id: Uuid) -> StoreResult<Option<SalaryComponent>> {
        Ok(self.read()?.salary_components.get(&id).cloned())
    }

    fn list_salary_components(&self) -> StoreResult<Vec<SalaryComponent>> {
        let mut rows = select(&self.read()?.salary_components, |_| true);
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    fn insert_salary_structure(&self, value: &SalaryStructure) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.salary_structures, value.id, "salary structure for employee", |r| {
            r.employee_id == value.employee_id
        })?;
        insert_row(&mut t.salary_structures, value.id, value, "salary structure")
    }

    fn update_salary_structure(&self, value: &SalaryStructure) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.salary_structures, value.id, "salary structure for employee", |r| {
            r.employee_id == value.employee_id
        })?;
        update_row(&mut t.salary_structures, value.id, value, "salary structure")
    }

    fn get_salary_structure(&self, id: Uuid) -> StoreResult<Option<SalaryStructure>> {
        Ok(self.read()?.salary_structures.get(&id).cloned())
    }

    fn find_structure_for_employee(
        &self,
        employee_id: Uuid,
    ) -> StoreResult<Option<SalaryStructure>> {
        Ok(first(&self.read()?.salary_structures, |r| r.employee_id == employee_id))
    }

    fn insert_structure_component(&self, value: &StructureComponent) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.structure_components, value.id, "component in structure", |r| {
            r.structure_id == value.structure_id && r.component_id == value.component_id
        })?;
        insert_row(&mut t.structure_components, value.id, value, "structure component")
    }

    fn update_structure_component(&self, value: &StructureComponent) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.structure_components, value.id, "component in structure", |r| {
            r.structure_id == value.structure_id && r.component_id == value.component_id
        })?;
        update_row(&mut t.structure_components, value.id, value, "structure component")
    }

    fn delete_structure_component(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.write()?.structure_components.remove(&id).is_some())
    }

    fn get_structure_component(&self, id: Uuid) -> StoreResult<Option<StructureComponent>> {
        Ok(self.read()?.structure_components.get(&id).cloned())
    }

    fn components_for_structure(
        &self,
        structure_id: Uuid,
    ) -> StoreResult<Vec<StructureComponent>> {
        let mut rows = select(&self.read()?.structure_components, |r| {
            r.structure_id == structure_id
        });
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }

    fn insert_leave_type(&self, value: &LeaveType) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.leave_types, value.id, "leave type code", |r| r.code == value.code)?;
        insert_row(&mut t.leave_types, value.id, value, "leave type")
    }

    fn get_leave_type(&self, id: Uuid) -> StoreResult<Option<LeaveType>> {
        Ok(self.read()?.leave_types.get(&id).cloned())
    }

    fn insert_leave_application(&self, value: &LeaveApplication) -> StoreResult<()> {
        insert_row(&mut self.write()?.leave_applications, value.id, value, "leave application")
    }

    fn update_leave_application(&self, value: &LeaveApplication) -> StoreResult<()> {
        update_row(&mut self.write()?.leave_applications, value.id, value, "leave application")
    }

    fn delete_leave_application(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.write()?.leave_applications.remove(&id).is_some())
    }

    fn get_leave_application(&self, id: Uuid) -> StoreResult<Option<LeaveApplication>> {
        Ok(self.read()?.leave_applications.get(&id).cloned())
    }

    fn leave_applications_for_employee(
        &self,
        employee_id: Uuid,
    ) -> StoreResult<Vec<LeaveApplication>> {
        let mut rows = select(&self.read()?.leave_applications, |r| r.employee_id == employee_id);
        rows.sort_by_key(|r| (r.start_date, r.created_at));
        Ok(rows)
    }

    fn find_leave_balance(
        &self,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> StoreResult<Option<LeaveBalance>> {
        Ok(first(&self.read()?.leave_balances, |r| {
            r.employee_id == employee_id && r.leave_type_id == leave_type_id && r.year == year
        }))
    }

    fn insert_leave_balance(&self, value: &LeaveBalance) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.leave_balances, value.id, "leave balance", |r| {
            r.employee_id == value.employee_id
                && r.leave_type_id == value.leave_type_id
                && r.year == value.year
        })?;
        insert_row(&mut t.leave_balances, value.id, value, "leave balance")
    }

    fn update_leave_balance(&self, value: &LeaveBalance) -> StoreResult<()> {
        update_row(&mut self.write()?.leave_balances, value.id, value, "leave balance")
    }

    fn insert_attendance(&self, value: &Attendance) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.attendance, value.id, "attendance for day", |r| {
            r.employee_id == value.employee_id && r.date == value.date
        })?;
        insert_row(&mut t.attendance, value.id, value, "attendance")
    }

    fn update_attendance(&self, value: &Attendance) -> StoreResult<()> {
        update_row(&mut self.write()?.attendance, value.id, value, "attendance")
    }

    fn attendance_between(
        &self,
        employee_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Attendance>> {
        let mut rows = select(&self.read()?.attendance, |r| {
            r.employee_id == employee_id && r.date >= from && r.date <= to
        });
        rows.sort_by_key(|r| r.date);
        Ok(rows)
    }

    fn insert_salary_month(&self, value: &SalaryMonth) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.salary_months, value.id, "salary month", |r| {
            r.year == value.year && r.month == value.month
        })?;
        insert_row(&mut t.salary_months, value.id, value, "salary month")
    }

    fn update_salary_month(&self, value: &SalaryMonth) -> StoreResult<()> {
        update_row(&mut self.write()?.salary_months, value.id, value, "salary month")
    }

    fn find_salary_month(&self, year: i32, month: i32) -> StoreResult<Option<SalaryMonth>> {
        Ok(first(&self.read()?.salary_months, |r| r.year == year && r.month == month))
    }

    fn insert_employee_salary(&self, value: &EmployeeSalary) -> StoreResult<()> {
        let mut t = self.write()?;
        ensure_unique(&t.employee_salaries, value.id, "salary for employee and month", |r| {
            r.salary_month_id == value.salary_month_id && r.employee_id == value.employee_id
        })?;
        insert_row(&mut t.employee_salaries, value.id, value, "employee salary")
    }

    fn salaries_for_month(&self, salary_month_id: Uuid) -> StoreResult<Vec<EmployeeSalary>> {
        let mut rows = select(&self.read()?.employee_salaries, |r| {
            r.salary_month_id == salary_month_id
        });
        rows.sort_by_key(|r| (r.created_at, r.employee_id));
        Ok(rows)
    }

    fn delete_salaries_for_month(&self, salary_month_id: Uuid) -> StoreResult<u64> {
        let mut t = self.write()?;
        let doomed: Vec<Uuid> = t
            .employee_salaries
            .values()
            .filter(|r| r.salary_month_id == salary_month_id)
            .map(|r| r.id)
            .collect();
        t.salary_details
            .retain(|_, r| !doomed.contains(&r.employee_salary_id));
        for id in &doomed {
            t.employee_salaries.remove(id);
        }
        Ok(doomed.len() as u64)
    }

    fn insert_salary_detail(&self, value: &SalaryDetail) -> StoreResult<()> {
        insert_row(&mut self.write()?.salary_details, value.id, value, "salary detail")
    }

    fn details_for_salary(&self, employee_salary_id: Uuid) -> StoreResult<Vec<SalaryDetail>> {
        let mut rows = select(&self.read()?.salary_details, |r| {
            r.employee_salary_id == employee_salary_id
        });
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }
}

impl DeviceStore for MemoryStore {
    fn insert_device(&self, value: &ZkDevice) -> StoreResult<()> {
        insert_row(&mut self.write()?.devices, value.id, value, "device")
    }

    fn update_device(&self, value: &ZkDevice) -> StoreResult<()> {
        update_row(&mut self.write()?.devices, value.id, value, "device")
    }

    fn get_device(&self, id: Uuid) -> StoreResult<Option<ZkDevice>> {
        Ok(self.read()?.devices.get(&id).cloned())
    }

    fn list_devices(&self) -> StoreResult<Vec<ZkDevice>> {
        let mut rows = select(&self.read()?.devices, |_| true);
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn attendance_log_exists(
        &self,
        device_id: Uuid,
        user_id: &str,
        timestamp: NaiveDateTime,
        punch_type: Option<&str>,
    ) -> StoreResult<bool> {
        Ok(self.read()?.attendance_logs.values().any(|r| {
            r.device_id == device_id
                && r.user_id == user_id
                && r.timestamp == timestamp
                && r.punch_type.as_deref() == punch_type
        }))
    }

    fn insert_attendance_log(&self, value: &ZkAttendanceLog) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.devices.contains_key(&value.device_id) {
            return Err(StoreError::Conflict(format!(
                "device {} does not exist",
                value.device_id
            )));
        }
        insert_row(&mut t.attendance_logs, value.id, value, "attendance log")
    }

    fn attendance_logs(&self, device_id: Option<Uuid>) -> StoreResult<Vec<ZkAttendanceLog>> {
        let mut rows = select(&self.read()?.attendance_logs, |r| {
            device_id.map_or(true, |id| r.device_id == id)
        });
        rows.sort_by_key(|r| (r.timestamp, r.id));
        Ok(rows)
    }
}

impl Store for MemoryStore {
    fn atomic<R, F>(&self, f: F) -> Result<R, ErpError>
    where
        F: FnOnce(&Self) -> Result<R, ErpError>,
    {
        let snapshot = self.read()?.clone();
        let result = f(self);
        if result.is_err() {
            *self.write()? = snapshot;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::model::AccountCategory;
    use crate::store::timestamp;

    fn account_type(code: &str) -> AccountType {
        let now = timestamp();
        AccountType {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: "Assets".to_string(),
            is_debit: true,
            category: AccountCategory::Asset,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_unique_code_enforced() {
        let store = MemoryStore::new();
        store.insert_account_type(&account_type("AST")).unwrap();
        let err = store.insert_account_type(&account_type("AST")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_atomic_restores_on_error() {
        let store = MemoryStore::new();
        let result: Result<(), ErpError> = store.atomic(|s| {
            s.insert_account_type(&account_type("AST"))?;
            Err(ErpError::invalid("code", "forced failure"))
        });
        assert!(result.is_err());
        assert!(store.list_account_types().unwrap().is_empty());
    }

    #[test]
    fn test_nested_atomic_keeps_outer_writes() {
        let store = MemoryStore::new();
        let outcome: Result<(), ErpError> = store.atomic(|s| {
            s.insert_account_type(&account_type("AST"))?;
            let inner: Result<(), ErpError> = s.atomic(|s| {
                s.insert_account_type(&account_type("LIA"))?;
                Err(ErpError::invalid("code", "inner failure"))
            });
            assert!(inner.is_err());
            Ok(())
        });
        assert!(outcome.is_ok());
        let codes: Vec<String> = store
            .list_account_types()
            .unwrap()
            .into_iter()
            .map(|t| t.code)
            .collect();
        assert_eq!(codes, vec!["AST".to_string()]);
    }

    #[test]
    fn test_update_missing_row_fails() {
        let store = MemoryStore::new();
        assert!(store.update_leave_balance(&LeaveBalance {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            leave_type_id: Uuid::new_v4(),
            year: 2024,
            total_days: Decimal::TEN,
            used_days: Decimal::ZERO,
            pending_days: Decimal::ZERO,
            carried_forward_days: Decimal::ZERO,
            created_at: timestamp(),
            updated_at: timestamp(),
        })
        .is_err());
    }
}
