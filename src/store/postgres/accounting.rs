use super::records::{column, PgRecord};
use super::{escape_like, PgStore};
use crate::accounting::filter::LedgerFilter;
use crate::accounting::model::{
    Account, AccountTotals, AccountType, CostCenter, JournalEntry, JournalEntryLine, LedgerEntry,
};
use crate::banking::model::PaymentLine;
use crate::executor::StoreError;
use crate::store::{AccountingStore, StoreResult};
use sea_query::{Condition, Expr, ExprTrait, Func, Order, PostgresQueryBuilder, Query};
use uuid::Uuid;

/// `WHERE` clause of a ledger query.
pub(super) fn ledger_condition(filter: &LedgerFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(id) = filter.account_id {
        condition = condition.add(Expr::col("account_id").eq(id));
    }
    if let Some(id) = filter.journal_entry_id {
        condition = condition.add(Expr::col("journal_entry_id").eq(id));
    }
    if let Some(id) = filter.cost_center_id {
        condition = condition.add(Expr::col("cost_center_id").eq(id));
    }
    if let Some(date) = filter.date_from {
        condition = condition.add(Expr::col("posting_date").gte(date));
    }
    if let Some(date) = filter.date_to {
        condition = condition.add(Expr::col("posting_date").lte(date));
    }
    if let Some(term) = filter.search_term() {
        let pattern = format!("%{}%", escape_like(&term));
        let accounts = Query::select()
            .column("id")
            .from(Account::TABLE)
            .cond_where(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col("code"))).like(pattern.clone()))
                    .add(Expr::expr(Func::lower(Expr::col("name"))).like(pattern.clone())),
            )
            .to_owned();
        let entries = Query::select()
            .column("id")
            .from(JournalEntry::TABLE)
            .and_where(Expr::expr(Func::lower(Expr::col("doc_num"))).like(pattern))
            .to_owned();
        condition = condition.add(
            Condition::any()
                .add(Expr::col("account_id").in_subquery(accounts))
                .add(Expr::col("journal_entry_id").in_subquery(entries)),
        );
    }
    condition
}

fn by_id(column: &'static str, id: Uuid) -> Condition {
    Condition::all().add(Expr::col(column).eq(id))
}

impl PgStore {
    fn referenced_by(&self, table: &'static str, column: &'static str, id: Uuid) -> StoreResult<bool> {
        self.exists(
            &Query::select()
                .column("id")
                .from(table)
                .and_where(Expr::col(column).eq(id))
                .limit(1)
                .to_owned(),
        )
    }
}

impl AccountingStore for PgStore {
    fn insert_account_type(&self, value: &AccountType) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn get_account_type(&self, id: Uuid) -> StoreResult<Option<AccountType>> {
        self.get_record(id)
    }

    fn list_account_types(&self) -> StoreResult<Vec<AccountType>> {
        self.list_by(Condition::all(), &["code"])
    }

    fn insert_account(&self, value: &Account) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_account(&self, value: &Account) -> StoreResult<()> {
        self.update_record(value)
    }

    fn delete_account(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_record::<Account>(id)
    }

    fn get_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        self.get_record(id)
    }

    fn find_account_by_code(&self, code: &str) -> StoreResult<Option<Account>> {
        self.find_by("code", code)
    }

    fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        self.list_by(Condition::all(), &["code"])
    }

    fn account_in_use(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.referenced_by(JournalEntryLine::TABLE, "account_id", id)?
            || self.referenced_by(LedgerEntry::TABLE, "account_id", id)?
            || self.referenced_by(PaymentLine::TABLE, "account_id", id)?
            || self.referenced_by(Account::TABLE, "parent_id", id)?)
    }

    fn insert_cost_center(&self, value: &CostCenter) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_cost_center(&self, value: &CostCenter) -> StoreResult<()> {
        self.update_record(value)
    }

    fn get_cost_center(&self, id: Uuid) -> StoreResult<Option<CostCenter>> {
        self.get_record(id)
    }

    fn find_cost_center_by_code(&self, code: &str) -> StoreResult<Option<CostCenter>> {
        self.find_by("code", code)
    }

    fn list_cost_centers(&self) -> StoreResult<Vec<CostCenter>> {
        self.list_by(Condition::all(), &["code"])
    }

    fn insert_journal_entry(&self, value: &JournalEntry) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_journal_entry(&self, value: &JournalEntry) -> StoreResult<()> {
        self.update_record(value)
    }

    fn delete_journal_entry(&self, id: Uuid) -> StoreResult<bool> {
        // lines and ledger rows cascade
        self.delete_record::<JournalEntry>(id)
    }

    fn get_journal_entry(&self, id: Uuid) -> StoreResult<Option<JournalEntry>> {
        self.get_record(id)
    }

    fn find_journal_entry_by_doc_num(&self, doc_num: &str) -> StoreResult<Option<JournalEntry>> {
        self.find_by("doc_num", doc_num)
    }

    fn list_journal_entries(&self) -> StoreResult<Vec<JournalEntry>> {
        self.list_by(Condition::all(), &["posting_date", "doc_num"])
    }

    fn journal_doc_nums(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.numbers_with_prefix(JournalEntry::TABLE, "doc_num", prefix)
    }

    fn insert_journal_line(&self, value: &JournalEntryLine) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_journal_line(&self, value: &JournalEntryLine) -> StoreResult<()> {
        self.update_record(value)
    }

    fn delete_journal_line(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_record::<JournalEntryLine>(id)
    }

    fn get_journal_line(&self, id: Uuid) -> StoreResult<Option<JournalEntryLine>> {
        self.get_record(id)
    }

    fn lines_for_entry(&self, journal_entry_id: Uuid) -> StoreResult<Vec<JournalEntryLine>> {
        self.list_by(
            by_id("journal_entry_id", journal_entry_id),
            &["line_number", "created_at"],
        )
    }

    fn ledger_for_entry(&self, journal_entry_id: Uuid) -> StoreResult<Vec<LedgerEntry>> {
        self.list_by(by_id("journal_entry_id", journal_entry_id), &["line_number"])
    }

    fn replace_ledger_for_entry(
        &self,
        journal_entry_id: Uuid,
        rows: &[LedgerEntry],
    ) -> StoreResult<()> {
        self.delete_ledger_for_entry(journal_entry_id)?;
        if rows.is_empty() {
            return Ok(());
        }
        let mut query = Query::insert();
        query
            .into_table(LedgerEntry::TABLE)
            .columns(LedgerEntry::COLUMNS.iter().copied());
        for row in rows {
            query
                .values(row.values().into_iter().map(Expr::from))
                .map_err(|e| StoreError::QueryError(format!("insert ledger rows: {e}")))?;
        }
        let (sql, values) = query.build(PostgresQueryBuilder);
        self.execute_statement(&sql, &values).map(|_| ())
    }

    fn delete_ledger_for_entry(&self, journal_entry_id: Uuid) -> StoreResult<u64> {
        self.delete_where(LedgerEntry::TABLE, by_id("journal_entry_id", journal_entry_id))
    }

    fn query_ledger(&self, filter: &LedgerFilter) -> StoreResult<Vec<LedgerEntry>> {
        self.list_by(
            ledger_condition(filter),
            &["posting_date", "created_at", "line_number", "id"],
        )
    }

    fn ledger_totals(&self, filter: &LedgerFilter) -> StoreResult<Vec<AccountTotals>> {
        let query = Query::select()
            .column("account_id")
            .expr_as(Func::sum(Expr::col("debit_amount")), "debit")
            .expr_as(Func::sum(Expr::col("credit_amount")), "credit")
            .from(LedgerEntry::TABLE)
            .cond_where(ledger_condition(filter))
            .group_by_col("account_id")
            .order_by("account_id", Order::Asc)
            .to_owned();
        self.rows(&query)?
            .iter()
            .map(|row| {
                Ok(AccountTotals {
                    account_id: column(row, "account_id")?,
                    debit: column(row, "debit")?,
                    credit: column(row, "credit")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sql(filter: &LedgerFilter) -> (String, usize) {
        let (sql, values) = Query::select()
            .column("id")
            .from(LedgerEntry::TABLE)
            .cond_where(ledger_condition(filter))
            .build(PostgresQueryBuilder);
        (sql, values.iter().count())
    }

    #[test]
    fn test_empty_filter_has_no_where() {
        let (sql, params) = sql(&LedgerFilter::new());
        assert!(!sql.contains("WHERE"));
        assert_eq!(params, 0);
    }

    #[test]
    fn test_each_field_binds_one_parameter() {
        let filter = LedgerFilter::new()
            .account(Uuid::new_v4())
            .cost_center(Uuid::new_v4())
            .from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .to(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        let (sql, params) = sql(&filter);
        assert!(sql.contains("\"posting_date\" >= $3"));
        assert_eq!(params, 4);
    }

    #[test]
    fn test_search_uses_subqueries() {
        let (sql, params) = sql(&LedgerFilter::new().search("  Cash "));
        assert!(sql.contains("LOWER(\"code\") LIKE"));
        assert!(sql.contains("IN (SELECT \"id\" FROM \"journal_entries\""));
        assert_eq!(params, 3);
    }
}
