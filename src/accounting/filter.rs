//! Typed general ledger query.
//!
//! Every field is optional and narrows the result; the PostgreSQL store turns the
//! filter into a parameterized `WHERE` clause, the memory store evaluates
//! [`LedgerFilter::matches_row`] and [`LedgerFilter::matches_search`].

use super::model::{Account, LedgerEntry};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub account_id: Option<Uuid>,
    pub journal_entry_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
    /// Inclusive
    pub date_from: Option<NaiveDate>,
    /// Inclusive
    pub date_to: Option<NaiveDate>,
    /// Case-insensitive match on account code, account name or journal doc_num
    pub search: Option<String>,
}

impl LedgerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn journal_entry(mut self, journal_entry_id: Uuid) -> Self {
        self.journal_entry_id = Some(journal_entry_id);
        self
    }

    pub fn cost_center(mut self, cost_center_id: Uuid) -> Self {
        self.cost_center_id = Some(cost_center_id);
        self
    }

    pub fn from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Lower-cased search term, `None` when absent or blank
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Checks every field except `search`.
    pub fn matches_row(&self, row: &LedgerEntry) -> bool {
        self.account_id.map_or(true, |id| row.account_id == id)
            && self
                .journal_entry_id
                .map_or(true, |id| row.journal_entry_id == id)
            && self
                .cost_center_id
                .map_or(true, |id| row.cost_center_id == Some(id))
            && self.date_from.map_or(true, |d| row.posting_date >= d)
            && self.date_to.map_or(true, |d| row.posting_date <= d)
    }

    pub fn matches_search(&self, account: Option<&Account>, doc_num: Option<&str>) -> bool {
        let Some(term) = self.search_term() else {
            return true;
        };
        let hit = |value: &str| value.to_lowercase().contains(&term);
        account.map_or(false, |a| hit(&a.code) || hit(&a.name)) || doc_num.map_or(false, hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn row(date: NaiveDate) -> LedgerEntry {
        let now = chrono::Utc::now().naive_utc();
        LedgerEntry {
            id: Uuid::new_v4(),
            journal_entry_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            line_number: 1,
            posting_date: date,
            debit_amount: Decimal::ONE,
            credit_amount: Decimal::ZERO,
            balance: Decimal::ONE,
            currency: "USD".into(),
            cost_center_id: None,
            posting_version: 1,
            created_at: now,
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let r = row(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(LedgerFilter::new().matches_row(&r));
        assert!(LedgerFilter::new().matches_search(None, None));
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let r = row(day);
        assert!(LedgerFilter::new().from(day).to(day).matches_row(&r));
        assert!(!LedgerFilter::new()
            .from(day.succ_opt().unwrap())
            .matches_row(&r));
    }

    #[test]
    fn test_cost_center_requires_tag() {
        let r = row(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(!LedgerFilter::new().cost_center(Uuid::new_v4()).matches_row(&r));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let filter = LedgerFilter::new().search("  CASH ");
        assert_eq!(filter.search_term().as_deref(), Some("cash"));
        assert!(filter.matches_search(None, Some("je-cash-01")));
        assert!(!filter.matches_search(None, Some("JE-000001")));
        assert!(LedgerFilter::new().search("   ").search_term().is_none());
    }
}
