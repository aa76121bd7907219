use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    /// Report section an account type belongs to
    pub enum AccountCategory {
        Asset => "asset",
        Liability => "liability",
        Equity => "equity",
        Revenue => "revenue",
        Expense => "expense",
        Other => "other",
    }
}

impl AccountCategory {
    /// Classifies an account type by its name, e.g. "Current Assets" or "Operating Expense".
    pub fn infer(type_name: &str) -> Self {
        let name = type_name.to_lowercase();
        if name.contains("asset") {
            AccountCategory::Asset
        } else if name.contains("liabilit") {
            AccountCategory::Liability
        } else if name.contains("equity") || name.contains("capital") {
            AccountCategory::Equity
        } else if name.contains("revenue") || name.contains("income") || name.contains("sales") {
            AccountCategory::Revenue
        } else if name.contains("expense") || name.contains("cost") {
            AccountCategory::Expense
        } else {
            AccountCategory::Other
        }
    }

    /// Debit-normal categories; used as the default nature of new account types.
    pub fn default_is_debit(self) -> bool {
        matches!(self, AccountCategory::Asset | AccountCategory::Expense)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountType {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub is_debit: bool,
    pub category: AccountCategory,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AccountType {
    /// Balance on the account's normal side: positive when the account carries its usual balance.
    pub fn natural_balance(&self, debit: Decimal, credit: Decimal) -> Decimal {
        if self.is_debit {
            debit - credit
        } else {
            credit - debit
        }
    }
}

/// An entry in the chart of accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostCenter {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub doc_num: String,
    pub posting_date: NaiveDate,
    pub reference: Option<String>,
    pub remarks: Option<String>,
    pub currency: String,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub is_posted: bool,
    /// Incremented each time the ledger projection of this entry is rewritten
    pub posting_version: i32,
    pub cost_center_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl JournalEntry {
    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        crate::money::within_tolerance(self.total_debit, self.total_credit, tolerance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntryLine {
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub line_number: i32,
    pub account_id: Uuid,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// One general ledger row, derived from a line of a posted journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub account_id: Uuid,
    pub line_number: i32,
    pub posting_date: NaiveDate,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
    /// `debit_amount - credit_amount` of this row alone
    pub balance: Decimal,
    pub currency: String,
    pub cost_center_id: Option<Uuid>,
    pub posting_version: i32,
    pub created_at: NaiveDateTime,
}

impl LedgerEntry {
    /// Equal in everything the projection derives from the journal entry; ids, versions and
    /// timestamps are ignored.
    pub fn same_content(&self, other: &LedgerEntry) -> bool {
        self.journal_entry_id == other.journal_entry_id
            && self.account_id == other.account_id
            && self.line_number == other.line_number
            && self.posting_date == other.posting_date
            && self.debit_amount == other.debit_amount
            && self.credit_amount == other.credit_amount
            && self.balance == other.balance
            && self.currency == other.currency
            && self.cost_center_id == other.cost_center_id
    }
}

/// Debit and credit sums of one account over a ledger query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTotals {
    pub account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_type(is_debit: bool) -> AccountType {
        let now = chrono::Utc::now().naive_utc();
        AccountType {
            id: Uuid::new_v4(),
            code: "T".into(),
            name: "T".into(),
            is_debit,
            category: AccountCategory::Other,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_infer_category() {
        assert_eq!(AccountCategory::infer("Current Assets"), AccountCategory::Asset);
        assert_eq!(AccountCategory::infer("Long-term Liabilities"), AccountCategory::Liability);
        assert_eq!(AccountCategory::infer("Owner's Equity"), AccountCategory::Equity);
        assert_eq!(AccountCategory::infer("Sales Revenue"), AccountCategory::Revenue);
        assert_eq!(AccountCategory::infer("Other Income"), AccountCategory::Revenue);
        assert_eq!(AccountCategory::infer("Operating Expenses"), AccountCategory::Expense);
        assert_eq!(AccountCategory::infer("Memo"), AccountCategory::Other);
    }

    #[test]
    fn test_natural_balance_polarity() {
        let hundred = Decimal::from(100);
        let forty = Decimal::from(40);
        assert_eq!(account_type(true).natural_balance(hundred, forty), Decimal::from(60));
        assert_eq!(account_type(false).natural_balance(hundred, forty), Decimal::from(-60));
    }

    #[test]
    fn test_category_round_trips_text() {
        for category in AccountCategory::ALL {
            assert_eq!(category.as_str().parse::<AccountCategory>().ok(), Some(*category));
        }
        assert!("assets".parse::<AccountCategory>().is_err());
    }
}
