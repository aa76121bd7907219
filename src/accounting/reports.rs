//! Financial reports recomputed from general ledger rows.
//!
//! Nothing here is persisted. Every figure is a sum over [`LedgerEntry`] rows, put on the
//! natural side of the account through [`AccountType::natural_balance`].

use super::filter::LedgerFilter;
use super::model::{Account, AccountCategory, AccountType, LedgerEntry};
use crate::error::{ErpError, ErpResult};
use crate::money::within_tolerance;
use crate::store::Store;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// One account with its debit and credit sums over a report window
struct AccountActivity {
    account: Account,
    account_type: AccountType,
    debit: Decimal,
    credit: Decimal,
}

impl AccountActivity {
    fn natural(&self) -> Decimal {
        self.account_type.natural_balance(self.debit, self.credit)
    }
}

/// Every account in code order, with zero sums where the window has no rows.
fn account_activity<S: Store>(store: &S, filter: &LedgerFilter) -> ErpResult<Vec<AccountActivity>> {
    let types: HashMap<Uuid, AccountType> = store
        .list_account_types()?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
    let totals: HashMap<Uuid, (Decimal, Decimal)> = store
        .ledger_totals(filter)?
        .into_iter()
        .map(|t| (t.account_id, (t.debit, t.credit)))
        .collect();

    store
        .list_accounts()?
        .into_iter()
        .map(|account| {
            let account_type = types
                .get(&account.account_type_id)
                .cloned()
                .ok_or_else(|| ErpError::not_found("account type", account.account_type_id))?;
            let (debit, credit) = totals.get(&account.id).copied().unwrap_or_default();
            Ok(AccountActivity {
                account,
                account_type,
                debit,
                credit,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialBalanceRow {
    pub account_id: Uuid,
    pub code: String,
    pub name: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialBalance {
    pub as_of: Option<NaiveDate>,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub is_balanced: bool,
}

/// Places a natural balance on the trial balance columns: a non-negative balance on the
/// account's own side, a negative one as its absolute value on the other side.
pub fn trial_balance_columns(is_debit: bool, natural: Decimal) -> (Decimal, Decimal) {
    let own_side = !natural.is_sign_negative() || natural.is_zero();
    match (is_debit, own_side) {
        (true, true) => (natural, Decimal::ZERO),
        (true, false) => (Decimal::ZERO, natural.abs()),
        (false, true) => (Decimal::ZERO, natural),
        (false, false) => (natural.abs(), Decimal::ZERO),
    }
}

pub fn trial_balance<S: Store>(
    store: &S,
    as_of: Option<NaiveDate>,
    tolerance: Decimal,
) -> ErpResult<TrialBalance> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::report_span("trial_balance").entered();

    let mut filter = LedgerFilter::new();
    filter.date_to = as_of;

    let rows: Vec<TrialBalanceRow> = account_activity(store, &filter)?
        .into_iter()
        .map(|activity| {
            let (debit, credit) =
                trial_balance_columns(activity.account_type.is_debit, activity.natural());
            TrialBalanceRow {
                account_id: activity.account.id,
                code: activity.account.code,
                name: activity.account.name,
                debit,
                credit,
            }
        })
        .collect();

    let total_debit: Decimal = rows.iter().map(|r| r.debit).sum();
    let total_credit: Decimal = rows.iter().map(|r| r.credit).sum();
    Ok(TrialBalance {
        as_of,
        is_balanced: within_tolerance(total_debit, total_credit, tolerance),
        rows,
        total_debit,
        total_credit,
    })
}

/// An account and its natural balance within a report section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub account_id: Uuid,
    pub code: String,
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitAndLoss {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub revenue: Vec<ReportLine>,
    pub expenses: Vec<ReportLine>,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub net_profit: Decimal,
}

/// Non-zero natural balances of the accounts in `category`, and their sum.
fn section(activity: &[AccountActivity], category: AccountCategory) -> (Vec<ReportLine>, Decimal) {
    let lines: Vec<ReportLine> = activity
        .iter()
        .filter(|a| a.account_type.category == category)
        .filter_map(|a| {
            let amount = a.natural();
            (!amount.is_zero()).then(|| ReportLine {
                account_id: a.account.id,
                code: a.account.code.clone(),
                name: a.account.name.clone(),
                amount,
            })
        })
        .collect();
    let total = lines.iter().map(|l| l.amount).sum();
    (lines, total)
}

/// Revenue and expenses posted between `from` and `to`, both inclusive. A reversed range
/// is swapped.
pub fn profit_and_loss<S: Store>(
    store: &S,
    from: NaiveDate,
    to: NaiveDate,
) -> ErpResult<ProfitAndLoss> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::report_span("profit_and_loss").entered();

    let (from, to) = if from > to { (to, from) } else { (from, to) };
    let activity = account_activity(store, &LedgerFilter::new().from(from).to(to))?;
    let (revenue, total_revenue) = section(&activity, AccountCategory::Revenue);
    let (expenses, total_expenses) = section(&activity, AccountCategory::Expense);
    Ok(ProfitAndLoss {
        from,
        to,
        revenue,
        expenses,
        total_revenue,
        total_expenses,
        net_profit: total_revenue - total_expenses,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub assets: Vec<ReportLine>,
    pub liabilities: Vec<ReportLine>,
    pub equity: Vec<ReportLine>,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub total_equity: Decimal,
    pub total_liabilities_and_equity: Decimal,
    /// Revenue minus expenses up to `as_of`, not yet closed into equity
    pub current_earnings: Decimal,
    pub is_balanced: bool,
}

pub fn balance_sheet<S: Store>(
    store: &S,
    as_of: NaiveDate,
    tolerance: Decimal,
) -> ErpResult<BalanceSheet> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::report_span("balance_sheet").entered();

    let activity = account_activity(store, &LedgerFilter::new().to(as_of))?;
    let (assets, total_assets) = section(&activity, AccountCategory::Asset);
    let (liabilities, total_liabilities) = section(&activity, AccountCategory::Liability);
    let (equity, total_equity) = section(&activity, AccountCategory::Equity);
    let (_, revenue) = section(&activity, AccountCategory::Revenue);
    let (_, expenses) = section(&activity, AccountCategory::Expense);
    let current_earnings = revenue - expenses;
    let total_liabilities_and_equity = total_liabilities + total_equity;

    Ok(BalanceSheet {
        as_of,
        is_balanced: within_tolerance(
            total_assets,
            total_liabilities_and_equity + current_earnings,
            tolerance,
        ),
        assets,
        liabilities,
        equity,
        total_assets,
        total_liabilities,
        total_equity,
        total_liabilities_and_equity,
        current_earnings,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountLedgerLine {
    pub entry: LedgerEntry,
    pub doc_num: Option<String>,
    pub running_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountLedger {
    pub account: Account,
    pub lines: Vec<AccountLedgerLine>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub final_balance: Decimal,
}

/// Ledger rows of one account with a running balance on the account's natural side.
pub fn account_ledger<S: Store>(
    store: &S,
    account_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ErpResult<AccountLedger> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::report_span("account_ledger").entered();

    let account = store
        .get_account(account_id)?
        .ok_or_else(|| ErpError::not_found("account", account_id))?;
    let account_type = store
        .get_account_type(account.account_type_id)?
        .ok_or_else(|| ErpError::not_found("account type", account.account_type_id))?;

    let mut filter = LedgerFilter::new().account(account_id);
    filter.date_from = from;
    filter.date_to = to;

    let mut doc_nums: HashMap<Uuid, Option<String>> = HashMap::new();
    let mut running = Decimal::ZERO;
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;
    let mut lines = Vec::new();
    for entry in store.query_ledger(&filter)? {
        running += account_type.natural_balance(entry.debit_amount, entry.credit_amount);
        total_debit += entry.debit_amount;
        total_credit += entry.credit_amount;
        let doc_num = match doc_nums.get(&entry.journal_entry_id) {
            Some(doc_num) => doc_num.clone(),
            None => {
                let doc_num = store
                    .get_journal_entry(entry.journal_entry_id)?
                    .map(|je| je.doc_num);
                doc_nums.insert(entry.journal_entry_id, doc_num.clone());
                doc_num
            }
        };
        lines.push(AccountLedgerLine {
            entry,
            doc_num,
            running_balance: running,
        });
    }

    Ok(AccountLedger {
        account,
        lines,
        total_debit,
        total_credit,
        final_balance: running,
    })
}

/// A ledger row joined with its document, account and cost center codes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralLedgerRow {
    pub posting_date: NaiveDate,
    pub doc_num: String,
    pub account_code: String,
    pub account_name: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub balance: Decimal,
    pub currency: String,
    pub cost_center: Option<String>,
}

pub fn general_ledger<S: Store>(store: &S, filter: &LedgerFilter) -> ErpResult<Vec<GeneralLedgerRow>> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::report_span("general_ledger").entered();

    let accounts: HashMap<Uuid, Account> = store
        .list_accounts()?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();
    let cost_centers: HashMap<Uuid, String> = store
        .list_cost_centers()?
        .into_iter()
        .map(|c| (c.id, c.code))
        .collect();
    let mut doc_nums: HashMap<Uuid, String> = HashMap::new();

    store
        .query_ledger(filter)?
        .into_iter()
        .map(|row| {
            let doc_num = match doc_nums.get(&row.journal_entry_id) {
                Some(doc_num) => doc_num.clone(),
                None => {
                    let doc_num = store
                        .get_journal_entry(row.journal_entry_id)?
                        .map(|je| je.doc_num)
                        .unwrap_or_default();
                    doc_nums.insert(row.journal_entry_id, doc_num.clone());
                    doc_num
                }
            };
            let account = accounts.get(&row.account_id);
            Ok(GeneralLedgerRow {
                posting_date: row.posting_date,
                doc_num,
                account_code: account.map(|a| a.code.clone()).unwrap_or_default(),
                account_name: account.map(|a| a.name.clone()).unwrap_or_default(),
                debit: row.debit_amount,
                credit: row.credit_amount,
                balance: row.balance,
                currency: row.currency,
                cost_center: row
                    .cost_center_id
                    .and_then(|id| cost_centers.get(&id).cloned()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_balance_columns() {
        let d = Decimal::from;
        assert_eq!(trial_balance_columns(true, d(60)), (d(60), d(0)));
        assert_eq!(trial_balance_columns(true, d(-60)), (d(0), d(60)));
        assert_eq!(trial_balance_columns(false, d(60)), (d(0), d(60)));
        assert_eq!(trial_balance_columns(false, d(-60)), (d(60), d(0)));
        assert_eq!(trial_balance_columns(false, d(0)), (d(0), d(0)));
    }
}
