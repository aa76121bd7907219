//! Financial reports computed from posted ledger rows.

mod common;

use common::*;
use ledgerguard::accounting::reports::{
    account_ledger, balance_sheet, general_ledger, profit_and_loss, trial_balance,
};
use ledgerguard::accounting::LedgerFilter;
use ledgerguard::export::{export_general_ledger, export_trial_balance};
use ledgerguard::store::AccountingStore;
use ledgerguard::MemoryStore;
use rust_decimal::Decimal;

fn tolerance() -> Decimal {
    config().balance_tolerance
}

/// Capital paid in, a credit sale partly collected, rent paid, and a draft that never posts.
fn books() -> (MemoryStore, Chart) {
    let store = MemoryStore::new();
    let chart = chart(&store);
    let entries = [
        (date(2024, 1, 5), line(chart.cash, 10_000, 0), line(chart.capital, 0, 10_000), true),
        (date(2024, 1, 10), line(chart.receivable, 3_000, 0), line(chart.sales, 0, 3_000), true),
        (date(2024, 1, 15), line(chart.cash, 2_000, 0), line(chart.receivable, 0, 2_000), true),
        (date(2024, 2, 1), line(chart.rent, 800, 0), line(chart.cash, 0, 800), true),
        (date(2024, 2, 3), line(chart.cash, 999, 0), line(chart.sales, 0, 999), false),
    ];
    for (posting_date, debit, credit, posted) in entries {
        journal(&store, posting_date, vec![debit, credit], posted).unwrap();
    }
    (store, chart)
}

#[test]
fn test_trial_balance_lists_every_account_and_balances() {
    let (store, chart) = books();
    let tb = trial_balance(&store, None, tolerance()).unwrap();

    assert_eq!(tb.rows.len(), 6);
    assert!(tb.is_balanced);
    assert_eq!(tb.total_debit, dec(13_000));
    assert_eq!(tb.total_credit, dec(13_000));

    let row = |id| tb.rows.iter().find(|r| r.account_id == id).unwrap();
    assert_eq!((row(chart.cash).debit, row(chart.cash).credit), (dec(11_200), dec(0)));
    assert_eq!(row(chart.receivable).debit, dec(1_000));
    assert_eq!(row(chart.capital).credit, dec(10_000));
    assert_eq!(row(chart.sales).credit, dec(3_000));
    assert_eq!(row(chart.rent).debit, dec(800));
    assert_eq!((row(chart.payable).debit, row(chart.payable).credit), (dec(0), dec(0)));
}

#[test]
fn test_trial_balance_as_of_cuts_off_later_rows() {
    let (store, chart) = books();
    let tb = trial_balance(&store, Some(date(2024, 1, 31)), tolerance()).unwrap();
    assert!(tb.is_balanced);
    assert_eq!(tb.total_debit, dec(13_000));
    let cash = tb.rows.iter().find(|r| r.account_id == chart.cash).unwrap();
    assert_eq!(cash.debit, dec(12_000));
    let rent = tb.rows.iter().find(|r| r.account_id == chart.rent).unwrap();
    assert_eq!(rent.debit, dec(0));
}

#[test]
fn test_overdrawn_asset_moves_to_credit_column() {
    let store = MemoryStore::new();
    let chart = chart(&store);
    journal(
        &store,
        date(2024, 1, 2),
        vec![line(chart.rent, 500, 0), line(chart.cash, 0, 500)],
        true,
    )
    .unwrap();

    let tb = trial_balance(&store, None, tolerance()).unwrap();
    let cash = tb.rows.iter().find(|r| r.account_id == chart.cash).unwrap();
    assert_eq!((cash.debit, cash.credit), (dec(0), dec(500)));
    assert!(tb.is_balanced);
}

#[test]
fn test_profit_and_loss_for_a_period() {
    let (store, chart) = books();

    let january = profit_and_loss(&store, date(2024, 1, 1), date(2024, 1, 31)).unwrap();
    assert_eq!(january.total_revenue, dec(3_000));
    assert_eq!(january.total_expenses, dec(0));
    assert_eq!(january.net_profit, dec(3_000));
    assert_eq!(january.revenue.len(), 1);
    assert_eq!(january.revenue[0].account_id, chart.sales);
    assert!(january.expenses.is_empty());

    let quarter = profit_and_loss(&store, date(2024, 3, 31), date(2024, 1, 1)).unwrap();
    assert_eq!((quarter.from, quarter.to), (date(2024, 1, 1), date(2024, 3, 31)));
    assert_eq!(quarter.total_expenses, dec(800));
    assert_eq!(quarter.net_profit, dec(2_200));
}

#[test]
fn test_balance_sheet_carries_current_earnings() {
    let (store, _) = books();
    let sheet = balance_sheet(&store, date(2024, 2, 28), tolerance()).unwrap();

    assert_eq!(sheet.total_assets, dec(12_200));
    assert_eq!(sheet.total_liabilities, dec(0));
    assert_eq!(sheet.total_equity, dec(10_000));
    assert_eq!(sheet.current_earnings, dec(2_200));
    assert_eq!(sheet.total_liabilities_and_equity, dec(10_000));
    assert!(sheet.is_balanced);
    assert_eq!(sheet.assets.len(), 2);
    assert!(sheet.liabilities.is_empty());
}

/// Rewrites the credit side of a posted two-line entry so the ledger no longer nets out.
fn skew_credit(store: &MemoryStore, entry_id: uuid::Uuid, credit: Decimal) {
    let mut rows = store.ledger_for_entry(entry_id).unwrap();
    let row = rows.iter_mut().find(|r| !r.credit_amount.is_zero()).unwrap();
    row.credit_amount = credit;
    row.balance = -credit;
    store.replace_ledger_for_entry(entry_id, &rows).unwrap();
}

#[test]
fn test_reports_flag_diverging_totals() {
    let store = MemoryStore::new();
    let chart = chart(&store);
    let saved = journal(
        &store,
        date(2024, 3, 1),
        vec![line(chart.cash, 15_000, 0), line(chart.capital, 0, 15_000)],
        true,
    )
    .unwrap();
    let entry_id = saved.entry.id;
    let month_end = date(2024, 3, 31);

    let tb = trial_balance(&store, None, tolerance()).unwrap();
    assert!(tb.is_balanced);

    skew_credit(&store, entry_id, "14998.00".parse().unwrap());
    let tb = trial_balance(&store, None, tolerance()).unwrap();
    assert_eq!(tb.total_debit, dec(15_000));
    assert_eq!(tb.total_credit, dec(14_998));
    assert!(!tb.is_balanced);
    let sheet = balance_sheet(&store, month_end, tolerance()).unwrap();
    assert_eq!(sheet.total_assets, dec(15_000));
    assert_eq!(sheet.total_liabilities_and_equity, dec(14_998));
    assert!(!sheet.is_balanced);

    // two cents is outside a one cent tolerance
    skew_credit(&store, entry_id, "14999.98".parse().unwrap());
    assert!(!trial_balance(&store, None, tolerance()).unwrap().is_balanced);

    skew_credit(&store, entry_id, "14999.995".parse().unwrap());
    assert!(trial_balance(&store, None, tolerance()).unwrap().is_balanced);

    skew_credit(&store, entry_id, dec(15_000));
    assert!(trial_balance(&store, None, tolerance()).unwrap().is_balanced);
    assert!(balance_sheet(&store, month_end, tolerance()).unwrap().is_balanced);
}

#[test]
fn test_account_ledger_running_balance() {
    let (store, chart) = books();

    let cash = account_ledger(&store, chart.cash, None, None).unwrap();
    let running: Vec<Decimal> = cash.lines.iter().map(|l| l.running_balance).collect();
    assert_eq!(running, vec![dec(10_000), dec(12_000), dec(11_200)]);
    assert_eq!(cash.total_debit, dec(12_000));
    assert_eq!(cash.total_credit, dec(800));
    assert_eq!(cash.final_balance, dec(11_200));
    assert_eq!(cash.lines[0].doc_num.as_deref(), Some("JE-000001"));

    let sales = account_ledger(&store, chart.sales, None, None).unwrap();
    assert_eq!(sales.final_balance, dec(3_000));

    let february = account_ledger(&store, chart.cash, Some(date(2024, 2, 1)), None).unwrap();
    assert_eq!(february.lines.len(), 1);
    assert_eq!(february.final_balance, dec(-800));
}

#[test]
fn test_general_ledger_rows_and_csv() {
    let (store, chart) = books();
    let filter = LedgerFilter::new().account(chart.cash);

    let rows = general_ledger(&store, &filter).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.account_code == "1000"));

    let mut out = Vec::new();
    assert_eq!(export_general_ledger(&store, &filter, &mut out).unwrap(), 3);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with(
        "posting_date,doc_num,account_code,account_name,debit,credit,balance,currency,cost_center"
    ));
    assert!(text.contains("2024-02-01,JE-000004,1000,Cash,0,800,-800,USD,"));
}

#[test]
fn test_trial_balance_csv_matches_report() {
    let (store, _) = books();
    let tb = trial_balance(&store, None, tolerance()).unwrap();
    let mut out = Vec::new();
    assert_eq!(export_trial_balance(&tb, &mut out).unwrap(), tb.rows.len());
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().last(), Some("TOTAL,,13000,13000"));
}
