//! CSV exports with fixed column sets.
//!
//! Each function writes a header row and returns the number of data rows written.

use crate::accounting::filter::LedgerFilter;
use crate::accounting::reports::{general_ledger, TrialBalance};
use crate::error::{ErpError, ErpResult};
use crate::store::Store;
use chrono::{NaiveDate, NaiveDateTime};
use csv::WriterBuilder;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

fn datetime(d: NaiveDateTime) -> String {
    d.format(DATETIME_FORMAT).to_string()
}

fn write_rows<W, R>(writer: W, rows: impl IntoIterator<Item = R>) -> ErpResult<usize>
where
    W: Write,
    R: Serialize,
{
    let mut wrt = WriterBuilder::new().from_writer(writer);
    let mut count = 0;
    for row in rows {
        wrt.serialize(row)?;
        count += 1;
    }
    wrt.flush().map_err(|e| ErpError::Export(e.to_string()))?;
    Ok(count)
}

#[derive(Serialize)]
struct PaymentRow {
    doc_num: String,
    business_partner: String,
    payment_type: &'static str,
    amount: Decimal,
    payment_date: String,
    is_reconciled: bool,
    created_at: String,
}

/// Every payment, ordered by payment date.
pub fn export_payments<S: Store, W: Write>(store: &S, writer: W) -> ErpResult<usize> {
    let partners: HashMap<_, _> = store
        .list_partners()?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    let rows = store
        .list_payments()?
        .into_iter()
        .map(|p| PaymentRow {
            business_partner: partners
                .get(&p.business_partner_id)
                .cloned()
                .unwrap_or_default(),
            doc_num: p.doc_num,
            payment_type: p.payment_type.as_str(),
            amount: p.amount,
            payment_date: date(p.payment_date),
            is_reconciled: p.is_reconciled,
            created_at: datetime(p.created_at),
        })
        .collect::<Vec<_>>();
    write_rows(writer, rows)
}

#[derive(Serialize)]
struct JournalEntryRow {
    doc_num: String,
    posting_date: String,
    reference: Option<String>,
    currency: String,
    total_debit: Decimal,
    total_credit: Decimal,
    is_posted: bool,
}

pub fn export_journal_entries<S: Store, W: Write>(store: &S, writer: W) -> ErpResult<usize> {
    let rows = store
        .list_journal_entries()?
        .into_iter()
        .map(|je| JournalEntryRow {
            doc_num: je.doc_num,
            posting_date: date(je.posting_date),
            reference: je.reference,
            currency: je.currency,
            total_debit: je.total_debit,
            total_credit: je.total_credit,
            is_posted: je.is_posted,
        })
        .collect::<Vec<_>>();
    write_rows(writer, rows)
}

#[derive(Serialize)]
struct LedgerRow {
    posting_date: String,
    doc_num: String,
    account_code: String,
    account_name: String,
    debit: Decimal,
    credit: Decimal,
    balance: Decimal,
    currency: String,
    cost_center: Option<String>,
}

pub fn export_general_ledger<S: Store, W: Write>(
    store: &S,
    filter: &LedgerFilter,
    writer: W,
) -> ErpResult<usize> {
    let rows = general_ledger(store, filter)?
        .into_iter()
        .map(|row| LedgerRow {
            posting_date: date(row.posting_date),
            doc_num: row.doc_num,
            account_code: row.account_code,
            account_name: row.account_name,
            debit: row.debit,
            credit: row.credit,
            balance: row.balance,
            currency: row.currency,
            cost_center: row.cost_center,
        })
        .collect::<Vec<_>>();
    write_rows(writer, rows)
}

#[derive(Serialize)]
struct TrialBalanceCsvRow<'a> {
    code: &'a str,
    name: &'a str,
    debit: Decimal,
    credit: Decimal,
}

/// Account rows followed by a `TOTAL` row; the totals row is not counted.
pub fn export_trial_balance<W: Write>(
    trial_balance: &TrialBalance,
    writer: W,
) -> ErpResult<usize> {
    let rows = trial_balance
        .rows
        .iter()
        .map(|row| TrialBalanceCsvRow {
            code: &row.code,
            name: &row.name,
            debit: row.debit,
            credit: row.credit,
        })
        .chain(std::iter::once(TrialBalanceCsvRow {
            code: "TOTAL",
            name: "",
            debit: trial_balance.total_debit,
            credit: trial_balance.total_credit,
        }));
    Ok(write_rows(writer, rows)? - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::reports::TrialBalanceRow;
    use uuid::Uuid;

    #[test]
    fn test_trial_balance_csv_has_totals_row() {
        let tb = TrialBalance {
            as_of: None,
            rows: vec![
                TrialBalanceRow {
                    account_id: Uuid::new_v4(),
                    code: "1000".into(),
                    name: "Cash".into(),
                    debit: Decimal::from(500),
                    credit: Decimal::ZERO,
                },
                TrialBalanceRow {
                    account_id: Uuid::new_v4(),
                    code: "4000".into(),
                    name: "Sales, domestic".into(),
                    debit: Decimal::ZERO,
                    credit: Decimal::from(500),
                },
            ],
            total_debit: Decimal::from(500),
            total_credit: Decimal::from(500),
            is_balanced: true,
        };
        let mut out = Vec::new();
        assert_eq!(export_trial_balance(&tb, &mut out).unwrap(), 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "code,name,debit,credit");
        assert_eq!(lines[2], "4000,\"Sales, domestic\",0,500");
        assert_eq!(lines[3], "TOTAL,,500,500");
    }
}
