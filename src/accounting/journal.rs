//! Journal entry authoring.
//!
//! Every function validates and writes inside one `atomic` block, recomputes the entry
//! totals from its lines, and calls [`post_journal_entry`] once the write has committed.

use super::model::{JournalEntry, JournalEntryLine};
use super::posting::{post_journal_entry, PostingOutcome};
use crate::config::LedgerConfig;
use crate::error::{ErpError, ErpResult};
use crate::money::{currency_code, non_negative, round_currency};
use crate::numbering::{next_document_number, JOURNAL_PREFIX, SEQUENCE_WIDTH};
use crate::store::{timestamp, Store};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewJournalLine {
    pub account_id: Uuid,
    #[serde(default)]
    pub debit_amount: Decimal,
    #[serde(default)]
    pub credit_amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewJournalEntry {
    /// Next `JE-NNNNNN` number when absent
    pub doc_num: Option<String>,
    pub posting_date: NaiveDate,
    pub reference: Option<String>,
    pub remarks: Option<String>,
    pub currency: Option<String>,
    pub cost_center_id: Option<Uuid>,
    #[serde(default)]
    pub is_posted: bool,
    #[serde(default)]
    pub lines: Vec<NewJournalLine>,
}

/// Header fields editable after creation
#[derive(Debug, Clone, Deserialize)]
pub struct JournalEntryUpdate {
    pub posting_date: NaiveDate,
    pub reference: Option<String>,
    pub remarks: Option<String>,
    pub currency: String,
    pub cost_center_id: Option<Uuid>,
    pub is_posted: bool,
}

/// A saved entry and what posting did with it
#[derive(Debug, Clone)]
pub struct SavedJournal {
    pub entry: JournalEntry,
    pub lines: Vec<JournalEntryLine>,
    pub posting: PostingOutcome,
}

fn validated_line<S: Store>(store: &S, line: &NewJournalLine) -> ErpResult<(Decimal, Decimal)> {
    let debit = round_currency(non_negative("debit_amount", line.debit_amount)?);
    let credit = round_currency(non_negative("credit_amount", line.credit_amount)?);
    if debit.is_zero() && credit.is_zero() {
        return Err(ErpError::invalid(
            "debit_amount",
            "a line needs a debit or a credit amount",
        ));
    }
    match store.get_account(line.account_id)? {
        Some(account) if account.is_active => Ok((debit, credit)),
        Some(account) => Err(ErpError::invalid(
            "account",
            format!("account {} is inactive", account.code),
        )),
        None => Err(ErpError::invalid(
            "account",
            format!("account {} does not exist", line.account_id),
        )),
    }
}

fn validate_cost_center<S: Store>(store: &S, cost_center_id: Option<Uuid>) -> ErpResult<()> {
    let Some(id) = cost_center_id else {
        return Ok(());
    };
    match store.get_cost_center(id)? {
        Some(cc) if cc.is_active => Ok(()),
        Some(cc) => Err(ErpError::invalid(
            "cost_center",
            format!("cost center {} is inactive", cc.code),
        )),
        None => Err(ErpError::invalid("cost_center", format!("{id} does not exist"))),
    }
}

/// Recomputes the entry totals from `lines` and enforces the posted-entry rules.
fn settle_totals(
    entry: &mut JournalEntry,
    lines: &[JournalEntryLine],
    tolerance: Decimal,
) -> ErpResult<()> {
    entry.total_debit = lines.iter().map(|l| l.debit_amount).sum();
    entry.total_credit = lines.iter().map(|l| l.credit_amount).sum();
    if entry.is_posted {
        if lines.is_empty() {
            return Err(ErpError::invalid("lines", "a posted entry needs at least one line"));
        }
        if !entry.is_balanced(tolerance) {
            return Err(ErpError::invalid(
                "lines",
                format!(
                    "entry is not balanced: debit {} vs credit {}",
                    entry.total_debit, entry.total_credit
                ),
            ));
        }
    }
    Ok(())
}

fn next_line_number(lines: &[JournalEntryLine]) -> i32 {
    lines.iter().map(|l| l.line_number).max().unwrap_or(0) + 1
}

fn build_line(
    entry_id: Uuid,
    line_number: i32,
    input: &NewJournalLine,
    (debit, credit): (Decimal, Decimal),
) -> JournalEntryLine {
    let now = timestamp();
    JournalEntryLine {
        id: Uuid::new_v4(),
        journal_entry_id: entry_id,
        line_number,
        account_id: input.account_id,
        debit_amount: debit,
        credit_amount: credit,
        description: input.description.clone(),
        created_at: now,
        updated_at: now,
    }
}

fn load_entry<S: Store>(store: &S, id: Uuid) -> ErpResult<JournalEntry> {
    store
        .get_journal_entry(id)?
        .ok_or_else(|| ErpError::not_found("journal entry", id))
}

fn finish<S: Store>(store: &S, entry_id: Uuid) -> ErpResult<SavedJournal> {
    let posting = post_journal_entry(store, entry_id)?;
    Ok(SavedJournal {
        entry: load_entry(store, entry_id)?,
        lines: store.lines_for_entry(entry_id)?,
        posting,
    })
}

/// Validates `inputs` into lines numbered from 1 and recomputes the totals of `entry`.
fn write_lines<S: Store>(
    s: &S,
    entry: &mut JournalEntry,
    inputs: &[NewJournalLine],
    tolerance: Decimal,
) -> ErpResult<Vec<JournalEntryLine>> {
    let mut lines = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let amounts = validated_line(s, input)?;
        lines.push(build_line(entry.id, index as i32 + 1, input, amounts));
    }
    settle_totals(entry, &lines, tolerance)?;
    Ok(lines)
}

pub fn create_journal_entry<S: Store>(
    store: &S,
    config: &LedgerConfig,
    input: NewJournalEntry,
) -> ErpResult<SavedJournal> {
    let entry_id = store.atomic(|s| {
        let doc_num = match input.doc_num.as_deref().map(str::trim) {
            Some(doc_num) if !doc_num.is_empty() => {
                if s.find_journal_entry_by_doc_num(doc_num)?.is_some() {
                    return Err(ErpError::invalid(
                        "doc_num",
                        format!("journal entry {doc_num} already exists"),
                    ));
                }
                doc_num.to_string()
            }
            _ => next_document_number(
                JOURNAL_PREFIX,
                s.journal_doc_nums(JOURNAL_PREFIX)?,
                SEQUENCE_WIDTH,
            )?,
        };
        validate_cost_center(s, input.cost_center_id)?;
        let currency = currency_code(
            input
                .currency
                .as_deref()
                .unwrap_or(&config.default_currency),
        )?;

        let now = timestamp();
        let mut entry = JournalEntry {
            id: Uuid::new_v4(),
            doc_num,
            posting_date: input.posting_date,
            reference: input.reference.clone(),
            remarks: input.remarks.clone(),
            currency,
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            is_posted: input.is_posted,
            posting_version: 0,
            cost_center_id: input.cost_center_id,
            created_at: now,
            updated_at: now,
        };
        let lines = write_lines(s, &mut entry, &input.lines, config.balance_tolerance)?;
        s.insert_journal_entry(&entry)?;
        for line in &lines {
            s.insert_journal_line(line)?;
        }
        log::info!(
            "created journal entry {} with {} lines",
            entry.doc_num,
            lines.len()
        );
        Ok(entry.id)
    })?;
    finish(store, entry_id)
}

pub fn update_journal_entry<S: Store>(
    store: &S,
    config: &LedgerConfig,
    id: Uuid,
    update: JournalEntryUpdate,
) -> ErpResult<SavedJournal> {
    store.atomic(|s| {
        let mut entry = load_entry(s, id)?;
        validate_cost_center(s, update.cost_center_id)?;
        let was_posted = entry.is_posted;
        entry.posting_date = update.posting_date;
        entry.reference = update.reference.clone();
        entry.remarks = update.remarks.clone();
        entry.currency = currency_code(&update.currency)?;
        entry.cost_center_id = update.cost_center_id;
        entry.is_posted = update.is_posted;
        entry.updated_at = timestamp();

        let lines = s.lines_for_entry(id)?;
        settle_totals(&mut entry, &lines, config.balance_tolerance)?;
        s.update_journal_entry(&entry)?;
        if was_posted && !entry.is_posted {
            s.delete_ledger_for_entry(id)?;
        }
        Ok(())
    })?;
    finish(store, id)
}

/// Replaces every line of the entry in one step, which is how a posted entry is edited
/// without passing through an unbalanced state.
pub fn replace_lines<S: Store>(
    store: &S,
    config: &LedgerConfig,
    id: Uuid,
    inputs: Vec<NewJournalLine>,
) -> ErpResult<SavedJournal> {
    store.atomic(|s| {
        let mut entry = load_entry(s, id)?;
        let lines = write_lines(s, &mut entry, &inputs, config.balance_tolerance)?;
        for old in s.lines_for_entry(id)? {
            s.delete_journal_line(old.id)?;
        }
        for line in &lines {
            s.insert_journal_line(line)?;
        }
        entry.updated_at = timestamp();
        s.update_journal_entry(&entry)?;
        Ok(())
    })?;
    finish(store, id)
}

pub fn add_line<S: Store>(
    store: &S,
    config: &LedgerConfig,
    entry_id: Uuid,
    input: NewJournalLine,
) -> ErpResult<SavedJournal> {
    store.atomic(|s| {
        let mut entry = load_entry(s, entry_id)?;
        let amounts = validated_line(s, &input)?;
        let mut lines = s.lines_for_entry(entry_id)?;
        let line = build_line(entry_id, next_line_number(&lines), &input, amounts);
        lines.push(line.clone());
        settle_totals(&mut entry, &lines, config.balance_tolerance)?;
        s.insert_journal_line(&line)?;
        entry.updated_at = timestamp();
        s.update_journal_entry(&entry)?;
        Ok(())
    })?;
    finish(store, entry_id)
}

pub fn update_line<S: Store>(
    store: &S,
    config: &LedgerConfig,
    line_id: Uuid,
    input: NewJournalLine,
) -> ErpResult<SavedJournal> {
    let entry_id = store.atomic(|s| {
        let mut line = s
            .get_journal_line(line_id)?
            .ok_or_else(|| ErpError::not_found("journal entry line", line_id))?;
        let mut entry = load_entry(s, line.journal_entry_id)?;
        let (debit, credit) = validated_line(s, &input)?;
        line.account_id = input.account_id;
        line.debit_amount = debit;
        line.credit_amount = credit;
        line.description = input.description.clone();
        line.updated_at = timestamp();

        let lines: Vec<JournalEntryLine> = s
            .lines_for_entry(entry.id)?
            .into_iter()
            .map(|l| if l.id == line.id { line.clone() } else { l })
            .collect();
        settle_totals(&mut entry, &lines, config.balance_tolerance)?;
        s.update_journal_line(&line)?;
        entry.updated_at = timestamp();
        s.update_journal_entry(&entry)?;
        Ok(entry.id)
    })?;
    finish(store, entry_id)
}

pub fn remove_line<S: Store>(
    store: &S,
    config: &LedgerConfig,
    line_id: Uuid,
) -> ErpResult<SavedJournal> {
    let entry_id = store.atomic(|s| {
        let line = s
            .get_journal_line(line_id)?
            .ok_or_else(|| ErpError::not_found("journal entry line", line_id))?;
        let mut entry = load_entry(s, line.journal_entry_id)?;
        let lines: Vec<JournalEntryLine> = s
            .lines_for_entry(entry.id)?
            .into_iter()
            .filter(|l| l.id != line_id)
            .collect();
        settle_totals(&mut entry, &lines, config.balance_tolerance)?;
        s.delete_journal_line(line_id)?;
        entry.updated_at = timestamp();
        s.update_journal_entry(&entry)?;
        Ok(entry.id)
    })?;
    finish(store, entry_id)
}

/// Deletes the entry together with its lines and ledger rows.
pub fn delete_journal_entry<S: Store>(store: &S, id: Uuid) -> ErpResult<()> {
    store.atomic(|s| {
        let entry = load_entry(s, id)?;
        s.delete_ledger_for_entry(id)?;
        s.delete_journal_entry(id)?;
        log::info!("deleted journal entry {}", entry.doc_num);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_line_number() {
        assert_eq!(next_line_number(&[]), 1);
    }

    #[test]
    fn test_settle_totals_rejects_unbalanced_posted_entry() {
        let now = timestamp();
        let mut entry = JournalEntry {
            id: Uuid::new_v4(),
            doc_num: "JE-000001".into(),
            posting_date: now.date(),
            reference: None,
            remarks: None,
            currency: "USD".into(),
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            is_posted: true,
            posting_version: 0,
            cost_center_id: None,
            created_at: now,
            updated_at: now,
        };
        let input = NewJournalLine {
            account_id: Uuid::new_v4(),
            debit_amount: Decimal::from(100),
            ..Default::default()
        };
        let lines = vec![build_line(entry.id, 1, &input, (Decimal::from(100), Decimal::ZERO))];
        let tolerance = Decimal::new(1, 2);
        assert!(settle_totals(&mut entry, &lines, tolerance).is_err());
        assert_eq!(entry.total_debit, Decimal::from(100));

        entry.is_posted = false;
        assert!(settle_totals(&mut entry, &lines, tolerance).is_ok());
        entry.is_posted = true;
        assert!(settle_totals(&mut entry, &[], tolerance).is_err());
    }
}
