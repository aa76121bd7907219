//! Journal entry authoring and general ledger projection.

mod common;

use common::*;
use ledgerguard::accounting::journal::{
    replace_lines, update_journal_entry, update_line, JournalEntryUpdate,
};
use ledgerguard::accounting::{
    post_journal_entry, unpost_journal_entry, PostingError, PostingOutcome,
};
use ledgerguard::store::AccountingStore;
use ledgerguard::MemoryStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

#[test]
fn test_posted_entry_projects_one_row_per_line() {
    let store = MemoryStore::new();
    let chart = chart(&store);

    let saved = journal(
        &store,
        date(2024, 1, 5),
        vec![line(chart.cash, 1500, 0), line(chart.capital, 0, 1500)],
        true,
    )
    .unwrap();

    assert_eq!(saved.entry.doc_num, "JE-000001");
    assert_eq!(saved.posting, PostingOutcome::Posted { version: 1, rows: 2 });
    let rows = store.ledger_for_entry(saved.entry.id).unwrap();
    assert_eq!(rows.len(), 2);
    let debit: Decimal = rows.iter().map(|r| r.debit_amount).sum();
    let credit: Decimal = rows.iter().map(|r| r.credit_amount).sum();
    assert_eq!(debit, saved.entry.total_debit);
    assert_eq!(credit, saved.entry.total_credit);
    assert_eq!(rows[0].balance, dec(1500));
    assert_eq!(rows[1].balance, dec(-1500));
    assert!(rows.iter().all(|r| r.posting_version == 1));
}

#[test]
fn test_draft_entry_writes_nothing_and_numbers_continue() {
    let store = MemoryStore::new();
    let chart = chart(&store);

    let first = journal(&store, date(2024, 1, 5), vec![line(chart.cash, 10, 0)], false).unwrap();
    assert_eq!(first.posting, PostingOutcome::Skipped);
    assert!(store.ledger_for_entry(first.entry.id).unwrap().is_empty());

    let second = journal(&store, date(2024, 1, 6), vec![line(chart.cash, 10, 0)], false).unwrap();
    assert_eq!(second.entry.doc_num, "JE-000002");
}

#[test]
fn test_unbalanced_posted_entry_is_rejected() {
    let store = MemoryStore::new();
    let chart = chart(&store);

    let err = journal(
        &store,
        date(2024, 1, 5),
        vec![line(chart.cash, 100, 0), line(chart.capital, 0, 90)],
        true,
    )
    .unwrap_err();
    assert!(err.as_validation().is_some(), "{err}");
    assert!(store.list_journal_entries().unwrap().is_empty());
}

#[test]
fn test_line_needs_an_amount_and_a_known_account() {
    let store = MemoryStore::new();
    let chart = chart(&store);

    assert!(journal(&store, date(2024, 1, 5), vec![line(chart.cash, 0, 0)], false).is_err());
    let unknown = line(uuid::Uuid::new_v4(), 5, 0);
    assert!(journal(&store, date(2024, 1, 5), vec![unknown], false).is_err());
    let negative = line(chart.cash, -5, 0);
    assert!(journal(&store, date(2024, 1, 5), vec![negative], false).is_err());
}

#[test]
fn test_reposting_unchanged_entry_keeps_rows() {
    let store = MemoryStore::new();
    let chart = chart(&store);
    let saved = journal(
        &store,
        date(2024, 2, 1),
        vec![line(chart.rent, 800, 0), line(chart.cash, 0, 800)],
        true,
    )
    .unwrap();
    let before = store.ledger_for_entry(saved.entry.id).unwrap();

    assert_eq!(
        post_journal_entry(&store, saved.entry.id).unwrap(),
        PostingOutcome::Unchanged
    );
    let after = store.ledger_for_entry(saved.entry.id).unwrap();
    assert_eq!(before, after);
    assert_eq!(
        store.get_journal_entry(saved.entry.id).unwrap().unwrap().posting_version,
        1
    );
}

#[test]
fn test_editing_a_posted_entry_bumps_the_version() {
    let store = MemoryStore::new();
    let chart = chart(&store);
    let config = config();
    let saved = journal(
        &store,
        date(2024, 2, 1),
        vec![line(chart.rent, 800, 0), line(chart.cash, 0, 800)],
        true,
    )
    .unwrap();

    let edited = replace_lines(
        &store,
        &config,
        saved.entry.id,
        vec![line(chart.rent, 900, 0), line(chart.cash, 0, 900)],
    )
    .unwrap();
    assert_eq!(edited.posting, PostingOutcome::Posted { version: 2, rows: 2 });
    assert_eq!(edited.entry.total_debit, dec(900));
    let rows = store.ledger_for_entry(saved.entry.id).unwrap();
    assert!(rows.iter().all(|r| r.posting_version == 2));
    assert_eq!(rows[0].debit_amount, dec(900));

    // a single-line edit that unbalances a posted entry is refused
    let first_line = edited.lines[0].id;
    assert!(update_line(&store, &config, first_line, line(chart.rent, 950, 0)).is_err());
    assert_eq!(
        store.ledger_for_entry(saved.entry.id).unwrap()[0].debit_amount,
        dec(900)
    );
}

#[test]
fn test_header_change_moves_ledger_date() {
    let store = MemoryStore::new();
    let chart = chart(&store);
    let config = config();
    let saved = journal(
        &store,
        date(2024, 2, 1),
        vec![line(chart.cash, 50, 0), line(chart.sales, 0, 50)],
        true,
    )
    .unwrap();

    let updated = update_journal_entry(
        &store,
        &config,
        saved.entry.id,
        JournalEntryUpdate {
            posting_date: date(2024, 2, 15),
            reference: Some("INV-7".into()),
            remarks: None,
            currency: "USD".into(),
            cost_center_id: None,
            is_posted: true,
        },
    )
    .unwrap();
    assert!(matches!(updated.posting, PostingOutcome::Posted { version: 2, .. }));
    let rows = store.ledger_for_entry(saved.entry.id).unwrap();
    assert!(rows.iter().all(|r| r.posting_date == date(2024, 2, 15)));
}

#[test]
fn test_unpost_removes_rows() {
    let store = MemoryStore::new();
    let chart = chart(&store);
    let saved = journal(
        &store,
        date(2024, 2, 1),
        vec![line(chart.cash, 50, 0), line(chart.sales, 0, 50)],
        true,
    )
    .unwrap();

    assert_eq!(unpost_journal_entry(&store, saved.entry.id).unwrap(), 2);
    assert!(store.ledger_for_entry(saved.entry.id).unwrap().is_empty());
    let entry = store.get_journal_entry(saved.entry.id).unwrap().unwrap();
    assert!(!entry.is_posted);
    assert_eq!(
        post_journal_entry(&store, saved.entry.id).unwrap(),
        PostingOutcome::Skipped
    );
}

#[test]
fn test_posting_unknown_entry_fails() {
    let store = MemoryStore::new();
    let id = uuid::Uuid::new_v4();
    let err = post_journal_entry(&store, id).unwrap_err();
    assert!(matches!(err, PostingError::EntryNotFound(missing) if missing == id));
}

#[test]
fn test_random_balanced_entries_keep_ledger_in_step() {
    let store = MemoryStore::new();
    let chart = chart(&store);
    let accounts = [chart.cash, chart.receivable, chart.payable, chart.capital, chart.sales, chart.rent];
    let mut rng = StdRng::seed_from_u64(20240101);

    for day in 1..=25 {
        let amount: i64 = rng.gen_range(1..=5_000);
        let split: i64 = rng.gen_range(0..=amount);
        let debit_account = accounts[rng.gen_range(0..accounts.len())];
        let mut lines = vec![line(debit_account, amount, 0)];
        for part in [split, amount - split] {
            if part > 0 {
                lines.push(line(accounts[rng.gen_range(0..accounts.len())], 0, part));
            }
        }
        journal(&store, date(2024, 1, day), lines, rng.gen_bool(0.8)).unwrap();
    }

    for entry in store.list_journal_entries().unwrap() {
        let rows = store.ledger_for_entry(entry.id).unwrap();
        if entry.is_posted {
            let debit: Decimal = rows.iter().map(|r| r.debit_amount).sum();
            let credit: Decimal = rows.iter().map(|r| r.credit_amount).sum();
            assert_eq!(debit, entry.total_debit, "{}", entry.doc_num);
            assert_eq!(credit, entry.total_credit, "{}", entry.doc_num);
            assert_eq!(
                post_journal_entry(&store, entry.id).unwrap(),
                PostingOutcome::Unchanged
            );
        } else {
            assert!(rows.is_empty(), "{}", entry.doc_num);
        }
    }
}
