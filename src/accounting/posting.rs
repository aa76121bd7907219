//! Journal entry to general ledger projection.
//!
//! A posted entry owns exactly one ledger row per line. Posting recomputes the rows and
//! compares them with the stored ones: identical content is left untouched, anything else
//! replaces the whole projection and bumps `posting_version`.

use super::model::{JournalEntry, JournalEntryLine, LedgerEntry};
use crate::error::ErpError;
use crate::executor::StoreError;
use crate::store::{timestamp, Store};
use std::fmt;
use uuid::Uuid;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

#[derive(Debug)]
pub enum PostingError {
    EntryNotFound(Uuid),
    AccountNotFound { account_id: Uuid, line_number: i32 },
    Store(StoreError),
}

impl fmt::Display for PostingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostingError::EntryNotFound(id) => write!(f, "journal entry {id} not found"),
            PostingError::AccountNotFound {
                account_id,
                line_number,
            } => write!(f, "line {line_number}: account {account_id} not found"),
            PostingError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PostingError {}

impl From<StoreError> for PostingError {
    fn from(err: StoreError) -> Self {
        PostingError::Store(err)
    }
}

fn into_posting_error(err: ErpError) -> PostingError {
    match err {
        ErpError::Posting(e) => e,
        ErpError::Store(e) => PostingError::Store(e),
        other => PostingError::Store(StoreError::Other(other.to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingOutcome {
    /// Entry is not posted; nothing written
    Skipped,
    /// Stored projection already matched the entry
    Unchanged,
    Posted { version: i32, rows: usize },
}

impl PostingOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PostingOutcome::Skipped => "skipped",
            PostingOutcome::Unchanged => "unchanged",
            PostingOutcome::Posted { .. } => "posted",
        }
    }

    pub fn rows_written(&self) -> usize {
        match self {
            PostingOutcome::Posted { rows, .. } => *rows,
            _ => 0,
        }
    }
}

/// Ledger rows for `entry`, stamped with `version`.
pub fn project_entry(
    entry: &JournalEntry,
    lines: &[JournalEntryLine],
    version: i32,
) -> Vec<LedgerEntry> {
    let now = timestamp();
    lines
        .iter()
        .map(|line| LedgerEntry {
            id: Uuid::new_v4(),
            journal_entry_id: entry.id,
            account_id: line.account_id,
            line_number: line.line_number,
            posting_date: entry.posting_date,
            debit_amount: line.debit_amount,
            credit_amount: line.credit_amount,
            balance: line.debit_amount - line.credit_amount,
            currency: entry.currency.clone(),
            cost_center_id: entry.cost_center_id,
            posting_version: version,
            created_at: now,
        })
        .collect()
}

fn same_projection(stored: &[LedgerEntry], fresh: &[LedgerEntry]) -> bool {
    stored.len() == fresh.len() && stored.iter().zip(fresh).all(|(a, b)| a.same_content(b))
}

/// Rebuilds the ledger rows of one journal entry.
pub fn post_journal_entry<S: Store>(
    store: &S,
    entry_id: Uuid,
) -> Result<PostingOutcome, PostingError> {
    let entry = store
        .get_journal_entry(entry_id)?
        .ok_or(PostingError::EntryNotFound(entry_id))?;

    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::post_journal_entry_span(&entry.doc_num).entered();

    if !entry.is_posted {
        log::debug!("{} is not posted, ledger left as is", entry.doc_num);
        #[cfg(feature = "metrics")]
        METRICS.record_posting(PostingOutcome::Skipped.label(), 0);
        return Ok(PostingOutcome::Skipped);
    }

    let outcome = store
        .atomic(|s| {
            let mut entry = s
                .get_journal_entry(entry_id)?
                .ok_or(PostingError::EntryNotFound(entry_id))?;
            let lines = s.lines_for_entry(entry_id)?;
            for line in &lines {
                if s.get_account(line.account_id)?.is_none() {
                    return Err(PostingError::AccountNotFound {
                        account_id: line.account_id,
                        line_number: line.line_number,
                    }
                    .into());
                }
            }

            let stored = s.ledger_for_entry(entry_id)?;
            let fresh = project_entry(&entry, &lines, entry.posting_version);
            if same_projection(&stored, &fresh) {
                return Ok(PostingOutcome::Unchanged);
            }

            let version = entry.posting_version + 1;
            let rows = project_entry(&entry, &lines, version);
            s.replace_ledger_for_entry(entry_id, &rows)?;
            entry.posting_version = version;
            s.update_journal_entry(&entry)?;
            Ok(PostingOutcome::Posted {
                version,
                rows: rows.len(),
            })
        })
        .map_err(into_posting_error)?;

    match outcome {
        PostingOutcome::Posted { version, rows } => log::info!(
            "posted {} (version {version}, {rows} ledger rows)",
            entry.doc_num
        ),
        _ => log::debug!("{} ledger already current", entry.doc_num),
    }
    #[cfg(feature = "metrics")]
    METRICS.record_posting(outcome.label(), outcome.rows_written());
    Ok(outcome)
}

/// Clears `is_posted` and removes the entry's ledger rows; returns how many were removed.
pub fn unpost_journal_entry<S: Store>(store: &S, entry_id: Uuid) -> Result<u64, PostingError> {
    let removed = store
        .atomic(|s| {
            let mut entry = s
                .get_journal_entry(entry_id)?
                .ok_or(PostingError::EntryNotFound(entry_id))?;
            if entry.is_posted {
                entry.is_posted = false;
                entry.updated_at = timestamp();
                s.update_journal_entry(&entry)?;
            }
            Ok(s.delete_ledger_for_entry(entry_id)?)
        })
        .map_err(into_posting_error)?;
    log::info!("unposted journal entry {entry_id}, removed {removed} ledger rows");
    Ok(removed)
}
