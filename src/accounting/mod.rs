//! General ledger accounting.
//!
//! - [`chart`]: account types, accounts and cost centers
//! - [`journal`]: journal entry authoring
//! - [`posting`]: projection of posted journal entries into the general ledger
//! - [`reports`]: trial balance, profit and loss, balance sheet and account ledger
//!
//! The ledger is never edited directly. Journal services post after every committed
//! change, and reports always recompute from ledger rows.

pub mod chart;
pub mod filter;
pub mod journal;
pub mod model;
pub mod posting;
pub mod reports;

pub use filter::LedgerFilter;
pub use model::{
    Account, AccountCategory, AccountTotals, AccountType, CostCenter, JournalEntry,
    JournalEntryLine, LedgerEntry,
};
pub use posting::{post_journal_entry, unpost_journal_entry, PostingError, PostingOutcome};
