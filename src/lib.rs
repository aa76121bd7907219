//! # Ledgerguard
//!
//! Coroutine-native ERP accounting core on PostgreSQL using the `may` runtime.
//!
//! - [`accounting`]: chart of accounts, journal entries, general ledger posting and reports
//! - [`sales`] and [`banking`]: sales orders, payments and payment reconciliation
//! - [`hrm`]: salary structures, leave, attendance and monthly payroll
//! - [`devices`]: biometric terminal registry and punch sync
//! - [`export`]: CSV exports
//!
//! Every service is a function generic over [`Store`]. [`PgStore`] persists through
//! `may_postgres`; [`MemoryStore`] keeps everything in process.
//!
//! ```no_run
//! use ledgerguard::accounting::reports::trial_balance;
//! use ledgerguard::{ErpConfig, PgStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ErpConfig::load()?;
//! let store = PgStore::connect(&config.database.url)?;
//! let tb = trial_balance(&store, None, config.ledger.balance_tolerance)?;
//! println!("balanced: {}", tb.is_balanced);
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

pub mod accounting;
pub mod banking;
pub mod config;
pub mod connection;
pub mod devices;
pub mod error;
pub mod executor;
pub mod export;
pub mod hrm;
pub mod metrics;
pub mod migration;
pub mod migrations;
pub mod money;
pub mod numbering;
pub mod partners;
pub mod sales;
pub mod store;
pub mod transaction;

pub use config::{AttendanceConfig, DeviceConfig, ErpConfig, LedgerConfig};
pub use connection::{connect, ConnectionError};
pub use error::{ErpError, ErpResult, ValidationError};
pub use executor::{ErpExecutor, PgExecutor, StoreError};
pub use store::{MemoryStore, PgStore, Store};
pub use transaction::{IsolationLevel, Transaction, TransactionError};
