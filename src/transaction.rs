//! Transaction Module
//!
//! Explicit transactions over a `may_postgres` client:
//! - `Transaction` implements `ErpExecutor`
//! - isolation levels
//! - nesting through savepoints (`sp_1`, `sp_2`, ...)
//!
//! `PgStore::atomic` opens a top-level transaction on first entry and a savepoint for every
//! nested `atomic` call, so service functions compose without knowing their call depth.

use crate::executor::{instrumented, ErpExecutor, StoreError};
use may_postgres::types::ToSql;
use may_postgres::{Client, Error as PostgresError, Row};
use std::fmt;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    /// Read committed (default)
    ReadCommitted,
    /// Repeatable read
    RepeatableRead,
    /// Serializable
    Serializable,
}

impl IsolationLevel {
    fn to_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Transaction error type
#[derive(Debug)]
pub enum TransactionError {
    /// PostgreSQL error from may_postgres
    PostgresError(PostgresError),
    /// Transaction already committed or rolled back
    TransactionClosed,
    /// Nested transaction error
    NestedTransactionError(String),
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::PostgresError(e) => write!(f, "PostgreSQL error: {e}"),
            TransactionError::TransactionClosed => {
                write!(f, "Transaction has already been committed or rolled back")
            }
            TransactionError::NestedTransactionError(s) => {
                write!(f, "Nested transaction error: {s}")
            }
        }
    }
}

impl std::error::Error for TransactionError {}

impl From<PostgresError> for TransactionError {
    fn from(err: PostgresError) -> Self {
        TransactionError::PostgresError(err)
    }
}

impl From<TransactionError> for StoreError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::PostgresError(e) => StoreError::from(e),
            TransactionError::TransactionClosed => {
                StoreError::Other("Transaction closed".to_string())
            }
            TransactionError::NestedTransactionError(s) => StoreError::Other(s),
        }
    }
}

/// A database transaction or savepoint
///
/// Depth 0 is a real `BEGIN`/`COMMIT` pair; deeper levels map to savepoints.
pub struct Transaction {
    client: Client,
    depth: u32,
    closed: bool,
}

fn savepoint_name(depth: u32) -> String {
    format!("sp_{depth}")
}

impl Transaction {
    pub(crate) fn new(client: Client) -> Result<Self, TransactionError> {
        Self::new_with_isolation(client, IsolationLevel::ReadCommitted)
    }

    pub(crate) fn new_with_isolation(
        client: Client,
        isolation_level: IsolationLevel,
    ) -> Result<Self, TransactionError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::begin_transaction_span().entered();

        client.execute("BEGIN", &[])?;
        if isolation_level != IsolationLevel::ReadCommitted {
            let isolation_sql = format!(
                "SET TRANSACTION ISOLATION LEVEL {}",
                isolation_level.to_sql()
            );
            client.execute(isolation_sql.as_str(), &[])?;
        }

        Ok(Self {
            client,
            depth: 0,
            closed: false,
        })
    }

    /// Open savepoint `sp_{depth}` inside an already running transaction.
    pub(crate) fn savepoint(client: Client, depth: u32) -> Result<Self, TransactionError> {
        if depth == 0 {
            return Err(TransactionError::NestedTransactionError(
                "savepoint depth must be at least 1".to_string(),
            ));
        }
        client.execute(format!("SAVEPOINT {}", savepoint_name(depth)).as_str(), &[])?;
        Ok(Self {
            client,
            depth,
            closed: false,
        })
    }

    /// Start a nested transaction (savepoint) one level below this one
    ///
    /// # Errors
    ///
    /// Returns an error if this transaction is closed or the savepoint cannot be created.
    pub fn begin_nested(&self) -> Result<Transaction, TransactionError> {
        if self.closed {
            return Err(TransactionError::TransactionClosed);
        }
        Self::savepoint(self.client.clone(), self.depth + 1)
    }

    /// Commit the transaction, or release the savepoint when nested
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction has already been committed or rolled back.
    pub fn commit(mut self) -> Result<(), TransactionError> {
        if self.closed {
            return Err(TransactionError::TransactionClosed);
        }

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::commit_transaction_span().entered();

        let sql = if self.depth == 0 {
            "COMMIT".to_string()
        } else {
            format!("RELEASE SAVEPOINT {}", savepoint_name(self.depth))
        };
        self.client.execute(sql.as_str(), &[])?;
        self.closed = true;
        Ok(())
    }

    /// Roll back the transaction, or roll back to the savepoint when nested
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction has already been committed or rolled back.
    pub fn rollback(mut self) -> Result<(), TransactionError> {
        if self.closed {
            return Err(TransactionError::TransactionClosed);
        }

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::rollback_transaction_span().entered();

        let sql = if self.depth == 0 {
            "ROLLBACK".to_string()
        } else {
            format!("ROLLBACK TO SAVEPOINT {}", savepoint_name(self.depth))
        };
        self.client.execute(sql.as_str(), &[])?;
        self.closed = true;
        Ok(())
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ErpExecutor for Transaction {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError> {
        if self.closed {
            return Err(StoreError::Other("Transaction is closed".to_string()));
        }
        instrumented(query, || self.client.execute(query, params))
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError> {
        if self.closed {
            return Err(StoreError::Other("Transaction is closed".to_string()));
        }
        instrumented(query, || self.client.query_one(query, params))
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StoreError> {
        if self.closed {
            return Err(StoreError::Other("Transaction is closed".to_string()));
        }
        instrumented(query, || self.client.query(query, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_level_to_sql() {
        assert_eq!(IsolationLevel::ReadCommitted.to_sql(), "READ COMMITTED");
        assert_eq!(IsolationLevel::RepeatableRead.to_sql(), "REPEATABLE READ");
        assert_eq!(IsolationLevel::Serializable.to_sql(), "SERIALIZABLE");
    }

    #[test]
    fn test_savepoint_names() {
        assert_eq!(savepoint_name(1), "sp_1");
        assert_eq!(savepoint_name(12), "sp_12");
    }

    #[test]
    fn test_transaction_error_display() {
        let err = TransactionError::TransactionClosed;
        assert!(err
            .to_string()
            .contains("Transaction has already been committed"));

        let err = TransactionError::NestedTransactionError("depth".to_string());
        assert!(err.to_string().contains("Nested transaction error"));
    }

    #[test]
    fn test_transaction_error_conversion() {
        let store_err: StoreError = TransactionError::TransactionClosed.into();
        assert!(store_err.to_string().contains("Transaction closed"));

        let store_err: StoreError =
            TransactionError::NestedTransactionError("sp".to_string()).into();
        assert!(matches!(store_err, StoreError::Other(_)));
    }
}
