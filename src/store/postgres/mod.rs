//! PostgreSQL [`Store`] over a single `may_postgres` connection.
//!
//! Statements are built with `sea-query` and run through [`ErpExecutor`]. `atomic` opens a
//! transaction at the outermost call and a savepoint for every nested one, on the same
//! connection, so a `PgStore` serves one unit of work at a time.

mod accounting;
mod banking;
mod devices;
mod hrm;
mod params;
pub(crate) mod records;
mod sales;

use super::{Store, StoreResult};
use crate::connection::{connect, ConnectionError};
use crate::error::ErpError;
use crate::executor::{ErpExecutor, PgExecutor, StoreError};
use crate::transaction::Transaction;
use may_postgres::Row;
use params::with_converted_params;
use records::PgRecord;
use sea_query::{
    Condition, DeleteStatement, Expr, ExprTrait, Order, PostgresQueryBuilder, Query,
    SelectStatement, UpdateStatement, Value,
};
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

pub struct PgStore {
    executor: PgExecutor,
    depth: AtomicU32,
}

impl PgStore {
    pub fn new(executor: PgExecutor) -> Self {
        Self {
            executor,
            depth: AtomicU32::new(0),
        }
    }

    pub fn connect(url: &str) -> Result<Self, ConnectionError> {
        Ok(Self::new(PgExecutor::new(connect(url)?)))
    }

    pub fn executor(&self) -> &PgExecutor {
        &self.executor
    }

    fn execute_statement(&self, sql: &str, values: &sea_query::Values) -> StoreResult<u64> {
        with_converted_params(values, |params| self.executor.execute(sql, params))
    }

    fn rows(&self, query: &SelectStatement) -> StoreResult<Vec<Row>> {
        let (sql, values) = query.build(PostgresQueryBuilder);
        with_converted_params(&values, |params| self.executor.query_all(&sql, params))
    }

    fn fetch<T: PgRecord>(&self, query: &SelectStatement) -> StoreResult<Vec<T>> {
        self.rows(query)?.iter().map(T::from_row).collect()
    }

    fn fetch_one<T: PgRecord>(&self, query: &SelectStatement) -> StoreResult<Option<T>> {
        Ok(self.fetch(query)?.into_iter().next())
    }

    fn insert_record<T: PgRecord>(&self, record: &T) -> StoreResult<()> {
        let mut query = Query::insert();
        query
            .into_table(T::TABLE)
            .columns(T::COLUMNS.iter().copied())
            .values(record.values().into_iter().map(Expr::from))
            .map_err(|e| StoreError::QueryError(format!("insert into {}: {e}", T::TABLE)))?;
        let (sql, values) = query.build(PostgresQueryBuilder);
        self.execute_statement(&sql, &values).map(|_| ())
    }

    fn update_record<T: PgRecord>(&self, record: &T) -> StoreResult<()> {
        let mut query = UpdateStatement::default();
        query
            .table(T::TABLE)
            .values(
                T::COLUMNS
                    .iter()
                    .copied()
                    .zip(record.values().into_iter().map(Expr::from))
                    .skip(1),
            )
            .and_where(Expr::col("id").eq(record.id()));
        let (sql, values) = query.build(PostgresQueryBuilder);
        match self.execute_statement(&sql, &values)? {
            0 => Err(StoreError::QueryError(format!(
                "{} {} does not exist",
                T::TABLE,
                record.id()
            ))),
            _ => Ok(()),
        }
    }

    fn delete_where(&self, table: &'static str, condition: Condition) -> StoreResult<u64> {
        let mut query = DeleteStatement::default();
        query.from_table(table).cond_where(condition);
        let (sql, values) = query.build(PostgresQueryBuilder);
        self.execute_statement(&sql, &values)
    }

    fn delete_record<T: PgRecord>(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.delete_where(T::TABLE, Condition::all().add(Expr::col("id").eq(id)))? > 0)
    }

    /// `SELECT <all columns> FROM <table> WHERE <condition> ORDER BY <order>`
    fn select<T: PgRecord>(condition: Condition, order: &[&'static str]) -> SelectStatement {
        let mut query = Query::select();
        query
            .columns(T::COLUMNS.iter().copied())
            .from(T::TABLE)
            .cond_where(condition);
        for column in order {
            query.order_by(*column, Order::Asc);
        }
        query
    }

    fn get_record<T: PgRecord>(&self, id: Uuid) -> StoreResult<Option<T>> {
        self.fetch_one(&Self::select::<T>(
            Condition::all().add(Expr::col("id").eq(id)),
            &[],
        ))
    }

    fn find_by<T: PgRecord>(
        &self,
        column: &'static str,
        value: impl Into<Value>,
    ) -> StoreResult<Option<T>> {
        self.fetch_one(&Self::select::<T>(
            Condition::all().add(Expr::col(column).eq(value.into())),
            &[],
        ))
    }

    fn list_by<T: PgRecord>(
        &self,
        condition: Condition,
        order: &[&'static str],
    ) -> StoreResult<Vec<T>> {
        self.fetch(&Self::select::<T>(condition, order))
    }

    /// Values of a text column starting with `prefix`
    fn numbers_with_prefix(
        &self,
        table: &'static str,
        column: &'static str,
        prefix: &str,
    ) -> StoreResult<Vec<String>> {
        let mut query = Query::select();
        query
            .column(column)
            .from(table)
            .and_where(Expr::col(column).like(format!("{}%", escape_like(prefix))))
            .order_by(column, Order::Asc);
        self.rows(&query)?
            .iter()
            .map(|row| records::column::<String>(row, column))
            .collect()
    }

    fn exists(&self, query: &SelectStatement) -> StoreResult<bool> {
        Ok(!self.rows(query)?.is_empty())
    }
}

/// Escapes LIKE wildcards so user text matches literally.
pub(crate) fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl Store for PgStore {
    fn atomic<R, F>(&self, f: F) -> Result<R, ErpError>
    where
        F: FnOnce(&Self) -> Result<R, ErpError>,
    {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst);
        let opened = if depth == 0 {
            self.executor.begin()
        } else {
            Transaction::savepoint(self.executor.client().clone(), depth)
        };
        let transaction = match opened {
            Ok(transaction) => transaction,
            Err(e) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::from(e).into());
            }
        };

        let result = f(self);
        self.depth.fetch_sub(1, Ordering::SeqCst);

        match result {
            Ok(value) => {
                transaction.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = transaction.rollback() {
                    log::error!("rollback at depth {depth} failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }
}
