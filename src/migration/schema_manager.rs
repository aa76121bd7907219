//! SchemaManager - schema operations available to migrations

use super::error::MigrationError;
use crate::executor::ErpExecutor;
use sea_query::{
    IndexCreateStatement, IndexDropStatement, PostgresQueryBuilder, SchemaStatementBuilder,
    TableCreateStatement, TableDropStatement,
};
use std::cell::RefCell;

enum Target<'a> {
    Executor(&'a dyn ErpExecutor),
    /// Collects statements instead of running them; used for checksums
    Recording(RefCell<Vec<String>>),
}

/// Runs DDL for a migration, either against a live executor or into a recording buffer.
pub struct SchemaManager<'a> {
    target: Target<'a>,
}

impl<'a> SchemaManager<'a> {
    pub fn new(executor: &'a dyn ErpExecutor) -> Self {
        Self {
            target: Target::Executor(executor),
        }
    }

    /// A manager that records every statement without touching a database.
    pub fn recording() -> SchemaManager<'static> {
        SchemaManager {
            target: Target::Recording(RefCell::new(Vec::new())),
        }
    }

    /// Statements captured so far; empty for a live manager.
    pub fn statements(&self) -> Vec<String> {
        match &self.target {
            Target::Executor(_) => Vec::new(),
            Target::Recording(buffer) => buffer.borrow().clone(),
        }
    }

    /// Runs one raw DDL statement
    pub fn execute_sql(&self, sql: &str) -> Result<(), MigrationError> {
        let sql = sql.trim();
        match &self.target {
            Target::Executor(executor) => executor.execute(sql, &[]).map(|_| ())?,
            Target::Recording(buffer) => buffer.borrow_mut().push(sql.to_string()),
        }
        Ok(())
    }

    pub fn create_table(&self, table: TableCreateStatement) -> Result<(), MigrationError> {
        self.execute_sql(&table.build(PostgresQueryBuilder))
    }

    /// # Example
    /// ```rust,no_run
    /// use sea_query::Table;
    ///
    /// # fn run(manager: &ledgerguard::migration::SchemaManager<'_>)
    /// #     -> Result<(), ledgerguard::migration::MigrationError> {
    /// manager.drop_table(Table::drop().table("payments").if_exists().to_owned())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn drop_table(&self, table: TableDropStatement) -> Result<(), MigrationError> {
        self.execute_sql(&table.build(PostgresQueryBuilder))
    }

    pub fn create_index(&self, index: IndexCreateStatement) -> Result<(), MigrationError> {
        self.execute_sql(&index.build(PostgresQueryBuilder))
    }

    pub fn drop_index(&self, index: IndexDropStatement) -> Result<(), MigrationError> {
        self.execute_sql(&index.build(PostgresQueryBuilder))
    }
}
