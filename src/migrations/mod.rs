//! Built-in schema for every table the PostgreSQL store reads and writes.

mod m20240101000001_create_accounting;
mod m20240101000002_create_sales;
mod m20240101000003_create_banking;
mod m20240101000004_create_hrm;
mod m20240101000005_create_devices;

use crate::migration::{Migration, MigrationError, Migrator, SchemaManager};
use sea_query::Table;

pub use m20240101000001_create_accounting::CreateAccounting;
pub use m20240101000002_create_sales::CreateSales;
pub use m20240101000003_create_banking::CreateBanking;
pub use m20240101000004_create_hrm::CreateHrm;
pub use m20240101000005_create_devices::CreateDevices;

/// Every built-in migration, oldest first
pub fn all() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(CreateAccounting),
        Box::new(CreateSales),
        Box::new(CreateBanking),
        Box::new(CreateHrm),
        Box::new(CreateDevices),
    ]
}

pub fn migrator() -> Result<Migrator, MigrationError> {
    Migrator::new(all())
}

/// Drops `tables` in the given order.
fn drop_tables(manager: &SchemaManager<'_>, tables: &[&'static str]) -> Result<(), MigrationError> {
    for table in tables {
        manager.drop_table(Table::drop().table(*table).if_exists().cascade().to_owned())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::postgres::records::PgRecord;

    fn all_sql() -> String {
        let manager = SchemaManager::recording();
        for migration in all() {
            migration.up(&manager).unwrap();
        }
        manager.statements().join("\n")
    }

    /// Column list of `CREATE TABLE IF NOT EXISTS <table> (...)`
    fn columns_of(sql: &str, table: &str) -> Vec<String> {
        let marker = format!("CREATE TABLE IF NOT EXISTS {table} (");
        let start = sql.find(&marker).unwrap_or_else(|| panic!("no table {table}")) + marker.len();
        sql[start..]
            .lines()
            .map(str::trim)
            .take_while(|line| *line != ")")
            .filter(|line| !line.is_empty())
            .filter(|line| !line.starts_with("UNIQUE") && !line.starts_with("CHECK"))
            .map(|line| line.split_whitespace().next().unwrap().to_string())
            .collect()
    }

    fn assert_matches<T: PgRecord>(sql: &str) {
        let mut expected: Vec<String> = T::COLUMNS.iter().map(|c| c.to_string()).collect();
        let mut actual = columns_of(sql, T::TABLE);
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected, "columns of {}", T::TABLE);
    }

    #[test]
    fn test_schema_matches_records() {
        use crate::accounting::model::*;
        use crate::banking::model::*;
        use crate::devices::model::*;
        use crate::hrm::model::*;
        use crate::partners::BusinessPartner;
        use crate::sales::model::*;

        let sql = all_sql();
        assert_matches::<AccountType>(&sql);
        assert_matches::<Account>(&sql);
        assert_matches::<CostCenter>(&sql);
        assert_matches::<JournalEntry>(&sql);
        assert_matches::<JournalEntryLine>(&sql);
        assert_matches::<LedgerEntry>(&sql);
        assert_matches::<BusinessPartner>(&sql);
        assert_matches::<SalesOrder>(&sql);
        assert_matches::<SalesOrderLine>(&sql);
        assert_matches::<PaymentMethod>(&sql);
        assert_matches::<Payment>(&sql);
        assert_matches::<PaymentLine>(&sql);
        assert_matches::<Employee>(&sql);
        assert_matches::<SalaryComponent>(&sql);
        assert_matches::<SalaryStructure>(&sql);
        assert_matches::<StructureComponent>(&sql);
        assert_matches::<LeaveType>(&sql);
        assert_matches::<LeaveApplication>(&sql);
        assert_matches::<LeaveBalance>(&sql);
        assert_matches::<Attendance>(&sql);
        assert_matches::<SalaryMonth>(&sql);
        assert_matches::<EmployeeSalary>(&sql);
        assert_matches::<SalaryDetail>(&sql);
        assert_matches::<ZkDevice>(&sql);
        assert_matches::<ZkAttendanceLog>(&sql);
    }

    #[test]
    fn test_built_in_versions_are_unique() {
        let migrator = migrator().unwrap();
        assert_eq!(migrator.migrations().count(), 5);
    }
}
