//! Conversion of `sea-query` bind values into `may_postgres` parameters.

use crate::executor::StoreError;
use chrono::{NaiveDate, NaiveDateTime};
use may_postgres::types::ToSql;
use rust_decimal::Decimal;
use sea_query::{Value, Values};
use uuid::Uuid;

/// Boxes one bind value, keeping the SQL type of NULLs so PostgreSQL accepts them.
fn to_param(value: &Value) -> Result<Box<dyn ToSql>, StoreError> {
    let param: Box<dyn ToSql> = match value {
        Value::Bool(v) => Box::new(*v),
        Value::SmallInt(v) => Box::new(*v),
        Value::Int(v) => Box::new(*v),
        Value::BigInt(v) => Box::new(*v),
        Value::Double(v) => Box::new(*v),
        Value::String(v) => Box::new(v.as_ref().map(|s| String::clone(s))),
        Value::Uuid(v) => Box::new(v.as_ref().map(|u| Uuid::clone(u))),
        Value::Decimal(v) => Box::new(v.as_ref().map(|d| Decimal::clone(d))),
        Value::ChronoDate(v) => Box::new(v.as_ref().map(|d| NaiveDate::clone(d))),
        Value::ChronoDateTime(v) => Box::new(v.as_ref().map(|t| NaiveDateTime::clone(t))),
        Value::Json(v) => Box::new(v.as_ref().map(|j| serde_json::Value::clone(j))),
        other => {
            return Err(StoreError::QueryError(format!(
                "Unsupported value type in query: {other:?}"
            )))
        }
    };
    Ok(param)
}

/// Converts `values` and runs `f` with them as positional parameters (`$1`, `$2`, ...).
pub(crate) fn with_converted_params<F, R>(values: &Values, f: F) -> Result<R, StoreError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, StoreError>,
{
    let owned = values
        .iter()
        .map(to_param)
        .collect::<Result<Vec<_>, _>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| &**p).collect();
    f(&params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{Expr, ExprTrait, PostgresQueryBuilder, Query};

    #[test]
    fn test_params_follow_placeholder_order() {
        let id = Uuid::new_v4();
        let (sql, values) = Query::select()
            .column("id")
            .from("accounts")
            .and_where(Expr::col("id").eq(id))
            .and_where(Expr::col("code").eq("1000"))
            .build(PostgresQueryBuilder);
        assert!(sql.contains("$1") && sql.contains("$2"));
        let count = with_converted_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_typed_nulls_are_accepted() {
        let none: Option<Uuid> = None;
        let (_, values) = Query::select()
            .column("id")
            .from("accounts")
            .and_where(Expr::col("parent_id").eq(none))
            .build(PostgresQueryBuilder);
        assert!(with_converted_params(&values, |_| Ok(())).is_ok());
    }
}
