use super::records::PgRecord;
use super::PgStore;
use crate::executor::StoreError;
use crate::partners::BusinessPartner;
use crate::sales::model::{PaymentSummary, SalesOrder, SalesOrderLine};
use crate::store::{timestamp, PartnerStore, SalesStore, StoreResult};
use sea_query::{Condition, Expr, ExprTrait, PostgresQueryBuilder, UpdateStatement};
use uuid::Uuid;

impl PartnerStore for PgStore {
    fn insert_partner(&self, value: &BusinessPartner) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_partner(&self, value: &BusinessPartner) -> StoreResult<()> {
        self.update_record(value)
    }

    fn get_partner(&self, id: Uuid) -> StoreResult<Option<BusinessPartner>> {
        self.get_record(id)
    }

    fn find_partner_by_code(&self, code: &str) -> StoreResult<Option<BusinessPartner>> {
        self.find_by("code", code)
    }

    fn list_partners(&self) -> StoreResult<Vec<BusinessPartner>> {
        self.list_by(Condition::all(), &["code"])
    }
}

impl SalesStore for PgStore {
    fn insert_sales_order(&self, value: &SalesOrder) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_sales_order(&self, value: &SalesOrder) -> StoreResult<()> {
        self.update_record(value)
    }

    fn save_payment_summary(&self, order_id: Uuid, summary: &PaymentSummary) -> StoreResult<()> {
        let mut query = UpdateStatement::default();
        query
            .table(SalesOrder::TABLE)
            .values([
                ("paid_amount", Expr::from(summary.paid_amount)),
                ("due_amount", Expr::from(summary.due_amount)),
                ("payment_method", Expr::from(summary.payment_method.clone())),
                ("payment_reference", Expr::from(summary.payment_reference.clone())),
                ("payment_date", Expr::from(summary.payment_date)),
                ("status", Expr::from(summary.status.as_str())),
                ("updated_at", Expr::from(timestamp())),
            ])
            .and_where(Expr::col("id").eq(order_id));
        let (sql, values) = query.build(PostgresQueryBuilder);
        match self.execute_statement(&sql, &values)? {
            0 => Err(StoreError::QueryError(format!(
                "sales order {order_id} does not exist"
            ))),
            _ => Ok(()),
        }
    }

    fn get_sales_order(&self, id: Uuid) -> StoreResult<Option<SalesOrder>> {
        self.get_record(id)
    }

    fn find_sales_order_by_document_no(
        &self,
        document_no: &str,
    ) -> StoreResult<Option<SalesOrder>> {
        self.find_by("document_no", document_no)
    }

    fn list_sales_orders(&self) -> StoreResult<Vec<SalesOrder>> {
        let mut query = Self::select::<SalesOrder>(Condition::all(), &[]);
        query
            .order_by("document_date", sea_query::Order::Desc)
            .order_by("created_at", sea_query::Order::Desc);
        self.fetch(&query)
    }

    fn sales_order_numbers(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.numbers_with_prefix(SalesOrder::TABLE, "document_no", prefix)
    }

    fn insert_order_line(&self, value: &SalesOrderLine) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_order_line(&self, value: &SalesOrderLine) -> StoreResult<()> {
        self.update_record(value)
    }

    fn delete_order_line(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_record::<SalesOrderLine>(id)
    }

    fn get_order_line(&self, id: Uuid) -> StoreResult<Option<SalesOrderLine>> {
        self.get_record(id)
    }

    fn lines_for_order(&self, order_id: Uuid) -> StoreResult<Vec<SalesOrderLine>> {
        self.list_by(
            Condition::all().add(Expr::col("order_id").eq(order_id)),
            &["created_at", "id"],
        )
    }
}
