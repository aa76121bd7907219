use super::records::PgRecord;
use super::PgStore;
use crate::banking::model::{Payment, PaymentLine, PaymentMethod};
use crate::store::{BankingStore, StoreResult};
use sea_query::{Condition, Expr, ExprTrait};
use uuid::Uuid;

impl BankingStore for PgStore {
    fn insert_payment_method(&self, value: &PaymentMethod) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn get_payment_method(&self, id: Uuid) -> StoreResult<Option<PaymentMethod>> {
        self.get_record(id)
    }

    fn find_payment_method_by_name(&self, name: &str) -> StoreResult<Option<PaymentMethod>> {
        self.find_by("name", name)
    }

    fn list_payment_methods(&self) -> StoreResult<Vec<PaymentMethod>> {
        self.list_by(Condition::all(), &["name"])
    }

    fn insert_payment(&self, value: &Payment) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_payment(&self, value: &Payment) -> StoreResult<()> {
        self.update_record(value)
    }

    fn delete_payment(&self, id: Uuid) -> StoreResult<bool> {
        // payment lines cascade
        self.delete_record::<Payment>(id)
    }

    fn get_payment(&self, id: Uuid) -> StoreResult<Option<Payment>> {
        self.get_record(id)
    }

    fn find_payment_by_doc_num(&self, doc_num: &str) -> StoreResult<Option<Payment>> {
        self.find_by("doc_num", doc_num)
    }

    fn list_payments(&self) -> StoreResult<Vec<Payment>> {
        self.list_by(Condition::all(), &["payment_date", "doc_num"])
    }

    fn payments_for_order(&self, order_id: Uuid) -> StoreResult<Vec<Payment>> {
        self.list_by(
            Condition::all().add(Expr::col("sales_order_id").eq(order_id)),
            &["payment_date", "created_at"],
        )
    }

    fn payment_doc_nums(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.numbers_with_prefix(Payment::TABLE, "doc_num", prefix)
    }

    fn insert_payment_line(&self, value: &PaymentLine) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn delete_payment_line(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_record::<PaymentLine>(id)
    }

    fn lines_for_payment(&self, payment_id: Uuid) -> StoreResult<Vec<PaymentLine>> {
        self.list_by(
            Condition::all().add(Expr::col("payment_id").eq(payment_id)),
            &["created_at", "id"],
        )
    }
}
