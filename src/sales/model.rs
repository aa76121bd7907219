use crate::money::round_document;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum OrderStatus {
        Draft => "Draft",
        Open => "Open",
        PartiallyDelivered => "Partially Delivered",
        Delivered => "Delivered",
        PartiallyInvoiced => "Partially Invoiced",
        Invoiced => "Invoiced",
        Closed => "Closed",
        Cancelled => "Cancelled",
    }
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Closed | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: Uuid,
    pub document_no: String,
    pub document_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    pub customer_id: Uuid,
    pub currency: String,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    /// Sum of active line totals
    pub total_amount: Decimal,
    /// `total + tax - discount`
    pub payable_amount: Decimal,
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub status: OrderStatus,
    pub remarks: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SalesOrder {
    /// Recomputes `total`, `payable` and `due` from the order's lines.
    pub fn recompute_amounts(&mut self, lines: &[SalesOrderLine]) {
        self.total_amount = round_document(
            lines
                .iter()
                .filter(|line| line.is_active)
                .map(|line| line.total_amount)
                .sum(),
        );
        self.payable_amount =
            round_document(self.total_amount + self.tax_amount - self.discount_amount);
        self.due_amount = self.payable_amount - self.paid_amount;
    }

    pub fn payment_summary(&self) -> PaymentSummary {
        PaymentSummary {
            paid_amount: self.paid_amount,
            due_amount: self.due_amount,
            payment_method: self.payment_method.clone(),
            payment_reference: self.payment_reference.clone(),
            payment_date: self.payment_date,
            status: self.status,
        }
    }

    pub fn apply_payment_summary(&mut self, summary: &PaymentSummary) {
        self.paid_amount = summary.paid_amount;
        self.due_amount = summary.due_amount;
        self.payment_method = summary.payment_method.clone();
        self.payment_reference = summary.payment_reference.clone();
        self.payment_date = summary.payment_date;
        self.status = summary.status;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// `quantity * unit_price`, 6 dp
    pub total_amount: Decimal,
    pub uom: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SalesOrderLine {
    pub fn recompute_total(&mut self) {
        self.total_amount = round_document(self.quantity * self.unit_price);
    }
}

/// The fields a payment recomputation is allowed to write on an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub status: OrderStatus,
}
