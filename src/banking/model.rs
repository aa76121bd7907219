use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum PaymentType {
        Incoming => "incoming",
        Outgoing => "outgoing",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub doc_num: String,
    pub business_partner_id: Uuid,
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub currency: String,
    pub payment_date: NaiveDate,
    pub payment_method_id: Uuid,
    pub sales_order_id: Option<Uuid>,
    pub reference: Option<String>,
    pub remarks: Option<String>,
    pub is_reconciled: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Payment {
    pub fn is_incoming(&self) -> bool {
        self.payment_type == PaymentType::Incoming
    }
}

/// Allocation of part of a payment to a ledger account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLine {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub account_id: Uuid,
    pub amount: Decimal,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
