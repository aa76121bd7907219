//! Payments and their reconciliation against sales orders.

pub mod model;
pub mod payments;
pub mod reconciliation;

pub use model::{Payment, PaymentLine, PaymentMethod, PaymentType};
pub use payments::{
    add_payment_line, create_payment, create_payment_method, delete_payment,
    remove_payment_line, set_payment_reconciled, update_payment, validate_payment_amount,
    NewPayment, NewPaymentLine, AMOUNT_EXCEEDS_ORDER,
};
pub use reconciliation::{reconcile_sales_order, summarize_payments};
