//! Sales orders and their lines.
//!
//! Payment figures on an order (`paid_amount`, `due_amount`, status) are owned by
//! [`crate::banking::reconciliation`]; this module maintains everything else.

pub mod model;
pub mod orders;

pub use model::{OrderStatus, PaymentSummary, SalesOrder, SalesOrderLine};
pub use orders::{
    add_order_line, create_sales_order, remove_order_line, set_order_status,
    update_order_line, update_sales_order, NewOrderLine, NewSalesOrder, SalesOrderUpdate,
};
