//! Sales order payment summary, derived from the order's incoming payments.

use super::model::Payment;
use crate::config::LedgerConfig;
use crate::error::{ErpError, ErpResult};
use crate::sales::model::{OrderStatus, PaymentSummary, SalesOrder};
use crate::store::Store;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Status implied by `paid` against `payable`. Zero paid keeps `Draft` and `Cancelled`
/// and opens everything else.
pub fn payment_status(current: OrderStatus, paid: Decimal, payable: Decimal) -> OrderStatus {
    if paid.is_zero() {
        match current {
            OrderStatus::Draft | OrderStatus::Cancelled => current,
            _ => OrderStatus::Open,
        }
    } else if paid < payable {
        OrderStatus::PartiallyInvoiced
    } else {
        OrderStatus::Invoiced
    }
}

/// Summary of `payments` for `order`. Outgoing payments are ignored; method, reference
/// and date come from the incoming payment with the latest payment date.
pub fn summarize_payments(
    order: &SalesOrder,
    payments: &[Payment],
    method_names: &HashMap<Uuid, String>,
    sticky_terminal_states: bool,
) -> PaymentSummary {
    let incoming: Vec<&Payment> = payments.iter().filter(|p| p.is_incoming()).collect();
    let paid: Decimal = incoming.iter().map(|p| p.amount).sum();
    let latest = incoming
        .iter()
        .max_by_key(|p| (p.payment_date, p.created_at));

    let status = if sticky_terminal_states && order.status.is_terminal() {
        order.status
    } else {
        payment_status(order.status, paid, order.payable_amount)
    };

    PaymentSummary {
        paid_amount: paid,
        due_amount: order.payable_amount - paid,
        payment_method: latest.and_then(|p| method_names.get(&p.payment_method_id).cloned()),
        payment_reference: latest.and_then(|p| p.reference.clone()),
        payment_date: latest.map(|p| p.payment_date),
        status,
    }
}

/// Recomputes and stores the payment summary of one order.
pub fn reconcile_sales_order<S: Store>(
    store: &S,
    config: &LedgerConfig,
    order_id: Uuid,
) -> ErpResult<PaymentSummary> {
    let summary = store.atomic(|s| {
        let order = s
            .get_sales_order(order_id)?
            .ok_or_else(|| ErpError::not_found("sales order", order_id))?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::reconcile_sales_order_span(&order.document_no).entered();

        let payments = s.payments_for_order(order_id)?;
        let method_names: HashMap<Uuid, String> = s
            .list_payment_methods()?
            .into_iter()
            .map(|m| (m.id, m.name))
            .collect();
        let summary =
            summarize_payments(&order, &payments, &method_names, config.sticky_terminal_states);
        if summary == order.payment_summary() {
            log::debug!("{} payment summary already current", order.document_no);
            return Ok(summary);
        }

        s.save_payment_summary(order_id, &summary)?;
        if order.status != summary.status {
            log::info!(
                "{}: {} -> {} (paid {} of {})",
                order.document_no,
                order.status,
                summary.status,
                summary.paid_amount,
                order.payable_amount
            );
        }
        Ok(summary)
    })?;

    #[cfg(feature = "metrics")]
    METRICS.record_reconciliation(summary.status.as_str());
    Ok(summary)
}
