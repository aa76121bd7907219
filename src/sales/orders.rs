//! Sales order authoring.
//!
//! Header amounts are recomputed from the lines inside the same `atomic` block as every
//! line change; the payment summary is refreshed afterwards by reconciliation, since a
//! new payable amount can move the order between statuses.

use super::model::{OrderStatus, SalesOrder, SalesOrderLine};
use crate::banking::reconciliation::reconcile_sales_order;
use crate::config::LedgerConfig;
use crate::error::{ErpError, ErpResult};
use crate::money::{currency_code, non_negative};
use crate::numbering::{next_document_number, sales_order_prefix, SALES_ORDER_WIDTH};
use crate::partners::PartnerType;
use crate::store::{timestamp, Store};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderLine {
    pub item_code: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub uom: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSalesOrder {
    /// Numbered `SO-<year>-NNNN` from the document date when absent
    pub document_no: Option<String>,
    pub document_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    pub customer_id: Uuid,
    pub currency: Option<String>,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    pub remarks: Option<String>,
    #[serde(default)]
    pub lines: Vec<NewOrderLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SalesOrderUpdate {
    pub document_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub remarks: Option<String>,
}

fn validated_line(input: &NewOrderLine) -> ErpResult<()> {
    if input.item_code.trim().is_empty() {
        return Err(ErpError::invalid("item_code", "is required"));
    }
    if input.quantity <= Decimal::ZERO {
        return Err(ErpError::invalid("quantity", "must be positive"));
    }
    non_negative("unit_price", input.unit_price)?;
    Ok(())
}

fn build_line(order_id: Uuid, input: NewOrderLine) -> ErpResult<SalesOrderLine> {
    validated_line(&input)?;
    let now = timestamp();
    let item_name = match input.item_name.trim() {
        "" => input.item_code.trim().to_string(),
        name => name.to_string(),
    };
    let mut line = SalesOrderLine {
        id: Uuid::new_v4(),
        order_id,
        item_code: input.item_code.trim().to_string(),
        item_name,
        quantity: input.quantity,
        unit_price: input.unit_price,
        total_amount: Decimal::ZERO,
        uom: input.uom,
        is_active: input.is_active,
        created_at: now,
        updated_at: now,
    };
    line.recompute_total();
    Ok(line)
}

fn load_order<S: Store>(store: &S, id: Uuid) -> ErpResult<SalesOrder> {
    store
        .get_sales_order(id)?
        .ok_or_else(|| ErpError::not_found("sales order", id))
}

/// Re-reads the order's lines and writes the recomputed header.
fn recompute_header<S: Store>(store: &S, mut order: SalesOrder) -> ErpResult<SalesOrder> {
    let lines = store.lines_for_order(order.id)?;
    order.recompute_amounts(&lines);
    order.updated_at = timestamp();
    store.update_sales_order(&order)?;
    Ok(order)
}

fn ensure_editable(order: &SalesOrder) -> ErpResult<()> {
    if order.status.is_terminal() {
        return Err(ErpError::invalid(
            "status",
            format!("{} is {} and can no longer be edited", order.document_no, order.status),
        ));
    }
    Ok(())
}

/// Reconciles after the header changed and returns the stored order.
fn finish<S: Store>(store: &S, config: &LedgerConfig, order_id: Uuid) -> ErpResult<SalesOrder> {
    reconcile_sales_order(store, config, order_id)?;
    load_order(store, order_id)
}

pub fn create_sales_order<S: Store>(
    store: &S,
    config: &LedgerConfig,
    input: NewSalesOrder,
) -> ErpResult<SalesOrder> {
    let order = store.atomic(|s| {
        let customer = s
            .get_partner(input.customer_id)?
            .ok_or_else(|| ErpError::invalid("customer", "does not exist"))?;
        if customer.bp_type == PartnerType::Supplier {
            return Err(ErpError::invalid(
                "customer",
                format!("{} is a supplier", customer.code),
            ));
        }
        non_negative("discount_amount", input.discount_amount)?;
        non_negative("tax_amount", input.tax_amount)?;

        let document_no = match input.document_no.as_deref().map(str::trim) {
            Some(no) if !no.is_empty() => {
                if s.find_sales_order_by_document_no(no)?.is_some() {
                    return Err(ErpError::invalid(
                        "document_no",
                        format!("sales order {no} already exists"),
                    ));
                }
                no.to_string()
            }
            _ => {
                let prefix = sales_order_prefix(input.document_date.year());
                next_document_number(
                    &prefix,
                    s.sales_order_numbers(&prefix)?,
                    SALES_ORDER_WIDTH,
                )?
            }
        };
        let currency = currency_code(
            input
                .currency
                .as_deref()
                .or(customer.currency.as_deref())
                .unwrap_or(&config.default_currency),
        )?;

        let now = timestamp();
        let mut order = SalesOrder {
            id: Uuid::new_v4(),
            document_no,
            document_date: input.document_date,
            delivery_date: input.delivery_date,
            customer_id: customer.id,
            currency,
            discount_amount: input.discount_amount,
            tax_amount: input.tax_amount,
            total_amount: Decimal::ZERO,
            payable_amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            due_amount: Decimal::ZERO,
            payment_method: None,
            payment_reference: None,
            payment_date: None,
            status: OrderStatus::Draft,
            remarks: input.remarks.clone(),
            created_at: now,
            updated_at: now,
        };
        let lines = input
            .lines
            .iter()
            .cloned()
            .map(|line| build_line(order.id, line))
            .collect::<ErpResult<Vec<_>>>()?;
        order.recompute_amounts(&lines);
        s.insert_sales_order(&order)?;
        for line in &lines {
            s.insert_order_line(line)?;
        }
        Ok(order)
    })?;
    log::info!(
        "created sales order {} payable {}",
        order.document_no,
        order.payable_amount
    );
    Ok(order)
}

pub fn update_sales_order<S: Store>(
    store: &S,
    config: &LedgerConfig,
    id: Uuid,
    update: SalesOrderUpdate,
) -> ErpResult<SalesOrder> {
    store.atomic(|s| {
        let mut order = load_order(s, id)?;
        ensure_editable(&order)?;
        order.document_date = update.document_date;
        order.delivery_date = update.delivery_date;
        order.discount_amount = non_negative("discount_amount", update.discount_amount)?;
        order.tax_amount = non_negative("tax_amount", update.tax_amount)?;
        order.remarks = update.remarks.clone();
        recompute_header(s, order)
    })?;
    finish(store, config, id)
}

/// Moves an order to `status`. Payment-driven statuses are recomputed right after, so
/// this is meant for `Draft`, `Open`, the delivery statuses, `Closed` and `Cancelled`.
pub fn set_order_status<S: Store>(
    store: &S,
    config: &LedgerConfig,
    id: Uuid,
    status: OrderStatus,
) -> ErpResult<SalesOrder> {
    store.atomic(|s| {
        let mut order = load_order(s, id)?;
        if config.sticky_terminal_states && order.status.is_terminal() && order.status != status
        {
            return Err(ErpError::invalid(
                "status",
                format!("{} is {}", order.document_no, order.status),
            ));
        }
        order.status = status;
        order.updated_at = timestamp();
        s.update_sales_order(&order)?;
        Ok(())
    })?;
    finish(store, config, id)
}

pub fn add_order_line<S: Store>(
    store: &S,
    config: &LedgerConfig,
    order_id: Uuid,
    input: NewOrderLine,
) -> ErpResult<SalesOrderLine> {
    let line = store.atomic(|s| {
        let order = load_order(s, order_id)?;
        ensure_editable(&order)?;
        let line = build_line(order_id, input)?;
        s.insert_order_line(&line)?;
        recompute_header(s, order)?;
        Ok(line)
    })?;
    finish(store, config, order_id)?;
    Ok(line)
}

pub fn update_order_line<S: Store>(
    store: &S,
    config: &LedgerConfig,
    line_id: Uuid,
    input: NewOrderLine,
) -> ErpResult<SalesOrderLine> {
    let line = store.atomic(|s| {
        let mut line = s
            .get_order_line(line_id)?
            .ok_or_else(|| ErpError::not_found("sales order line", line_id))?;
        let order = load_order(s, line.order_id)?;
        ensure_editable(&order)?;
        let rebuilt = build_line(line.order_id, input)?;
        line.item_code = rebuilt.item_code;
        line.item_name = rebuilt.item_name;
        line.quantity = rebuilt.quantity;
        line.unit_price = rebuilt.unit_price;
        line.total_amount = rebuilt.total_amount;
        line.uom = rebuilt.uom;
        line.is_active = rebuilt.is_active;
        line.updated_at = rebuilt.updated_at;
        s.update_order_line(&line)?;
        recompute_header(s, order)?;
        Ok(line)
    })?;
    finish(store, config, line.order_id)?;
    Ok(line)
}

pub fn remove_order_line<S: Store>(
    store: &S,
    config: &LedgerConfig,
    line_id: Uuid,
) -> ErpResult<SalesOrder> {
    let order_id = store.atomic(|s| {
        let line = s
            .get_order_line(line_id)?
            .ok_or_else(|| ErpError::not_found("sales order line", line_id))?;
        let order = load_order(s, line.order_id)?;
        ensure_editable(&order)?;
        s.delete_order_line(line_id)?;
        recompute_header(s, order)?;
        Ok(line.order_id)
    })?;
    finish(store, config, order_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(qty: i64, price: i64) -> NewOrderLine {
        NewOrderLine {
            item_code: "WIDGET".into(),
            item_name: String::new(),
            quantity: Decimal::from(qty),
            unit_price: Decimal::from(price),
            uom: None,
            is_active: true,
        }
    }

    #[test]
    fn test_build_line_defaults_name_to_code() {
        let line = build_line(Uuid::new_v4(), line(3, 250)).unwrap();
        assert_eq!(line.item_name, "WIDGET");
        assert_eq!(line.total_amount, Decimal::from(750));
    }

    #[test]
    fn test_line_quantity_must_be_positive() {
        let err = build_line(Uuid::new_v4(), line(0, 10)).unwrap_err();
        assert_eq!(err.as_validation().and_then(|v| v.field), Some("quantity"));
        assert!(build_line(Uuid::new_v4(), line(1, -1)).is_err());
    }
}
