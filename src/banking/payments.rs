//! Payments, payment lines and payment methods.
//!
//! Every write that touches a payment linked to a sales order reconciles that order once
//! the write has committed. A payment moved from one order to another reconciles both.

use super::model::{Payment, PaymentLine, PaymentMethod, PaymentType};
use super::reconciliation::reconcile_sales_order;
use crate::config::LedgerConfig;
use crate::error::{ErpError, ErpResult};
use crate::money::{currency_code, round_currency};
use crate::numbering::{next_document_number, PAYMENT_PREFIX, SEQUENCE_WIDTH};
use crate::store::{timestamp, Store};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

pub const AMOUNT_EXCEEDS_ORDER: &str =
    "The payment amount exceeds the total amount of the sales order.";

#[derive(Debug, Clone, Deserialize)]
pub struct NewPaymentLine {
    pub account_id: Uuid,
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Input for [`create_payment`] and [`update_payment`]
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    /// Numbered `PAY-NNNNNN` when absent; kept as is on update when absent
    pub doc_num: Option<String>,
    /// Defaults to the sales order's customer
    pub business_partner_id: Option<Uuid>,
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub payment_date: NaiveDate,
    pub payment_method_id: Uuid,
    pub sales_order_id: Option<Uuid>,
    pub reference: Option<String>,
    pub remarks: Option<String>,
    #[serde(default)]
    pub lines: Vec<NewPaymentLine>,
}

pub fn create_payment_method<S: Store>(
    store: &S,
    name: &str,
    description: Option<String>,
) -> ErpResult<PaymentMethod> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ErpError::invalid("name", "is required"));
    }
    if store.find_payment_method_by_name(name)?.is_some() {
        return Err(ErpError::invalid(
            "name",
            format!("payment method {name} already exists"),
        ));
    }
    let now = timestamp();
    let method = PaymentMethod {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description,
        created_at: now,
        updated_at: now,
    };
    store.insert_payment_method(&method)?;
    Ok(method)
}

/// Rejects `amount` when the order's other incoming payments plus `amount` would exceed
/// the order total. `exclude` is the payment being edited.
pub fn validate_payment_amount<S: Store>(
    store: &S,
    order_id: Uuid,
    amount: Decimal,
    exclude: Option<Uuid>,
) -> ErpResult<()> {
    let order = store
        .get_sales_order(order_id)?
        .ok_or_else(|| ErpError::invalid("sales_order", "does not exist"))?;
    let already_paid: Decimal = store
        .payments_for_order(order_id)?
        .iter()
        .filter(|p| p.is_incoming() && Some(p.id) != exclude)
        .map(|p| p.amount)
        .sum();
    if already_paid + amount > order.total_amount {
        return Err(ErpError::invalid("amount", AMOUNT_EXCEEDS_ORDER));
    }
    Ok(())
}

/// Field values shared by create and update, after validation
struct CheckedPayment {
    business_partner_id: Uuid,
    amount: Decimal,
    currency: String,
}

fn check_payment<S: Store>(
    store: &S,
    config: &LedgerConfig,
    input: &NewPayment,
    exclude: Option<Uuid>,
) -> ErpResult<CheckedPayment> {
    let amount = round_currency(input.amount);
    if amount <= Decimal::ZERO {
        return Err(ErpError::invalid("amount", "must be positive"));
    }
    if store.get_payment_method(input.payment_method_id)?.is_none() {
        return Err(ErpError::invalid("payment_method", "does not exist"));
    }

    let order = match input.sales_order_id {
        Some(order_id) => {
            validate_payment_amount(store, order_id, amount, exclude)?;
            store.get_sales_order(order_id)?
        }
        None => None,
    };
    let business_partner_id = input
        .business_partner_id
        .or(order.as_ref().map(|o| o.customer_id))
        .ok_or_else(|| ErpError::invalid("business_partner", "is required"))?;
    if store.get_partner(business_partner_id)?.is_none() {
        return Err(ErpError::invalid("business_partner", "does not exist"));
    }
    let currency = currency_code(
        input
            .currency
            .as_deref()
            .or(order.as_ref().map(|o| o.currency.as_str()))
            .unwrap_or(&config.default_currency),
    )?;

    let allocated: Decimal = input.lines.iter().map(|l| round_currency(l.amount)).sum();
    if allocated > amount {
        return Err(ErpError::invalid(
            "lines",
            format!("allocate {allocated}, more than the payment amount {amount}"),
        ));
    }

    Ok(CheckedPayment {
        business_partner_id,
        amount,
        currency,
    })
}

fn build_line<S: Store>(
    store: &S,
    payment_id: Uuid,
    input: &NewPaymentLine,
) -> ErpResult<PaymentLine> {
    let amount = round_currency(input.amount);
    if amount <= Decimal::ZERO {
        return Err(ErpError::invalid("amount", "must be positive"));
    }
    if store.get_account(input.account_id)?.is_none() {
        return Err(ErpError::invalid("account", "does not exist"));
    }
    let now = timestamp();
    Ok(PaymentLine {
        id: Uuid::new_v4(),
        payment_id,
        account_id: input.account_id,
        amount,
        description: input.description.clone(),
        created_at: now,
        updated_at: now,
    })
}

fn load_payment<S: Store>(store: &S, id: Uuid) -> ErpResult<Payment> {
    store
        .get_payment(id)?
        .ok_or_else(|| ErpError::not_found("payment", id))
}

/// Reconciles every distinct order in `orders`.
fn reconcile_orders<S: Store>(
    store: &S,
    config: &LedgerConfig,
    orders: &[Option<Uuid>],
) -> ErpResult<()> {
    let mut done = Vec::with_capacity(orders.len());
    for order_id in orders.iter().flatten() {
        if !done.contains(order_id) {
            reconcile_sales_order(store, config, *order_id)?;
            done.push(*order_id);
        }
    }
    Ok(())
}

pub fn create_payment<S: Store>(
    store: &S,
    config: &LedgerConfig,
    input: NewPayment,
) -> ErpResult<Payment> {
    let payment = store.atomic(|s| {
        let checked = check_payment(s, config, &input, None)?;
        let doc_num = match input.doc_num.as_deref().map(str::trim) {
            Some(doc_num) if !doc_num.is_empty() => {
                if s.find_payment_by_doc_num(doc_num)?.is_some() {
                    return Err(ErpError::invalid(
                        "doc_num",
                        format!("payment {doc_num} already exists"),
                    ));
                }
                doc_num.to_string()
            }
            _ => next_document_number(
                PAYMENT_PREFIX,
                s.payment_doc_nums(PAYMENT_PREFIX)?,
                SEQUENCE_WIDTH,
            )?,
        };

        let now = timestamp();
        let payment = Payment {
            id: Uuid::new_v4(),
            doc_num,
            business_partner_id: checked.business_partner_id,
            payment_type: input.payment_type,
            amount: checked.amount,
            currency: checked.currency,
            payment_date: input.payment_date,
            payment_method_id: input.payment_method_id,
            sales_order_id: input.sales_order_id,
            reference: input.reference.clone(),
            remarks: input.remarks.clone(),
            is_reconciled: false,
            created_at: now,
            updated_at: now,
        };
        s.insert_payment(&payment)?;
        for line in &input.lines {
            s.insert_payment_line(&build_line(s, payment.id, line)?)?;
        }
        Ok(payment)
    })?;
    log::info!(
        "recorded {} payment {} of {} {}",
        payment.payment_type,
        payment.doc_num,
        payment.amount,
        payment.currency
    );
    reconcile_orders(store, config, &[payment.sales_order_id])?;
    Ok(payment)
}

/// Rewrites a payment's header. Lines are kept unless `input.lines` is non-empty, in
/// which case they are replaced.
pub fn update_payment<S: Store>(
    store: &S,
    config: &LedgerConfig,
    id: Uuid,
    input: NewPayment,
) -> ErpResult<Payment> {
    let (previous_order, payment) = store.atomic(|s| {
        let mut payment = load_payment(s, id)?;
        let previous_order = payment.sales_order_id;
        let checked = check_payment(s, config, &input, Some(id))?;

        if let Some(doc_num) = input.doc_num.as_deref().map(str::trim) {
            if !doc_num.is_empty() && doc_num != payment.doc_num {
                if s.find_payment_by_doc_num(doc_num)?.is_some() {
                    return Err(ErpError::invalid(
                        "doc_num",
                        format!("payment {doc_num} already exists"),
                    ));
                }
                payment.doc_num = doc_num.to_string();
            }
        }
        if !input.lines.is_empty() {
            for line in s.lines_for_payment(id)? {
                s.delete_payment_line(line.id)?;
            }
            for line in &input.lines {
                s.insert_payment_line(&build_line(s, id, line)?)?;
            }
        } else {
            let allocated: Decimal = s.lines_for_payment(id)?.iter().map(|l| l.amount).sum();
            if allocated > checked.amount {
                return Err(ErpError::invalid(
                    "amount",
                    format!("is less than the {allocated} already allocated to lines"),
                ));
            }
        }

        payment.business_partner_id = checked.business_partner_id;
        payment.payment_type = input.payment_type;
        payment.amount = checked.amount;
        payment.currency = checked.currency;
        payment.payment_date = input.payment_date;
        payment.payment_method_id = input.payment_method_id;
        payment.sales_order_id = input.sales_order_id;
        payment.reference = input.reference.clone();
        payment.remarks = input.remarks.clone();
        payment.updated_at = timestamp();
        s.update_payment(&payment)?;
        Ok((previous_order, payment))
    })?;
    reconcile_orders(store, config, &[previous_order, payment.sales_order_id])?;
    Ok(payment)
}

pub fn delete_payment<S: Store>(store: &S, config: &LedgerConfig, id: Uuid) -> ErpResult<()> {
    let payment = store.atomic(|s| {
        let payment = load_payment(s, id)?;
        s.delete_payment(id)?;
        Ok(payment)
    })?;
    log::info!("deleted payment {}", payment.doc_num);
    reconcile_orders(store, config, &[payment.sales_order_id])
}

pub fn set_payment_reconciled<S: Store>(store: &S, id: Uuid, reconciled: bool) -> ErpResult<Payment> {
    let mut payment = load_payment(store, id)?;
    payment.is_reconciled = reconciled;
    payment.updated_at = timestamp();
    store.update_payment(&payment)?;
    Ok(payment)
}

pub fn add_payment_line<S: Store>(
    store: &S,
    payment_id: Uuid,
    input: NewPaymentLine,
) -> ErpResult<PaymentLine> {
    store.atomic(|s| {
        let payment = load_payment(s, payment_id)?;
        let line = build_line(s, payment_id, &input)?;
        let allocated: Decimal = s
            .lines_for_payment(payment_id)?
            .iter()
            .map(|l| l.amount)
            .sum();
        if allocated + line.amount > payment.amount {
            return Err(ErpError::invalid(
                "amount",
                format!(
                    "only {} of {} is left to allocate",
                    payment.amount - allocated,
                    payment.doc_num
                ),
            ));
        }
        s.insert_payment_line(&line)?;
        Ok(line)
    })
}

pub fn remove_payment_line<S: Store>(store: &S, line_id: Uuid) -> ErpResult<()> {
    if !store.delete_payment_line(line_id)? {
        return Err(ErpError::not_found("payment line", line_id));
    }
    Ok(())
}
