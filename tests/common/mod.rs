//! Fixtures shared by the service-level tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use ledgerguard::accounting::chart::{create_account, create_account_type, NewAccount, NewAccountType};
use ledgerguard::accounting::journal::{create_journal_entry, NewJournalEntry, NewJournalLine, SavedJournal};
use ledgerguard::accounting::AccountCategory;
use ledgerguard::banking::payments::{create_payment, create_payment_method, NewPayment};
use ledgerguard::banking::{Payment, PaymentType};
use ledgerguard::partners::{create_partner, BusinessPartner, NewBusinessPartner, PartnerType};
use ledgerguard::sales::{create_sales_order, NewOrderLine, NewSalesOrder, SalesOrder};
use ledgerguard::{ErpResult, LedgerConfig, Store};
use rust_decimal::Decimal;
use uuid::Uuid;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

pub fn config() -> LedgerConfig {
    LedgerConfig::default()
}

/// Accounts used by the ledger tests
pub struct Chart {
    pub cash: Uuid,
    pub receivable: Uuid,
    pub payable: Uuid,
    pub capital: Uuid,
    pub sales: Uuid,
    pub rent: Uuid,
}

fn account<S: Store>(store: &S, type_id: Uuid, code: &str, name: &str) -> Uuid {
    create_account(
        store,
        NewAccount {
            code: code.into(),
            name: name.into(),
            account_type_id: type_id,
            ..NewAccount::default()
        },
        "USD",
    )
    .expect("account")
    .id
}

fn account_type<S: Store>(store: &S, code: &str, category: AccountCategory) -> Uuid {
    create_account_type(
        store,
        NewAccountType {
            code: code.into(),
            name: category.to_string(),
            category: Some(category),
            is_debit: None,
        },
    )
    .expect("account type")
    .id
}

pub fn chart<S: Store>(store: &S) -> Chart {
    let asset = account_type(store, "AST", AccountCategory::Asset);
    let liability = account_type(store, "LIA", AccountCategory::Liability);
    let equity = account_type(store, "EQT", AccountCategory::Equity);
    let revenue = account_type(store, "REV", AccountCategory::Revenue);
    let expense = account_type(store, "EXP", AccountCategory::Expense);
    Chart {
        cash: account(store, asset, "1000", "Cash"),
        receivable: account(store, asset, "1100", "Accounts Receivable"),
        payable: account(store, liability, "2000", "Accounts Payable"),
        capital: account(store, equity, "3000", "Owner Capital"),
        sales: account(store, revenue, "4000", "Sales"),
        rent: account(store, expense, "5000", "Rent"),
    }
}

pub fn line(account_id: Uuid, debit: i64, credit: i64) -> NewJournalLine {
    NewJournalLine {
        account_id,
        debit_amount: dec(debit),
        credit_amount: dec(credit),
        description: None,
    }
}

pub fn journal<S: Store>(
    store: &S,
    posting_date: NaiveDate,
    lines: Vec<NewJournalLine>,
    is_posted: bool,
) -> ErpResult<SavedJournal> {
    create_journal_entry(
        store,
        &config(),
        NewJournalEntry {
            doc_num: None,
            posting_date,
            reference: None,
            remarks: None,
            currency: None,
            cost_center_id: None,
            is_posted,
            lines,
        },
    )
}

pub fn customer<S: Store>(store: &S, code: &str) -> BusinessPartner {
    create_partner(
        store,
        NewBusinessPartner {
            code: code.into(),
            name: format!("Customer {code}"),
            bp_type: Some(PartnerType::Customer),
            ..NewBusinessPartner::default()
        },
    )
    .expect("customer")
}

/// A draft order with one line worth `total`
pub fn order<S: Store>(store: &S, customer_id: Uuid, total: i64) -> SalesOrder {
    create_sales_order(
        store,
        &config(),
        NewSalesOrder {
            document_no: None,
            document_date: date(2024, 3, 1),
            delivery_date: None,
            customer_id,
            currency: None,
            discount_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            remarks: None,
            lines: vec![NewOrderLine {
                item_code: "ITEM-1".into(),
                item_name: "Widget".into(),
                quantity: Decimal::ONE,
                unit_price: dec(total),
                uom: None,
                is_active: true,
            }],
        },
    )
    .expect("sales order")
}

pub fn payment_method<S: Store>(store: &S, name: &str) -> Uuid {
    create_payment_method(store, name, None)
        .expect("payment method")
        .id
}

pub fn new_payment(method: Uuid, order_id: Option<Uuid>, amount: i64, day: u32) -> NewPayment {
    NewPayment {
        doc_num: None,
        business_partner_id: None,
        payment_type: PaymentType::Incoming,
        amount: dec(amount),
        currency: None,
        payment_date: date(2024, 3, day),
        payment_method_id: method,
        sales_order_id: order_id,
        reference: None,
        remarks: None,
        lines: Vec::new(),
    }
}

pub fn pay<S: Store>(store: &S, method: Uuid, order_id: Uuid, amount: i64, day: u32) -> ErpResult<Payment> {
    create_payment(store, &config(), new_payment(method, Some(order_id), amount, day))
}
