//! Chart of accounts and cost centers.

use super::model::{Account, AccountCategory, AccountType, CostCenter};
use crate::error::{ErpError, ErpResult};
use crate::money::currency_code;
use crate::store::{timestamp, Store};
use serde::Deserialize;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAccountType {
    pub code: String,
    pub name: String,
    /// Inferred from the name when absent
    pub category: Option<AccountCategory>,
    /// Follows the category when absent
    pub is_debit: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub account_type_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCostCenter {
    pub code: String,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

fn required(field: &'static str, value: &str) -> ErpResult<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(ErpError::invalid(field, "is required"))
    } else {
        Ok(value.to_string())
    }
}

/// Walks the parent chain starting at `parent`; fails if it reaches `id` or loops.
fn ensure_acyclic(
    id: Uuid,
    parent: Option<Uuid>,
    parent_of: impl Fn(Uuid) -> ErpResult<Option<Option<Uuid>>>,
) -> ErpResult<()> {
    let mut seen = HashSet::new();
    let mut current = parent;
    while let Some(node) = current {
        if node == id || !seen.insert(node) {
            return Err(ErpError::invalid("parent", "would create a cycle"));
        }
        current = match parent_of(node)? {
            Some(next) => next,
            None => return Err(ErpError::invalid("parent", format!("{node} does not exist"))),
        };
    }
    Ok(())
}

pub fn create_account_type<S: Store>(store: &S, input: NewAccountType) -> ErpResult<AccountType> {
    let code = required("code", &input.code)?;
    let name = required("name", &input.name)?;
    if store
        .list_account_types()?
        .iter()
        .any(|existing| existing.code == code)
    {
        return Err(ErpError::invalid("code", format!("account type {code} already exists")));
    }
    let category = input
        .category
        .unwrap_or_else(|| AccountCategory::infer(&name));
    let now = timestamp();
    let account_type = AccountType {
        id: Uuid::new_v4(),
        code,
        name,
        is_debit: input.is_debit.unwrap_or_else(|| category.default_is_debit()),
        category,
        created_at: now,
        updated_at: now,
    };
    store.insert_account_type(&account_type)?;
    Ok(account_type)
}

fn validate_account<S: Store>(
    store: &S,
    id: Uuid,
    input: &NewAccount,
    default_currency: &str,
) -> ErpResult<(String, String, String)> {
    let code = required("code", &input.code)?;
    let name = required("name", &input.name)?;
    if store.get_account_type(input.account_type_id)?.is_none() {
        return Err(ErpError::invalid("account_type", "does not exist"));
    }
    if let Some(existing) = store.find_account_by_code(&code)? {
        if existing.id != id {
            return Err(ErpError::invalid("code", format!("account {code} already exists")));
        }
    }
    ensure_acyclic(id, input.parent_id, |node| {
        Ok(store.get_account(node)?.map(|a| a.parent_id))
    })?;
    let currency = currency_code(input.currency.as_deref().unwrap_or(default_currency))?;
    Ok((code, name, currency))
}

pub fn create_account<S: Store>(
    store: &S,
    input: NewAccount,
    default_currency: &str,
) -> ErpResult<Account> {
    let id = Uuid::new_v4();
    let (code, name, currency) = validate_account(store, id, &input, default_currency)?;
    let now = timestamp();
    let account = Account {
        id,
        code,
        name,
        account_type_id: input.account_type_id,
        parent_id: input.parent_id,
        currency,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    store.insert_account(&account)?;
    log::info!("created account {} {}", account.code, account.name);
    Ok(account)
}

pub fn update_account<S: Store>(
    store: &S,
    id: Uuid,
    input: NewAccount,
    default_currency: &str,
) -> ErpResult<Account> {
    let mut account = store
        .get_account(id)?
        .ok_or_else(|| ErpError::not_found("account", id))?;
    let (code, name, currency) = validate_account(store, id, &input, default_currency)?;
    account.code = code;
    account.name = name;
    account.account_type_id = input.account_type_id;
    account.parent_id = input.parent_id;
    account.currency = currency;
    account.updated_at = timestamp();
    store.update_account(&account)?;
    Ok(account)
}

pub fn set_account_active<S: Store>(store: &S, id: Uuid, active: bool) -> ErpResult<Account> {
    let mut account = store
        .get_account(id)?
        .ok_or_else(|| ErpError::not_found("account", id))?;
    account.is_active = active;
    account.updated_at = timestamp();
    store.update_account(&account)?;
    Ok(account)
}

/// Deletes an account nothing refers to; accounts with postings or children are kept.
pub fn delete_account<S: Store>(store: &S, id: Uuid) -> ErpResult<()> {
    let account = store
        .get_account(id)?
        .ok_or_else(|| ErpError::not_found("account", id))?;
    if store.account_in_use(id)? {
        return Err(ErpError::invalid(
            "account",
            format!(
                "{} is referenced by journal lines, ledger rows, payments or child accounts",
                account.code
            ),
        ));
    }
    store.delete_account(id)?;
    Ok(())
}

/// The account together with its type
pub fn account_with_type<S: Store>(store: &S, id: Uuid) -> ErpResult<(Account, AccountType)> {
    let account = store
        .get_account(id)?
        .ok_or_else(|| ErpError::not_found("account", id))?;
    let account_type = store
        .get_account_type(account.account_type_id)?
        .ok_or_else(|| ErpError::not_found("account type", account.account_type_id))?;
    Ok((account, account_type))
}

fn validate_cost_center<S: Store>(
    store: &S,
    id: Uuid,
    input: &NewCostCenter,
) -> ErpResult<(String, String)> {
    let code = required("code", &input.code)?;
    let name = required("name", &input.name)?;
    if let Some(existing) = store.find_cost_center_by_code(&code)? {
        if existing.id != id {
            return Err(ErpError::invalid("code", format!("cost center {code} already exists")));
        }
    }
    ensure_acyclic(id, input.parent_id, |node| {
        Ok(store.get_cost_center(node)?.map(|c| c.parent_id))
    })?;
    Ok((code, name))
}

pub fn create_cost_center<S: Store>(store: &S, input: NewCostCenter) -> ErpResult<CostCenter> {
    let id = Uuid::new_v4();
    let (code, name) = validate_cost_center(store, id, &input)?;
    let now = timestamp();
    let cost_center = CostCenter {
        id,
        code,
        name,
        parent_id: input.parent_id,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    store.insert_cost_center(&cost_center)?;
    Ok(cost_center)
}

pub fn update_cost_center<S: Store>(
    store: &S,
    id: Uuid,
    input: NewCostCenter,
) -> ErpResult<CostCenter> {
    let mut cost_center = store
        .get_cost_center(id)?
        .ok_or_else(|| ErpError::not_found("cost center", id))?;
    let (code, name) = validate_cost_center(store, id, &input)?;
    cost_center.code = code;
    cost_center.name = name;
    cost_center.parent_id = input.parent_id;
    cost_center.updated_at = timestamp();
    store.update_cost_center(&cost_center)?;
    Ok(cost_center)
}

pub fn set_cost_center_active<S: Store>(
    store: &S,
    id: Uuid,
    active: bool,
) -> ErpResult<CostCenter> {
    let mut cost_center = store
        .get_cost_center(id)?
        .ok_or_else(|| ErpError::not_found("cost center", id))?;
    cost_center.is_active = active;
    cost_center.updated_at = timestamp();
    store.update_cost_center(&cost_center)?;
    Ok(cost_center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AccountingStore, MemoryStore};

    fn asset_type(store: &MemoryStore) -> AccountType {
        create_account_type(
            store,
            NewAccountType {
                code: "AST".into(),
                name: "Current Assets".into(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn account(store: &MemoryStore, code: &str, parent: Option<Uuid>) -> Account {
        let account_type = store.list_account_types().unwrap().remove(0);
        create_account(
            store,
            NewAccount {
                code: code.into(),
                name: format!("Account {code}"),
                account_type_id: account_type.id,
                parent_id: parent,
                currency: None,
            },
            "USD",
        )
        .unwrap()
    }

    #[test]
    fn test_account_type_defaults_from_name() {
        let store = MemoryStore::new();
        let ty = asset_type(&store);
        assert_eq!(ty.category, AccountCategory::Asset);
        assert!(ty.is_debit);

        let revenue = create_account_type(
            &store,
            NewAccountType {
                code: "REV".into(),
                name: "Sales Revenue".into(),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!revenue.is_debit);
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let store = MemoryStore::new();
        asset_type(&store);
        let root = account(&store, "1000", None);
        let child = account(&store, "1100", Some(root.id));

        let mut input = NewAccount {
            code: root.code.clone(),
            name: root.name.clone(),
            account_type_id: root.account_type_id,
            parent_id: Some(child.id),
            currency: None,
        };
        let err = update_account(&store, root.id, input.clone(), "USD").unwrap_err();
        assert_eq!(err.as_validation().and_then(|v| v.field), Some("parent"));

        input.parent_id = Some(root.id);
        assert!(update_account(&store, root.id, input, "USD").is_err());
    }

    #[test]
    fn test_account_with_children_cannot_be_deleted() {
        let store = MemoryStore::new();
        asset_type(&store);
        let root = account(&store, "1000", None);
        let child = account(&store, "1100", Some(root.id));
        assert!(delete_account(&store, root.id).is_err());
        delete_account(&store, child.id).unwrap();
        delete_account(&store, root.id).unwrap();
        assert!(store.list_accounts().unwrap().is_empty());
    }

    #[test]
    fn test_cost_center_codes_unique() {
        let store = MemoryStore::new();
        let input = NewCostCenter {
            code: "HQ".into(),
            name: "Head office".into(),
            parent_id: None,
        };
        create_cost_center(&store, input.clone()).unwrap();
        assert!(create_cost_center(&store, input).is_err());
    }
}
