//! Business partner master data: customers, suppliers and leads.

use crate::error::{ErpError, ErpResult};
use crate::money::{currency_code, non_negative};
use crate::store::{timestamp, Store};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum PartnerType {
        Customer => "C",
        Supplier => "S",
        Lead => "L",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessPartner {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub bp_type: PartnerType,
    pub currency: Option<String>,
    pub credit_limit: Decimal,
    pub balance: Decimal,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input for [`create_partner`] and [`update_partner`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBusinessPartner {
    pub code: String,
    pub name: String,
    pub bp_type: Option<PartnerType>,
    pub currency: Option<String>,
    pub credit_limit: Decimal,
    pub phone: Option<String>,
    pub email: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewBusinessPartner {
    fn validated(self) -> ErpResult<NewBusinessPartner> {
        let code = self.code.trim().to_string();
        if code.is_empty() {
            return Err(ErpError::invalid("code", "is required"));
        }
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ErpError::invalid("name", "is required"));
        }
        let email = blank_to_none(self.email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(ErpError::invalid("email", "is not a valid email address"));
            }
        }
        let currency = blank_to_none(self.currency)
            .map(|c| currency_code(&c))
            .transpose()?;
        Ok(NewBusinessPartner {
            code,
            name,
            bp_type: self.bp_type,
            currency,
            credit_limit: non_negative("credit_limit", self.credit_limit)?,
            phone: blank_to_none(self.phone),
            email,
        })
    }
}

fn ensure_code_free<S: Store>(store: &S, code: &str, id: Uuid) -> ErpResult<()> {
    match store.find_partner_by_code(code)? {
        Some(existing) if existing.id != id => Err(ErpError::invalid(
            "code",
            format!("business partner {code} already exists"),
        )),
        _ => Ok(()),
    }
}

pub fn create_partner<S: Store>(store: &S, input: NewBusinessPartner) -> ErpResult<BusinessPartner> {
    let input = input.validated()?;
    let id = Uuid::new_v4();
    ensure_code_free(store, &input.code, id)?;

    let now = timestamp();
    let partner = BusinessPartner {
        id,
        code: input.code,
        name: input.name,
        bp_type: input.bp_type.unwrap_or(PartnerType::Customer),
        currency: input.currency,
        credit_limit: input.credit_limit,
        balance: Decimal::ZERO,
        phone: input.phone,
        email: input.email,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    store.insert_partner(&partner)?;
    log::info!("created business partner {}", partner.code);
    Ok(partner)
}

pub fn update_partner<S: Store>(
    store: &S,
    id: Uuid,
    input: NewBusinessPartner,
) -> ErpResult<BusinessPartner> {
    let mut partner = store
        .get_partner(id)?
        .ok_or_else(|| ErpError::not_found("business partner", id))?;
    let input = input.validated()?;
    ensure_code_free(store, &input.code, id)?;

    partner.code = input.code;
    partner.name = input.name;
    if let Some(bp_type) = input.bp_type {
        partner.bp_type = bp_type;
    }
    partner.currency = input.currency;
    partner.credit_limit = input.credit_limit;
    partner.phone = input.phone;
    partner.email = input.email;
    partner.updated_at = timestamp();
    store.update_partner(&partner)?;
    Ok(partner)
}

pub fn set_partner_active<S: Store>(store: &S, id: Uuid, active: bool) -> ErpResult<BusinessPartner> {
    let mut partner = store
        .get_partner(id)?
        .ok_or_else(|| ErpError::not_found("business partner", id))?;
    partner.is_active = active;
    partner.updated_at = timestamp();
    store.update_partner(&partner)?;
    Ok(partner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, PartnerStore};

    fn input(code: &str) -> NewBusinessPartner {
        NewBusinessPartner {
            code: code.to_string(),
            name: "Acme Trading".to_string(),
            email: Some("billing@acme.test".to_string()),
            currency: Some("usd".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_defaults_to_customer() {
        let store = MemoryStore::new();
        let partner = create_partner(&store, input("C001")).unwrap();
        assert_eq!(partner.bp_type, PartnerType::Customer);
        assert_eq!(partner.currency.as_deref(), Some("USD"));
        assert!(partner.is_active);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let store = MemoryStore::new();
        create_partner(&store, input("C001")).unwrap();
        let err = create_partner(&store, input("C001")).unwrap_err();
        assert_eq!(err.as_validation().and_then(|v| v.field), Some("code"));
    }

    #[test]
    fn test_bad_email_rejected() {
        let store = MemoryStore::new();
        let mut bad = input("C002");
        bad.email = Some("nobody".into());
        assert!(create_partner(&store, bad).is_err());
    }

    #[test]
    fn test_deactivate() {
        let store = MemoryStore::new();
        let partner = create_partner(&store, input("C003")).unwrap();
        let partner = set_partner_active(&store, partner.id, false).unwrap();
        assert!(!store.get_partner(partner.id).unwrap().unwrap().is_active);
    }
}
