//! Employees, salary components and salary structures.
//!
//! A structure's totals are never written by hand: every change to the structure or one
//! of its components ends in [`recalculate_salary_structure`], which also copies basic
//! and gross onto the employee.

use super::model::{ComponentType, Employee, SalaryComponent, SalaryStructure, StructureComponent};
use crate::error::{ErpError, ErpResult};
use crate::money::{non_negative, percentage_of, round_currency};
use crate::store::{timestamp, Store};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub joining_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSalaryComponent {
    pub code: String,
    pub name: String,
    pub component_type: ComponentType,
    #[serde(default)]
    pub is_taxable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStructureComponent {
    pub component_id: Uuid,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSalaryStructure {
    pub employee_id: Uuid,
    pub effective_date: NaiveDate,
    pub basic_salary: Decimal,
    #[serde(default)]
    pub components: Vec<NewStructureComponent>,
}

/// Result of [`calculate_totals`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryTotals {
    pub total_earnings: Decimal,
    pub total_deductions: Decimal,
    pub gross_salary: Decimal,
    pub net_salary: Decimal,
    /// Calculated amount per structure component id, inactive components included
    pub amounts: HashMap<Uuid, Decimal>,
}

/// Amount of one component against `base`: a set, non-zero percentage wins over the
/// fixed amount.
pub fn component_amount(component: &StructureComponent, base: Decimal) -> Decimal {
    match component.percentage {
        Some(percent) if !percent.is_zero() => round_currency(percentage_of(base, percent)),
        _ => round_currency(component.amount.unwrap_or_default()),
    }
}

/// Earnings are taken against basic; deductions against the gross that results from the
/// earnings. Total earnings include basic and equal the gross. Only active components
/// count toward the totals.
pub fn calculate_totals(
    basic_salary: Decimal,
    components: &[(StructureComponent, ComponentType)],
) -> SalaryTotals {
    let mut amounts = HashMap::with_capacity(components.len());

    let mut total_earnings = basic_salary;
    for (component, _) in components
        .iter()
        .filter(|(_, kind)| *kind == ComponentType::Earning)
    {
        let amount = component_amount(component, basic_salary);
        amounts.insert(component.id, amount);
        if component.is_active {
            total_earnings += amount;
        }
    }
    let gross_salary = total_earnings;

    let mut total_deductions = Decimal::ZERO;
    for (component, _) in components
        .iter()
        .filter(|(_, kind)| *kind == ComponentType::Deduction)
    {
        let amount = component_amount(component, gross_salary);
        amounts.insert(component.id, amount);
        if component.is_active {
            total_deductions += amount;
        }
    }

    SalaryTotals {
        total_earnings,
        total_deductions,
        gross_salary,
        net_salary: gross_salary - total_deductions,
        amounts,
    }
}

pub fn create_employee<S: Store>(store: &S, input: NewEmployee) -> ErpResult<Employee> {
    let employee_code = input.employee_code.trim().to_string();
    if employee_code.is_empty() {
        return Err(ErpError::invalid("employee_code", "is required"));
    }
    if input.first_name.trim().is_empty() {
        return Err(ErpError::invalid("first_name", "is required"));
    }
    if store
        .list_employees()?
        .iter()
        .any(|e| e.employee_code == employee_code)
    {
        return Err(ErpError::invalid(
            "employee_code",
            format!("employee {employee_code} already exists"),
        ));
    }
    let now = timestamp();
    let employee = Employee {
        id: Uuid::new_v4(),
        employee_code,
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        email: input.email,
        joining_date: input.joining_date,
        basic_salary: Decimal::ZERO,
        gross_salary: Decimal::ZERO,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    store.insert_employee(&employee)?;
    Ok(employee)
}

pub fn set_employee_active<S: Store>(store: &S, id: Uuid, active: bool) -> ErpResult<Employee> {
    let mut employee = store
        .get_employee(id)?
        .ok_or_else(|| ErpError::not_found("employee", id))?;
    employee.is_active = active;
    employee.updated_at = timestamp();
    store.update_employee(&employee)?;
    Ok(employee)
}

pub fn create_salary_component<S: Store>(
    store: &S,
    input: NewSalaryComponent,
) -> ErpResult<SalaryComponent> {
    let code = input.code.trim().to_string();
    if code.is_empty() {
        return Err(ErpError::invalid("code", "is required"));
    }
    if store
        .list_salary_components()?
        .iter()
        .any(|c| c.code == code)
    {
        return Err(ErpError::invalid(
            "code",
            format!("salary component {code} already exists"),
        ));
    }
    let now = timestamp();
    let component = SalaryComponent {
        id: Uuid::new_v4(),
        code,
        name: input.name.trim().to_string(),
        component_type: input.component_type,
        is_taxable: input.is_taxable,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    store.insert_salary_component(&component)?;
    Ok(component)
}

fn validate_component_input(input: &NewStructureComponent) -> ErpResult<()> {
    if input.amount.is_none() && input.percentage.is_none() {
        return Err(ErpError::invalid(
            "amount",
            "either an amount or a percentage is required",
        ));
    }
    if let Some(amount) = input.amount {
        non_negative("amount", amount)?;
    }
    if let Some(percent) = input.percentage {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(ErpError::invalid("percentage", "must be between 0 and 100"));
        }
    }
    Ok(())
}

/// Validates `input` for `structure_id`; `existing` is the row being edited.
fn build_structure_component<S: Store>(
    store: &S,
    structure_id: Uuid,
    input: &NewStructureComponent,
    existing: Option<&StructureComponent>,
) -> ErpResult<StructureComponent> {
    validate_component_input(input)?;
    if store.get_salary_component(input.component_id)?.is_none() {
        return Err(ErpError::invalid("component", "does not exist"));
    }
    let duplicate = store
        .components_for_structure(structure_id)?
        .into_iter()
        .any(|c| c.component_id == input.component_id && Some(c.id) != existing.map(|e| e.id));
    if duplicate {
        return Err(ErpError::invalid(
            "component",
            "is already part of this salary structure",
        ));
    }
    let now = timestamp();
    Ok(StructureComponent {
        id: existing.map_or_else(Uuid::new_v4, |e| e.id),
        structure_id,
        component_id: input.component_id,
        amount: input.amount,
        percentage: input.percentage,
        calculated_amount: existing.map_or(Decimal::ZERO, |e| e.calculated_amount),
        is_active: input.is_active,
        created_at: existing.map_or(now, |e| e.created_at),
        updated_at: now,
    })
}

/// Recomputes component amounts and structure totals, then syncs the employee.
pub fn recalculate_salary_structure<S: Store>(
    store: &S,
    structure_id: Uuid,
) -> ErpResult<SalaryStructure> {
    store.atomic(|s| {
        let mut structure = s
            .get_salary_structure(structure_id)?
            .ok_or_else(|| ErpError::not_found("salary structure", structure_id))?;
        let kinds: HashMap<Uuid, ComponentType> = s
            .list_salary_components()?
            .into_iter()
            .map(|c| (c.id, c.component_type))
            .collect();
        let components = s
            .components_for_structure(structure_id)?
            .into_iter()
            .map(|c| {
                let kind = kinds
                    .get(&c.component_id)
                    .copied()
                    .ok_or_else(|| ErpError::not_found("salary component", c.component_id))?;
                Ok((c, kind))
            })
            .collect::<ErpResult<Vec<_>>>()?;

        let totals = calculate_totals(structure.basic_salary, &components);
        let now = timestamp();
        for (mut component, _) in components {
            let amount = totals
                .amounts
                .get(&component.id)
                .copied()
                .unwrap_or_default();
            if component.calculated_amount != amount {
                component.calculated_amount = amount;
                component.updated_at = now;
                s.update_structure_component(&component)?;
            }
        }

        structure.total_earnings = totals.total_earnings;
        structure.total_deductions = totals.total_deductions;
        structure.gross_salary = totals.gross_salary;
        structure.net_salary = totals.net_salary;
        structure.updated_at = now;
        s.update_salary_structure(&structure)?;

        let mut employee = s
            .get_employee(structure.employee_id)?
            .ok_or_else(|| ErpError::not_found("employee", structure.employee_id))?;
        if employee.basic_salary != structure.basic_salary
            || employee.gross_salary != structure.gross_salary
        {
            employee.basic_salary = structure.basic_salary;
            employee.gross_salary = structure.gross_salary;
            employee.updated_at = now;
            s.update_employee(&employee)?;
        }
        log::debug!(
            "salary structure of {}: gross {} net {}",
            employee.employee_code,
            structure.gross_salary,
            structure.net_salary
        );
        Ok(structure)
    })
}

pub fn create_salary_structure<S: Store>(
    store: &S,
    input: NewSalaryStructure,
) -> ErpResult<SalaryStructure> {
    let structure_id = store.atomic(|s| {
        if s.get_employee(input.employee_id)?.is_none() {
            return Err(ErpError::invalid("employee", "does not exist"));
        }
        if s.find_structure_for_employee(input.employee_id)?.is_some() {
            return Err(ErpError::invalid(
                "employee",
                "already has a salary structure",
            ));
        }
        let now = timestamp();
        let structure = SalaryStructure {
            id: Uuid::new_v4(),
            employee_id: input.employee_id,
            effective_date: input.effective_date,
            basic_salary: round_currency(non_negative("basic_salary", input.basic_salary)?),
            total_earnings: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            gross_salary: Decimal::ZERO,
            net_salary: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        s.insert_salary_structure(&structure)?;
        for component in &input.components {
            let row = build_structure_component(s, structure.id, component, None)?;
            s.insert_structure_component(&row)?;
        }
        Ok(structure.id)
    })?;
    recalculate_salary_structure(store, structure_id)
}

pub fn update_salary_structure<S: Store>(
    store: &S,
    id: Uuid,
    effective_date: NaiveDate,
    basic_salary: Decimal,
) -> ErpResult<SalaryStructure> {
    let mut structure = store
        .get_salary_structure(id)?
        .ok_or_else(|| ErpError::not_found("salary structure", id))?;
    structure.effective_date = effective_date;
    structure.basic_salary = round_currency(non_negative("basic_salary", basic_salary)?);
    structure.updated_at = timestamp();
    store.update_salary_structure(&structure)?;
    recalculate_salary_structure(store, id)
}

pub fn add_structure_component<S: Store>(
    store: &S,
    structure_id: Uuid,
    input: NewStructureComponent,
) -> ErpResult<SalaryStructure> {
    store.atomic(|s| {
        if s.get_salary_structure(structure_id)?.is_none() {
            return Err(ErpError::not_found("salary structure", structure_id));
        }
        let row = build_structure_component(s, structure_id, &input, None)?;
        s.insert_structure_component(&row)?;
        Ok(())
    })?;
    recalculate_salary_structure(store, structure_id)
}

pub fn update_structure_component<S: Store>(
    store: &S,
    id: Uuid,
    input: NewStructureComponent,
) -> ErpResult<SalaryStructure> {
    let structure_id = store.atomic(|s| {
        let existing = s
            .get_structure_component(id)?
            .ok_or_else(|| ErpError::not_found("structure component", id))?;
        let row = build_structure_component(s, existing.structure_id, &input, Some(&existing))?;
        s.update_structure_component(&row)?;
        Ok(existing.structure_id)
    })?;
    recalculate_salary_structure(store, structure_id)
}

pub fn remove_structure_component<S: Store>(store: &S, id: Uuid) -> ErpResult<SalaryStructure> {
    let existing = store
        .get_structure_component(id)?
        .ok_or_else(|| ErpError::not_found("structure component", id))?;
    store.delete_structure_component(id)?;
    recalculate_salary_structure(store, existing.structure_id)
}
