//! Salary structure totals and their sync onto the employee.

mod common;

use common::*;
use ledgerguard::hrm::{
    add_structure_component, create_employee, create_salary_component, create_salary_structure,
    remove_structure_component, update_salary_structure, update_structure_component,
    ComponentType, Employee, NewEmployee, NewSalaryComponent, NewSalaryStructure,
    NewStructureComponent, SalaryComponent,
};
use ledgerguard::store::HrmStore;
use ledgerguard::MemoryStore;
use rust_decimal::Decimal;

fn employee(store: &MemoryStore, code: &str) -> Employee {
    create_employee(
        store,
        NewEmployee {
            employee_code: code.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: None,
            joining_date: date(2023, 6, 1),
        },
    )
    .unwrap()
}

fn component(store: &MemoryStore, code: &str, component_type: ComponentType) -> SalaryComponent {
    create_salary_component(
        store,
        NewSalaryComponent {
            code: code.into(),
            name: code.into(),
            component_type,
            is_taxable: false,
        },
    )
    .unwrap()
}

fn percent(component: &SalaryComponent, value: i64) -> NewStructureComponent {
    NewStructureComponent {
        component_id: component.id,
        amount: None,
        percentage: Some(dec(value)),
        is_active: true,
    }
}

fn fixed(component: &SalaryComponent, value: i64, is_active: bool) -> NewStructureComponent {
    NewStructureComponent {
        component_id: component.id,
        amount: Some(dec(value)),
        percentage: None,
        is_active,
    }
}

#[test]
fn test_structure_totals_and_employee_sync() {
    let store = MemoryStore::new();
    let ada = employee(&store, "E-001");
    let hra = component(&store, "HRA", ComponentType::Earning);
    let pf = component(&store, "PF", ComponentType::Deduction);
    let transport = component(&store, "TRN", ComponentType::Earning);

    let structure = create_salary_structure(
        &store,
        NewSalaryStructure {
            employee_id: ada.id,
            effective_date: date(2024, 1, 1),
            basic_salary: dec(50_000),
            components: vec![percent(&hra, 10), percent(&pf, 5), fixed(&transport, 1_500, false)],
        },
    )
    .unwrap();

    assert_eq!(structure.total_earnings, dec(55_000));
    assert_eq!(structure.gross_salary, dec(55_000));
    assert_eq!(structure.total_deductions, dec(2_750));
    assert_eq!(structure.net_salary, dec(52_250));

    let stored = store.get_employee(ada.id).unwrap().unwrap();
    assert_eq!(stored.basic_salary, dec(50_000));
    assert_eq!(stored.gross_salary, dec(55_000));

    let rows = store.components_for_structure(structure.id).unwrap();
    let amount_of = |id| rows.iter().find(|r| r.component_id == id).unwrap().calculated_amount;
    assert_eq!(amount_of(hra.id), dec(5_000));
    assert_eq!(amount_of(pf.id), dec(2_750));
    assert_eq!(amount_of(transport.id), dec(1_500));
}

#[test]
fn test_basic_change_recalculates() {
    let store = MemoryStore::new();
    let ada = employee(&store, "E-001");
    let hra = component(&store, "HRA", ComponentType::Earning);
    let pf = component(&store, "PF", ComponentType::Deduction);
    let structure = create_salary_structure(
        &store,
        NewSalaryStructure {
            employee_id: ada.id,
            effective_date: date(2024, 1, 1),
            basic_salary: dec(50_000),
            components: vec![percent(&hra, 10), percent(&pf, 5)],
        },
    )
    .unwrap();

    let raised = update_salary_structure(&store, structure.id, date(2024, 7, 1), dec(60_000)).unwrap();
    assert_eq!(raised.gross_salary, dec(66_000));
    assert_eq!(raised.total_deductions, dec(3_300));
    assert_eq!(raised.net_salary, dec(62_700));
    assert_eq!(store.get_employee(ada.id).unwrap().unwrap().gross_salary, dec(66_000));
}

#[test]
fn test_component_edits_recalculate() {
    let store = MemoryStore::new();
    let ada = employee(&store, "E-001");
    let hra = component(&store, "HRA", ComponentType::Earning);
    let bonus = component(&store, "BON", ComponentType::Earning);
    let tax = component(&store, "TAX", ComponentType::Deduction);
    let structure = create_salary_structure(
        &store,
        NewSalaryStructure {
            employee_id: ada.id,
            effective_date: date(2024, 1, 1),
            basic_salary: dec(10_000),
            components: vec![percent(&hra, 20)],
        },
    )
    .unwrap();
    assert_eq!(structure.gross_salary, dec(12_000));

    let with_bonus = add_structure_component(&store, structure.id, fixed(&bonus, 500, true)).unwrap();
    assert_eq!(with_bonus.total_earnings, dec(12_500));

    let with_tax = add_structure_component(&store, structure.id, percent(&tax, 10)).unwrap();
    assert_eq!(with_tax.total_deductions, dec(1_250));
    assert_eq!(with_tax.net_salary, dec(11_250));

    // a zero percentage falls back to the fixed amount
    let hra_row = store
        .components_for_structure(structure.id)
        .unwrap()
        .into_iter()
        .find(|c| c.component_id == hra.id)
        .unwrap();
    let flat = update_structure_component(
        &store,
        hra_row.id,
        NewStructureComponent {
            component_id: hra.id,
            amount: Some(dec(1_000)),
            percentage: Some(Decimal::ZERO),
            is_active: true,
        },
    )
    .unwrap();
    assert_eq!(flat.total_earnings, dec(11_500));
    assert_eq!(flat.gross_salary, dec(11_500));

    let without_hra = remove_structure_component(&store, hra_row.id).unwrap();
    assert_eq!(without_hra.total_earnings, dec(10_500));
    assert_eq!(without_hra.total_deductions, dec(1_050));
}

#[test]
fn test_structure_rules() {
    let store = MemoryStore::new();
    let ada = employee(&store, "E-001");
    let hra = component(&store, "HRA", ComponentType::Earning);
    let input = |components| NewSalaryStructure {
        employee_id: ada.id,
        effective_date: date(2024, 1, 1),
        basic_salary: dec(1_000),
        components,
    };

    assert!(create_salary_structure(&store, input(vec![percent(&hra, 101)])).is_err());
    assert!(create_salary_structure(&store, input(vec![percent(&hra, 5), percent(&hra, 6)])).is_err());
    let empty = NewStructureComponent {
        component_id: hra.id,
        amount: None,
        percentage: None,
        is_active: true,
    };
    assert!(create_salary_structure(&store, input(vec![empty])).is_err());

    create_salary_structure(&store, input(vec![percent(&hra, 5)])).unwrap();
    assert!(create_salary_structure(&store, input(Vec::new())).is_err());
    assert!(create_employee(
        &store,
        NewEmployee {
            employee_code: "E-001".into(),
            first_name: "Dup".into(),
            last_name: String::new(),
            email: None,
            joining_date: date(2024, 1, 1),
        }
    )
    .is_err());
}
