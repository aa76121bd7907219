//! Leave balances, attendance and monthly payroll.

mod common;

use common::*;
use ledgerguard::hrm::salary::set_employee_active;
use ledgerguard::hrm::{
    apply_for_leave, approve_leave, cancel_leave, create_employee, create_leave_type,
    create_salary_component, create_salary_structure, delete_leave_application,
    generate_salary_month, leave_balance, mark_salary_month_paid, record_attendance,
    reject_leave, update_salary_structure, AttendanceStatus, ComponentType, Employee,
    LeaveStatus, LeaveType, NewEmployee, NewLeaveApplication, NewLeaveType, NewSalaryComponent,
    NewSalaryStructure, NewStructureComponent,
};
use ledgerguard::store::HrmStore;
use ledgerguard::MemoryStore;
use rust_decimal::Decimal;
use uuid::Uuid;

fn employee(store: &MemoryStore, code: &str) -> Employee {
    create_employee(
        store,
        NewEmployee {
            employee_code: code.into(),
            first_name: format!("Employee {code}"),
            last_name: String::new(),
            email: None,
            joining_date: date(2023, 1, 1),
        },
    )
    .unwrap()
}

fn annual_leave(store: &MemoryStore) -> LeaveType {
    create_leave_type(
        store,
        NewLeaveType {
            code: "AL".into(),
            name: "Annual Leave".into(),
            paid: true,
            max_days_per_year: 20,
            carry_forward: false,
            max_carry_forward_days: 0,
        },
    )
    .unwrap()
}

fn application(
    employee_id: Uuid,
    leave_type_id: Uuid,
    start: u32,
    end: u32,
    status: Option<LeaveStatus>,
) -> NewLeaveApplication {
    NewLeaveApplication {
        employee_id,
        leave_type_id,
        start_date: date(2024, 3, start),
        end_date: date(2024, 3, end),
        reason: "family".into(),
        status,
    }
}

/// (used, pending, available) for 2024
fn days(store: &MemoryStore, employee_id: Uuid, leave_type_id: Uuid) -> (Decimal, Decimal, Decimal) {
    let balance = leave_balance(store, employee_id, leave_type_id, 2024).unwrap();
    (balance.used_days, balance.pending_days, balance.available_days())
}

#[test]
fn test_leave_lifecycle_moves_balance() {
    let store = MemoryStore::new();
    let ada = employee(&store, "E-001");
    let manager = employee(&store, "E-002");
    let annual = annual_leave(&store);

    let pending = apply_for_leave(&store, application(ada.id, annual.id, 4, 6, None)).unwrap();
    assert_eq!(pending.status, LeaveStatus::Pending);
    assert_eq!(pending.days(), dec(3));
    assert_eq!(days(&store, ada.id, annual.id), (dec(0), dec(3), dec(17)));

    let approved = approve_leave(&store, pending.id, Some(manager.id)).unwrap();
    assert_eq!(approved.approved_by, Some(manager.id));
    assert!(approved.approved_at.is_some());
    assert_eq!(days(&store, ada.id, annual.id), (dec(3), dec(0), dec(17)));

    cancel_leave(&store, pending.id).unwrap();
    assert_eq!(days(&store, ada.id, annual.id), (dec(0), dec(0), dec(20)));

    let second = apply_for_leave(&store, application(ada.id, annual.id, 11, 12, None)).unwrap();
    let rejected = reject_leave(&store, second.id, Some("busy week".into())).unwrap();
    assert_eq!(rejected.remarks.as_deref(), Some("busy week"));
    assert_eq!(days(&store, ada.id, annual.id), (dec(0), dec(0), dec(20)));
    assert!(approve_leave(&store, second.id, None).is_err());
}

#[test]
fn test_leave_recorded_as_approved_and_deleted() {
    let store = MemoryStore::new();
    let ada = employee(&store, "E-001");
    let annual = annual_leave(&store);

    let granted = apply_for_leave(
        &store,
        application(ada.id, annual.id, 18, 18, Some(LeaveStatus::Approved)),
    )
    .unwrap();
    assert_eq!(days(&store, ada.id, annual.id), (dec(1), dec(0), dec(19)));

    delete_leave_application(&store, granted.id).unwrap();
    assert_eq!(days(&store, ada.id, annual.id), (dec(0), dec(0), dec(20)));
    assert!(store.get_leave_application(granted.id).unwrap().is_none());
}

#[test]
fn test_leave_input_rules() {
    let store = MemoryStore::new();
    let ada = employee(&store, "E-001");
    let annual = annual_leave(&store);

    assert!(apply_for_leave(&store, application(ada.id, annual.id, 6, 4, None)).is_err());
    assert!(apply_for_leave(&store, application(Uuid::new_v4(), annual.id, 4, 4, None)).is_err());
    assert!(apply_for_leave(
        &store,
        application(ada.id, annual.id, 4, 4, Some(LeaveStatus::Rejected))
    )
    .is_err());
}

#[test]
fn test_attendance_one_record_per_day() {
    let store = MemoryStore::new();
    let ada = employee(&store, "E-001");
    let at = |h| date(2024, 3, 4).and_hms_opt(h, 0, 0);

    record_attendance(&store, ada.id, date(2024, 3, 4), AttendanceStatus::Present, at(9), at(17))
        .unwrap();
    assert!(record_attendance(&store, ada.id, date(2024, 3, 4), AttendanceStatus::Late, None, None)
        .is_err());
    assert!(record_attendance(&store, ada.id, date(2024, 3, 5), AttendanceStatus::Present, at(17), at(9))
        .is_err());
}

struct Payroll {
    store: MemoryStore,
    ada: Employee,
    structure_id: Uuid,
}

/// One salaried employee with March attendance, one without a structure, one inactive.
fn payroll_books() -> Payroll {
    let store = MemoryStore::new();
    let ada = employee(&store, "E-001");
    employee(&store, "E-002");
    let gone = employee(&store, "E-003");

    let hra = create_salary_component(
        &store,
        NewSalaryComponent {
            code: "HRA".into(),
            name: "House Rent".into(),
            component_type: ComponentType::Earning,
            is_taxable: true,
        },
    )
    .unwrap();
    let pf = create_salary_component(
        &store,
        NewSalaryComponent {
            code: "PF".into(),
            name: "Provident Fund".into(),
            component_type: ComponentType::Deduction,
            is_taxable: false,
        },
    )
    .unwrap();
    let components = || {
        vec![
            NewStructureComponent {
                component_id: hra.id,
                amount: None,
                percentage: Some(dec(10)),
                is_active: true,
            },
            NewStructureComponent {
                component_id: pf.id,
                amount: None,
                percentage: Some(dec(5)),
                is_active: true,
            },
        ]
    };
    let structure = create_salary_structure(
        &store,
        NewSalaryStructure {
            employee_id: ada.id,
            effective_date: date(2024, 1, 1),
            basic_salary: dec(50_000),
            components: components(),
        },
    )
    .unwrap();
    create_salary_structure(
        &store,
        NewSalaryStructure {
            employee_id: gone.id,
            effective_date: date(2024, 1, 1),
            basic_salary: dec(10_000),
            components: components(),
        },
    )
    .unwrap();
    set_employee_active(&store, gone.id, false).unwrap();

    let marks = [
        (4, AttendanceStatus::Present),
        (5, AttendanceStatus::Late),
        (6, AttendanceStatus::Absent),
        (7, AttendanceStatus::Leave),
        (8, AttendanceStatus::HalfDay),
        (9, AttendanceStatus::Weekend),
    ];
    for (day, status) in marks {
        record_attendance(&store, ada.id, date(2024, 3, day), status, None, None).unwrap();
    }
    // outside the month
    record_attendance(&store, ada.id, date(2024, 4, 1), AttendanceStatus::Absent, None, None)
        .unwrap();

    Payroll {
        store,
        ada,
        structure_id: structure.id,
    }
}

#[test]
fn test_generate_salary_month_snapshots_structures() {
    let Payroll { store, ada, .. } = payroll_books();

    let run = generate_salary_month(&store, 2024, 3).unwrap();
    assert!(run.salary_month.is_generated);
    assert!(!run.salary_month.is_paid);
    assert_eq!(run.salaries.len(), 1);

    let salary = &run.salaries[0];
    assert_eq!(salary.employee_id, ada.id);
    assert_eq!(salary.total_earnings, dec(55_000));
    assert_eq!(salary.gross_salary, dec(55_000));
    assert_eq!(salary.net_salary, dec(52_250));
    assert_eq!(salary.working_days, 31);
    assert_eq!(salary.present_days, Decimal::new(25, 1));
    assert_eq!(salary.absent_days, 1);
    assert_eq!(salary.leave_days, 1);
    assert_eq!(run.total_net(), dec(52_250));

    let details = store.details_for_salary(salary.id).unwrap();
    assert_eq!(details.len(), 2);
    let deductions: Decimal = details
        .iter()
        .filter(|d| d.component_type == ComponentType::Deduction)
        .map(|d| d.amount)
        .sum();
    assert_eq!(deductions, dec(2_750));
}

#[test]
fn test_regenerate_replaces_until_paid() {
    let Payroll {
        store,
        structure_id,
        ..
    } = payroll_books();

    let first = generate_salary_month(&store, 2024, 3).unwrap();
    update_salary_structure(&store, structure_id, date(2024, 3, 1), dec(60_000)).unwrap();
    let second = generate_salary_month(&store, 2024, 3).unwrap();

    assert_eq!(first.salary_month.id, second.salary_month.id);
    let stored = store.salaries_for_month(second.salary_month.id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].net_salary, dec(62_700));
    assert!(store.details_for_salary(first.salaries[0].id).unwrap().is_empty());

    let paid = mark_salary_month_paid(&store, 2024, 3, date(2024, 3, 31)).unwrap();
    assert!(paid.is_paid);
    assert_eq!(paid.payment_date, Some(date(2024, 3, 31)));
    assert!(generate_salary_month(&store, 2024, 3).is_err());
}

#[test]
fn test_mark_paid_needs_generated_month() {
    let Payroll { store, .. } = payroll_books();
    assert!(mark_salary_month_paid(&store, 2024, 5, date(2024, 5, 31)).is_err());
    assert!(generate_salary_month(&store, 2024, 13).is_err());
}
