//! Human resources: salary structures, leave and monthly payroll.
//!
//! - [`salary`]: employees, salary components and structure totals
//! - [`leave`]: leave applications and the yearly balances they move
//! - [`attendance`]: daily attendance, entered or derived from terminal punches
//! - [`payroll`]: monthly salary snapshots

pub mod attendance;
pub mod leave;
pub mod model;
pub mod payroll;
pub mod salary;

pub use attendance::{classify_day, process_attendance, record_attendance, AttendanceRun, DayAttendance};
pub use leave::{
    apply_for_leave, approve_leave, cancel_leave, create_leave_type, delete_leave_application,
    leave_balance, reject_leave, set_leave_status, NewLeaveApplication, NewLeaveType,
};
pub use model::{
    Attendance, AttendanceStatus, ComponentType, Employee, EmployeeSalary, LeaveApplication,
    LeaveBalance, LeaveStatus, LeaveType, SalaryComponent, SalaryDetail, SalaryMonth,
    SalaryStructure, StructureComponent,
};
pub use payroll::{generate_salary_month, mark_salary_month_paid, PayrollRun};
pub use salary::{
    add_structure_component, calculate_totals, create_employee, create_salary_component,
    create_salary_structure, recalculate_salary_structure, remove_structure_component,
    update_salary_structure, update_structure_component, NewEmployee, NewSalaryComponent,
    NewSalaryStructure, NewStructureComponent, SalaryTotals,
};
