use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub joining_date: NaiveDate,
    /// Mirrors the basic salary of the employee's salary structure
    pub basic_salary: Decimal,
    /// Mirrors the gross salary of the employee's salary structure
    pub gross_salary: Decimal,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

text_enum! {
    pub enum ComponentType {
        Earning => "EARN",
        Deduction => "DED",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryComponent {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub component_type: ComponentType,
    pub is_taxable: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryStructure {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub effective_date: NaiveDate,
    pub basic_salary: Decimal,
    pub total_earnings: Decimal,
    pub total_deductions: Decimal,
    /// `basic + earnings`
    pub gross_salary: Decimal,
    /// `gross - deductions`
    pub net_salary: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A salary component attached to one structure, as a fixed amount or a percentage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureComponent {
    pub id: Uuid,
    pub structure_id: Uuid,
    pub component_id: Uuid,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
    pub calculated_amount: Decimal,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

text_enum! {
    pub enum LeaveStatus {
        Pending => "PEN",
        Approved => "APP",
        Rejected => "REJ",
        Cancelled => "CAN",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveType {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub paid: bool,
    pub max_days_per_year: i32,
    pub carry_forward: bool,
    pub max_carry_forward_days: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveApplication {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<NaiveDateTime>,
    pub remarks: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl LeaveApplication {
    /// Calendar days covered, both ends included
    pub fn days(&self) -> Decimal {
        Decimal::from((self.end_date - self.start_date).num_days() + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub year: i32,
    pub total_days: Decimal,
    pub used_days: Decimal,
    pub pending_days: Decimal,
    pub carried_forward_days: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl LeaveBalance {
    pub fn available_days(&self) -> Decimal {
        self.total_days - self.used_days - self.pending_days
    }
}

text_enum! {
    pub enum AttendanceStatus {
        Present => "PRE",
        Absent => "ABS",
        Late => "LAT",
        Leave => "LEA",
        Holiday => "HOL",
        Weekend => "WEE",
        HalfDay => "HAL",
    }
}

/// Daily attendance of one employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryMonth {
    pub id: Uuid,
    pub year: i32,
    pub month: i32,
    pub is_generated: bool,
    pub generated_at: Option<NaiveDateTime>,
    pub is_paid: bool,
    pub payment_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Snapshot of one employee's salary for one salary month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSalary {
    pub id: Uuid,
    pub salary_month_id: Uuid,
    pub employee_id: Uuid,
    pub basic_salary: Decimal,
    pub total_earnings: Decimal,
    pub total_deductions: Decimal,
    pub gross_salary: Decimal,
    pub net_salary: Decimal,
    pub working_days: i32,
    pub present_days: Decimal,
    pub absent_days: i32,
    pub leave_days: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryDetail {
    pub id: Uuid,
    pub employee_salary_id: Uuid,
    pub component_id: Uuid,
    pub component_type: ComponentType,
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
}
