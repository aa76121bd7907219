//! Monthly payroll: salary snapshots per employee.

use super::model::{
    Attendance, AttendanceStatus, ComponentType, EmployeeSalary, SalaryDetail, SalaryMonth,
};
use crate::error::{ErpError, ErpResult};
use crate::store::{timestamp, Store};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// First and last day of `year`-`month`
pub fn month_bounds(year: i32, month: u32) -> ErpResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ErpError::invalid("month", format!("{year}-{month} is not a month")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .and_then(|d| d.pred_opt())
    .ok_or_else(|| ErpError::invalid("month", format!("{year}-{month} is out of range")))?;
    Ok((first, next))
}

/// Attendance counts for one employee over one month
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub present_days: Decimal,
    pub absent_days: i32,
    pub leave_days: i32,
}

/// Present and late days count fully, half days as one half.
pub fn summarize_attendance(records: &[Attendance]) -> AttendanceSummary {
    let half = Decimal::new(5, 1);
    records
        .iter()
        .fold(AttendanceSummary::default(), |mut acc, record| {
            match record.status {
                AttendanceStatus::Present | AttendanceStatus::Late => {
                    acc.present_days += Decimal::ONE
                }
                AttendanceStatus::HalfDay => acc.present_days += half,
                AttendanceStatus::Absent => acc.absent_days += 1,
                AttendanceStatus::Leave => acc.leave_days += 1,
                AttendanceStatus::Holiday | AttendanceStatus::Weekend => {}
            }
            acc
        })
}

#[derive(Debug, Clone, Serialize)]
pub struct PayrollRun {
    pub salary_month: SalaryMonth,
    pub salaries: Vec<EmployeeSalary>,
}

impl PayrollRun {
    pub fn total_net(&self) -> Decimal {
        self.salaries.iter().map(|s| s.net_salary).sum()
    }
}

/// Creates, or regenerates when not yet paid, the salaries of `year`-`month`.
///
/// Every active employee with a salary structure gets one [`EmployeeSalary`] holding a copy
/// of the structure's figures and one [`SalaryDetail`] per active component.
pub fn generate_salary_month<S: Store>(store: &S, year: i32, month: u32) -> ErpResult<PayrollRun> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::payroll_span(year, month).entered();

    let (first, last) = month_bounds(year, month)?;
    let working_days = (last - first).num_days() as i32 + 1;

    let run = store.atomic(|s| {
        let now = timestamp();
        let mut salary_month = match s.find_salary_month(year, month as i32)? {
            Some(existing) if existing.is_paid => {
                return Err(ErpError::invalid(
                    "month",
                    format!("salaries for {year}-{month:02} are already paid"),
                ))
            }
            Some(existing) => {
                let removed = s.delete_salaries_for_month(existing.id)?;
                log::info!("regenerating {year}-{month:02}, replacing {removed} salaries");
                existing
            }
            None => {
                let created = SalaryMonth {
                    id: Uuid::new_v4(),
                    year,
                    month: month as i32,
                    is_generated: false,
                    generated_at: None,
                    is_paid: false,
                    payment_date: None,
                    created_at: now,
                    updated_at: now,
                };
                s.insert_salary_month(&created)?;
                created
            }
        };

        let kinds: HashMap<Uuid, ComponentType> = s
            .list_salary_components()?
            .into_iter()
            .map(|c| (c.id, c.component_type))
            .collect();

        let mut salaries = Vec::new();
        for employee in s.list_employees()?.into_iter().filter(|e| e.is_active) {
            let Some(structure) = s.find_structure_for_employee(employee.id)? else {
                log::debug!("{} has no salary structure, skipped", employee.employee_code);
                continue;
            };
            let attendance =
                summarize_attendance(&s.attendance_between(employee.id, first, last)?);
            let salary = EmployeeSalary {
                id: Uuid::new_v4(),
                salary_month_id: salary_month.id,
                employee_id: employee.id,
                basic_salary: structure.basic_salary,
                total_earnings: structure.total_earnings,
                total_deductions: structure.total_deductions,
                gross_salary: structure.gross_salary,
                net_salary: structure.net_salary,
                working_days,
                present_days: attendance.present_days,
                absent_days: attendance.absent_days,
                leave_days: attendance.leave_days,
                created_at: now,
            };
            s.insert_employee_salary(&salary)?;

            for component in s
                .components_for_structure(structure.id)?
                .into_iter()
                .filter(|c| c.is_active)
            {
                let component_type = kinds
                    .get(&component.component_id)
                    .copied()
                    .ok_or_else(|| ErpError::not_found("salary component", component.component_id))?;
                s.insert_salary_detail(&SalaryDetail {
                    id: Uuid::new_v4(),
                    employee_salary_id: salary.id,
                    component_id: component.component_id,
                    component_type,
                    amount: component.calculated_amount,
                    created_at: now,
                })?;
            }
            salaries.push(salary);
        }

        salary_month.is_generated = true;
        salary_month.generated_at = Some(now);
        salary_month.updated_at = now;
        s.update_salary_month(&salary_month)?;
        Ok(PayrollRun {
            salary_month,
            salaries,
        })
    })?;

    log::info!(
        "generated {} salaries for {year}-{month:02}, net total {}",
        run.salaries.len(),
        run.total_net()
    );
    #[cfg(feature = "metrics")]
    METRICS.record_salaries_generated(run.salaries.len());
    Ok(run)
}

pub fn mark_salary_month_paid<S: Store>(
    store: &S,
    year: i32,
    month: u32,
    payment_date: NaiveDate,
) -> ErpResult<SalaryMonth> {
    let mut salary_month = store
        .find_salary_month(year, month as i32)?
        .ok_or_else(|| ErpError::not_found("salary month", format!("{year}-{month:02}")))?;
    if !salary_month.is_generated {
        return Err(ErpError::invalid(
            "month",
            format!("salaries for {year}-{month:02} have not been generated"),
        ));
    }
    salary_month.is_paid = true;
    salary_month.payment_date = Some(payment_date);
    salary_month.updated_at = timestamp();
    store.update_salary_month(&salary_month)?;
    log::info!("salaries for {year}-{month:02} marked paid on {payment_date}");
    Ok(salary_month)
}
