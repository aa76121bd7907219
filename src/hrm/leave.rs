//! Leave types, leave applications and yearly leave balances.
//!
//! A balance row per (employee, leave type, year) tracks used and pending days. Every
//! application write moves its days within the balance of its start year in the same
//! `atomic` block.

use super::model::{LeaveApplication, LeaveBalance, LeaveStatus, LeaveType};
use crate::error::{ErpError, ErpResult};
use crate::store::{timestamp, Store};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewLeaveType {
    pub code: String,
    pub name: String,
    #[serde(default = "paid")]
    pub paid: bool,
    pub max_days_per_year: i32,
    #[serde(default)]
    pub carry_forward: bool,
    #[serde(default)]
    pub max_carry_forward_days: i32,
}

fn paid() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLeaveApplication {
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    /// `Pending` when absent; `Approved` records leave that was granted up front
    pub status: Option<LeaveStatus>,
}

/// How an application write moves days within a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveChange {
    Created(LeaveStatus),
    Transition(LeaveStatus, LeaveStatus),
    Deleted(LeaveStatus),
}

/// Applies `change` for `days` to `balance`.
pub fn apply_leave_change(
    balance: &mut LeaveBalance,
    change: LeaveChange,
    days: Decimal,
) -> ErpResult<()> {
    use LeaveStatus::*;
    match change {
        LeaveChange::Created(Pending) => balance.pending_days += days,
        LeaveChange::Created(Approved) => balance.used_days += days,
        LeaveChange::Transition(Pending, Approved) => {
            balance.pending_days -= days;
            balance.used_days += days;
        }
        LeaveChange::Transition(Pending, Rejected | Cancelled) => balance.pending_days -= days,
        LeaveChange::Transition(Approved, Cancelled) => balance.used_days -= days,
        LeaveChange::Deleted(Pending) => balance.pending_days -= days,
        LeaveChange::Deleted(Approved) => balance.used_days -= days,
        LeaveChange::Deleted(Rejected | Cancelled) => {}
        LeaveChange::Created(status) => {
            return Err(ErpError::invalid(
                "status",
                format!("a new leave application cannot be {status}"),
            ))
        }
        LeaveChange::Transition(from, to) => {
            return Err(ErpError::invalid(
                "status",
                format!("cannot move a leave application from {from} to {to}"),
            ))
        }
    }
    Ok(())
}

pub fn create_leave_type<S: Store>(store: &S, input: NewLeaveType) -> ErpResult<LeaveType> {
    let code = input.code.trim().to_string();
    if code.is_empty() {
        return Err(ErpError::invalid("code", "is required"));
    }
    if input.max_days_per_year < 0 {
        return Err(ErpError::invalid("max_days_per_year", "must not be negative"));
    }
    let now = timestamp();
    let leave_type = LeaveType {
        id: Uuid::new_v4(),
        code,
        name: input.name.trim().to_string(),
        paid: input.paid,
        max_days_per_year: input.max_days_per_year,
        carry_forward: input.carry_forward,
        max_carry_forward_days: input.max_carry_forward_days,
        created_at: now,
        updated_at: now,
    };
    store.insert_leave_type(&leave_type)?;
    Ok(leave_type)
}

/// The balance for `year`, created with the leave type's yearly allowance when missing.
pub fn leave_balance<S: Store>(
    store: &S,
    employee_id: Uuid,
    leave_type_id: Uuid,
    year: i32,
) -> ErpResult<LeaveBalance> {
    if let Some(balance) = store.find_leave_balance(employee_id, leave_type_id, year)? {
        return Ok(balance);
    }
    let leave_type = store
        .get_leave_type(leave_type_id)?
        .ok_or_else(|| ErpError::not_found("leave type", leave_type_id))?;
    let now = timestamp();
    let balance = LeaveBalance {
        id: Uuid::new_v4(),
        employee_id,
        leave_type_id,
        year,
        total_days: Decimal::from(leave_type.max_days_per_year),
        used_days: Decimal::ZERO,
        pending_days: Decimal::ZERO,
        carried_forward_days: Decimal::ZERO,
        created_at: now,
        updated_at: now,
    };
    store.insert_leave_balance(&balance)?;
    Ok(balance)
}

fn move_days<S: Store>(
    store: &S,
    application: &LeaveApplication,
    change: LeaveChange,
) -> ErpResult<LeaveBalance> {
    let mut balance = leave_balance(
        store,
        application.employee_id,
        application.leave_type_id,
        application.start_date.year(),
    )?;
    apply_leave_change(&mut balance, change, application.days())?;
    balance.updated_at = timestamp();
    store.update_leave_balance(&balance)?;
    Ok(balance)
}

pub fn apply_for_leave<S: Store>(
    store: &S,
    input: NewLeaveApplication,
) -> ErpResult<LeaveApplication> {
    if input.end_date < input.start_date {
        return Err(ErpError::invalid("end_date", "must not be before the start date"));
    }
    store.atomic(|s| {
        if s.get_employee(input.employee_id)?.is_none() {
            return Err(ErpError::invalid("employee", "does not exist"));
        }
        if s.get_leave_type(input.leave_type_id)?.is_none() {
            return Err(ErpError::invalid("leave_type", "does not exist"));
        }
        let status = input.status.unwrap_or(LeaveStatus::Pending);
        let now = timestamp();
        let application = LeaveApplication {
            id: Uuid::new_v4(),
            employee_id: input.employee_id,
            leave_type_id: input.leave_type_id,
            start_date: input.start_date,
            end_date: input.end_date,
            reason: input.reason.clone(),
            status,
            approved_by: None,
            approved_at: (status == LeaveStatus::Approved).then_some(now),
            remarks: None,
            created_at: now,
            updated_at: now,
        };
        s.insert_leave_application(&application)?;
        move_days(s, &application, LeaveChange::Created(status))?;
        Ok(application)
    })
}

/// Moves an application to `status`, adjusting the balance. `approver` is recorded on
/// approval.
pub fn set_leave_status<S: Store>(
    store: &S,
    id: Uuid,
    status: LeaveStatus,
    approver: Option<Uuid>,
    remarks: Option<String>,
) -> ErpResult<LeaveApplication> {
    store.atomic(|s| {
        let mut application = s
            .get_leave_application(id)?
            .ok_or_else(|| ErpError::not_found("leave application", id))?;
        if application.status == status {
            return Ok(application);
        }
        move_days(s, &application, LeaveChange::Transition(application.status, status))?;

        let now = timestamp();
        if status == LeaveStatus::Approved {
            application.approved_by = approver;
            application.approved_at = Some(now);
        }
        if remarks.is_some() {
            application.remarks = remarks.clone();
        }
        log::info!("leave application {id}: {} -> {status}", application.status);
        application.status = status;
        application.updated_at = now;
        s.update_leave_application(&application)?;
        Ok(application)
    })
}

pub fn approve_leave<S: Store>(
    store: &S,
    id: Uuid,
    approver: Option<Uuid>,
) -> ErpResult<LeaveApplication> {
    set_leave_status(store, id, LeaveStatus::Approved, approver, None)
}

pub fn reject_leave<S: Store>(
    store: &S,
    id: Uuid,
    remarks: Option<String>,
) -> ErpResult<LeaveApplication> {
    set_leave_status(store, id, LeaveStatus::Rejected, None, remarks)
}

pub fn cancel_leave<S: Store>(store: &S, id: Uuid) -> ErpResult<LeaveApplication> {
    set_leave_status(store, id, LeaveStatus::Cancelled, None, None)
}

pub fn delete_leave_application<S: Store>(store: &S, id: Uuid) -> ErpResult<()> {
    store.atomic(|s| {
        let application = s
            .get_leave_application(id)?
            .ok_or_else(|| ErpError::not_found("leave application", id))?;
        if s
            .find_leave_balance(
                application.employee_id,
                application.leave_type_id,
                application.start_date.year(),
            )?
            .is_some()
        {
            move_days(s, &application, LeaveChange::Deleted(application.status))?;
        }
        s.delete_leave_application(id)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance() -> LeaveBalance {
        let now = timestamp();
        LeaveBalance {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            leave_type_id: Uuid::new_v4(),
            year: 2024,
            total_days: Decimal::from(20),
            used_days: Decimal::ZERO,
            pending_days: Decimal::ZERO,
            carried_forward_days: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pending_then_approved() {
        let mut b = balance();
        let days = Decimal::from(3);
        apply_leave_change(&mut b, LeaveChange::Created(LeaveStatus::Pending), days).unwrap();
        assert_eq!(b.available_days(), Decimal::from(17));
        apply_leave_change(
            &mut b,
            LeaveChange::Transition(LeaveStatus::Pending, LeaveStatus::Approved),
            days,
        )
        .unwrap();
        assert_eq!(b.pending_days, Decimal::ZERO);
        assert_eq!(b.used_days, days);
        apply_leave_change(
            &mut b,
            LeaveChange::Transition(LeaveStatus::Approved, LeaveStatus::Cancelled),
            days,
        )
        .unwrap();
        assert_eq!(b.available_days(), Decimal::from(20));
    }

    #[test]
    fn test_rejected_cannot_be_approved() {
        let mut b = balance();
        let err = apply_leave_change(
            &mut b,
            LeaveChange::Transition(LeaveStatus::Rejected, LeaveStatus::Approved),
            Decimal::ONE,
        )
        .unwrap_err();
        assert_eq!(err.as_validation().and_then(|v| v.field), Some("status"));
        assert!(apply_leave_change(
            &mut b,
            LeaveChange::Created(LeaveStatus::Cancelled),
            Decimal::ONE
        )
        .is_err());
    }
}
