//! Daily attendance records, the input to payroll attendance counts.
//!
//! Records are entered by hand with [`record_attendance`] or derived from stored terminal
//! punches with [`process_attendance`]. Terminals identify people by the employee code.

use super::model::{Attendance, AttendanceStatus, Employee, LeaveStatus};
use crate::config::AttendanceConfig;
use crate::error::{ErpError, ErpResult};
use crate::store::{timestamp, Store};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

pub fn record_attendance<S: Store>(
    store: &S,
    employee_id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
) -> ErpResult<Attendance> {
    if store.get_employee(employee_id)?.is_none() {
        return Err(ErpError::invalid("employee", "does not exist"));
    }
    if let (Some(check_in), Some(check_out)) = (check_in, check_out) {
        if check_out < check_in {
            return Err(ErpError::invalid("check_out", "must not be before check in"));
        }
    }
    if !store
        .attendance_between(employee_id, date, date)?
        .is_empty()
    {
        return Err(ErpError::invalid(
            "date",
            format!("attendance for {date} is already recorded"),
        ));
    }
    let now = timestamp();
    let attendance = Attendance {
        id: Uuid::new_v4(),
        employee_id,
        date,
        status,
        check_in,
        check_out,
        created_at: now,
        updated_at: now,
    };
    store.insert_attendance(&attendance)?;
    Ok(attendance)
}

/// Status and check times for one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayAttendance {
    pub status: AttendanceStatus,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
}

/// Classifies one employee's day.
///
/// Holidays win over leave, leave over weekends, and all three over punches. The first
/// punch is the check-in and the last one the check-out; a single punch has no check-out
/// and is judged on lateness alone.
pub fn classify_day(
    rules: &AttendanceConfig,
    date: NaiveDate,
    punches: &[NaiveDateTime],
    on_leave: bool,
) -> DayAttendance {
    let check_in = punches.iter().min().copied();
    let check_out = match punches.len() {
        0 | 1 => None,
        _ => punches.iter().max().copied(),
    };
    let status = if rules.holidays.contains(&date) {
        AttendanceStatus::Holiday
    } else if on_leave {
        AttendanceStatus::Leave
    } else if rules.weekend_days.contains(&date.weekday()) {
        AttendanceStatus::Weekend
    } else {
        match (check_in, check_out) {
            (None, _) => AttendanceStatus::Absent,
            (Some(check_in), Some(check_out))
                if check_out - check_in < Duration::hours(i64::from(rules.minimum_hours)) =>
            {
                AttendanceStatus::Absent
            }
            (Some(check_in), Some(check_out))
                if check_out - check_in < Duration::hours(i64::from(rules.full_day_hours)) =>
            {
                AttendanceStatus::HalfDay
            }
            (Some(check_in), _) => {
                let late_after = date.and_time(rules.shift_start)
                    + Duration::minutes(i64::from(rules.grace_minutes));
                if check_in > late_after {
                    AttendanceStatus::Late
                } else {
                    AttendanceStatus::Present
                }
            }
        }
    };
    DayAttendance {
        status,
        check_in,
        check_out,
    }
}

/// Outcome of [`process_attendance`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceRun {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Terminal user ids with punches in the range that match no active employee
    pub unmatched_users: Vec<String>,
}

fn approved_leave_days<S: Store>(
    store: &S,
    employee_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> ErpResult<BTreeSet<NaiveDate>> {
    let mut days = BTreeSet::new();
    for application in store.leave_applications_for_employee(employee_id)? {
        if application.status != LeaveStatus::Approved {
            continue;
        }
        let mut day = application.start_date.max(from);
        let last = application.end_date.min(to);
        while day <= last {
            days.insert(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
    }
    Ok(days)
}

fn process_employee<S: Store>(
    store: &S,
    rules: &AttendanceConfig,
    employee: &Employee,
    days: &[NaiveDate],
    punches: &BTreeMap<NaiveDate, Vec<NaiveDateTime>>,
    run: &mut AttendanceRun,
) -> ErpResult<()> {
    let (Some(&from), Some(&to)) = (days.first(), days.last()) else {
        return Ok(());
    };
    let on_leave = approved_leave_days(store, employee.id, from, to)?;
    let existing: HashMap<NaiveDate, Attendance> = store
        .attendance_between(employee.id, from, to)?
        .into_iter()
        .map(|a| (a.date, a))
        .collect();
    let now = timestamp();

    for &date in days.iter().filter(|d| **d >= employee.joining_date) {
        let day = classify_day(
            rules,
            date,
            punches.get(&date).map(Vec::as_slice).unwrap_or_default(),
            on_leave.contains(&date),
        );
        match existing.get(&date) {
            Some(current)
                if current.status == day.status
                    && current.check_in == day.check_in
                    && current.check_out == day.check_out =>
            {
                run.unchanged += 1;
            }
            Some(current) => {
                store.update_attendance(&Attendance {
                    status: day.status,
                    check_in: day.check_in,
                    check_out: day.check_out,
                    updated_at: now,
                    ..current.clone()
                })?;
                run.updated += 1;
            }
            None => {
                store.insert_attendance(&Attendance {
                    id: Uuid::new_v4(),
                    employee_id: employee.id,
                    date,
                    status: day.status,
                    check_in: day.check_in,
                    check_out: day.check_out,
                    created_at: now,
                    updated_at: now,
                })?;
                run.created += 1;
            }
        }
    }
    Ok(())
}

/// Derives one [`Attendance`] per active employee and day in `from..=to` from the stored
/// terminal punches, approved leave and the configured calendar.
///
/// Days before an employee joined are skipped. Existing records for the range are
/// overwritten when the derived day differs.
pub fn process_attendance<S: Store>(
    store: &S,
    rules: &AttendanceConfig,
    from: NaiveDate,
    to: NaiveDate,
) -> ErpResult<AttendanceRun> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::attendance_span(from, to).entered();

    if to < from {
        return Err(ErpError::invalid("to", "must not be before from"));
    }
    let days: Vec<NaiveDate> = from.iter_days().take_while(|d| *d <= to).collect();

    let employees: HashMap<String, Employee> = store
        .list_employees()?
        .into_iter()
        .filter(|e| e.is_active)
        .map(|e| (e.employee_code.clone(), e))
        .collect();

    let mut punches: HashMap<String, BTreeMap<NaiveDate, Vec<NaiveDateTime>>> = HashMap::new();
    let mut unmatched = BTreeSet::new();
    for log in store.attendance_logs(None)? {
        let date = log.timestamp.date();
        if date < from || date > to {
            continue;
        }
        if !employees.contains_key(&log.user_id) {
            unmatched.insert(log.user_id);
            continue;
        }
        punches
            .entry(log.user_id)
            .or_default()
            .entry(date)
            .or_default()
            .push(log.timestamp);
    }

    let no_punches = BTreeMap::new();
    let mut run = store.atomic(|s| {
        let mut run = AttendanceRun::default();
        for (code, employee) in &employees {
            let employee_punches = punches.get(code).unwrap_or(&no_punches);
            process_employee(s, rules, employee, &days, employee_punches, &mut run)?;
        }
        Ok(run)
    })?;
    run.unmatched_users = unmatched.into_iter().collect();

    if !run.unmatched_users.is_empty() {
        log::warn!(
            "punches from unknown terminal users: {}",
            run.unmatched_users.join(", ")
        );
    }
    log::info!(
        "attendance {from}..={to}: {} created, {} updated, {} unchanged",
        run.created,
        run.updated,
        run.unchanged
    );
    Ok(run)
}
