//! Parallel punch-log sync and user provisioning across terminals.
//!
//! Device I/O runs on at most `workers` `may` coroutines. Jobs are queued on a
//! crossbeam channel before any worker starts and results come back on a second channel,
//! tagged with the device's position. Storage is only touched from the calling context,
//! after every fetch has finished.

use super::client::{
    punch_type_label, ConnectionParams, DeviceConnector, DeviceUser, PunchRecord,
};
use super::model::{ZkAttendanceLog, ZkDevice};
use super::{DeviceConnection, DeviceError};
use crate::error::ErpResult;
use crate::store::{timestamp, Store};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Inclusive date window; an open end is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl SyncRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let date = at.date();
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Outcome of syncing one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceReport {
    pub device_id: Uuid,
    pub device_name: String,
    /// Punches read from the terminal within the range
    pub fetched: usize,
    pub saved: usize,
    /// Already stored punches
    pub skipped: usize,
    pub error: Option<String>,
}

impl DeviceReport {
    fn new(device: &ZkDevice) -> Self {
        Self {
            device_id: device.id,
            device_name: device.name.clone(),
            fetched: 0,
            saved: 0,
            skipped: 0,
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub devices: Vec<DeviceReport>,
}

impl SyncReport {
    pub fn saved(&self) -> usize {
        self.devices.iter().map(|d| d.saved).sum()
    }

    pub fn skipped(&self) -> usize {
        self.devices.iter().map(|d| d.skipped).sum()
    }

    pub fn failed(&self) -> usize {
        self.devices.iter().filter(|d| !d.is_ok()).count()
    }
}

/// Outcome of pushing to or removing from one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceAction {
    pub device_id: Uuid,
    pub device_name: String,
    pub error: Option<String>,
}

/// Opens a session, runs `op`, and always attempts to disconnect.
fn with_connection<C, T, F>(connector: &C, device: &ZkDevice, op: &F) -> Result<T, DeviceError>
where
    C: DeviceConnector,
    F: Fn(&mut C::Connection) -> Result<T, DeviceError>,
{
    if !device.is_active {
        return Err(DeviceError::Unavailable(format!("{} is disabled", device.name)));
    }
    let params = ConnectionParams::from_device(device)?;
    let mut connection = connector.connect(&params)?;
    let result = op(&mut connection);
    if let Err(e) = connection.disconnect() {
        log::warn!("{}: disconnect failed: {e}", device.name);
    }
    result
}

/// Runs `op` against every device on at most `workers` coroutines; results keep the
/// order of `devices`.
pub fn run_on_devices<C, T, F>(
    connector: Arc<C>,
    devices: &[ZkDevice],
    workers: usize,
    op: F,
) -> Vec<(Result<T, DeviceError>, Duration)>
where
    C: DeviceConnector + 'static,
    T: Send + 'static,
    F: Fn(&mut C::Connection) -> Result<T, DeviceError> + Send + Sync + 'static,
{
    if devices.is_empty() {
        return Vec::new();
    }
    let workers = workers.clamp(1, devices.len());
    let op = Arc::new(op);

    let (job_tx, job_rx) = crossbeam_channel::bounded::<(usize, ZkDevice)>(devices.len());
    for job in devices.iter().cloned().enumerate() {
        if job_tx.send(job).is_err() {
            break;
        }
    }
    drop(job_tx);

    let (result_tx, result_rx) = crossbeam_channel::unbounded();
    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let connector = Arc::clone(&connector);
            let op = Arc::clone(&op);
            may::go!(move || {
                // every job is queued before the workers start
                while let Ok((index, device)) = jobs.try_recv() {
                    let started = Instant::now();
                    let outcome = with_connection(connector.as_ref(), &device, op.as_ref());
                    if results.send((index, outcome, started.elapsed())).is_err() {
                        break;
                    }
                }
            })
        })
        .collect();
    drop(result_tx);

    for handle in handles {
        if handle.join().is_err() {
            log::error!("device worker panicked");
        }
    }

    let mut slots: Vec<Option<(Result<T, DeviceError>, Duration)>> =
        (0..devices.len()).map(|_| None).collect();
    for (index, outcome, elapsed) in result_rx.try_iter() {
        slots[index] = Some((outcome, elapsed));
    }
    slots
        .into_iter()
        .zip(devices)
        .map(|(slot, device)| {
            slot.unwrap_or_else(|| {
                (
                    Err(DeviceError::Unavailable(format!(
                        "{}: worker stopped before reporting",
                        device.name
                    ))),
                    Duration::ZERO,
                )
            })
        })
        .collect()
}

fn store_punches<S: Store>(
    store: &S,
    device: &ZkDevice,
    serial: Option<String>,
    punches: Vec<PunchRecord>,
    range: SyncRange,
    report: &mut DeviceReport,
) -> ErpResult<()> {
    store.atomic(|s| {
        let now = timestamp();
        for punch in punches {
            let user_id = punch.user_id.trim();
            if user_id.is_empty() || !range.contains(punch.timestamp) {
                continue;
            }
            report.fetched += 1;
            let punch_type = punch.punch.map(punch_type_label);
            let exists = s.attendance_log_exists(
                device.id,
                user_id,
                punch.timestamp,
                punch_type.as_deref(),
            )?;
            if exists {
                report.skipped += 1;
                continue;
            }
            s.insert_attendance_log(&ZkAttendanceLog {
                id: Uuid::new_v4(),
                device_id: device.id,
                device_serial_no: serial.clone().or_else(|| device.device_id.clone()),
                user_id: user_id.to_string(),
                timestamp: punch.timestamp,
                punch_type,
                status: punch.status.map(|v| v.to_string()),
                verify_type: punch.verify_type.map(|v| v.to_string()),
                work_code: punch.work_code,
                created_at: now,
            })?;
            report.saved += 1;
        }

        let mut device = device.clone();
        device.last_sync = Some(now);
        if serial.is_some() {
            device.device_id = serial.clone();
        }
        device.updated_at = now;
        s.update_device(&device)?;
        Ok(())
    })
}

/// Fetches punches from `devices` in parallel and stores the new ones.
///
/// Failures are reported per device and never stop the others.
pub fn sync_devices<S, C>(
    store: &S,
    connector: Arc<C>,
    devices: &[ZkDevice],
    range: SyncRange,
    workers: usize,
) -> SyncReport
where
    S: Store,
    C: DeviceConnector + 'static,
{
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::device_sync_span(devices.len()).entered();

    let fetched = run_on_devices(connector, devices, workers, |connection| {
        let serial = connection.serial_number()?;
        let punches = connection.get_attendance()?;
        Ok((serial, punches))
    });

    let mut report = SyncReport::default();
    for (device, (outcome, _elapsed)) in devices.iter().zip(fetched) {
        let mut device_report = DeviceReport::new(device);
        let result = match outcome {
            Ok((serial, punches)) => {
                store_punches(store, device, serial, punches, range, &mut device_report)
                    .map_err(|e| e.to_string())
            }
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(()) => log::info!(
                "{}: {} punches, {} saved, {} already stored",
                device.name,
                device_report.fetched,
                device_report.saved,
                device_report.skipped
            ),
            Err(error) => {
                log::warn!("{}: sync failed: {error}", device.name);
                device_report.saved = 0;
                device_report.skipped = 0;
                device_report.error = Some(error);
            }
        }
        #[cfg(feature = "metrics")]
        METRICS.record_device_sync(_elapsed, !device_report.is_ok());
        report.devices.push(device_report);
    }
    report
}

fn to_actions(
    devices: &[ZkDevice],
    outcomes: Vec<(Result<(), DeviceError>, Duration)>,
) -> Vec<DeviceAction> {
    devices
        .iter()
        .zip(outcomes)
        .map(|(device, (outcome, _))| DeviceAction {
            device_id: device.id,
            device_name: device.name.clone(),
            error: outcome.err().map(|e| e.to_string()),
        })
        .collect()
}

/// Writes `user` to every device.
pub fn push_user<C>(
    connector: Arc<C>,
    devices: &[ZkDevice],
    user: DeviceUser,
    workers: usize,
) -> Vec<DeviceAction>
where
    C: DeviceConnector + 'static,
{
    let user_id = user.user_id.clone();
    let outcomes = run_on_devices(connector, devices, workers, move |connection| {
        connection.set_user(&user)
    });
    let actions = to_actions(devices, outcomes);
    log::info!(
        "pushed user {user_id} to {} of {} devices",
        actions.iter().filter(|a| a.error.is_none()).count(),
        actions.len()
    );
    actions
}

/// Deletes the user with `user_id` from every device.
pub fn remove_user<C>(
    connector: Arc<C>,
    devices: &[ZkDevice],
    user_id: &str,
    workers: usize,
) -> Vec<DeviceAction>
where
    C: DeviceConnector + 'static,
{
    let target = user_id.to_string();
    let outcomes = run_on_devices(connector, devices, workers, move |connection| {
        connection.delete_user(&target)
    });
    to_actions(devices, outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_inclusive() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        let range = SyncRange::between(day(1), day(3));
        let at = |d: u32, h: u32| day(d).and_hms_opt(h, 0, 0).unwrap();
        assert!(range.contains(at(1, 0)));
        assert!(range.contains(at(3, 23)));
        assert!(!range.contains(at(4, 0)));
        assert!(SyncRange::all().contains(at(30, 12)));
    }
}
