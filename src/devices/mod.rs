//! Biometric attendance terminals.
//!
//! The wire protocol is not part of this crate: callers supply a [`DeviceConnector`].
//! [`sync::sync_devices`] fetches punch logs from many terminals at once on a bounded set
//! of `may` coroutines and stores the new ones.

pub mod client;
pub mod model;
pub mod registry;
pub mod sync;

use std::fmt;

pub use client::{
    punch_type_label, ConnectionParams, DeviceConnection, DeviceConnector, DeviceUser,
    PunchRecord,
};
pub use model::{ZkAttendanceLog, ZkDevice};
pub use registry::{register_device, set_device_active, NewDevice};
pub use sync::{push_user, remove_user, sync_devices, DeviceReport, SyncRange, SyncReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The terminal could not be reached or refused the session
    Connection(String),
    /// The stored comm key is not numeric
    InvalidPassword(String),
    Protocol(String),
    /// The terminal is disabled or the worker handling it died
    Unavailable(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Connection(s) => write!(f, "Connection failed: {s}"),
            DeviceError::InvalidPassword(s) => write!(f, "Password must be numeric or blank: {s}"),
            DeviceError::Protocol(s) => write!(f, "Protocol error: {s}"),
            DeviceError::Unavailable(s) => write!(f, "Device unavailable: {s}"),
        }
    }
}

impl std::error::Error for DeviceError {}
