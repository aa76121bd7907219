//! Connection seam for attendance terminals.

use super::model::ZkDevice;
use super::DeviceError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything needed to open a session with one terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub ip: String,
    pub port: u16,
    pub timeout: Duration,
    /// Comm key; 0 when none is set
    pub password: u32,
    pub force_udp: bool,
}

/// Parses a stored comm key: blank means 0, anything else must be all digits.
pub fn parse_password(raw: Option<&str>) -> Result<u32, DeviceError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(key) if key.chars().all(|c| c.is_ascii_digit()) => key
            .parse()
            .map_err(|_| DeviceError::InvalidPassword(format!("{key} is out of range"))),
        Some(_) => Err(DeviceError::InvalidPassword(
            "contains non-digit characters".to_string(),
        )),
    }
}

impl ConnectionParams {
    pub fn from_device(device: &ZkDevice) -> Result<Self, DeviceError> {
        let port = u16::try_from(device.port).map_err(|_| {
            DeviceError::Connection(format!("{}: port {} is out of range", device.name, device.port))
        })?;
        Ok(Self {
            ip: device.ip_address.clone(),
            port,
            timeout: Duration::from_secs(device.timeout_seconds.max(1) as u64),
            password: parse_password(device.password.as_deref())?,
            force_udp: device.force_udp,
        })
    }
}

/// A user record as held by a terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceUser {
    /// Terminal-internal slot number
    pub uid: u16,
    pub user_id: String,
    pub name: String,
    pub privilege: u8,
    pub password: Option<String>,
    pub group_id: Option<String>,
    pub card: u32,
}

/// One punch read from a terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchRecord {
    pub user_id: String,
    pub timestamp: NaiveDateTime,
    pub punch: Option<i32>,
    pub status: Option<i32>,
    pub verify_type: Option<i32>,
    pub work_code: Option<String>,
}

/// Human-readable punch type.
pub fn punch_type_label(code: i32) -> String {
    match code {
        0 => "Check In".to_string(),
        1 => "Check Out".to_string(),
        2 => "Break Out".to_string(),
        3 => "Break In".to_string(),
        4 => "Overtime In".to_string(),
        5 => "Overtime Out".to_string(),
        other => format!("Unknown ({other})"),
    }
}

/// An open session with one terminal.
pub trait DeviceConnection {
    fn serial_number(&mut self) -> Result<Option<String>, DeviceError>;
    fn get_users(&mut self) -> Result<Vec<DeviceUser>, DeviceError>;
    fn get_attendance(&mut self) -> Result<Vec<PunchRecord>, DeviceError>;
    fn set_user(&mut self, user: &DeviceUser) -> Result<(), DeviceError>;
    fn delete_user(&mut self, user_id: &str) -> Result<(), DeviceError>;
    fn disconnect(&mut self) -> Result<(), DeviceError>;
}

/// Opens sessions. Shared between sync workers, hence `Send + Sync`.
pub trait DeviceConnector: Send + Sync {
    type Connection: DeviceConnection;

    fn connect(&self, params: &ConnectionParams) -> Result<Self::Connection, DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_password() {
        assert_eq!(parse_password(None).unwrap(), 0);
        assert_eq!(parse_password(Some("  ")).unwrap(), 0);
        assert_eq!(parse_password(Some("1234")).unwrap(), 1234);
        assert!(matches!(
            parse_password(Some("12a4")),
            Err(DeviceError::InvalidPassword(_))
        ));
        assert!(parse_password(Some("99999999999")).is_err());
    }

    #[test]
    fn test_punch_labels() {
        assert_eq!(punch_type_label(0), "Check In");
        assert_eq!(punch_type_label(5), "Overtime Out");
        assert_eq!(punch_type_label(15), "Unknown (15)");
    }
}
