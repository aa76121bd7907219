use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A networked attendance terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZkDevice {
    pub id: Uuid,
    pub name: String,
    pub ip_address: String,
    pub port: i32,
    /// Serial number reported by the terminal
    pub device_id: Option<String>,
    pub is_active: bool,
    pub last_sync: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub timeout_seconds: i32,
    /// Numeric comm key, blank for none
    pub password: Option<String>,
    pub force_udp: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// One punch as stored after a sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZkAttendanceLog {
    pub id: Uuid,
    pub device_id: Uuid,
    pub device_serial_no: Option<String>,
    pub user_id: String,
    pub timestamp: NaiveDateTime,
    pub punch_type: Option<String>,
    pub status: Option<String>,
    pub verify_type: Option<String>,
    pub work_code: Option<String>,
    pub created_at: NaiveDateTime,
}
