use super::client::parse_password;
use super::model::ZkDevice;
use crate::config::DeviceConfig;
use crate::error::{ErpError, ErpResult};
use crate::store::{timestamp, Store};
use serde::Deserialize;
use std::net::IpAddr;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDevice {
    pub name: String,
    pub ip_address: String,
    /// `devices.default_port` when absent
    pub port: Option<u16>,
    pub location: Option<String>,
    /// `devices.timeout_seconds` when absent
    pub timeout_seconds: Option<u64>,
    pub password: Option<String>,
    #[serde(default)]
    pub force_udp: bool,
}

pub fn register_device<S: Store>(
    store: &S,
    config: &DeviceConfig,
    input: NewDevice,
) -> ErpResult<ZkDevice> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(ErpError::invalid("name", "is required"));
    }
    let ip_address = input.ip_address.trim().to_string();
    if ip_address.parse::<IpAddr>().is_err() {
        return Err(ErpError::invalid(
            "ip_address",
            format!("{ip_address:?} is not an IP address"),
        ));
    }
    if parse_password(input.password.as_deref()).is_err() {
        return Err(ErpError::invalid("password", "must be numeric or blank"));
    }
    let now = timestamp();
    let device = ZkDevice {
        id: Uuid::new_v4(),
        name,
        ip_address,
        port: i32::from(input.port.unwrap_or(config.default_port)),
        device_id: None,
        is_active: true,
        last_sync: None,
        location: input.location,
        timeout_seconds: input.timeout_seconds.unwrap_or(config.timeout_seconds) as i32,
        password: input.password.filter(|p| !p.trim().is_empty()),
        force_udp: input.force_udp,
        created_at: now,
        updated_at: now,
    };
    store.insert_device(&device)?;
    log::info!("registered device {} at {}:{}", device.name, device.ip_address, device.port);
    Ok(device)
}

pub fn set_device_active<S: Store>(store: &S, id: Uuid, active: bool) -> ErpResult<ZkDevice> {
    let mut device = store
        .get_device(id)?
        .ok_or_else(|| ErpError::not_found("device", id))?;
    device.is_active = active;
    device.updated_at = timestamp();
    store.update_device(&device)?;
    Ok(device)
}
