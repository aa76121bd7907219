//! Biometric terminals and the punches read from them.

use super::drop_tables;
use crate::migration::{Migration, MigrationError, SchemaManager};

pub struct CreateDevices;

impl Migration for CreateDevices {
    fn name(&self) -> &str {
        "create_devices"
    }

    fn version(&self) -> i64 {
        20240101000005
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS zk_devices (
                id UUID PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                ip_address VARCHAR(45) NOT NULL,
                port INTEGER NOT NULL DEFAULT 4370,
                device_id VARCHAR(100),
                is_active BOOLEAN NOT NULL DEFAULT true,
                last_sync TIMESTAMP,
                location VARCHAR(255),
                timeout_seconds INTEGER NOT NULL DEFAULT 5,
                password VARCHAR(20),
                force_udp BOOLEAN NOT NULL DEFAULT false,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;

        manager.execute_sql(
            r#"
            CREATE TABLE IF NOT EXISTS zk_attendance_logs (
                id UUID PRIMARY KEY,
                device_id UUID NOT NULL REFERENCES zk_devices(id) ON DELETE CASCADE,
                device_serial_no VARCHAR(100),
                user_id VARCHAR(50) NOT NULL,
                timestamp TIMESTAMP NOT NULL,
                punch_type VARCHAR(50),
                status VARCHAR(20),
                verify_type VARCHAR(20),
                work_code VARCHAR(50),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )?;
        manager.execute_sql(
            "CREATE INDEX IF NOT EXISTS idx_zk_attendance_logs_lookup ON zk_attendance_logs(device_id, user_id, timestamp)",
        )?;
        Ok(())
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        drop_tables(manager, &["zk_attendance_logs", "zk_devices"])
    }
}
