use super::records::PgRecord;
use super::PgStore;
use crate::devices::model::{ZkAttendanceLog, ZkDevice};
use crate::store::{DeviceStore, StoreResult};
use chrono::NaiveDateTime;
use sea_query::{Condition, Expr, ExprTrait, Query};
use uuid::Uuid;

impl DeviceStore for PgStore {
    fn insert_device(&self, value: &ZkDevice) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_device(&self, value: &ZkDevice) -> StoreResult<()> {
        self.update_record(value)
    }

    fn get_device(&self, id: Uuid) -> StoreResult<Option<ZkDevice>> {
        self.get_record(id)
    }

    fn list_devices(&self) -> StoreResult<Vec<ZkDevice>> {
        self.list_by(Condition::all(), &["name"])
    }

    fn attendance_log_exists(
        &self,
        device_id: Uuid,
        user_id: &str,
        timestamp: NaiveDateTime,
        punch_type: Option<&str>,
    ) -> StoreResult<bool> {
        let punch = match punch_type {
            Some(punch) => Expr::col("punch_type").eq(punch),
            None => Expr::col("punch_type").is_null(),
        };
        self.exists(
            &Query::select()
                .column("id")
                .from(ZkAttendanceLog::TABLE)
                .and_where(Expr::col("device_id").eq(device_id))
                .and_where(Expr::col("user_id").eq(user_id))
                .and_where(Expr::col("timestamp").eq(timestamp))
                .and_where(punch)
                .limit(1)
                .to_owned(),
        )
    }

    fn insert_attendance_log(&self, value: &ZkAttendanceLog) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn attendance_logs(&self, device_id: Option<Uuid>) -> StoreResult<Vec<ZkAttendanceLog>> {
        let mut condition = Condition::all();
        if let Some(id) = device_id {
            condition = condition.add(Expr::col("device_id").eq(id));
        }
        self.list_by(condition, &["timestamp", "id"])
    }
}
