use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::time::deserialize_opt_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 42,
        "employee_id": 1,
        "day_of_week": 1,
        "check_in": "2026-10-19T08:02:11+02:00",
        "check_out": null,
        "present": true,
        "created_at": "2026-10-19T08:02:11+02:00"
    })
)]
pub struct AttendanceRecord {
    pub id: i64,
    pub employee_id: i64,

    /// 1 = Monday ... 7 = Sunday
    #[schema(example = 1, minimum = 1, maximum = 7)]
    pub day_of_week: u8,

    #[schema(value_type = Option<String>, example = "2026-10-19T08:02:11+02:00")]
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub check_in: Option<DateTime<FixedOffset>>,

    #[schema(value_type = Option<String>, example = "2026-10-19T17:30:00+02:00")]
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub check_out: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub present: bool,

    #[schema(value_type = Option<String>)]
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub created_at: Option<DateTime<FixedOffset>>,
}

impl AttendanceRecord {
    pub fn is_complete(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_some()
    }
}

/// Row body for the first scan of a day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAttendance {
    pub employee_id: i64,
    pub check_in: DateTime<FixedOffset>,
    pub present: bool,
    pub day_of_week: u8,
}

/// Timestamp columns a scan may fill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceColumn {
    CheckIn,
    CheckOut,
}

impl AttendanceColumn {
    pub fn name(self) -> &'static str {
        self.into()
    }
}
