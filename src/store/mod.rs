use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::model::attendance::{AttendanceColumn, AttendanceRecord, NewAttendance};
use crate::model::employee::Employee;
use crate::supabase::UpstreamError;
use crate::utils::time::DayWindow;

#[cfg(test)]
pub mod fake;

/// Row access the scan resolver needs. Implemented over PostgREST by
/// `SupabaseClient`.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_employee_by_code(&self, code: &str) -> Result<Option<Employee>, UpstreamError>;

    /// Earliest record of `employee_id` created inside `window`.
    async fn find_attendance_in_window(
        &self,
        employee_id: i64,
        window: &DayWindow,
    ) -> Result<Option<AttendanceRecord>, UpstreamError>;

    async fn insert_attendance(
        &self,
        record: &NewAttendance,
    ) -> Result<AttendanceRecord, UpstreamError>;

    /// Sets `column` to `at` only while it is still null. `None` means no row matched.
    async fn mark_if_unset(
        &self,
        record_id: i64,
        column: AttendanceColumn,
        at: DateTime<FixedOffset>,
    ) -> Result<Option<AttendanceRecord>, UpstreamError>;
}
