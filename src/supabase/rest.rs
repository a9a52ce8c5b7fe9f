use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;

use super::{SupabaseClient, UpstreamError, read_json};
use crate::model::attendance::{AttendanceColumn, AttendanceRecord, NewAttendance};
use crate::model::employee::Employee;
use crate::store::AttendanceStore;
use crate::utils::time::DayWindow;

const EMPLOYEES: &str = "employees";
const ATTENDANCE: &str = "attendance";

pub(crate) fn employee_filter(code: &str) -> Vec<(&'static str, String)> {
    vec![("qr_code", format!("eq.{code}")), ("limit", "1".to_string())]
}

pub(crate) fn window_filter(employee_id: i64, window: &DayWindow) -> Vec<(&'static str, String)> {
    vec![
        ("employee_id", format!("eq.{employee_id}")),
        ("created_at", format!("gte.{}", timestamp(&window.start))),
        ("created_at", format!("lt.{}", timestamp(&window.end))),
        ("order", "created_at.asc".to_string()),
        ("limit", "1".to_string()),
    ]
}

pub(crate) fn unset_filter(record_id: i64, column: AttendanceColumn) -> Vec<(&'static str, String)> {
    vec![
        ("id", format!("eq.{record_id}")),
        (column.name(), "is.null".to_string()),
    ]
}

fn timestamp(instant: &DateTime<FixedOffset>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}

#[async_trait]
impl AttendanceStore for SupabaseClient {
    async fn find_employee_by_code(&self, code: &str) -> Result<Option<Employee>, UpstreamError> {
        let response = self
            .request(Method::GET, &self.rest_url(EMPLOYEES))
            .query(&employee_filter(code))
            .send()
            .await?;

        let rows: Vec<Employee> = read_json(response).await?;
        debug!(matches = rows.len(), "Employee lookup finished");
        Ok(rows.into_iter().next())
    }

    async fn find_attendance_in_window(
        &self,
        employee_id: i64,
        window: &DayWindow,
    ) -> Result<Option<AttendanceRecord>, UpstreamError> {
        let response = self
            .request(Method::GET, &self.rest_url(ATTENDANCE))
            .query(&window_filter(employee_id, window))
            .send()
            .await?;

        let rows: Vec<AttendanceRecord> = read_json(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_attendance(
        &self,
        record: &NewAttendance,
    ) -> Result<AttendanceRecord, UpstreamError> {
        let response = self
            .request(Method::POST, &self.rest_url(ATTENDANCE))
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;

        let rows: Vec<AttendanceRecord> = read_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| UpstreamError::Inconsistent("insert returned no row".to_string()))
    }

    async fn mark_if_unset(
        &self,
        record_id: i64,
        column: AttendanceColumn,
        at: DateTime<FixedOffset>,
    ) -> Result<Option<AttendanceRecord>, UpstreamError> {
        let mut body = Map::new();
        body.insert(column.to_string(), Value::String(at.to_rfc3339()));

        let response = self
            .request(Method::PATCH, &self.rest_url(ATTENDANCE))
            .query(&unset_filter(record_id, column))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;

        let rows: Vec<AttendanceRecord> = read_json(response).await?;
        Ok(rows.into_iter().next())
    }
}
