//! Scan resolution: decides whether a scan is a check-in, a check-out or a
//! no-op for a day that is already complete, and performs at most one write.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceColumn, AttendanceRecord, NewAttendance};
use crate::store::AttendanceStore;
use crate::supabase::UpstreamError;
use crate::utils::time::{DayWindow, day_of_week};

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("No QR code provided")]
    MissingCode,

    #[error("Employee not found")]
    EmployeeNotFound,

    #[error("Internal error")]
    Upstream(#[from] UpstreamError),
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::MissingCode => StatusCode::BAD_REQUEST,
            AttendanceError::EmployeeNotFound => StatusCode::NOT_FOUND,
            AttendanceError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceStatus {
    CheckIn,
    CheckOut,
    AlreadyComplete,
}

impl AttendanceStatus {
    pub fn message(&self) -> &'static str {
        match self {
            AttendanceStatus::CheckIn => "Check-in recorded.",
            AttendanceStatus::CheckOut => "Check-out recorded.",
            AttendanceStatus::AlreadyComplete => "Attendance for today is already complete.",
        }
    }

    /// Status describing a record as it currently stands.
    fn of(record: &AttendanceRecord) -> Self {
        if record.is_complete() {
            AttendanceStatus::AlreadyComplete
        } else {
            AttendanceStatus::CheckIn
        }
    }
}

/// What a scan does to today's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Insert,
    Mark(AttendanceColumn),
    Complete,
}

pub fn decide(existing: Option<&AttendanceRecord>) -> Transition {
    match existing {
        None => Transition::Insert,
        Some(r) if r.check_in.is_none() => Transition::Mark(AttendanceColumn::CheckIn),
        Some(r) if r.check_out.is_none() => Transition::Mark(AttendanceColumn::CheckOut),
        Some(_) => Transition::Complete,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub status: AttendanceStatus,
    pub record: AttendanceRecord,
}

/// Resolves one scan at local time `now`.
pub async fn resolve_scan(
    store: &dyn AttendanceStore,
    code: &str,
    now: DateTime<Local>,
) -> Result<ScanOutcome, AttendanceError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AttendanceError::MissingCode);
    }

    let employee = store
        .find_employee_by_code(code)
        .await
        .inspect_err(|e| error!(error = %e, "Employee lookup failed"))?
        .ok_or(AttendanceError::EmployeeNotFound)?;

    let window = DayWindow::containing(&now);
    let stamp = now.fixed_offset();

    let existing = store
        .find_attendance_in_window(employee.id, &window)
        .await
        .inspect_err(|e| error!(error = %e, employee_id = employee.id, "Attendance lookup failed"))?;

    let transition = decide(existing.as_ref());
    debug!(employee_id = employee.id, ?transition, "Scan resolved");

    let outcome = match (transition, existing) {
        (Transition::Insert, _) => {
            let row = NewAttendance {
                employee_id: employee.id,
                check_in: stamp,
                present: true,
                day_of_week: day_of_week(&now),
            };
            let record = store
                .insert_attendance(&row)
                .await
                .inspect_err(|e| error!(error = %e, employee_id = employee.id, "Check-in insert failed"))?;
            ScanOutcome {
                status: AttendanceStatus::CheckIn,
                record,
            }
        }
        (Transition::Mark(column), Some(current)) => {
            let status = match column {
                AttendanceColumn::CheckIn => AttendanceStatus::CheckIn,
                AttendanceColumn::CheckOut => AttendanceStatus::CheckOut,
            };
            match store
                .mark_if_unset(current.id, column, stamp)
                .await
                .inspect_err(|e| error!(error = %e, record_id = current.id, %column, "Attendance update failed"))?
            {
                Some(record) => ScanOutcome { status, record },
                None => {
                    warn!(record_id = current.id, %column, "Concurrent scan already wrote this column");
                    let record = store
                        .find_attendance_in_window(employee.id, &window)
                        .await?
                        .ok_or_else(|| {
                            UpstreamError::Inconsistent(format!(
                                "attendance {} vanished during scan",
                                current.id
                            ))
                        })?;
                    ScanOutcome {
                        status: AttendanceStatus::of(&record),
                        record,
                    }
                }
            }
        }
        (Transition::Complete, Some(record)) => ScanOutcome {
            status: AttendanceStatus::AlreadyComplete,
            record,
        },
        (_, None) => {
            return Err(UpstreamError::Inconsistent("no record to update".to_string()).into());
        }
    };

    info!(
        employee_id = employee.id,
        record_id = outcome.record.id,
        status = %outcome.status,
        "Attendance scan handled"
    );

    Ok(outcome)
}
