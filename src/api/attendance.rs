use actix_web::{HttpResponse, web};
use chrono::Local;
use tracing::instrument;

use crate::models::{ScanRequest, ScanResponse};
use crate::resolver::{AttendanceError, resolve_scan};
use crate::store::AttendanceStore;

/// Scan endpoint: check-in, check-out, or a no-op once the day is complete
#[utoipa::path(
    post,
    path = "/attendance",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan recorded", body = ScanResponse),
        (status = 400, description = "No QR code provided", body = Object, example = json!({
            "error": "No QR code provided"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found"
        })),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "error": "Internal error"
        }))
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_scan", skip(store, payload))]
pub async fn scan(
    payload: web::Json<ScanRequest>,
    store: web::Data<dyn AttendanceStore>,
) -> Result<HttpResponse, AttendanceError> {
    let code = payload
        .qr_code
        .as_deref()
        .ok_or(AttendanceError::MissingCode)?;

    let outcome = resolve_scan(store.get_ref(), code, Local::now()).await?;

    Ok(HttpResponse::Ok().json(ScanResponse {
        status: outcome.status,
        message: outcome.status.message().to_string(),
        attendance: outcome.record,
    }))
}
