use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;
use crate::model::session::User;
use crate::resolver::AttendanceStatus;

#[derive(Deserialize, ToSchema)]
pub struct ScanRequest {
    #[schema(example = "EMP-001")]
    #[serde(default)]
    pub qr_code: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ScanResponse {
    pub status: AttendanceStatus,
    #[schema(example = "Check-in recorded.")]
    pub message: String,
    pub attendance: AttendanceRecord,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "admin@company.com")]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterReqDto {
    #[schema(example = "admin@company.com")]
    pub email: String,
    pub password: String,
    #[schema(example = "Ada Admin")]
    pub full_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RecoverReqDto {
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPasswordReqDto {
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: Option<User>,
    /// True until the emailed confirmation link is followed
    pub confirmation_required: bool,
}
