use crate::auth::session::SessionState;
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;
use crate::model::session::User;
use crate::models::{
    LoginReqDto, RecoverReqDto, RegisterReqDto, RegisterResponse, ResetPasswordReqDto,
    ScanRequest, ScanResponse, UserResponse,
};
use crate::resolver::AttendanceStatus;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scan Attendance API",
        version = "0.1.0",
        description = r#"
## Employee attendance by QR scan

A scanner terminal posts the code printed on an employee badge. The first scan
of a local calendar day records the check-in, the second the check-out, and
any later scan reports the day as complete without writing.

Employees, attendance rows and accounts live in a hosted Supabase project;
this service talks to its REST and auth endpoints with the project key.

### Response format
- Errors are `{"error": "..."}` with 400 / 401 / 404 / 500
- Scans answer `{"status", "message", "attendance"}`
"#,
    ),
    paths(
        crate::api::attendance::scan,
        crate::api::health,

        crate::auth::handlers::login,
        crate::auth::handlers::register,
        crate::auth::handlers::logout,
        crate::auth::handlers::current_session,
        crate::auth::handlers::recover,
        crate::auth::handlers::reset_password
    ),
    components(
        schemas(
            ScanRequest,
            ScanResponse,
            AttendanceStatus,
            AttendanceRecord,
            Employee,
            LoginReqDto,
            RegisterReqDto,
            RegisterResponse,
            RecoverReqDto,
            ResetPasswordReqDto,
            UserResponse,
            User,
            SessionState
        )
    ),
    tags(
        (name = "Attendance", description = "Scan check-in / check-out"),
        (name = "Auth", description = "Session management over the identity provider"),
        (name = "Health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
