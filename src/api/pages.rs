use actix_web::{HttpRequest, HttpResponse, Responder};
use serde_json::json;

pub const LOGIN: &str = "/login";
pub const DASHBOARD: &str = "/dashboard";

/// Front-end page table. Pages themselves render elsewhere; the server only
/// needs to know which ones exist and who may see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Page {
    Root,
    Login,
    RegisterAdmin,
    ForgotPassword,
    ResetPassword,
    Dashboard,
    Attendance,
    Employees,
    Reports,
    Schedules,
    NotFound,
}

impl Page {
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Page::Root,
            ["login"] => Page::Login,
            ["register-admin"] => Page::RegisterAdmin,
            ["forgot-password"] => Page::ForgotPassword,
            ["reset-password"] => Page::ResetPassword,
            ["dashboard"] => Page::Dashboard,
            ["attendance", _] => Page::Attendance,
            ["employees"] => Page::Employees,
            ["reports", _] => Page::Reports,
            ["schedules", _] => Page::Schedules,
            _ => Page::NotFound,
        }
    }

    /// Reachable without a session.
    pub fn is_public(self) -> bool {
        matches!(
            self,
            Page::Login | Page::RegisterAdmin | Page::ForgotPassword | Page::ResetPassword
        )
    }

    /// Pages a signed-in user is sent away from.
    pub fn is_guest_only(self) -> bool {
        matches!(self, Page::Login | Page::RegisterAdmin)
    }
}

/// Placeholder body for any known page.
pub async fn page(req: HttpRequest) -> impl Responder {
    let page = Page::from_path(req.path());
    HttpResponse::Ok().json(json!({
        "page": page.to_string(),
        "path": req.path(),
    }))
}

pub async fn not_found(req: HttpRequest) -> impl Responder {
    HttpResponse::NotFound().json(json!({
        "page": Page::NotFound.to_string(),
        "path": req.path(),
    }))
}
