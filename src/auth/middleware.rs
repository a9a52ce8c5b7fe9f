use actix_web::middleware::Next;
use actix_web::{
    Error, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::LOCATION,
    web::Data,
};

use super::guard::{Navigation, before_each};
use super::session::SessionContext;

/// Runs the navigation guard in front of every page route.
pub async fn session_guard(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let session = req
        .app_data::<Data<SessionContext>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Session context missing"))?;

    match before_each(&session, req.path()).await {
        Navigation::Proceed => next.call(req).await,
        Navigation::Redirect(location) => {
            let resp = HttpResponse::Found()
                .insert_header((LOCATION, location))
                .finish();
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}
