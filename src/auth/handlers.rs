use actix_web::{HttpResponse, web};
use serde_json::json;
use tracing::{info, instrument};

use super::provider::AuthError;
use super::session::SessionContext;
use crate::models::{
    LoginReqDto, RecoverReqDto, RegisterReqDto, RegisterResponse, ResetPasswordReqDto,
    UserResponse,
};

fn require(value: &str, what: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = UserResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Rejected by the identity provider", body = Object, example = json!({
            "error": "Invalid login credentials"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(session, payload), fields(email = %payload.email))]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    session: web::Data<SessionContext>,
) -> Result<HttpResponse, AuthError> {
    require(&payload.email, "Email")?;
    require(&payload.password, "Password")?;

    let user = session.login(payload.email.trim(), &payload.password).await?;
    info!(user_id = %user.id, "Login successful");

    Ok(HttpResponse::Ok().json(UserResponse { user }))
}

/// Register an administrator account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReqDto,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Missing field"),
        (status = 401, description = "Rejected by the identity provider"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(session, payload), fields(email = %payload.email))]
pub async fn register(
    payload: web::Json<RegisterReqDto>,
    session: web::Data<SessionContext>,
) -> Result<HttpResponse, AuthError> {
    require(&payload.email, "Email")?;
    require(&payload.password, "Password")?;
    require(&payload.full_name, "Full name")?;

    let outcome = session
        .register(payload.email.trim(), &payload.password, payload.full_name.trim())
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        confirmation_required: outcome.session.is_none(),
        user: outcome.user,
    }))
}

/// Sign out; always succeeds locally
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Signed out")),
    tag = "Auth"
)]
pub async fn logout(session: web::Data<SessionContext>) -> HttpResponse {
    session.logout().await;
    HttpResponse::NoContent().finish()
}

/// Refresh and return the cached session state
#[utoipa::path(
    get,
    path = "/auth/session",
    responses((status = 200, description = "Current session state", body = SessionState)),
    tag = "Auth"
)]
pub async fn current_session(session: web::Data<SessionContext>) -> HttpResponse {
    session.get_session().await;
    HttpResponse::Ok().json(session.snapshot())
}

/// Request a password-recovery email
#[utoipa::path(
    post,
    path = "/auth/recover",
    request_body = RecoverReqDto,
    responses(
        (status = 202, description = "Recovery email requested"),
        (status = 400, description = "Missing email"),
        (status = 401, description = "Rejected by the identity provider")
    ),
    tag = "Auth"
)]
pub async fn recover(
    payload: web::Json<RecoverReqDto>,
    session: web::Data<SessionContext>,
) -> Result<HttpResponse, AuthError> {
    require(&payload.email, "Email")?;
    session.recover_password(payload.email.trim()).await?;

    Ok(HttpResponse::Accepted().json(json!({
        "message": "If the address is registered, a recovery email is on its way"
    })))
}

/// Complete recovery by setting a new password for the signed-in user
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordReqDto,
    responses(
        (status = 200, description = "Password updated", body = UserResponse),
        (status = 400, description = "Missing password"),
        (status = 401, description = "Not signed in or rejected")
    ),
    tag = "Auth"
)]
pub async fn reset_password(
    payload: web::Json<ResetPasswordReqDto>,
    session: web::Data<SessionContext>,
) -> Result<HttpResponse, AuthError> {
    require(&payload.password, "Password")?;
    let user = session.update_password(&payload.password).await?;

    Ok(HttpResponse::Ok().json(UserResponse { user }))
}
