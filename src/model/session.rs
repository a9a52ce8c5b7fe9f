use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Identity-provider user as returned by the GoTrue `/user` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(example = "8d0f6d3e-5b4a-4f1b-9a55-0c1c7f8f2a10")]
    pub id: String,

    #[schema(example = "admin@company.com", nullable = true)]
    #[serde(default)]
    pub email: Option<String>,

    #[schema(value_type = Object)]
    #[serde(default)]
    pub user_metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub user: User,
}

impl Session {
    /// Treats the token as expired slightly early so it is not used mid-flight.
    pub fn is_expired(&self, now_unix: i64) -> bool {
        self.expires_at - 10 <= now_unix
    }
}

/// Result of a sign-up. `session` is absent when email confirmation is pending.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUp {
    pub user: Option<User>,
    pub session: Option<Session>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Session-change notification; `session` is the session after the change.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}
