use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::model::session::{AuthEvent, Session, SignUp, User};
use crate::supabase::UpstreamError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider refused the request; carries its message.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Internal error")]
    Upstream(#[from] UpstreamError),
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Rejected(_) | AuthError::NotSignedIn => StatusCode::UNAUTHORIZED,
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// Where the confirmation email sends the user
    pub redirect_to: String,
}

/// Session-based identity service. `SupabaseAuth` is the GoTrue implementation.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The stored session, refreshed first if its access token expired.
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
    -> Result<Session, AuthError>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUp, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Sends a password-recovery email linking back to `redirect_to`.
    async fn recover_password(&self, email: &str, redirect_to: &str) -> Result<(), AuthError>;

    async fn update_password(&self, password: &str) -> Result<User, AuthError>;

    /// Session-change notifications, delivered in the order they happen.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use crate::model::session::AuthEventKind;
    use serde_json::Value;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    pub fn user(email: &str) -> User {
        User {
            id: format!("id-{email}"),
            email: Some(email.to_string()),
            user_metadata: Value::Null,
        }
    }

    pub fn session(email: &str) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: i64::MAX,
            user: user(email),
        }
    }

    /// Scriptable provider. With `gate` set, `current_session` blocks until released.
    pub struct FakeIdentity {
        pub session: Mutex<Option<Session>>,
        pub password: String,
        pub gate: Option<Notify>,
        pub session_calls: AtomicUsize,
        pub fail_sign_out: bool,
        pub last_sign_up: Mutex<Option<SignUpRequest>>,
        pub last_recovery: Mutex<Option<(String, String)>>,
        events: broadcast::Sender<AuthEvent>,
    }

    impl FakeIdentity {
        pub fn new(session: Option<Session>) -> Self {
            let (events, _) = broadcast::channel(16);
            Self {
                session: Mutex::new(session),
                password: "correct horse".to_string(),
                gate: None,
                session_calls: AtomicUsize::new(0),
                fail_sign_out: false,
                last_sign_up: Mutex::new(None),
                last_recovery: Mutex::new(None),
                events,
            }
        }

        pub fn gated(session: Option<Session>) -> Self {
            Self {
                gate: Some(Notify::new()),
                ..Self::new(session)
            }
        }

        pub fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.notify_one();
            }
        }

        pub fn session_calls(&self) -> usize {
            self.session_calls.load(Ordering::SeqCst)
        }

        pub fn emit(&self, kind: AuthEventKind, session: Option<Session>) {
            let _ = self.events.send(AuthEvent { kind, session });
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        async fn current_session(&self) -> Result<Option<Session>, AuthError> {
            self.session_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(self.session.lock().unwrap().clone())
        }

        async fn sign_in_with_password(
            &self,
            email: &str,
            password: &str,
        ) -> Result<Session, AuthError> {
            if password != self.password {
                return Err(AuthError::Rejected("Invalid login credentials".to_string()));
            }
            let session = session(email);
            *self.session.lock().unwrap() = Some(session.clone());
            self.emit(AuthEventKind::SignedIn, Some(session.clone()));
            Ok(session)
        }

        async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUp, AuthError> {
            *self.last_sign_up.lock().unwrap() = Some(request.clone());
            if request.email.contains("taken") {
                return Err(AuthError::Rejected("User already registered".to_string()));
            }
            Ok(SignUp {
                user: Some(user(&request.email)),
                session: None,
            })
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            *self.session.lock().unwrap() = None;
            if self.fail_sign_out {
                return Err(AuthError::Upstream(UpstreamError::Status {
                    status: 502,
                    body: "bad gateway".to_string(),
                }));
            }
            self.emit(AuthEventKind::SignedOut, None);
            Ok(())
        }

        async fn recover_password(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
            *self.last_recovery.lock().unwrap() = Some((email.to_string(), redirect_to.to_string()));
            Ok(())
        }

        async fn update_password(&self, _password: &str) -> Result<User, AuthError> {
            self.session
                .lock()
                .unwrap()
                .as_ref()
                .map(|s| s.user.clone())
                .ok_or(AuthError::NotSignedIn)
        }

        fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
            self.events.subscribe()
        }
    }
}
