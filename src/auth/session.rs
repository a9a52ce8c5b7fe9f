//! Application-level session state, shared through `web::Data`.
//!
//! Lifecycle: uninitialized -> loading (first fetch in flight) -> resolved.
//! `loading` starts out `true` so nothing treats the app as signed out before
//! the first fetch has answered.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use super::provider::{AuthError, IdentityProvider, SignUpRequest};
use crate::model::session::{AuthEvent, SignUp, User};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
    pub initialized: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
            initialized: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Resolved,
}

pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<SessionState>>,
    fetch_started: AtomicBool,
    site_url: String,
}

impl SessionContext {
    pub fn new(provider: Arc<dyn IdentityProvider>, site_url: impl Into<String>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            provider,
            state: Arc::new(state),
            fetch_started: AtomicBool::new(false),
            site_url: site_url.into(),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn phase(&self) -> SessionPhase {
        if self.state.borrow().initialized {
            SessionPhase::Resolved
        } else if self.fetch_started.load(Ordering::SeqCst) {
            SessionPhase::Loading
        } else {
            SessionPhase::Uninitialized
        }
    }

    fn set_user(&self, user: Option<User>) {
        self.state.send_modify(|state| state.user = user);
    }

    /// Re-reads the session from the provider. Always leaves the state resolved;
    /// a provider failure is logged and treated as signed out.
    ///
    /// The fetch runs on its own task, so dropping the caller does not leave
    /// the state stuck in `loading`.
    pub async fn get_session(&self) {
        self.fetch_started.store(true, Ordering::SeqCst);

        let fetch = tokio::spawn(fetch_session(
            Arc::clone(&self.provider),
            Arc::clone(&self.state),
        ));
        if let Err(e) = fetch.await {
            error!(error = %e, "Session fetch task failed");
            resolve(&self.state, None);
        }
    }

    /// Starts the first fetch if nobody has, otherwise waits for the one in flight.
    pub async fn ensure_loaded(&self) {
        if !self.is_loading() {
            return;
        }
        if !self.fetch_started.swap(true, Ordering::SeqCst) {
            self.get_session().await;
            return;
        }

        let mut rx = self.state.subscribe();
        // the sender lives as long as self, so this only ends once loaded
        let _ = rx.wait_for(|state| !state.loading).await;
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        self.set_user(Some(session.user.clone()));
        Ok(session.user)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUp, AuthError> {
        let request = SignUpRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            redirect_to: format!("{}/login", self.site_url),
        };

        let outcome = self.provider.sign_up(&request).await?;
        if let Some(session) = &outcome.session {
            self.set_user(Some(session.user.clone()));
        }
        Ok(outcome)
    }

    /// Clears the cached user even when the provider call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "Sign-out failed upstream");
        }
        self.set_user(None);
    }

    pub async fn recover_password(&self, email: &str) -> Result<(), AuthError> {
        let redirect_to = format!("{}/reset-password", self.site_url);
        self.provider.recover_password(email, &redirect_to).await
    }

    pub async fn update_password(&self, password: &str) -> Result<User, AuthError> {
        let user = self.provider.update_password(password).await?;
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    /// Keeps the cached user in step with provider events until the returned
    /// handle is dropped or unsubscribed. Must be called inside a tokio runtime.
    pub fn subscribe(&self) -> AuthSubscription {
        let mut events = self.provider.subscribe();
        let state = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => apply_event(&state, event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        info!("Subscribed to auth state changes");
        AuthSubscription { task }
    }
}

async fn fetch_session(
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<SessionState>>,
) {
    let user = match provider.current_session().await {
        Ok(session) => session.map(|s| s.user),
        Err(e) => {
            error!(error = %e, "Failed to fetch session");
            None
        }
    };

    debug!(signed_in = user.is_some(), "Session fetched");
    resolve(&state, user);
}

fn resolve(state: &watch::Sender<SessionState>, user: Option<User>) {
    state.send_modify(|state| {
        state.user = user;
        state.loading = false;
        state.initialized = true;
    });
}

fn apply_event(state: &watch::Sender<SessionState>, event: AuthEvent) {
    debug!(event = %event.kind, "Auth event received");
    let user = event.session.map(|s| s.user);
    state.send_modify(|state| state.user = user);
}

pub struct AuthSubscription {
    task: JoinHandle<()>,
}

impl AuthSubscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
