use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use super::{SupabaseClient, UpstreamError, read_json};
use crate::auth::provider::{AuthError, IdentityProvider, SignUpRequest};
use crate::model::session::{AuthEvent, AuthEventKind, Session, SignUp, User};

/// GoTrue token grant reply.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self, now_unix: i64) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|ttl| now_unix + ttl))
            .unwrap_or(now_unix);

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// GoTrue has used several error field names across versions.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// Maps a GoTrue reply: 4xx is a rejection the caller should see, anything
/// else unsuccessful is an upstream failure.
async fn read_auth<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    let status = response.status();
    if status.is_client_error() {
        let bytes = response.bytes().await.map_err(UpstreamError::from)?;
        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| format!("Request rejected ({})", status.as_u16()));
        return Err(AuthError::Rejected(message));
    }
    Ok(read_json(response).await?)
}

fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Session holder over GoTrue, mirroring the browser client: keeps the
/// current session in memory and emits an event on every change.
pub struct SupabaseAuth {
    client: SupabaseClient,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            client,
            session: RwLock::new(None),
            events,
        }
    }

    async fn store(&self, session: Option<Session>, kind: AuthEventKind) {
        *self.session.write().await = session.clone();
        // no receivers is fine
        let _ = self.events.send(AuthEvent { kind, session });
        debug!(event = %kind, "Auth state changed");
    }

    async fn grant(&self, grant_type: &str, body: Value) -> Result<Session, AuthError> {
        let response = self
            .client
            .request(Method::POST, &self.client.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await
            .map_err(UpstreamError::from)?;

        let token: TokenResponse = read_auth(response).await?;
        Ok(token.into_session(now_unix()))
    }

    async fn refresh(&self, expired: &Session) -> Result<Session, AuthError> {
        let session = self
            .grant(
                "refresh_token",
                json!({ "refresh_token": expired.refresh_token }),
            )
            .await?;
        self.store(Some(session.clone()), AuthEventKind::TokenRefreshed)
            .await;
        Ok(session)
    }

    async fn access_token(&self) -> Result<String, AuthError> {
        self.current_session()
            .await?
            .map(|s| s.access_token)
            .ok_or(AuthError::NotSignedIn)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let stored = self.session.read().await.clone();
        match stored {
            Some(session) if session.is_expired(now_unix()) => {
                match self.refresh(&session).await {
                    Ok(fresh) => Ok(Some(fresh)),
                    Err(e) => {
                        warn!(error = %e, "Session refresh failed, signing out locally");
                        self.store(None, AuthEventKind::SignedOut).await;
                        Err(e)
                    }
                }
            }
            other => Ok(other),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let session = self
            .grant(
                "password",
                json!({ "email": email, "password": password }),
            )
            .await?;
        info!(user_id = %session.user.id, "Signed in");
        self.store(Some(session.clone()), AuthEventKind::SignedIn)
            .await;
        Ok(session)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUp, AuthError> {
        let response = self
            .client
            .request(Method::POST, &self.client.auth_url("signup"))
            .query(&[("redirect_to", request.redirect_to.as_str())])
            .json(&json!({
                "email": request.email,
                "password": request.password,
                "data": { "full_name": request.full_name },
            }))
            .send()
            .await
            .map_err(UpstreamError::from)?;

        // With autoconfirm on GoTrue answers with a token grant, otherwise with the bare user.
        let body: Value = read_auth(response).await?;
        if body.get("access_token").is_some() {
            let session = serde_json::from_value::<TokenResponse>(body)
                .map_err(UpstreamError::from)?
                .into_session(now_unix());
            self.store(Some(session.clone()), AuthEventKind::SignedIn)
                .await;
            return Ok(SignUp {
                user: Some(session.user.clone()),
                session: Some(session),
            });
        }

        let user_value = body.get("user").cloned().unwrap_or(body);
        let user = serde_json::from_value::<User>(user_value).map_err(UpstreamError::from)?;

        Ok(SignUp {
            user: Some(user),
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let stored = self.session.read().await.clone();
        // local state goes first; the remote revoke is best effort
        self.store(None, AuthEventKind::SignedOut).await;

        let Some(session) = stored else {
            return Ok(());
        };

        let response = self
            .client
            .request_as(
                Method::POST,
                &self.client.auth_url("logout"),
                &session.access_token,
            )
            .send()
            .await
            .map_err(UpstreamError::from)?;

        let status = response.status();
        // an already revoked token answers 401/404
        if status.is_success() || status.as_u16() == 401 || status.as_u16() == 404 {
            return Ok(());
        }
        Err(UpstreamError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }
        .into())
    }

    async fn recover_password(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .request(Method::POST, &self.client.auth_url("recover"))
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(UpstreamError::from)?;

        let _: Value = read_auth(response).await?;
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<User, AuthError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .request_as(Method::PUT, &self.client.auth_url("user"), &token)
            .json(&json!({ "password": password }))
            .send()
            .await
            .map_err(UpstreamError::from)?;

        let user: User = read_auth(response).await?;
        let updated = self.session.read().await.clone().map(|mut s| {
            s.user = user.clone();
            s
        });
        self.store(updated, AuthEventKind::UserUpdated).await;
        Ok(user)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
