//! Thin reqwest client for the hosted Supabase project: PostgREST for rows
//! (`rest.rs`) and GoTrue for sessions (`auth.rs`).

pub mod auth;
pub mod error;
pub mod rest;

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::Config;
pub use error::UpstreamError;

#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        Self::new(
            &config.supabase_url,
            &config.supabase_key,
            Duration::from_secs(config.upstream_timeout_secs),
        )
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request carrying the project key both as `apikey` and as bearer token.
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.request_as(method, url, &self.api_key)
    }

    /// Request on behalf of a signed-in user.
    pub(crate) fn request_as(&self, method: Method, url: &str, bearer: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }
}

/// Reads a success body as JSON, turning non-2xx replies into `UpstreamError::Status`.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, UpstreamError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SupabaseClient {
        SupabaseClient::new("https://demo.supabase.co/", "anon", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn builds_rest_and_auth_urls() {
        let client = client();
        assert_eq!(
            client.rest_url("employees"),
            "https://demo.supabase.co/rest/v1/employees"
        );
        assert_eq!(
            client.auth_url("/token"),
            "https://demo.supabase.co/auth/v1/token"
        );
    }

    #[test]
    fn every_request_carries_the_project_key() {
        let request = client()
            .request(Method::GET, "https://demo.supabase.co/rest/v1/employees")
            .build()
            .unwrap();

        assert_eq!(request.headers()["apikey"], "anon");
        assert_eq!(request.headers()["authorization"], "Bearer anon");
    }

    #[test]
    fn user_requests_use_the_access_token() {
        let request = client()
            .request_as(Method::GET, "https://demo.supabase.co/auth/v1/user", "user-jwt")
            .build()
            .unwrap();

        assert_eq!(request.headers()["apikey"], "anon");
        assert_eq!(request.headers()["authorization"], "Bearer user-jwt");
    }

    fn reply(status: u16, body: &'static str) -> Response {
        Response::from(http::Response::builder().status(status).body(body).unwrap())
    }

    #[actix_web::test]
    async fn non_success_reply_keeps_status_and_body() {
        let err = read_json::<Vec<serde_json::Value>>(reply(503, "service unavailable"))
            .await
            .unwrap_err();

        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "service unavailable");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn malformed_success_body_is_a_decode_error() {
        let err = read_json::<Vec<serde_json::Value>>(reply(200, "[{\"id\": 1,"))
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Decode(_)));
    }

    #[actix_web::test]
    async fn success_body_is_decoded() {
        let rows: Vec<serde_json::Value> = read_json(reply(200, r#"[{"id": 1}]"#)).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 1);
    }
}
