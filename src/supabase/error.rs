use thiserror::Error;

/// Failures talking to the Supabase REST / GoTrue endpoints.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed upstream payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected upstream state: {0}")]
    Inconsistent(String),
}
