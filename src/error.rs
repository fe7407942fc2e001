//! Error types for media generation.

use std::time::Duration;

/// Errors that can occur while generating or editing media.
#[derive(Debug, thiserror::Error)]
pub enum GenLabError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Billing is not enabled for the key's project.
    #[error("billing error: {0}")]
    Billing(String),

    /// Polling gave up after the configured maximum wait.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Polling was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service answered but no candidate carried an inline payload.
    #[error("no {0} generated")]
    NoMedia(&'static str),

    /// Video job finished without a usable result.
    #[error("video generation failed: {0}")]
    VideoGeneration(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenLabError {
    /// Returns true if this error is likely transient.
    ///
    /// Nothing in this crate retries automatically; callers decide.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network(_))
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::Network(_) => Some(Duration::from_secs(2)),
            _ => None,
        }
    }
}

/// Result type alias for media generation operations.
pub type Result<T> = std::result::Result<T, GenLabError>;

const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Reads a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Redacts anything that looks like a Google API key and caps the length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted = text
        .split_inclusive(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-')
        .map(|chunk| {
            let token =
                chunk.trim_end_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-');
            if token.starts_with("AIza") && token.len() >= 30 {
                chunk.replacen(token, "[REDACTED]", 1)
            } else {
                chunk.to_string()
            }
        })
        .collect::<String>();

    let trimmed = redacted.trim();
    if trimmed.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let cut: String = trimmed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}

/// Passes successful responses through and turns the rest into errors.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let headers = response.headers().clone();
    let text = response.text().await.unwrap_or_default();
    Err(classify_http_error(status.as_u16(), &text, &headers))
}

/// Maps a non-success HTTP response onto an error variant.
pub(crate) fn classify_http_error(
    status: u16,
    text: &str,
    headers: &reqwest::header::HeaderMap,
) -> GenLabError {
    let text = sanitize_error_message(text);
    match status {
        401 | 403 => return GenLabError::Auth(text),
        402 => {
            return GenLabError::Billing(
                "enable billing for the API key's project at https://aistudio.google.com".into(),
            )
        }
        404 => {
            return GenLabError::InvalidRequest(
                "model or operation not found. Verify the model name is correct.".into(),
            )
        }
        429 => {
            let retry_after = parse_retry_after(headers).map(Duration::from_secs);
            return GenLabError::RateLimited { retry_after };
        }
        _ => {}
    }
    let lower = text.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return GenLabError::ContentBlocked(text);
    }
    GenLabError::Api {
        status,
        message: text,
    }
}
