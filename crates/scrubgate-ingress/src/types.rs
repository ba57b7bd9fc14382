//! Shared ingress types and utilities

use axum::http::{HeaderValue, StatusCode, header};
use scrubgate_core::Error;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

/// Realm advertised on 401 responses
pub const AUTH_REALM: &str = r#"Basic realm="pii-scrubber""#;

/// Request ID for tracing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new request ID
    pub fn generate() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let count = COUNTER.fetch_add(1, Ordering::Relaxed);
        let timestamp = chrono::Utc::now().timestamp_micros();

        Self(format!("req_{:x}_{:x}", timestamp, count))
    }

    /// Get the string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity used when no client address can be determined
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Request metadata collected during ingress
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// Request ID
    pub request_id: RequestId,
    /// Rate-limit identity: peer address, forwarded client behind a trusted proxy, or `unknown`
    pub client_identity: String,
    /// Acceptance time; `processing_time_ms` and latency metrics count from here
    pub accepted_at: Instant,
}

impl RequestMetadata {
    /// Create new request metadata
    pub fn new() -> Self {
        Self {
            request_id: RequestId::generate(),
            client_identity: UNKNOWN_CLIENT.to_string(),
            accepted_at: Instant::now(),
        }
    }

    /// Set client identity
    pub fn with_client_identity(mut self, identity: String) -> Self {
        self.client_identity = identity;
        self
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Ingress error types
#[derive(Debug, Error)]
pub enum IngressError {
    /// Body is not a valid request document
    #[error("Invalid JSON in request body")]
    InvalidJson,

    /// Any pipeline or guard failure
    #[error(transparent)]
    Pipeline(#[from] Error),
}

impl IngressError {
    /// Underlying error kind, for metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            IngressError::InvalidJson => "validation_error",
            IngressError::Pipeline(err) => err.kind(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            IngressError::InvalidJson => StatusCode::BAD_REQUEST,
            IngressError::Pipeline(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl axum::response::IntoResponse for IngressError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        let message = match &self {
            IngressError::Pipeline(err) if !err.is_client_facing() => {
                tracing::error!(kind = err.kind(), error = %err, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": {
                "message": message,
                "type": self.kind(),
                "code": status.as_u16(),
            }
        });

        let mut response = (status, axum::Json(body)).into_response();

        match &self {
            IngressError::Pipeline(Error::Unauthorized(_)) => {
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(AUTH_REALM),
                );
            }
            IngressError::Pipeline(Error::RateLimited { retry_after_secs }) => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
            }
            _ => {}
        }

        response
    }
}

/// Ingress result type
pub type IngressResult<T> = Result<T, IngressError>;
