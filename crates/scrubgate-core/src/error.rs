//! Error types for Scrubgate Core
//!
//! Messages are surfaced to callers, so no variant ever carries submitted
//! text or masked fragments. Entity-type names, counts, limits and timings only.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Payload too large: {size} exceeds the maximum of {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("{0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Too many entities detected: {found} exceeds the maximum of {max}")]
    TooManyEntities { found: usize, max: usize },

    #[error("Processing exceeded the deadline of {timeout_ms}ms")]
    ProcessingTimeout { timeout_ms: u64 },

    #[error("Invalid masking_mode '{0}'. Must be: replace, redact, or hash")]
    UnsupportedMaskingMode(String),

    #[error("Span [{start}, {end}) is out of bounds for text of length {len}")]
    InvalidSpanBounds { start: usize, end: usize, len: usize },

    #[error("No recognizer warmed for language '{0}'")]
    UnsupportedLanguage(String),

    #[error("Invalid model reference")]
    InvalidModelReference(String),

    #[error("Recognizer error: {0}")]
    Recognizer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Reference HTTP status for this error kind
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::UnsupportedMaskingMode(_) => 400,
            Error::InvalidModelReference(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::PayloadTooLarge { .. } => 413,
            Error::TooManyEntities { .. } => 422,
            Error::RateLimited { .. } => 429,
            Error::ProcessingTimeout { .. } => 504,
            Error::InvalidSpanBounds { .. }
            | Error::UnsupportedLanguage(_)
            | Error::Recognizer(_)
            | Error::Config(_)
            | Error::Internal(_) => 500,
        }
    }

    /// Stable machine-readable tag, used for metrics labels and error envelopes
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::Unauthorized(_) => "unauthorized",
            Error::RateLimited { .. } => "rate_limited",
            Error::TooManyEntities { .. } => "too_many_entities",
            Error::ProcessingTimeout { .. } => "processing_timeout",
            Error::UnsupportedMaskingMode(_) => "unsupported_masking_mode",
            Error::InvalidSpanBounds { .. } => "invalid_span_bounds",
            Error::UnsupportedLanguage(_) => "unsupported_language",
            Error::InvalidModelReference(_) => "invalid_model_reference",
            Error::Recognizer(_) => "recognizer_error",
            Error::Config(_) => "config_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Whether the message is safe and useful to show the caller verbatim.
    /// Internal faults are reported with a generic message instead.
    pub fn is_client_facing(&self) -> bool {
        self.status_code() < 500 || matches!(self, Error::ProcessingTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
