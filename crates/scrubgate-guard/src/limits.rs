//! Resource ceilings and the processing deadline

use scrubgate_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard ceilings applied to every request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Maximum characters of `text`
    pub max_text_chars: usize,

    /// Maximum raw request body bytes
    pub max_body_bytes: usize,

    /// Maximum entities a single request may produce
    pub max_entities: usize,

    /// Budget for analysis plus masking
    pub processing_timeout_ms: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_text_chars: 50_000,
            max_body_bytes: 1_048_576,
            max_entities: 1_000,
            processing_timeout_ms: 30_000,
        }
    }
}

impl ResourceLimits {
    pub fn processing_timeout(&self) -> Duration {
        Duration::from_millis(self.processing_timeout_ms)
    }

    /// Reject bodies larger than the configured byte ceiling
    pub fn check_body_size(&self, bytes: usize) -> Result<()> {
        if bytes > self.max_body_bytes {
            return Err(Error::PayloadTooLarge {
                size: bytes,
                max: self.max_body_bytes,
            });
        }
        Ok(())
    }

    /// Reject text longer than the configured character ceiling.
    /// Counting is by Unicode scalar value, not bytes.
    pub fn check_text_size(&self, text: &str) -> Result<()> {
        // Byte length bounds char count from above
        if text.len() <= self.max_text_chars {
            return Ok(());
        }

        let chars = text.chars().count();
        if chars > self.max_text_chars {
            return Err(Error::PayloadTooLarge {
                size: chars,
                max: self.max_text_chars,
            });
        }
        Ok(())
    }

    /// Reject analyses that produced more spans than allowed
    pub fn check_entity_count(&self, found: usize) -> Result<()> {
        if found > self.max_entities {
            tracing::warn!(found, max = self.max_entities, "Entity ceiling exceeded");
            return Err(Error::TooManyEntities {
                found,
                max: self.max_entities,
            });
        }
        Ok(())
    }

    /// Validate ceilings at startup
    pub fn validate(&self) -> Result<()> {
        if self.max_text_chars == 0 {
            return Err(Error::Config("max text size must be greater than 0".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(Error::Config("max request size must be greater than 0".to_string()));
        }
        if self.max_entities == 0 {
            return Err(Error::Config("max entities must be greater than 0".to_string()));
        }
        if self.processing_timeout_ms == 0 {
            return Err(Error::Config("processing timeout must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Run CPU-bound `work` on the blocking pool under `deadline`.
///
/// On expiry the caller gets `ProcessingTimeout` immediately; the blocking
/// task runs to completion in the background and its result is discarded.
pub async fn run_with_deadline<T, F>(deadline: Duration, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);

    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => {
            tracing::error!(error = %join_error, "Processing task failed");
            Err(Error::Internal("processing task failed".to_string()))
        }
        Err(_) => {
            let timeout_ms = deadline.as_millis() as u64;
            tracing::warn!(timeout_ms, "Processing deadline exceeded");
            Err(Error::ProcessingTimeout { timeout_ms })
        }
    }
}
