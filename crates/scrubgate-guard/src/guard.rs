//! Composed admission checks
//!
//! Order is fixed: body size, then authentication, then rate limiting.
//! Entity ceiling and deadline are applied later by the orchestrator through
//! [`SecurityGuard::limits`].

use crate::auth::{AuthConfig, Authenticator, Credentials};
use crate::limits::ResourceLimits;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use scrubgate_core::Result;
use serde::{Deserialize, Serialize};

/// All guard settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub limits: ResourceLimits,
}

/// What the transport knows about the caller
#[derive(Debug, Clone)]
pub struct ClientContext {
    /// Rate-limit key, usually the client address
    pub identity: String,
    pub credentials: Option<Credentials>,
}

impl ClientContext {
    pub fn new(identity: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self {
            identity: identity.into(),
            credentials,
        }
    }
}

/// Process-wide guard shared by all requests
pub struct SecurityGuard {
    limits: ResourceLimits,
    authenticator: Option<Authenticator>,
    rate_limiter: Option<RateLimiter>,
}

impl SecurityGuard {
    /// Build and validate. Fails on incomplete or weak credentials, zero limits
    /// and a rate-limit idle timeout shorter than its interval.
    pub fn new(config: GuardConfig) -> Result<Self> {
        config.limits.validate()?;
        if config.rate_limit.enabled {
            config.rate_limit.validate()?;
        }

        let authenticator = Authenticator::from_config(&config.auth)?;
        let rate_limiter = config
            .rate_limit
            .enabled
            .then(|| RateLimiter::new(config.rate_limit.clone()));

        tracing::info!(
            auth = authenticator.is_some(),
            rate_limit = rate_limiter.is_some(),
            max_text_chars = config.limits.max_text_chars,
            max_body_bytes = config.limits.max_body_bytes,
            max_entities = config.limits.max_entities,
            processing_timeout_ms = config.limits.processing_timeout_ms,
            "Security guard configured"
        );

        Ok(Self {
            limits: config.limits,
            authenticator,
            rate_limiter,
        })
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn auth_enabled(&self) -> bool {
        self.authenticator.is_some()
    }

    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }

    /// Run the pre-parse checks for one request, cheapest first
    pub fn admit(&self, client: &ClientContext, body_bytes: usize) -> Result<()> {
        self.limits.check_body_size(body_bytes)?;

        if let Some(auth) = &self.authenticator {
            auth.verify(client.credentials.as_ref(), &client.identity)?;
        }

        if let Some(limiter) = &self.rate_limiter {
            limiter.check(&client.identity)?;
        }

        Ok(())
    }

    /// Drop idle rate-limit state. Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        self.rate_limiter.as_ref().map_or(0, RateLimiter::sweep)
    }
}
