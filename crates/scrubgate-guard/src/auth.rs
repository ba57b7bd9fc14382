//! HTTP Basic authentication
//!
//! Both supplied values are digested to a fixed width and compared with
//! `subtle`, so neither content nor length of the configured secret shortens
//! the comparison.

use base64::Engine;
use scrubgate_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: None,
            password: None,
            min_password_length: 12,
        }
    }
}

/// Credential pair supplied by a caller
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse an `Authorization: Basic <base64>` header value
    pub fn from_basic_header(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self::new(username, password))
    }
}

type Digest32 = [u8; 32];

fn digest(value: &str) -> Digest32 {
    Sha256::digest(value.as_bytes()).into()
}

/// Verifies caller credentials against the configured pair
pub struct Authenticator {
    username: Digest32,
    password: Digest32,
}

impl Authenticator {
    /// Build from config. Returns `Ok(None)` when authentication is disabled.
    pub fn from_config(config: &AuthConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }

        let (Some(username), Some(password)) = (&config.username, &config.password) else {
            return Err(Error::Config(
                "authentication is enabled but credentials are not configured".to_string(),
            ));
        };

        if username.is_empty() {
            return Err(Error::Config("API username must not be empty".to_string()));
        }

        if password.chars().count() < config.min_password_length {
            return Err(Error::Config(format!(
                "API password must be at least {} characters",
                config.min_password_length
            )));
        }

        Ok(Some(Self::new(username, password)))
    }

    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: digest(username),
            password: digest(password),
        }
    }

    /// Check `supplied` credentials. `identity` is only used for the failure record.
    pub fn verify(&self, supplied: Option<&Credentials>, identity: &str) -> Result<()> {
        let Some(credentials) = supplied else {
            self.record_failure(identity, "missing");
            return Err(Error::Unauthorized("Authentication required".to_string()));
        };

        let user_ok = digest(&credentials.username).ct_eq(&self.username);
        let pass_ok = digest(&credentials.password).ct_eq(&self.password);

        // Non-short-circuiting AND over both comparisons
        if bool::from(user_ok & pass_ok) {
            Ok(())
        } else {
            self.record_failure(identity, "invalid");
            Err(Error::Unauthorized(
                "Invalid authentication credentials".to_string(),
            ))
        }
    }

    fn record_failure(&self, identity: &str, reason: &'static str) {
        tracing::warn!(
            client = %identity,
            reason,
            at = %chrono::Utc::now().to_rfc3339(),
            "Authentication failure"
        );
    }
}
