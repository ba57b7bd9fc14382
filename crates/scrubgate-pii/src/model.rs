//! Recognizer model references
//!
//! Any string that selects a recognizer model, and may end up as an argument to
//! a model loader or subprocess, passes through [`ModelRef::parse`] first.
//! Anything outside the fixed pattern fails closed.

use once_cell::sync::Lazy;
use regex::Regex;
use scrubgate_core::{Error, Result};
use std::fmt;

/// Name of the bundled pattern recognizer
pub const BUILTIN_MODEL: &str = "builtin-regex";

// spaCy-style package names: `<lang>_core_<web|news>_<sm|md|lg|trf>`
static MODEL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]{2,3}_core_(?:web|news)_(?:sm|md|lg|trf)$").expect("static model pattern")
});

/// A validated model reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelRef(String);

impl ModelRef {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw == BUILTIN_MODEL || MODEL_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(Error::InvalidModelReference(raw.chars().take(64).collect()))
        }
    }

    pub fn builtin() -> Self {
        Self(BUILTIN_MODEL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Language prefix encoded in the model name, if any
    pub fn language_hint(&self) -> Option<&str> {
        self.0.split_once("_core_").map(|(lang, _)| lang)
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
