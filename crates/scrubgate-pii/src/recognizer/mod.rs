//! Built-in entity recognizers
//!
//! The production deployment plugs an NLP engine in behind
//! [`scrubgate_core::EntityRecognizer`]; the pattern recognizer here covers
//! structured identifiers and serves as the bundled default.

mod regex_recognizer;

pub use regex_recognizer::RegexRecognizer;

use crate::model::ModelRef;
use serde::{Deserialize, Serialize};

/// Entity type tags produced by [`RegexRecognizer`]
pub mod entity {
    pub const EMAIL_ADDRESS: &str = "EMAIL_ADDRESS";
    pub const PHONE_NUMBER: &str = "PHONE_NUMBER";
    pub const US_SSN: &str = "US_SSN";
    pub const CREDIT_CARD: &str = "CREDIT_CARD";
    pub const IP_ADDRESS: &str = "IP_ADDRESS";
    pub const URL: &str = "URL";
    pub const IBAN_CODE: &str = "IBAN_CODE";
}

/// Additional pattern recognized as its own entity type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPattern {
    /// Entity type tag emitted for matches, e.g. `EMPLOYEE_ID`
    pub entity_type: String,

    /// Regex pattern
    pub pattern: String,

    /// Score assigned to matches
    #[serde(default = "default_custom_score")]
    pub score: f64,
}

fn default_custom_score() -> f64 {
    0.8
}

/// Configuration for one [`RegexRecognizer`] instance
#[derive(Debug, Clone)]
pub struct RegexRecognizerConfig {
    /// Language this instance serves
    pub language: String,

    /// Model this instance was warmed from
    pub model: ModelRef,

    /// Spans scoring below this are discarded
    pub min_score: f64,

    pub custom_patterns: Vec<CustomPattern>,
}

impl RegexRecognizerConfig {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            model: ModelRef::builtin(),
            min_score: 0.5,
            custom_patterns: Vec::new(),
        }
    }
}
