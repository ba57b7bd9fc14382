//! Request and outcome types for the masking pipeline

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether the pipeline only reports entities or also masks them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Return the analyzed text unchanged plus the detected spans
    Detect,
    /// Return masked text plus the detected spans
    #[default]
    Mask,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Detect => "detect",
            Mode::Mask => "mask",
        }
    }
}

/// Transform applied to every masked span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskingMode {
    /// `<ENTITY_TYPE>`
    Replace,
    /// A constant-width run of the masking character
    Redact,
    /// `<HASH:xxxxxxxx>` keyed on the matched value
    Hash,
}

impl MaskingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskingMode::Replace => "replace",
            MaskingMode::Redact => "redact",
            MaskingMode::Hash => "hash",
        }
    }
}

impl FromStr for MaskingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "replace" => Ok(MaskingMode::Replace),
            "redact" => Ok(MaskingMode::Redact),
            "hash" => Ok(MaskingMode::Hash),
            other => Err(Error::UnsupportedMaskingMode(truncate_for_message(other))),
        }
    }
}

impl fmt::Display for MaskingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound request body for `POST /mask`
///
/// Optional fields are resolved against server defaults once, at the
/// orchestrator boundary. `null` and absent mean the same thing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub mode: Mode,

    /// Parsed into [`MaskingMode`] during resolution so that unknown values
    /// surface as `UnsupportedMaskingMode` rather than a generic parse failure.
    #[serde(default)]
    pub masking_mode: Option<String>,

    #[serde(default)]
    pub masking_char: Option<String>,

    /// Allow-list passed to the recognizer
    #[serde(default)]
    pub entities: Option<Vec<String>>,

    /// Deny-list applied after recognition; always wins over `entities`
    #[serde(default)]
    pub skip_entities: Option<Vec<String>>,

    /// ISO code, or `"auto"`
    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub enable_preprocessing: Option<bool>,
}

/// A detected PII span
///
/// `start`/`end` are byte offsets into the analyzed text, which is the
/// preprocessed text when preprocessing ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl EntitySpan {
    pub fn new(entity_type: impl Into<String>, start: usize, end: usize, score: f64) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
            score,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Successful pipeline result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationOutcome {
    pub masked_text: String,
    pub entities_found: Vec<EntitySpan>,
    pub processing_time_ms: f64,
    pub detected_language: String,
}

fn truncate_for_message(value: &str) -> String {
    value.chars().take(32).collect()
}
