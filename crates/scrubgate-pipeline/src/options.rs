//! Per-request option resolution
//!
//! Every optional request field resolves exactly once, here:
//! request value, else server default, else hardcoded fallback.

use scrubgate_core::{AnalysisRequest, Error, MaskingMode, Mode, Result};
use scrubgate_pii::MaskingEngine;
use serde::{Deserialize, Serialize};

/// Fallback masking character
pub const DEFAULT_MASKING_CHAR: char = '█';

/// Server-side defaults for optional request fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefaults {
    pub masking_mode: MaskingMode,
    pub masking_char: char,
    pub enable_preprocessing: bool,

    /// Emit one metadata event per processed request. Never includes text.
    pub log_metadata: bool,
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            masking_mode: MaskingMode::Redact,
            masking_char: DEFAULT_MASKING_CHAR,
            enable_preprocessing: false,
            log_metadata: false,
        }
    }
}

/// Request options after resolution against [`PipelineDefaults`]
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub mode: Mode,

    /// Present in mask mode only
    pub engine: Option<MaskingEngine>,

    pub preprocess: bool,
    pub allow_list: Option<Vec<String>>,
    pub skip_list: Vec<String>,
    pub language: Option<String>,
}

/// Parse a masking character: exactly one Unicode scalar value
pub fn parse_masking_char(raw: &str) -> Result<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Ok(c),
        _ => Err(Error::Validation(
            "masking_char must be a single character".to_string(),
        )),
    }
}

impl PipelineDefaults {
    /// Resolve `request` against these defaults.
    ///
    /// Masking options are validated in both modes so that a bad value fails
    /// before any text is analyzed.
    pub fn resolve(&self, request: &AnalysisRequest) -> Result<ResolvedOptions> {
        let masking_mode = match request.masking_mode.as_deref() {
            Some(raw) => raw.parse::<MaskingMode>()?,
            None => self.masking_mode,
        };

        let masking_char = match request.masking_char.as_deref() {
            Some(raw) => parse_masking_char(raw)?,
            None => self.masking_char,
        };

        let engine = match request.mode {
            Mode::Mask => Some(MaskingEngine::new(masking_mode, masking_char)),
            Mode::Detect => None,
        };

        Ok(ResolvedOptions {
            mode: request.mode,
            engine,
            preprocess: request
                .enable_preprocessing
                .unwrap_or(self.enable_preprocessing),
            allow_list: request.entities.clone(),
            skip_list: request.skip_entities.clone().unwrap_or_default(),
            language: request.language.clone(),
        })
    }
}
