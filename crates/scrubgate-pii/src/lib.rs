//! Scrubgate PII Detection and Masking
//!
//! This crate provides the text-side stages of the masking pipeline:
//! - Preprocessing with offset-safety tracking
//! - Language selection and per-language recognizer routing
//! - Entity allow/deny filtering
//! - Consistent masking (replace, redact, hash)
//! - Model-reference validation for recognizer warm-up

pub mod filter;
pub mod language;
pub mod masking;
pub mod model;
pub mod preprocess;
pub mod recognizer;
pub mod registry;

pub use filter::filter_entities;
pub use language::{IndicatorLanguageDetector, LanguageSelector};
pub use masking::{MaskedText, MaskingEngine, REDACT_WIDTH};
pub use model::ModelRef;
pub use preprocess::{Preprocessed, normalize};
pub use recognizer::{CustomPattern, RegexRecognizer, RegexRecognizerConfig};
pub use registry::{RecognizerRegistry, RegistryBuilder};
