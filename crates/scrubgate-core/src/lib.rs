//! Scrubgate Core Types and Traits
//!
//! This crate provides the fundamental types and traits used throughout Scrubgate:
//! - Request/outcome types for the masking pipeline
//! - Entity recognizer and language detector abstractions
//! - Core error taxonomy

pub mod error;
pub mod recognizer;
pub mod types;

pub use error::{Error, Result};
pub use recognizer::{EntityRecognizer, LanguageDetector};
pub use types::{AnalysisRequest, AnonymizationOutcome, EntitySpan, MaskingMode, Mode};
