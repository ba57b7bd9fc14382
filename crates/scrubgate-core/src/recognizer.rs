//! Recognizer and language-detector trait definitions
//!
//! Both are synchronous: recognition is CPU-bound and is driven from the
//! blocking pool by the pipeline, never while a shared lock is held.

use crate::{Result, types::EntitySpan};

pub trait EntityRecognizer: Send + Sync {
    /// Language code this instance was warmed for
    fn language(&self) -> &str;

    /// Detect entity spans in `text`.
    ///
    /// `entities`, when present, restricts detection to those types.
    /// Returned spans are ordered by `start`.
    fn analyze(&self, text: &str, entities: Option<&[String]>) -> Result<Vec<EntitySpan>>;

    /// Entity types this instance can produce
    fn supported_entities(&self) -> Vec<String>;
}

pub trait LanguageDetector: Send + Sync {
    /// Identify the language of `text`; `Ok(None)` when undecided
    fn detect(&self, text: &str) -> Result<Option<String>>;
}
