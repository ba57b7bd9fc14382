//! Per-language recognizer registry
//!
//! Built once at startup with every supported language warmed, then shared
//! read-only across requests.

use scrubgate_core::{EntityRecognizer, EntitySpan, Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Warm-up probe run through every recognizer before the registry is sealed
const WARMUP_PROBE: &str = "Warm-up probe for test@example.com";

/// Immutable map of language code to warmed recognizer
#[derive(Clone, Default)]
pub struct RecognizerRegistry {
    recognizers: HashMap<String, Arc<dyn EntityRecognizer>>,
}

impl RecognizerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Recognizer warmed for `language`.
    ///
    /// A miss is an internal-consistency fault: the language selector only
    /// returns codes this registry was built for.
    pub fn lookup(&self, language: &str) -> Result<Arc<dyn EntityRecognizer>> {
        self.recognizers.get(language).cloned().ok_or_else(|| {
            tracing::error!(language, "No recognizer warmed for selected language");
            Error::UnsupportedLanguage(language.to_string())
        })
    }

    /// Run `recognizer` over `text`, passing the allow-list through
    pub fn analyze(
        recognizer: &dyn EntityRecognizer,
        text: &str,
        allow_list: Option<&[String]>,
    ) -> Result<Vec<EntitySpan>> {
        recognizer.analyze(text, allow_list)
    }

    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.recognizers.keys().cloned().collect();
        languages.sort();
        languages
    }

    pub fn contains(&self, language: &str) -> bool {
        self.recognizers.contains_key(language)
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }
}

/// Collects recognizers and warms them eagerly in [`RegistryBuilder::build`]
#[derive(Default)]
pub struct RegistryBuilder {
    recognizers: Vec<Arc<dyn EntityRecognizer>>,
}

impl RegistryBuilder {
    pub fn with_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.recognizers.push(recognizer);
        self
    }

    /// Warm every recognizer once and seal the registry.
    ///
    /// Fails if two recognizers claim the same language or a warm-up pass errors.
    pub fn build(self) -> Result<RecognizerRegistry> {
        let mut recognizers = HashMap::with_capacity(self.recognizers.len());

        for recognizer in self.recognizers {
            let language = recognizer.language().to_string();
            if recognizers.contains_key(&language) {
                return Err(Error::Config(format!(
                    "duplicate recognizer for language '{}'",
                    language
                )));
            }

            let started = Instant::now();
            recognizer.analyze(WARMUP_PROBE, None)?;
            tracing::info!(
                language = %language,
                entity_types = recognizer.supported_entities().len(),
                warmup_ms = started.elapsed().as_millis() as u64,
                "Recognizer warmed"
            );

            recognizers.insert(language, recognizer);
        }

        Ok(RecognizerRegistry { recognizers })
    }
}
