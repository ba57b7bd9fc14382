//! Language selection
//!
//! Resolution order: explicit supported request value, then detection (when
//! enabled and the text is non-trivial), then the configured default.
//! Detection failures never reach the caller.

use scrubgate_core::{LanguageDetector, Result};
use std::sync::Arc;

/// Value of `language` that asks for detection explicitly
pub const AUTO: &str = "auto";

/// Resolves the effective language of a request
#[derive(Clone)]
pub struct LanguageSelector {
    supported: Vec<String>,
    default_language: String,
    auto_detect: bool,
    detector: Arc<dyn LanguageDetector>,
}

impl LanguageSelector {
    pub fn new(
        supported: Vec<String>,
        default_language: impl Into<String>,
        auto_detect: bool,
        detector: Arc<dyn LanguageDetector>,
    ) -> Self {
        Self {
            supported,
            default_language: default_language.into(),
            auto_detect,
            detector,
        }
    }

    pub fn supported_languages(&self) -> &[String] {
        &self.supported
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    fn is_supported(&self, code: &str) -> bool {
        self.supported.iter().any(|s| s == code)
    }

    /// Pick the language for `text`. Always returns a supported code
    /// as long as the default itself is supported.
    pub fn resolve(&self, requested: Option<&str>, text: &str) -> String {
        if let Some(code) = requested
            && code != AUTO
            && self.is_supported(code)
        {
            return code.to_string();
        }

        if self.auto_detect && !text.trim().is_empty() {
            match self.detector.detect(text) {
                Ok(Some(code)) if self.is_supported(&code) => return code,
                Ok(Some(code)) => {
                    tracing::debug!(detected = %code, "Detected language not supported, using default");
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Language detection failed, using default");
                }
            }
        }

        self.default_language.clone()
    }
}

/// Words that are common in one language and rare in the others
struct Indicators {
    code: &'static str,
    words: &'static [&'static str],
    /// Characters specific to the language's orthography
    letters: &'static [char],
}

const INDICATORS: &[Indicators] = &[
    Indicators {
        code: "en",
        words: &[
            "the", "and", "is", "was", "for", "are", "with", "this", "that", "have", "from",
            "my", "your", "name", "contact", "please", "at", "of", "to",
        ],
        letters: &[],
    },
    Indicators {
        code: "de",
        words: &[
            "der", "die", "das", "und", "ist", "ich", "nicht", "mit", "mein", "meine", "sie",
            "ein", "eine", "wohnt", "unter", "oder", "herr", "frau", "name", "zu",
        ],
        letters: &['ä', 'ö', 'ü', 'ß'],
    },
    Indicators {
        code: "fr",
        words: &[
            "le", "la", "les", "et", "est", "une", "des", "pour", "dans", "avec", "mon", "je",
            "vous", "nom", "madame", "monsieur",
        ],
        letters: &['é', 'è', 'ê', 'ç', 'à'],
    },
    Indicators {
        code: "es",
        words: &[
            "el", "los", "las", "y", "es", "una", "por", "para", "con", "mi", "su", "nombre",
            "señor", "señora",
        ],
        letters: &['ñ', 'á', 'í', 'ó', 'ú', '¿', '¡'],
    },
    Indicators {
        code: "it",
        words: &[
            "il", "gli", "della", "che", "sono", "per", "con", "mio", "nome", "signor", "signora",
        ],
        letters: &['ì', 'ò'],
    },
    Indicators {
        code: "nl",
        words: &[
            "het", "een", "en", "ik", "niet", "met", "mijn", "naam", "meneer", "mevrouw", "van",
        ],
        letters: &['ĳ'],
    },
];

/// Keyword-frequency language detector
///
/// Scores each language by indicator words and orthography, returning the
/// best score if it clears a margin over the runner-up.
#[derive(Debug, Clone)]
pub struct IndicatorLanguageDetector {
    min_words: usize,
}

impl IndicatorLanguageDetector {
    pub fn new(min_words: usize) -> Self {
        Self { min_words }
    }

    fn scores(&self, text: &str) -> Vec<(&'static str, u32)> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .collect();

        INDICATORS
            .iter()
            .map(|ind| {
                let word_hits = words.iter().filter(|w| ind.words.contains(w)).count() as u32;
                let letter_hits = lower.chars().filter(|c| ind.letters.contains(c)).count() as u32;
                (ind.code, word_hits * 2 + letter_hits)
            })
            .collect()
    }
}

impl Default for IndicatorLanguageDetector {
    fn default() -> Self {
        Self::new(3)
    }
}

impl LanguageDetector for IndicatorLanguageDetector {
    fn detect(&self, text: &str) -> Result<Option<String>> {
        if text.split_whitespace().count() < self.min_words {
            return Ok(None);
        }

        let mut scores = self.scores(text);
        scores.sort_by(|a, b| b.1.cmp(&a.1));

        match scores.as_slice() {
            [(code, best), (_, runner_up), ..] if *best > 0 && best > runner_up => {
                Ok(Some(code.to_string()))
            }
            _ => Ok(None),
        }
    }
}
