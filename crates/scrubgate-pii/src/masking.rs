//! Masking engine
//!
//! Splices masked segments into the analyzed text in one left-to-right pass.
//! Within one engine invocation, character-identical source values of the same
//! entity type always produce character-identical output.

use scrubgate_core::{EntitySpan, Error, MaskingMode};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Number of masking characters emitted per redacted span, regardless of span length
pub const REDACT_WIDTH: usize = 6;

/// Hex characters of the SHA-256 digest kept in hash mode
const HASH_PREFIX_LEN: usize = 8;

/// Output of [`MaskingEngine::mask`]
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedText {
    pub text: String,
    /// Spans that were skipped because their bounds were inconsistent with the text
    pub rejected: Vec<Error>,
}

/// Converts filtered entity spans into masked output under one strategy
#[derive(Debug, Clone)]
pub struct MaskingEngine {
    mode: MaskingMode,
    masking_char: char,
}

impl MaskingEngine {
    pub fn new(mode: MaskingMode, masking_char: char) -> Self {
        Self { mode, masking_char }
    }

    pub fn mode(&self) -> MaskingMode {
        self.mode
    }

    /// Mask `spans` in `text`.
    ///
    /// Out-of-range, empty, overlapping or non-char-boundary spans are never
    /// applied; each is reported in [`MaskedText::rejected`] as
    /// `InvalidSpanBounds` and masking continues with the remaining spans.
    pub fn mask(&self, text: &str, spans: &[EntitySpan]) -> MaskedText {
        if spans.is_empty() {
            return MaskedText {
                text: text.to_string(),
                rejected: Vec::new(),
            };
        }

        let mut ordered: Vec<&EntitySpan> = spans.iter().collect();
        ordered.sort_by_key(|span| (span.start, span.end));

        let mut replacements: HashMap<(&str, &str), String> = HashMap::new();
        let mut rejected = Vec::new();
        let mut result = String::with_capacity(text.len());
        let mut last_end = 0;

        for span in ordered {
            if !self.span_fits(text, span, last_end) {
                tracing::error!(
                    entity_type = %span.entity_type,
                    start = span.start,
                    end = span.end,
                    text_len = text.len(),
                    "Dropping span with inconsistent bounds"
                );
                rejected.push(Error::InvalidSpanBounds {
                    start: span.start,
                    end: span.end,
                    len: text.len(),
                });
                continue;
            }

            let value = &text[span.start..span.end];
            let replacement = replacements
                .entry((span.entity_type.as_str(), value))
                .or_insert_with(|| self.replacement_for(&span.entity_type, value));

            result.push_str(&text[last_end..span.start]);
            result.push_str(replacement);
            last_end = span.end;
        }

        result.push_str(&text[last_end..]);

        MaskedText {
            text: result,
            rejected,
        }
    }

    fn span_fits(&self, text: &str, span: &EntitySpan, last_end: usize) -> bool {
        span.start < span.end
            && span.end <= text.len()
            && span.start >= last_end
            && text.is_char_boundary(span.start)
            && text.is_char_boundary(span.end)
    }

    fn replacement_for(&self, entity_type: &str, value: &str) -> String {
        match self.mode {
            MaskingMode::Replace => format!("<{}>", entity_type),
            MaskingMode::Redact => std::iter::repeat_n(self.masking_char, REDACT_WIDTH).collect(),
            MaskingMode::Hash => format!("<HASH:{}>", digest_prefix(value)),
        }
    }
}

/// First [`HASH_PREFIX_LEN`] hex characters of SHA-256 over `value`
fn digest_prefix(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(HASH_PREFIX_LEN);
    encoded
}
