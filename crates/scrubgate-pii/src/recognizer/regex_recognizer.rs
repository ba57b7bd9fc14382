//! Regex-based entity recognizer implementation

use super::{RegexRecognizerConfig, entity};
use regex::Regex;
use scrubgate_core::{EntityRecognizer, EntitySpan, Error, Result};
use std::sync::Arc;

/// One compiled pattern with its validator and score
struct PatternRule {
    entity_type: String,
    regex: Arc<Regex>,
    score: f64,
    validate: Option<fn(&str) -> bool>,
}

/// Regex-based entity recognizer
pub struct RegexRecognizer {
    config: RegexRecognizerConfig,
    rules: Vec<PatternRule>,
}

impl RegexRecognizer {
    /// Compile all patterns for the given configuration
    pub fn new(config: RegexRecognizerConfig) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map(Arc::new)
                .map_err(|e| Error::Config(format!("invalid recognizer pattern: {}", e)))
        };

        let mut rules = vec![
            PatternRule {
                entity_type: entity::EMAIL_ADDRESS.to_string(),
                regex: compile(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")?,
                score: 1.0,
                validate: None,
            },
            // (123) 456-7890, 123-456-7890, 123.456.7890, +1 123 456 7890
            PatternRule {
                entity_type: entity::PHONE_NUMBER.to_string(),
                regex: compile(r"(\+?\d{1,3}[-.\s]?)?(\(?\d{3}\)?[-.\s]?)?\d{3}[-.\s]?\d{4}\b")?,
                score: 0.75,
                validate: Some(validate_phone),
            },
            PatternRule {
                entity_type: entity::US_SSN.to_string(),
                regex: compile(r"\b\d{3}-?\d{2}-?\d{4}\b")?,
                score: 0.85,
                validate: Some(validate_ssn),
            },
            // 13-19 digits with optional spaces or dashes
            PatternRule {
                entity_type: entity::CREDIT_CARD.to_string(),
                regex: compile(r"\b(?:\d{4}[-\s]?){3}\d{1,7}\b")?,
                score: 1.0,
                validate: Some(validate_credit_card),
            },
            PatternRule {
                entity_type: entity::IP_ADDRESS.to_string(),
                regex: compile(
                    r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b|\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b",
                )?,
                score: 0.95,
                validate: None,
            },
            PatternRule {
                entity_type: entity::URL.to_string(),
                regex: compile(r#"\bhttps?://[^\s<>"']+"#)?,
                score: 0.6,
                validate: None,
            },
            PatternRule {
                entity_type: entity::IBAN_CODE.to_string(),
                regex: compile(r"\b[A-Z]{2}\d{2}(?:\s?[A-Z0-9]{4}){2,7}(?:\s?[A-Z0-9]{1,3})?\b")?,
                score: 1.0,
                validate: Some(validate_iban),
            },
        ];

        for pattern in &config.custom_patterns {
            rules.push(PatternRule {
                entity_type: pattern.entity_type.clone(),
                regex: compile(&pattern.pattern)?,
                score: pattern.score,
                validate: None,
            });
        }

        Ok(Self { config, rules })
    }

    pub fn model(&self) -> &crate::model::ModelRef {
        &self.config.model
    }
}

/// Keep the highest-scoring span among overlapping candidates (longer wins ties),
/// then order the survivors by position.
fn resolve_overlaps(mut candidates: Vec<EntitySpan>) -> Vec<EntitySpan> {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.start.cmp(&b.start))
    });

    let mut kept: Vec<EntitySpan> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let overlaps = kept
            .iter()
            .any(|k| candidate.start < k.end && k.start < candidate.end);
        if !overlaps {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|s| s.start);
    kept
}

/// Validate a potential credit card number using the Luhn algorithm
fn validate_credit_card(number: &str) -> bool {
    let digits: Vec<u32> = number.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }

    let checksum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    checksum.is_multiple_of(10)
}

/// Reject SSN shapes the SSA never issues
fn validate_ssn(ssn: &str) -> bool {
    let digits: String = ssn.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() != 9 {
        return false;
    }

    if digits.starts_with("000") || digits[3..5] == *"00" || digits[5..9] == *"0000" {
        return false;
    }

    // 666 and 9xx (ITIN) are never assigned
    !(digits.starts_with("666") || digits.starts_with('9'))
}

/// 10-15 digits; 11-digit numbers must carry the North American country code
fn validate_phone(phone: &str) -> bool {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < 10 || digits.len() > 15 {
        return false;
    }

    !(digits.len() == 11 && !digits.starts_with('1'))
}

/// ISO 13616 mod-97 check
fn validate_iban(iban: &str) -> bool {
    let compact: Vec<char> = iban.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() < 15 || compact.len() > 34 {
        return false;
    }

    let rearranged = compact[4..].iter().chain(compact[..4].iter());
    let mut remainder: u32 = 0;
    for c in rearranged {
        let Some(value) = c.to_digit(36) else {
            return false;
        };
        remainder = if value >= 10 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }

    remainder == 1
}

impl EntityRecognizer for RegexRecognizer {
    fn language(&self) -> &str {
        &self.config.language
    }

    fn analyze(&self, text: &str, entities: Option<&[String]>) -> Result<Vec<EntitySpan>> {
        let mut candidates = Vec::new();

        for rule in &self.rules {
            if let Some(allow) = entities
                && !allow.contains(&rule.entity_type)
            {
                continue;
            }
            if rule.score < self.config.min_score {
                continue;
            }

            for found in rule.regex.find_iter(text) {
                if rule.validate.is_some_and(|validate| !validate(found.as_str())) {
                    continue;
                }
                candidates.push(EntitySpan::new(
                    rule.entity_type.clone(),
                    found.start(),
                    found.end(),
                    rule.score,
                ));
            }
        }

        Ok(resolve_overlaps(candidates))
    }

    fn supported_entities(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.entity_type.clone()).collect()
    }
}
