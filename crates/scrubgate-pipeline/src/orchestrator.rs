//! Pipeline orchestrator
//!
//! Per request: validate → size check → preprocess → select language →
//! look up recognizer → (analyze → filter → entity ceiling → mask) under the
//! deadline → assemble. Any failure aborts the whole request; there is no
//! partial masking.

use crate::options::{PipelineDefaults, ResolvedOptions};
use scrubgate_core::{AnalysisRequest, AnonymizationOutcome, EntitySpan, Error, Mode, Result};
use scrubgate_guard::{ResourceLimits, run_with_deadline};
use scrubgate_pii::{LanguageSelector, RecognizerRegistry, filter_entities, normalize};
use std::sync::Arc;
use std::time::Instant;

/// Owns the warmed registry and everything else a request needs
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<RecognizerRegistry>,
    selector: LanguageSelector,
    limits: ResourceLimits,
    defaults: PipelineDefaults,
}

impl Orchestrator {
    /// Fails if any supported language lacks a warmed recognizer
    pub fn new(
        registry: Arc<RecognizerRegistry>,
        selector: LanguageSelector,
        limits: ResourceLimits,
        defaults: PipelineDefaults,
    ) -> Result<Self> {
        if !selector
            .supported_languages()
            .iter()
            .any(|l| l == selector.default_language())
        {
            return Err(Error::Config(format!(
                "default language '{}' is not a supported language",
                selector.default_language()
            )));
        }

        if let Some(missing) = selector
            .supported_languages()
            .iter()
            .find(|l| !registry.contains(l))
        {
            return Err(Error::Config(format!(
                "no recognizer warmed for supported language '{}'",
                missing
            )));
        }

        Ok(Self {
            registry,
            selector,
            limits,
            defaults,
        })
    }

    pub fn defaults(&self) -> &PipelineDefaults {
        &self.defaults
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn supported_languages(&self) -> &[String] {
        self.selector.supported_languages()
    }

    /// Run the pipeline for one request
    pub async fn process(&self, request: AnalysisRequest) -> Result<AnonymizationOutcome> {
        self.process_since(request, Instant::now()).await
    }

    /// Run the pipeline for a request accepted at `accepted_at`.
    ///
    /// `processing_time_ms` covers everything since acceptance, including
    /// guard checks and body parsing done before this call.
    pub async fn process_since(
        &self,
        request: AnalysisRequest,
        accepted_at: Instant,
    ) -> Result<AnonymizationOutcome> {
        let options = self.defaults.resolve(&request)?;

        if request.text.is_empty() {
            return Err(Error::Validation("Missing text in request body".to_string()));
        }
        self.limits.check_text_size(&request.text)?;

        let analyzed = normalize(&request.text, options.preprocess).into_owned();
        let language = self.selector.resolve(options.language.as_deref(), &analyzed);
        let recognizer = self.registry.lookup(&language)?;

        let text_chars = analyzed.chars().count();
        let mode = options.mode;
        let limits = self.limits.clone();
        let (masked_text, entities) = run_with_deadline(limits.processing_timeout(), move || {
            analyze_and_mask(recognizer.as_ref(), analyzed, options, &limits)
        })
        .await?;

        let processing_time_ms = accepted_at.elapsed().as_secs_f64() * 1000.0;

        if self.defaults.log_metadata {
            tracing::info!(
                mode = ?mode,
                language = %language,
                text_chars,
                entity_count = entities.len(),
                processing_time_ms,
                "Processed request"
            );
        }

        Ok(AnonymizationOutcome {
            masked_text,
            entities_found: entities,
            processing_time_ms: round_to(processing_time_ms, 2),
            detected_language: language,
        })
    }
}

/// The deadline-bounded part of the pipeline. Runs on the blocking pool.
fn analyze_and_mask(
    recognizer: &dyn scrubgate_core::EntityRecognizer,
    analyzed: String,
    options: ResolvedOptions,
    limits: &ResourceLimits,
) -> Result<(String, Vec<EntitySpan>)> {
    let spans = RecognizerRegistry::analyze(recognizer, &analyzed, options.allow_list.as_deref())?;

    let mut spans = filter_entities(spans, &options.skip_list);
    spans.sort_by_key(|span| span.start);

    limits.check_entity_count(spans.len())?;

    let output = match (&options.mode, &options.engine) {
        (Mode::Mask, Some(engine)) => engine.mask(&analyzed, &spans).text,
        _ => analyzed,
    };

    for span in &mut spans {
        span.score = round_to(span.score, 3);
    }

    Ok((output, spans))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests;
