//! Application assembly from a validated [`ServerConfig`]

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use axum::Router;
use scrubgate_guard::SecurityGuard;
use scrubgate_ingress::{AppState, RouterConfig, build_router};
use scrubgate_observability::Metrics;
use scrubgate_pii::{
    IndicatorLanguageDetector, LanguageSelector, RecognizerRegistry, RegexRecognizer,
    RegexRecognizerConfig,
};
use scrubgate_pipeline::Orchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Everything the server needs after startup
pub struct App {
    pub router: Router,
    pub guard: Arc<SecurityGuard>,
    pub metrics: Arc<Metrics>,
}

/// Warm one recognizer per supported language and wire the request path
pub fn build(config: &ServerConfig) -> Result<App> {
    let mut registry = RecognizerRegistry::builder();
    for language in &config.language.supported {
        let model = config.model_for(language)?;
        if let Some(hint) = model.language_hint()
            && hint != language.as_str()
        {
            warn!(
                language = %language,
                model = %model,
                "Recognizer model name suggests a different language"
            );
        }

        let recognizer = RegexRecognizer::new(RegexRecognizerConfig {
            language: language.clone(),
            model: model.clone(),
            min_score: config.recognizers.min_score,
            custom_patterns: config.recognizers.custom_patterns.clone(),
        })
        .with_context(|| format!("failed to load recognizer for '{}'", language))?;

        info!(language = %language, model = %model, "Recognizer ready");
        registry = registry.with_recognizer(Arc::new(recognizer));
    }
    let registry = Arc::new(registry.build()?);

    let selector = LanguageSelector::new(
        config.language.supported.clone(),
        config.language.default.clone(),
        config.language.auto_detect,
        Arc::new(IndicatorLanguageDetector::default()),
    );

    let guard = Arc::new(SecurityGuard::new(config.security.clone())?);
    let orchestrator = Orchestrator::new(
        registry,
        selector,
        guard.limits().clone(),
        config.pipeline_defaults()?,
    )?;
    let metrics = Arc::new(Metrics::new().context("failed to register metrics")?);

    let state = AppState::new(Arc::new(orchestrator), guard.clone(), metrics.clone());
    let router = build_router(
        state,
        &RouterConfig {
            cors_origins: config.cors_origins.clone(),
            trust_forwarded: config.trust_proxy_headers,
            trusted_proxies: config.trusted_proxies.clone(),
        },
    );

    Ok(App {
        router,
        guard,
        metrics,
    })
}

/// Periodically drop idle rate-limit state and publish the tracked-client gauge
pub fn spawn_sweeper(
    guard: Arc<SecurityGuard>,
    metrics: Arc<Metrics>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = guard.sweep();
            let tracked = guard.rate_limiter().map_or(0, |l| l.tracked_clients());
            metrics.set_tracked_clients(tracked);
            if removed > 0 {
                debug!(removed, tracked, "Rate limit sweep");
            }
        }
    })
}
