//! Metrics collection with Prometheus
//!
//! This module provides Prometheus metrics for Scrubgate:
//! - Request counts by mode and outcome
//! - Guard rejections by error kind
//! - Processing latency histogram
//! - Detected entities by type
//! - Authentication failures

use prometheus::{Counter, CounterVec, HistogramOpts, HistogramVec, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector for Scrubgate
#[derive(Clone)]
pub struct Metrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Requests handled, labelled by mode and outcome (`success` or an error kind)
    pub requests_total: CounterVec,

    /// Requests rejected by the security guard before reaching the pipeline
    pub guard_rejections_total: CounterVec,

    /// Pipeline processing duration
    pub processing_duration_seconds: HistogramVec,

    /// Entities returned, by entity type
    pub entities_detected_total: CounterVec,

    /// Failed authentication attempts
    pub auth_failures_total: Counter,

    /// Identities currently tracked by the rate limiter
    pub rate_limit_tracked_clients: IntGauge,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("scrubgate_requests_total", "Total number of mask requests"),
            &["mode", "outcome"],
        )?;

        let guard_rejections_total = CounterVec::new(
            Opts::new(
                "scrubgate_guard_rejections_total",
                "Requests rejected by the security guard",
            ),
            &["kind"],
        )?;

        let processing_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "scrubgate_processing_duration_seconds",
                "Pipeline processing duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
            &["mode"],
        )?;

        let entities_detected_total = CounterVec::new(
            Opts::new(
                "scrubgate_entities_detected_total",
                "Entities detected, by entity type",
            ),
            &["entity_type"],
        )?;

        let auth_failures_total = Counter::with_opts(Opts::new(
            "scrubgate_auth_failures_total",
            "Failed authentication attempts",
        ))?;

        let rate_limit_tracked_clients = IntGauge::with_opts(Opts::new(
            "scrubgate_rate_limit_tracked_clients",
            "Client identities currently tracked by the rate limiter",
        ))?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(guard_rejections_total.clone()))?;
        registry.register(Box::new(processing_duration_seconds.clone()))?;
        registry.register(Box::new(entities_detected_total.clone()))?;
        registry.register(Box::new(auth_failures_total.clone()))?;
        registry.register(Box::new(rate_limit_tracked_clients.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            guard_rejections_total,
            processing_duration_seconds,
            entities_detected_total,
            auth_failures_total,
            rate_limit_tracked_clients,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a successful pipeline run
    pub fn record_success<'a>(
        &self,
        mode: &str,
        duration_secs: f64,
        entity_types: impl IntoIterator<Item = &'a str>,
    ) {
        self.requests_total
            .with_label_values(&[mode, "success"])
            .inc();
        self.processing_duration_seconds
            .with_label_values(&[mode])
            .observe(duration_secs);
        for entity_type in entity_types {
            self.entities_detected_total
                .with_label_values(&[entity_type])
                .inc();
        }
    }

    /// Record a pipeline failure
    pub fn record_failure(&self, mode: &str, kind: &str, duration_secs: f64) {
        self.requests_total.with_label_values(&[mode, kind]).inc();
        self.processing_duration_seconds
            .with_label_values(&[mode])
            .observe(duration_secs);
    }

    /// Record a request stopped by the guard
    pub fn record_guard_rejection(&self, kind: &str) {
        self.guard_rejections_total.with_label_values(&[kind]).inc();
        if kind == "unauthorized" {
            self.auth_failures_total.inc();
        }
    }

    /// Update rate limiter occupancy
    pub fn set_tracked_clients(&self, count: usize) {
        self.rate_limit_tracked_clients.set(count as i64);
    }
}
