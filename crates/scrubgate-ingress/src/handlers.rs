//! Request handlers

use crate::middleware::RequestMetadataExt;
use crate::types::{IngressError, IngressResult};
use axum::{
    Extension, Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
};
use scrubgate_core::{AnalysisRequest, AnonymizationOutcome, Error};
use scrubgate_guard::SecurityGuard;
use scrubgate_observability::Metrics;
use scrubgate_pipeline::Orchestrator;
use std::sync::Arc;
use std::time::Instant;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub guard: Arc<SecurityGuard>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        guard: Arc<SecurityGuard>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            orchestrator,
            guard,
            metrics,
        }
    }
}

/// `POST /mask`
///
/// Latency is measured from acceptance by the request context layer, or from
/// handler entry when that layer is absent.
pub async fn mask_handler(
    State(state): State<AppState>,
    metadata: Option<Extension<RequestMetadataExt>>,
    body: Result<Bytes, BytesRejection>,
) -> IngressResult<Json<AnonymizationOutcome>> {
    let accepted_at = metadata
        .map(|Extension(RequestMetadataExt(meta))| meta.accepted_at)
        .unwrap_or_else(Instant::now);

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            let max = state.guard.limits().max_body_bytes;
            // Exact size is unknown once the limit trips
            let err = Error::PayloadTooLarge {
                size: max.saturating_add(1),
                max,
            };
            state.metrics.record_guard_rejection(err.kind());
            IngressError::from(err)
        } else {
            IngressError::InvalidJson
        }
    })?;

    let request: AnalysisRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(
            line = e.line(),
            column = e.column(),
            category = ?e.classify(),
            "Rejected malformed request body"
        );
        IngressError::InvalidJson
    })?;

    let mode = request.mode.as_str();

    match state.orchestrator.process_since(request, accepted_at).await {
        Ok(outcome) => {
            state.metrics.record_success(
                mode,
                accepted_at.elapsed().as_secs_f64(),
                outcome.entities_found.iter().map(|s| s.entity_type.as_str()),
            );
            Ok(Json(outcome))
        }
        Err(err) => {
            state
                .metrics
                .record_failure(mode, err.kind(), accepted_at.elapsed().as_secs_f64());
            Err(err.into())
        }
    }
}
