//! Application router

use crate::handlers::{AppState, mask_handler};
use crate::middleware::{
    ProxyTrust, guard_middleware, request_context_middleware, security_headers_middleware,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::post,
};
use scrubgate_observability::{HealthState, health_router};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Router-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Origins allowed to call the API cross-origin. Empty disables CORS.
    pub cors_origins: Vec<String>,
    /// Honor `X-Forwarded-For` / `X-Real-IP` from the proxies below
    #[serde(default)]
    pub trust_forwarded: bool,
    /// Peers allowed to set forwarding headers
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

/// Build the full application: `/mask` behind the guard, plus `/health` and `/metrics`
pub fn build_router(state: AppState, config: &RouterConfig) -> Router {
    let max_body = state.guard.limits().max_body_bytes;
    let trust = Arc::new(ProxyTrust::new(
        config.trust_forwarded,
        config.trusted_proxies.clone(),
    ));

    let api = Router::new()
        .route("/mask", post(mask_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard_middleware,
        ))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state.clone());

    let app = api
        .merge(health_router(HealthState::new(state.metrics.clone())))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn_with_state(
            trust,
            request_context_middleware,
        ));

    match cors_layer(&config.cors_origins) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .expose_headers([HeaderName::from_static("x-request-id")]),
    )
}

#[cfg(test)]
mod tests;
