//! Shared ingress middleware

use crate::handlers::AppState;
use crate::types::{IngressError, RequestMetadata, UNKNOWN_CLIENT};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use scrubgate_guard::{ClientContext, Credentials};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Extension key for request metadata
#[derive(Clone)]
pub struct RequestMetadataExt(pub RequestMetadata);

/// Which peers may speak for the client through forwarding headers
#[derive(Debug, Clone, Default)]
pub struct ProxyTrust {
    enabled: bool,
    proxies: Vec<IpAddr>,
}

impl ProxyTrust {
    pub fn new(enabled: bool, proxies: Vec<IpAddr>) -> Self {
        Self { enabled, proxies }
    }

    fn is_trusted(&self, ip: IpAddr) -> bool {
        self.enabled && self.proxies.contains(&ip)
    }

    /// Right-most `X-Forwarded-For` entry that is not one of our proxies
    fn forwarded_client(&self, headers: &HeaderMap) -> Option<String> {
        let entries: Vec<&str> = headers
            .get_all("x-forwarded-for")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();

        entries
            .iter()
            .rev()
            .find(|entry| !entry.parse::<IpAddr>().is_ok_and(|ip| self.is_trusted(ip)))
            .or(entries.first())
            .map(|entry| entry.to_string())
    }
}

/// Client identity used for rate limiting.
///
/// The socket peer, unless the peer is a trusted proxy; then the forwarded
/// client (`X-Forwarded-For`, then `X-Real-IP`).
pub fn client_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust: &ProxyTrust,
) -> Option<String> {
    let peer_ip = peer.map(|addr| addr.ip());

    if peer_ip.is_some_and(|ip| trust.is_trusted(ip)) {
        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        if let Some(client) = trust.forwarded_client(headers).or(real_ip) {
            return Some(client);
        }
    }

    peer_ip.map(|ip| ip.to_string())
}

/// Middleware to attach request metadata and echo the request ID
pub async fn request_context_middleware(
    State(trust): State<Arc<ProxyTrust>>,
    mut req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let mut metadata = RequestMetadata::new();

    if let Some(identity) = client_identity(req.headers(), peer, &trust) {
        metadata = metadata.with_client_identity(identity);
    }

    let request_id = metadata.request_id.clone();

    req.extensions_mut().insert(RequestMetadataExt(metadata));

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Middleware to add security headers
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    response
}

/// Declared body size, when the client sent a parseable `Content-Length`
fn declared_length(headers: &HeaderMap) -> usize {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0)
}

/// Security guard admission: body size, then authentication, then rate limit.
///
/// Bodies without a `Content-Length` are still bounded by the body limit layer.
pub async fn guard_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let identity = req
        .extensions()
        .get::<RequestMetadataExt>()
        .map(|RequestMetadataExt(meta)| meta.client_identity.clone())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    let credentials = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(Credentials::from_basic_header);

    let client = ClientContext::new(identity, credentials);

    if let Err(err) = state.guard.admit(&client, declared_length(req.headers())) {
        state.metrics.record_guard_rejection(err.kind());
        return IngressError::from(err).into_response();
    }

    next.run(req).await
}
