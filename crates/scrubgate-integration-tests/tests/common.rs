//! Common test utilities for integration tests

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, header},
    response::Response,
};
use base64::Engine;
use http_body_util::BodyExt;
use scrubgate_core::{EntityRecognizer, EntitySpan, Result};
use scrubgate_guard::{AuthConfig, GuardConfig, RateLimitConfig, SecurityGuard};
use scrubgate_ingress::{AppState, RouterConfig, build_router};
use scrubgate_observability::Metrics;
use scrubgate_pii::{
    IndicatorLanguageDetector, LanguageSelector, RecognizerRegistry, RegexRecognizer,
    RegexRecognizerConfig,
};
use scrubgate_pipeline::{Orchestrator, PipelineDefaults};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

#[allow(dead_code)]
pub const USER: &str = "scrub-client";
#[allow(dead_code)]
pub const PASS: &str = "integration-test-password";

/// A fully wired application plus handles for inspection
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub metrics: Arc<Metrics>,
    pub guard: Arc<SecurityGuard>,
}

/// Guard settings with rate limiting off so tests can share a client identity
#[allow(dead_code)]
pub fn open_guard() -> GuardConfig {
    GuardConfig {
        rate_limit: RateLimitConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn auth_guard() -> GuardConfig {
    GuardConfig {
        auth: AuthConfig {
            enabled: true,
            username: Some(USER.to_string()),
            password: Some(PASS.to_string()),
            min_password_length: 12,
        },
        ..open_guard()
    }
}

/// Pattern recognizers for `en` and `de`
#[allow(dead_code)]
pub fn app(guard: GuardConfig, defaults: PipelineDefaults) -> TestApp {
    let recognizers: Vec<Arc<dyn EntityRecognizer>> = ["en", "de"]
        .into_iter()
        .map(|lang| {
            Arc::new(RegexRecognizer::new(RegexRecognizerConfig::new(lang)).unwrap())
                as Arc<dyn EntityRecognizer>
        })
        .collect();
    app_with_recognizers(recognizers, guard, defaults)
}

/// Default recognizers behind a reverse proxy whose forwarding headers are trusted
#[allow(dead_code)]
pub fn app_behind_proxy(guard: GuardConfig, proxy: IpAddr) -> TestApp {
    let recognizer: Arc<dyn EntityRecognizer> =
        Arc::new(RegexRecognizer::new(RegexRecognizerConfig::new("en")).unwrap());
    build_app(
        vec![recognizer],
        guard,
        PipelineDefaults::default(),
        RouterConfig {
            trust_forwarded: true,
            trusted_proxies: vec![proxy],
            ..Default::default()
        },
    )
}

#[allow(dead_code)]
pub fn app_with_recognizers(
    recognizers: Vec<Arc<dyn EntityRecognizer>>,
    guard: GuardConfig,
    defaults: PipelineDefaults,
) -> TestApp {
    build_app(recognizers, guard, defaults, RouterConfig::default())
}

fn build_app(
    recognizers: Vec<Arc<dyn EntityRecognizer>>,
    guard: GuardConfig,
    defaults: PipelineDefaults,
    router: RouterConfig,
) -> TestApp {
    let supported: Vec<String> = recognizers.iter().map(|r| r.language().to_string()).collect();

    let mut registry = RecognizerRegistry::builder();
    for recognizer in recognizers {
        registry = registry.with_recognizer(recognizer);
    }

    let selector = LanguageSelector::new(
        supported,
        "en",
        true,
        Arc::new(IndicatorLanguageDetector::default()),
    );
    let guard = Arc::new(SecurityGuard::new(guard).unwrap());
    let orchestrator = Orchestrator::new(
        Arc::new(registry.build().unwrap()),
        selector,
        guard.limits().clone(),
        defaults,
    )
    .unwrap();
    let metrics = Arc::new(Metrics::new().unwrap());

    let router = build_router(
        AppState::new(Arc::new(orchestrator), guard.clone(), metrics.clone()),
        &router,
    );

    TestApp {
        router,
        metrics,
        guard,
    }
}

/// English recognizer that sleeps before delegating to the pattern recognizer
#[allow(dead_code)]
pub struct SlowRecognizer {
    inner: RegexRecognizer,
    delay: Duration,
}

#[allow(dead_code)]
impl SlowRecognizer {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: RegexRecognizer::new(RegexRecognizerConfig::new("en")).unwrap(),
            delay,
        }
    }
}

impl EntityRecognizer for SlowRecognizer {
    fn language(&self) -> &str {
        self.inner.language()
    }

    fn analyze(&self, text: &str, entities: Option<&[String]>) -> Result<Vec<EntitySpan>> {
        std::thread::sleep(self.delay);
        self.inner.analyze(text, entities)
    }

    fn supported_entities(&self) -> Vec<String> {
        self.inner.supported_entities()
    }
}

#[allow(dead_code)]
pub fn post_mask(body: serde_json::Value) -> Request<Body> {
    post_raw(&body.to_string())
}

#[allow(dead_code)]
pub fn post_raw(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mask")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Request as it arrives from `peer` carrying the given `X-Forwarded-For`
#[allow(dead_code)]
pub fn via_peer(mut request: Request<Body>, peer: SocketAddr, forwarded_for: &str) -> Request<Body> {
    request.extensions_mut().insert(ConnectInfo(peer));
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded_for.parse().unwrap());
    request
}

#[allow(dead_code)]
pub fn with_basic_auth(mut request: Request<Body>, user: &str, pass: &str) -> Request<Body> {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Basic {token}").parse().unwrap(),
    );
    request
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
