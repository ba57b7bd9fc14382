use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use base64::Engine;
use http_body_util::BodyExt;
use scrubgate_guard::{AuthConfig, GuardConfig, RateLimitConfig, ResourceLimits, SecurityGuard};
use scrubgate_observability::Metrics;
use scrubgate_pii::{
    IndicatorLanguageDetector, LanguageSelector, RecognizerRegistry, RegexRecognizer,
    RegexRecognizerConfig,
};
use scrubgate_pipeline::{Orchestrator, PipelineDefaults};
use std::sync::Arc;
use tower::ServiceExt;

const USER: &str = "svc";
const PASS: &str = "a-sufficiently-long-secret";

fn guard_config() -> GuardConfig {
    GuardConfig {
        auth: AuthConfig::default(),
        rate_limit: RateLimitConfig {
            enabled: false,
            ..Default::default()
        },
        limits: ResourceLimits::default(),
    }
}

fn app_with(guard: GuardConfig, router: RouterConfig) -> Router {
    let registry = RecognizerRegistry::builder()
        .with_recognizer(Arc::new(
            RegexRecognizer::new(RegexRecognizerConfig::new("en")).unwrap(),
        ))
        .build()
        .unwrap();
    let selector = LanguageSelector::new(
        vec!["en".to_string()],
        "en",
        true,
        Arc::new(IndicatorLanguageDetector::default()),
    );
    let guard = Arc::new(SecurityGuard::new(guard).unwrap());
    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        selector,
        guard.limits().clone(),
        PipelineDefaults::default(),
    )
    .unwrap();
    let metrics = Arc::new(Metrics::new().unwrap());

    build_router(
        AppState::new(Arc::new(orchestrator), guard, metrics),
        &router,
    )
}

fn app() -> Router {
    app_with(guard_config(), RouterConfig::default())
}

fn post_mask(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mask")
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_mask_replace() {
    let response = app()
        .oneshot(post_mask(
            r#"{"text": "Mail john@example.com today", "masking_mode": "replace"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");

    let body = json(response).await;
    assert_eq!(body["masked_text"], "Mail <EMAIL_ADDRESS> today");
    assert_eq!(body["entities_found"][0]["entity_type"], "EMAIL_ADDRESS");
    assert_eq!(body["entities_found"][0]["start"], 5);
    assert_eq!(body["entities_found"][0]["end"], 21);
    assert_eq!(body["detected_language"], "en");
    assert!(body["processing_time_ms"].is_number());
}

#[tokio::test]
async fn test_invalid_json_is_400() {
    let response = app().oneshot(post_mask("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"]["message"], "Invalid JSON in request body");
}

#[tokio::test]
async fn test_missing_text_is_400() {
    let response = app().oneshot(post_mask(r#"{"mode": "mask"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json(response).await;
    assert_eq!(body["error"]["type"], "validation_error");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Missing text in request body")
    );
}

#[tokio::test]
async fn test_unknown_masking_mode_is_400() {
    let response = app()
        .oneshot(post_mask(r#"{"text": "hi there", "masking_mode": "blur"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"]["type"], "unsupported_masking_mode");
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let mut guard = guard_config();
    guard.limits.max_body_bytes = 32;
    let app = app_with(guard, RouterConfig::default());

    let body = format!(r#"{{"text": "{}"}}"#, "x".repeat(64));
    let response = app.oneshot(post_mask(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_auth_required() {
    let mut guard = guard_config();
    guard.auth = AuthConfig {
        enabled: true,
        username: Some(USER.to_string()),
        password: Some(PASS.to_string()),
        min_password_length: 12,
    };
    let app = app_with(guard, RouterConfig::default());

    let anonymous = app
        .clone()
        .oneshot(post_mask(r#"{"text": "hello"}"#))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert!(anonymous.headers().get("www-authenticate").is_some());

    let token = base64::engine::general_purpose::STANDARD.encode(format!("{USER}:{PASS}"));
    let mut request = post_mask(r#"{"text": "hello"}"#);
    request
        .headers_mut()
        .insert("authorization", format!("Basic {token}").parse().unwrap());
    let authorized = app.oneshot(request).await.unwrap();
    assert_eq!(authorized.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_returns_retry_after() {
    let mut guard = guard_config();
    guard.rate_limit = RateLimitConfig {
        enabled: true,
        requests_per_interval: 2,
        ..Default::default()
    };
    let app = app_with(guard, RouterConfig::default());

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_mask(r#"{"text": "hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let limited = app.oneshot(post_mask(r#"{"text": "hello"}"#)).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().get("retry-after").is_some());
}

#[tokio::test]
async fn test_health_bypasses_guard() {
    let mut guard = guard_config();
    guard.auth = AuthConfig {
        enabled: true,
        username: Some(USER.to_string()),
        password: Some(PASS.to_string()),
        min_password_length: 12,
    };
    let app = app_with(guard, RouterConfig::default());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_cors_only_for_configured_origins() {
    let app = app_with(
        guard_config(),
        RouterConfig {
            cors_origins: vec!["https://app.example.com".to_string()],
            ..Default::default()
        },
    );

    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/mask")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app
        .clone()
        .oneshot(preflight("https://app.example.com"))
        .await
        .unwrap();
    assert_eq!(
        allowed.headers().get("access-control-allow-origin").unwrap(),
        "https://app.example.com"
    );

    let denied = app.oneshot(preflight("https://evil.example")).await.unwrap();
    assert!(denied.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_no_cors_headers_by_default() {
    let mut request = post_mask(r#"{"text": "hello"}"#);
    request
        .headers_mut()
        .insert("origin", "https://app.example.com".parse().unwrap());

    let response = app().oneshot(request).await.unwrap();
    assert!(response.headers().get("access-control-allow-origin").is_none());
}
