use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{health_handler, redirect_handler, shorten_handler};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/shorten", post(shorten_handler))
            .route("/{token}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShortenResponse;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use std::sync::Arc;
    use tower::ServiceExt;
    use ushort_core::{ShortenPolicy, Shortener, ShortenerError, Token};
    use ushort_redirector::{Redirector, RedirectorError, RedirectorService};
    use ushort_shortener::ShortenerService;
    use ushort_storage::InMemoryRepository;

    const BASE_URL: &str = "https://sho.rt";

    fn router(policy: ShortenPolicy) -> Router {
        let store = InMemoryRepository::new();
        let shortener = ShortenerService::with_policy(store.clone(), policy);
        let redirector = RedirectorService::new(store);
        App::router(AppState::new(
            Arc::new(shortener),
            Arc::new(redirector),
            BASE_URL,
        ))
    }

    async fn send(router: &Router, request: Request<Body>) -> Response {
        router.clone().oneshot(request).await.unwrap()
    }

    fn shorten_request(body: &str) -> Request<Body> {
        Request::post("/shorten")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(path: &str) -> Request<Body> {
        Request::get(path).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn shorten(router: &Router, url: &str) -> ShortenResponse {
        let body = serde_json::json!({ "url": url }).to_string();
        let response = send(router, shorten_request(&body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_value(json_body(response).await).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let router = router(ShortenPolicy::Idempotent);

        let response = send(&router, get_request("/health")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn shorten_then_redirect() {
        let router = router(ShortenPolicy::Idempotent);

        let created = shorten(&router, "https://example.com/some/long/path?q=1").await;
        assert_eq!(created.token, "b");
        assert_eq!(created.short_url, "https://sho.rt/b");
        assert_eq!(created.original_url, "https://example.com/some/long/path?q=1");

        let response = send(&router, get_request("/b")).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://example.com/some/long/path?q=1"
        );
    }

    #[tokio::test]
    async fn idempotent_shorten_returns_same_token() {
        let router = router(ShortenPolicy::Idempotent);

        let first = shorten(&router, "https://example.com").await;
        let second = shorten(&router, "https://example.com").await;

        assert_eq!(first.token, second.token);
    }

    #[tokio::test]
    async fn strict_duplicate_is_conflict() {
        let router = router(ShortenPolicy::Strict);
        shorten(&router, "https://example.com").await;

        let body = serde_json::json!({ "url": "https://example.com" }).to_string();
        let response = send(&router, shorten_request(&body)).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn invalid_url_is_bad_request() {
        let router = router(ShortenPolicy::Idempotent);

        let response = send(&router, shorten_request(r#"{"url": "ftp://example.com"}"#)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("http"));
    }

    #[tokio::test]
    async fn url_with_control_or_padding_is_bad_request() {
        let router = router(ShortenPolicy::Idempotent);

        for url in ["https://example.com/a\nb", " https://example.com", "https://example.com\t"] {
            let body = serde_json::json!({ "url": url }).to_string();
            let response = send(&router, shorten_request(&body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{url:?}");
        }

        // Nothing was stored, so the first token is still unassigned.
        let response = send(&router, get_request("/b")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let router = router(ShortenPolicy::Idempotent);

        for body in ["{", r#"{"link": "https://example.com"}"#, "[]"] {
            let response = send(&router, shorten_request(body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
            assert!(json_body(response).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let router = router(ShortenPolicy::Idempotent);

        for path in ["/zzz", "/doesNotExist"] {
            let response = send(&router, get_request(path)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {path}");
        }
    }

    #[tokio::test]
    async fn malformed_token_is_bad_request() {
        let router = router(ShortenPolicy::Idempotent);

        let response = send(&router, get_request("/bad-token")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn many_urls_get_distinct_resolvable_tokens() {
        let router = router(ShortenPolicy::Idempotent);
        let mut tokens = std::collections::HashSet::new();

        for i in 0..50 {
            let url = format!("https://example.com/{i}");
            let created = shorten(&router, &url).await;
            assert!(tokens.insert(created.token.clone()));

            let response = send(&router, get_request(&format!("/{}", created.token))).await;
            assert_eq!(response.headers()[header::LOCATION], url.as_str());
        }
    }

    struct DownShortener;

    #[async_trait]
    impl Shortener for DownShortener {
        async fn shorten(&self, _original_url: &str) -> Result<Token, ShortenerError> {
            Err(ShortenerError::Unavailable("pool timed out".into()))
        }
    }

    struct DownRedirector;

    #[async_trait]
    impl Redirector for DownRedirector {
        async fn resolve(&self, _token: &str) -> ushort_redirector::Result<String> {
            Err(RedirectorError::Unavailable("pool timed out".into()))
        }
    }

    #[tokio::test]
    async fn storage_outage_is_service_unavailable() {
        let router = App::router(AppState::new(
            Arc::new(DownShortener),
            Arc::new(DownRedirector),
            BASE_URL,
        ));

        let response = send(&router, shorten_request(r#"{"url": "https://example.com"}"#)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = send(&router, get_request("/b")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
