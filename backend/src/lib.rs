// Library exports for the api binary and tests
pub mod config;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use config::Config;
use services::notice_store::NoticeStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub notices: Arc<NoticeStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let notices = Arc::new(NoticeStore::new(config.max_notices));
        Self {
            config: Arc::new(config),
            notices,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        .route(
            "/notices",
            get(routes::notices::list_notices).post(routes::notices::add_notice),
        );

    // Serve the static admin/student pages from the same origin when configured.
    let app = match &config.static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state)
}

/// Any origin unless `CORS_ALLOWED_ORIGINS` lists specific ones.
fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.cors_allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(origin)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn state(vars: &[(&str, &str)]) -> AppState {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_vars(|key| {
            vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
        .unwrap();
        AppState::new(config)
    }

    fn far_future(title: &str) -> models::notice::CreateNoticeRequest {
        models::notice::CreateNoticeRequest {
            title: Some(title.into()),
            message: Some("m".into()),
            date: Some("2025-03-14".into()),
            expires_at: Some("2999-01-01T00:00:00Z".into()),
        }
    }

    #[tokio::test]
    async fn health_reports_stored_count() {
        let app = build_router(state(&[]));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "status": "ok", "notices": 0 }));
    }

    #[tokio::test]
    async fn metrics_are_exposed() {
        let state = state(&[]);
        state.notices.add(far_future("Metrics"), Utc::now()).unwrap();

        let resp = build_router(state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("notices_added_total"));
    }

    #[tokio::test]
    async fn cors_preflight_allows_post() {
        let app = build_router(state(&[("CORS_ALLOWED_ORIGINS", "http://board.test")]));
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/notices")
                    .header(header::ORIGIN, "http://board.test")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let allowed = resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok());
        assert_eq!(allowed, Some("http://board.test"));
    }

    #[tokio::test]
    async fn capacity_comes_from_config() {
        let state = state(&[("MAX_NOTICES", "1")]);
        for title in ["a", "b"] {
            state.notices.add(far_future(title), Utc::now()).unwrap();
        }
        assert_eq!(state.notices.len(), 1);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = build_router(state(&[("MAX_BODY_BYTES", "64")]));
        let big = json!({
            "title": "t",
            "message": "x".repeat(1024),
            "date": "2025-03-14",
            "expires_at": "2999-01-01T00:00:00Z",
        });
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/notices")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(big.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
