mod sentiment;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sentimeter_model::ScoringEngine;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScoringEngine>,
}

/// Error response rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub(super) fn map_engine_error(request_id: &str, error: &sentimeter_model::EngineError) -> ApiError {
    tracing::error!(request_id, error = %error, "sentiment engine unavailable");
    ApiError::unavailable("sentiment model unavailable")
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sentiment/analyze", post(sentiment::analyze))
        .route("/api/sentiment/metrics", get(sentiment::metrics))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthData { status: "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sentimeter_core::{ExampleStore, InMemoryExampleStore, LabeledExample};
    use sentimeter_model::EngineConfig;
    use tower::ServiceExt;

    fn app_with(store: Arc<dyn ExampleStore>, dir: &tempfile::TempDir) -> Router {
        let config = EngineConfig::new(dir.path().join("sentiment_model"));
        build_app(AppState {
            engine: ScoringEngine::new(config, store),
        })
    }

    fn polarity_consistent_store() -> Arc<dyn ExampleStore> {
        let mut rows = Vec::new();
        for i in 0..8 {
            rows.push(LabeledExample::new(format!("I love this, day {i}"), true, false));
            rows.push(LabeledExample::new(format!("This is terrible, day {i}"), false, true));
        }
        Arc::new(InMemoryExampleStore::new(rows))
    }

    async fn post_json(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sentiment/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_owned()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&bytes).expect("json parse");
        (status, json)
    }

    #[test]
    fn api_error_renders_error_field() {
        let response = ApiError::bad_request("nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_ok_and_echoes_request_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app_with(Arc::new(InMemoryExampleStore::new(Vec::new())), &dir);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header(REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("req-42")
        );
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn analyze_scores_every_tweet() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app_with(polarity_consistent_store(), &dir);

        let (status, json) =
            post_json(app, r#"{"tweets": ["I love this!", "This is terrible!"]}"#).await;

        assert_eq!(status, StatusCode::OK);
        let love = json["I love this!"].as_f64().expect("love score");
        let terrible = json["This is terrible!"].as_f64().expect("terrible score");
        assert!((-1.0..=1.0).contains(&love));
        assert!((-1.0..=1.0).contains(&terrible));
        assert!(love > terrible, "love={love} terrible={terrible}");
    }

    #[tokio::test]
    async fn analyze_rejects_malformed_requests() {
        let cases = [
            (r#"{"tweets": []}"#, "Tweets list cannot be empty"),
            ("{}", "Missing required field: tweets"),
            (r#"{"tweets": "x"}"#, "Tweets must be a list of strings"),
            (r#"{"tweets": ["ok", 3]}"#, "All tweets must be strings"),
            ("not json at all", "Missing required field: tweets"),
        ];

        for (body, expected) in cases {
            let dir = tempfile::tempdir().expect("tempdir");
            let store = Arc::new(InMemoryExampleStore::with_sample_data());
            let app = app_with(store.clone(), &dir);

            let (status, json) = post_json(app, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
            assert_eq!(json["error"], expected, "body {body}");
            assert_eq!(store.fetch_count(), 0, "validation must not reach the engine");
        }
    }

    #[tokio::test]
    async fn analyze_reports_unavailable_engine() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app_with(Arc::new(InMemoryExampleStore::failing()), &dir);

        let (status, json) = post_json(app, r#"{"tweets": ["hello"]}"#).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn metrics_are_null_for_bootstrap_generation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app_with(Arc::new(InMemoryExampleStore::new(Vec::new())), &dir);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/sentiment/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert!(json["metrics"].is_null());
    }
}
