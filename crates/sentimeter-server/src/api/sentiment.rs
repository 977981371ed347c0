use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sentimeter_model::EvaluationMetrics;
use serde::Serialize;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{map_engine_error, ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct MetricsResponse {
    pub trained_at: DateTime<Utc>,
    pub metrics: Option<EvaluationMetrics>,
}

/// Pull the `tweets` array out of a request body.
///
/// Checks run in a fixed order so each malformed shape maps to one message.
fn parse_tweets(body: Option<&Value>) -> Result<Vec<String>, ApiError> {
    let Some(tweets) = body.and_then(|b| b.get("tweets")) else {
        return Err(ApiError::bad_request("Missing required field: tweets"));
    };
    let Some(items) = tweets.as_array() else {
        return Err(ApiError::bad_request("Tweets must be a list of strings"));
    };
    let texts = items
        .iter()
        .map(|item| item.as_str().map(str::to_owned))
        .collect::<Option<Vec<String>>>()
        .ok_or_else(|| ApiError::bad_request("All tweets must be strings"))?;
    if texts.is_empty() {
        return Err(ApiError::bad_request("Tweets list cannot be empty"));
    }
    Ok(texts)
}

/// `POST /api/sentiment/analyze` with `{"tweets": [...]}`; responds with
/// `{tweet: score}`. Repeated tweets share one key.
pub(super) async fn analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BTreeMap<String, f64>>, ApiError> {
    let body = match payload {
        Ok(Json(value)) => Some(value),
        Err(rejection) => {
            tracing::debug!(request_id = %req_id.0, error = %rejection, "unparseable analyze body");
            None
        }
    };
    let tweets = parse_tweets(body.as_ref())?;

    let scores = state
        .engine
        .score(&tweets)
        .await
        .map_err(|e| map_engine_error(&req_id.0, &e))?;

    tracing::debug!(request_id = %req_id.0, tweets = tweets.len(), "scored tweets");
    Ok(Json(tweets.into_iter().zip(scores).collect()))
}

/// `GET /api/sentiment/metrics`: held-out metrics of the serving generation,
/// `null` when it was fitted on the bootstrap pair.
pub(super) async fn metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<MetricsResponse>, ApiError> {
    let generation = state
        .engine
        .current()
        .await
        .map_err(|e| map_engine_error(&req_id.0, &e))?;

    Ok(Json(MetricsResponse {
        trained_at: generation.trained_at(),
        metrics: generation.metrics().cloned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn message(result: Result<Vec<String>, ApiError>) -> String {
        let err = result.expect_err("should be rejected");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        err.message
    }

    #[test]
    fn accepts_list_of_strings() {
        let body = json!({"tweets": ["a", "b", "a"]});
        assert_eq!(parse_tweets(Some(&body)).expect("valid"), ["a", "b", "a"]);
    }

    #[test]
    fn missing_body_or_field_is_reported_first() {
        assert_eq!(message(parse_tweets(None)), "Missing required field: tweets");
        assert_eq!(
            message(parse_tweets(Some(&json!({"text": "hi"})))),
            "Missing required field: tweets"
        );
        assert_eq!(
            message(parse_tweets(Some(&json!(["not", "an", "object"])))),
            "Missing required field: tweets"
        );
    }

    #[test]
    fn null_tweets_is_not_a_list() {
        assert_eq!(
            message(parse_tweets(Some(&json!({"tweets": null})))),
            "Tweets must be a list of strings"
        );
    }

    #[test]
    fn non_string_element_wins_over_other_checks() {
        assert_eq!(
            message(parse_tweets(Some(&json!({"tweets": [null]})))),
            "All tweets must be strings"
        );
    }
}
