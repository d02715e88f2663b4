//! HTTP API handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::error::{ApiError, GenerateError};
use crate::gemini::GeminiClient;
use crate::metrics;
use crate::store::{nutrition_row, RecordStore, SessionInput, Table};

use super::identity::UserId;

// === Public error messages ===

/// Generative credential missing on the server.
pub const MSG_MISSING_API_KEY: &str = "GEMINI_API_KEY is not configured on the server.";
/// Generate request without `payload`.
pub const MSG_MISSING_PAYLOAD: &str = "Request body is missing payload.";
/// Any generative upstream failure.
pub const MSG_GENERATE_FAILED: &str = "Failed to get a response from the Gemini API.";
/// Body declared as JSON but unparseable.
pub const MSG_INVALID_JSON: &str = "Request body must be valid JSON.";
/// Insert body that is not a JSON object.
pub const MSG_BODY_NOT_OBJECT: &str = "Request body must be a JSON object.";
/// Session list failure.
pub const MSG_SESSIONS_LOAD_FAILED: &str = "Failed to load session data.";
/// Session insert failure.
pub const MSG_SESSIONS_SAVE_FAILED: &str = "Failed to record session.";
/// Nutrition list failure.
pub const MSG_NUTRITION_LOAD_FAILED: &str = "Failed to load nutrition data.";
/// Nutrition insert failure.
pub const MSG_NUTRITION_SAVE_FAILED: &str = "Failed to record nutrition entry.";

/// State for the generative proxy routes.
#[derive(Debug, Clone)]
pub struct GenerateState {
    /// Gemini client holding the server credential.
    pub gemini: GeminiClient,
}

/// State for the per-user data routes.
#[derive(Clone)]
pub struct StoreState {
    /// Backing record store.
    pub store: Arc<dyn RecordStore>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Accept a JSON body, treating a request without a JSON content type as `{}`.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(Value::Object(Map::new())),
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection.body_text());
            Err(ApiError::BadRequest(MSG_INVALID_JSON.to_string()))
        }
    }
}

/// `null`, `false`, zero and `""` count as no payload at all.
fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// `POST /api/proxy-generate` - forward `payload` to Gemini with the server key.
pub async fn proxy_generate(
    State(state): State<GenerateState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    metrics::inc_api_requests("/api/proxy-generate");

    if !state.gemini.has_api_key() {
        error!("GEMINI_API_KEY is not configured; rejecting generate request");
        return Err(ApiError::Internal(MSG_MISSING_API_KEY.to_string()));
    }

    let body = json_body(body)?;
    let payload = match body.get("payload") {
        Some(payload) if !is_empty_payload(payload) => payload,
        _ => return Err(ApiError::BadRequest(MSG_MISSING_PAYLOAD.to_string())),
    };

    match state.gemini.generate(payload).await {
        Ok(data) => Ok(Json(data)),
        Err(e) => {
            match &e {
                GenerateError::Upstream { status, body } => {
                    error!(status, body = %body, "Gemini API returned an error");
                }
                other => error!("Gemini proxy error: {}", other),
            }
            metrics::inc_upstream_failures("gemini");
            Err(ApiError::Internal(MSG_GENERATE_FAILED.to_string()))
        }
    }
}

async fn list_rows(
    state: &StoreState,
    table: Table,
    user_id: &UserId,
    failure: &str,
) -> Result<Json<Vec<Value>>, ApiError> {
    state
        .store
        .list(table, user_id.as_str())
        .await
        .map(Json)
        .map_err(|e| {
            error!(table = %table, "Failed to list rows: {}", e);
            metrics::inc_upstream_failures("store");
            ApiError::Internal(failure.to_string())
        })
}

async fn insert_row(
    state: &StoreState,
    table: Table,
    row: Map<String, Value>,
    failure: &str,
) -> Result<(StatusCode, Json<Vec<Value>>), ApiError> {
    state
        .store
        .insert(table, row)
        .await
        .map(|rows| (StatusCode::CREATED, Json(rows)))
        .map_err(|e| {
            error!(table = %table, "Failed to insert row: {}", e);
            metrics::inc_upstream_failures("store");
            ApiError::Internal(failure.to_string())
        })
}

/// `GET /api/sessions` - the caller's sessions, newest first.
pub async fn list_sessions(
    State(state): State<StoreState>,
    user_id: UserId,
) -> Result<Json<Vec<Value>>, ApiError> {
    metrics::inc_api_requests("/api/sessions");
    list_rows(&state, Table::Sessions, &user_id, MSG_SESSIONS_LOAD_FAILED).await
}

/// `POST /api/sessions` - record `{total_volume, exercises}` for the caller.
pub async fn create_session(
    State(state): State<StoreState>,
    user_id: UserId,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Value>>), ApiError> {
    metrics::inc_api_requests("/api/sessions");

    let body = json_body(body)?;
    if !body.is_object() {
        return Err(ApiError::BadRequest(MSG_BODY_NOT_OBJECT.to_string()));
    }
    let input: SessionInput = serde_json::from_value(body)
        .map_err(|_| ApiError::BadRequest(MSG_BODY_NOT_OBJECT.to_string()))?;

    let row = input.into_row(user_id.as_str());
    insert_row(&state, Table::Sessions, row, MSG_SESSIONS_SAVE_FAILED).await
}

/// `GET /api/nutrition` - the caller's nutrition entries, newest first.
pub async fn list_nutrition(
    State(state): State<StoreState>,
    user_id: UserId,
) -> Result<Json<Vec<Value>>, ApiError> {
    metrics::inc_api_requests("/api/nutrition");
    list_rows(&state, Table::Nutrition, &user_id, MSG_NUTRITION_LOAD_FAILED).await
}

/// `POST /api/nutrition` - record the caller body merged with the caller's id.
pub async fn create_nutrition(
    State(state): State<StoreState>,
    user_id: UserId,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Value>>), ApiError> {
    metrics::inc_api_requests("/api/nutrition");

    let Value::Object(body) = json_body(body)? else {
        return Err(ApiError::BadRequest(MSG_BODY_NOT_OBJECT.to_string()));
    };

    let row = nutrition_row(body, user_id.as_str());
    insert_row(&state, Table::Nutrition, row, MSG_NUTRITION_SAVE_FAILED).await
}
