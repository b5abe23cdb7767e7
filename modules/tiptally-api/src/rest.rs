use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use base64::Engine;
use serde::Deserialize;
use tracing::warn;

use tiptally_common::{RawImage, TipTallyError};

use crate::AppState;

#[derive(Deserialize)]
pub struct ImagePayload {
    pub filename: Option<String>,
    pub media_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

#[derive(Deserialize)]
pub struct BatchRequest {
    pub images: Vec<ImagePayload>,
}

fn decode_payload(payload: &ImagePayload) -> Result<RawImage, String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.data.as_bytes())
        .map_err(|e| {
            format!(
                "invalid base64 image data for {}: {e}",
                payload.filename.as_deref().unwrap_or("<unnamed>")
            )
        })?;
    Ok(RawImage {
        bytes,
        media_type: payload.media_type.clone(),
        filename: payload.filename.clone(),
    })
}

/// HTTP status for a terminal pipeline error on a single submission.
/// Batch submissions return 200 with per-item outcomes instead.
fn error_status(err: &TipTallyError) -> StatusCode {
    match err {
        TipTallyError::UnsupportedMediaType(_)
        | TipTallyError::NormalizationFailed(_)
        | TipTallyError::InvalidRequest(_)
        | TipTallyError::EmptyBatch => StatusCode::BAD_REQUEST,
        TipTallyError::TransientService(_)
        | TipTallyError::RetriesExhausted { .. }
        | TipTallyError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        TipTallyError::Authentication(_) | TipTallyError::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_json(err: &TipTallyError) -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": err.to_string()}))
}

pub async fn api_scan_receipt(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ImagePayload>,
) -> impl IntoResponse {
    let raw = match decode_payload(&body) {
        Ok(raw) => raw,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": message})),
            )
                .into_response();
        }
    };

    match state.coordinator.process_single(&raw).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            warn!(error = %err, "Single receipt submission failed");
            (error_status(&err), error_json(&err)).into_response()
        }
    }
}

pub async fn api_scan_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchRequest>,
) -> impl IntoResponse {
    if body.images.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "empty batch: no images submitted"})),
        )
            .into_response();
    }

    let mut raws = Vec::with_capacity(body.images.len());
    for payload in &body.images {
        match decode_payload(payload) {
            Ok(raw) => raws.push(raw),
            Err(message) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": message})),
                )
                    .into_response();
            }
        }
    }

    match state.coordinator.process_batch(&raws).await {
        // Per-item failures live inside the outcome list; the batch call
        // itself still succeeds.
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => {
            warn!(error = %err, "Batch submission failed before starting");
            (error_status(&err), error_json(&err)).into_response()
        }
    }
}

pub async fn api_cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.cache.stats().await)
}

pub async fn api_cache_flush(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let removed = state.cache.flush().await;
    Json(serde_json::json!({"removed": removed}))
}
