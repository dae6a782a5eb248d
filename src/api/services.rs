use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::collections::HashMap;
use tracing::{error, info, warn};

use super::{
    models::{ConvertDocumentRequest, HealthResponse},
    state::AppState,
    utils,
};
use crate::api::error::ApiError;
use crate::content::QueryParams;
use crate::handlers::HandlerContext;

/// Document conversion endpoint (POST /convert-document)
///
/// Converts an HTML page body into the editor JSON tree and the base64
/// binary state. Both `description_html` and `variant` must be present;
/// otherwise the request is rejected before the converter runs. A field sent
/// as JSON `null` counts as missing. An empty string is present.
///
/// Conversion runs on the blocking pool.
pub async fn convert_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    utils::require_content_type(&headers, &mime::APPLICATION_JSON)?;

    let body_bytes = read_body(body, state.max_payload_bytes()).await?;
    let request: ConvertDocumentRequest = serde_json::from_slice(&body_bytes)?;

    let (Some(description_html), Some(variant)) = (request.description_html, request.variant)
    else {
        return Err(ApiError::MissingFields);
    };

    let converter = state.converter.clone();
    let requested = variant.clone();
    let result = tokio::task::spawn_blocking(move || {
        converter.convert(&description_html, &requested)
    })
    .await
    .map_err(|err| {
        state.metrics.conversion_failed();
        error!(error = %err, %variant, "Conversion task did not complete");
        ApiError::Internal(format!("conversion task failed: {}", err))
    })?;

    match result {
        Ok(converted) => {
            state.metrics.conversion_ok();
            Ok((StatusCode::OK, Json(converted)))
        }
        Err(err) => {
            state.metrics.conversion_failed();
            error!(error = %err, %variant, "Error in /convert-document endpoint");
            Err(ApiError::Internal(err.to_string()))
        }
    }
}

/// Binary state of a page (GET /documents/{page_id})
///
/// The handler is chosen from the query string (`documentType`,
/// `workspaceSlug` and friends). Returns 204 when the page has no state yet.
pub async fn fetch_document(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let params = QueryParams::from(query);
    let ctx = HandlerContext::from_params(&params);
    let handler = state.registry.get_handler(&ctx)?;
    let cookie = utils::cookie_header(&headers);

    let fetched = handler.fetch(&page_id, &params, cookie.as_deref()).await?;
    state.metrics.document_fetched();

    let response = match fetched {
        Some(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime::APPLICATION_OCTET_STREAM.as_ref())],
            bytes,
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };

    Ok(response)
}

/// Persist a page's binary state (PUT /documents/{page_id})
pub async fn store_document(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    utils::require_content_type(&headers, &mime::APPLICATION_OCTET_STREAM)?;

    let params = QueryParams::from(query);
    let ctx = HandlerContext::from_params(&params);
    let handler = state.registry.get_handler(&ctx)?;
    let cookie = utils::cookie_header(&headers);

    let body_bytes = read_body(body, state.max_payload_bytes()).await?;

    if let Err(err) = handler
        .store(&page_id, body_bytes, &params, cookie.as_deref())
        .await
    {
        state.metrics.update_failed();
        warn!(error = %err, %page_id, handler = handler.name(), "Document update failed");
        return Err(err.into());
    }

    state.metrics.document_stored();
    info!(%page_id, handler = handler.name(), "Document stored");

    Ok(StatusCode::NO_CONTENT)
}

/// Reads the (already decompressed) request body, stopping at `max_size`
async fn read_body(body: axum::body::Body, max_size: usize) -> Result<Bytes, ApiError> {
    let collected = Limited::new(body, max_size).collect().await.map_err(|err| {
        if err.is::<LengthLimitError>() {
            ApiError::PayloadTooLarge(max_size)
        } else {
            ApiError::InvalidPayload(err.to_string())
        }
    })?;

    Ok(collected.to_bytes())
}

/// Health check endpoint (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());
    components.insert(
        "handlers".to_string(),
        if state.registry.is_empty() {
            "unhealthy".to_string()
        } else {
            "healthy".to_string()
        },
    );

    let all_healthy = components.values().all(|status| status == "healthy");
    let (status_code, overall_status) = if all_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
        metrics: state.metrics.snapshot(),
    };

    (status_code, Json(response))
}
