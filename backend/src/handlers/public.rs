use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use image::ImageFormat;
use serde::Serialize;
use validator::Validate;

use super::{message, MessageResponse};
use crate::error::{ApiJson, ApiPath, ApiResult};
use crate::models::{PublicStats, Subscribe, SubscribeOutcome};
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> ApiJson<HealthResponse> {
    ApiJson(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn root() -> ApiJson<MessageResponse> {
    message("Dealership API is running")
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<ApiJson<PublicStats>> {
    Ok(ApiJson(state.store.public_stats().await?))
}

pub async fn subscribe(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<Subscribe>,
) -> ApiResult<(StatusCode, ApiJson<MessageResponse>)> {
    request.validate()?;
    let email = request.email.trim().to_lowercase();
    let response = match state.store.subscribe(&email).await? {
        SubscribeOutcome::Subscribed => {
            (StatusCode::CREATED, message("Thank you for subscribing!"))
        }
        SubscribeOutcome::Reactivated => (
            StatusCode::OK,
            message("Your subscription has been reactivated!"),
        ),
    };
    Ok(response)
}

/// Serves a stored upload. Unknown or malformed paths are 404.
pub async fn upload(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<String>,
) -> ApiResult<Response> {
    let bytes = state.images.blobs().retrieve(&path).await?;
    let content_type = ImageFormat::from_path(&path)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CACHE_CONTROL, "public, max-age=86400"),
        ],
        bytes,
    )
        .into_response())
}
