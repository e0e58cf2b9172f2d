//! HTTP handlers, grouped by resource. Routing lives in [`crate::router`].

pub mod auth;
pub mod brands;
pub mod dashboard;
pub mod enquiries;
pub mod leads;
pub mod public;
pub mod sell_requests;
pub mod users;
pub mod vehicles;

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use serde::Serialize;

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::images::{ImageIntake, UploadedFile};
use crate::listing::{PageRequest, ADMIN_MAX_PAGE_SIZE, ADMIN_PAGE_SIZE};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn message(text: impl Into<String>) -> ApiJson<MessageResponse> {
    ApiJson(MessageResponse {
        message: text.into(),
    })
}

/// Page request for the back-office lists.
pub(crate) fn admin_page(page: Option<i64>, page_size: Option<i64>) -> ApiResult<PageRequest> {
    PageRequest::new(page, page_size, ADMIN_PAGE_SIZE, ADMIN_MAX_PAGE_SIZE)
}

/// Pulls the `file` field out of a multipart body. The name is checked before any bytes are
/// read and reading stops as soon as the file passes the size cap.
pub(crate) async fn read_upload(
    mut multipart: Multipart,
    intake: &ImageIntake,
) -> ApiResult<UploadedFile> {
    let body_error = |err: MultipartError| -> ApiError {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            intake.oversized().into()
        } else {
            err.into()
        }
    };

    while let Some(mut field) = multipart.next_field().await.map_err(body_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        intake.check_name(filename.as_deref())?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(body_error)? {
            bytes.extend_from_slice(&chunk);
            intake.check_size(bytes.len())?;
        }
        return Ok(UploadedFile {
            filename,
            bytes: Bytes::from(bytes),
        });
    }
    Err(ApiError::Validation {
        message: "No file provided".to_string(),
        reason: Some("missing_file"),
    })
}
