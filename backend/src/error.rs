use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use diesel::result::DatabaseErrorKind;
use serde::Serialize;
use thiserror::Error;

use crate::images::blob::BlobError;
use crate::models::UnknownVariant;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Validation {
        message: String,
        reason: Option<&'static str>,
    },
    #[error("{0}")]
    Invalid(#[from] validator::ValidationErrors),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("diesel error: `{0}`")]
    Diesel(#[from] diesel::result::Error),
    #[error("postgres pool error: `{0}`")]
    PgPool(#[from] diesel_async::pooled_connection::deadpool::PoolError),
    #[error("blob storage error: `{0}`")]
    Blob(#[from] BlobError),
    #[error("token error: `{0}`")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("stored value is invalid: `{0}`")]
    Corrupt(#[from] UnknownVariant),
    #[error("invalid json body: {0}")]
    Json(#[from] JsonRejection),
    #[error("invalid query string: {0}")]
    Query(#[from] QueryRejection),
    #[error("invalid path parameter: {0}")]
    Path(#[from] PathRejection),
    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            reason: None,
        }
    }

    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found"))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, reason) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            Self::Validation { message, reason } => (StatusCode::BAD_REQUEST, message, reason),
            Self::Invalid(errors) => {
                let message = errors.to_string().trim().to_string();
                (StatusCode::BAD_REQUEST, message, None)
            }
            Self::Conflict(message) => (StatusCode::CONFLICT, message, None),
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message, None),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message, None),
            Self::Blob(BlobError::NotFound(_) | BlobError::InvalidPath(_)) => {
                (StatusCode::NOT_FOUND, "File not found".to_string(), None)
            }
            Self::Diesel(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => (StatusCode::CONFLICT, info.message().to_string(), None),
            Self::Json(rejection) => (rejection.status(), rejection.body_text(), None),
            Self::Query(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text(), None),
            Self::Path(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text(), None),
            Self::Multipart(err) => (StatusCode::BAD_REQUEST, err.body_text(), None),
            other => {
                log::error!("request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                    None,
                )
            }
        };

        (status, ApiJson(ErrorResponse { message, reason })).into_response()
    }
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

/// JSON body extractor whose rejections render as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T> IntoResponse for ApiJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
