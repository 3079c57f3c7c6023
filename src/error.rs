use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Failures while preparing application state at startup.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Opening record store failed: {0}")]
    Store(#[from] StoreError),

    #[error("Preparing upload directory failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Loading page templates failed: {0}")]
    Template(#[from] minijinja::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Only PDF files are allowed")]
    InvalidContentType,

    #[error("Tracking record not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Malformed request: {0}")]
    MalformedBody(String),

    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        AppError::MalformedBody(err.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFile | AppError::InvalidContentType | AppError::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Io(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(AppError::MissingFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidContentType.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn filesystem_errors_map_to_500() {
        let err = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = AppError::from(StoreError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
