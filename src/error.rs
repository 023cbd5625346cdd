//! Error types for plotbench
//!
//! User mistakes (bad uploads, malformed CSV) never reach this type; they
//! become flash messages and a redirect instead. [`AppError`] covers the
//! failures a handler cannot recover from.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Handler error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Session store failure (500)
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Upload stream could not be read (400)
    #[error("Upload error: {0}")]
    Upload(#[from] MultipartError),

    /// Figure could not be rasterized (500)
    #[error("Render error: {0}")]
    Render(#[from] crate::figure::FigureError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Upload(ref err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Session(ref err) => {
                error!("Session store failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            AppError::Render(ref err) => {
                error!("Figure rendering failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
