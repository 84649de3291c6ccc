use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;

/// Upload failures with their HTTP mapping
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(
        "Missing files. Expect multipart fields: sourceImage (image) and targetVideo (video)."
    )]
    MissingFiles,

    #[error("File too large")]
    FileTooLarge,

    #[error("Too many files")]
    TooManyFiles,

    #[error("Unexpected field: {0}")]
    UnexpectedField(&'static str),

    #[error("{}", .0.body_text())]
    Multipart(#[from] MultipartError),

    #[error("Failed to store uploaded file")]
    Storage(#[from] std::io::Error),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::MissingFiles | UploadError::UnexpectedField(_) => StatusCode::BAD_REQUEST,
            UploadError::FileTooLarge | UploadError::TooManyFiles => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Multipart(error) => error.status(),
            UploadError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            ok: false,
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
