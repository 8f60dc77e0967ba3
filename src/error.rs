use axum::extract::multipart::MultipartError;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum ContactsError {
    #[error("The ID must be a valid number")]
    InvalidId,

    #[error("Contact not found")]
    NotFound,

    #[error("API route not found")]
    RouteNotFound,

    #[error("the request must contain a file image")]
    MissingPicture,

    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Already exists that number")]
    DuplicateContact,

    #[error("Already exists that email")]
    DuplicateEmail,

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while receiving the picture part of a write request.
#[derive(Debug, ThisError)]
pub enum UploadError {
    #[error("the file is too large, maximum size is 5MB")]
    FileTooLarge,

    #[error("only image files are allowed")]
    InvalidFileType,

    #[error("only one picture file is allowed")]
    UnexpectedFile,

    #[error("malformed multipart body: {0}")]
    Multipart(MultipartError),

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MultipartError> for UploadError {
    fn from(e: MultipartError) -> Self {
        // The body limit surfaces as a stream error carrying 413.
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::FileTooLarge
        } else {
            UploadError::Multipart(e)
        }
    }
}

impl From<MultipartError> for ContactsError {
    fn from(e: MultipartError) -> Self {
        ContactsError::Upload(e.into())
    }
}

impl IntoResponse for ContactsError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ContactsError::InvalidId
            | ContactsError::MissingPicture
            | ContactsError::Validation(_)
            | ContactsError::DuplicateContact
            | ContactsError::DuplicateEmail
            | ContactsError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ContactsError::NotFound | ContactsError::RouteNotFound => StatusCode::NOT_FOUND,
            ContactsError::Upload(UploadError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ContactsError::Upload(_) => StatusCode::BAD_REQUEST,
            ContactsError::DatabaseError(_) | ContactsError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
            let body = ApiErrorResponse {
                error: "Internal Error".to_string(),
            };
            return (status, Json(body)).into_response();
        }

        match self {
            ContactsError::Validation(errors) => {
                (status, Json(ValidationErrorResponse { errors })).into_response()
            }
            other => {
                let body = ApiErrorResponse {
                    error: other.to_string(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}

/// `{"error": "..."}` body shared by every non-validation failure.
#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct ValidationErrorResponse {
    pub errors: Vec<String>,
}
