use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::crypto::{cipher::DecryptError, lookup::LookupError, reveal::RevealError, reveal::ShapeError};

/// Application-wide error taxonomy. Business failures carry their own HTTP
/// status; anything else is a 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("stored value could not be decrypted")]
    Decrypt(#[from] DecryptError),

    #[error("stored record failed validation: {0}")]
    Shape(#[from] ShapeError),

    #[error("e-mail already registered")]
    DuplicateEmail,

    #[error("new {0} must differ from the current one")]
    NoOpChange(&'static str),

    #[error("no fields provided to update")]
    NoChanges,

    #[error("action not authorized for this user")]
    NotAuthorized,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid {0}")]
    InvalidInput(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::NoOpChange(_) | AppError::NoChanges | AppError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotAuthorized => StatusCode::FORBIDDEN,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Decrypt(_)
            | AppError::Shape(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RevealError> for AppError {
    fn from(err: RevealError) -> Self {
        match err {
            RevealError::Decrypt(e) => AppError::Decrypt(e),
            RevealError::Shape(e) => AppError::Shape(e),
        }
    }
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::MissingSecret => AppError::Config("HASH_SECRET is not configured".into()),
            LookupError::EmptyInput => AppError::InvalidInput("value for lookup hash"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_map_to_client_statuses() {
        assert_eq!(AppError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NoOpChange("e-mail").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NoChanges.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotAuthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("vehicle").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn data_corruption_is_a_server_error() {
        assert_eq!(
            AppError::Decrypt(DecryptError::Format).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Shape(ShapeError::MissingField("email")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
