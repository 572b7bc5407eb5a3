//! HTTP-facing error type for the API handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::multipart::DecodeError;
use crate::registry::RegistryError;
use crate::transfer::TransferError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error in handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, message).into_response()
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        // Malformed upload bodies are the client's fault
        AppError::BadRequest(format!("could not decode multipart body: {err}"))
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownCode(code) => {
                AppError::NotFound(format!("no file offered under code {code}"))
            }
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::UnknownCode(code) => {
                AppError::NotFound(format!("no file offered under code {code}"))
            }
            TransferError::AlreadyConsumed(code) => {
                AppError::NotFound(format!("code {code} was already downloaded"))
            }
            TransferError::MalformedHeader(line) => {
                AppError::Internal(anyhow::anyhow!("sender produced a bad header: {line:?}"))
            }
            other => AppError::Internal(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_map_to_bad_request() {
        let err: AppError = DecodeError::MissingFilename.into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn unknown_code_maps_to_not_found() {
        let err: AppError = RegistryError::UnknownCode(9001).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = TransferError::UnknownCode(9001).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
