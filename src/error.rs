use actix_multipart::MultipartError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use std::fmt;

use crate::services::resize::archive::ArchiveError;
use crate::services::resize::types::ResizeFailure;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ResizeFailure>,
}

#[derive(Debug)]
pub enum ResizerError {
    // Boundary errors, the pipeline never runs
    ValidationFailed(String),
    PayloadTooLarge(String),

    // Every (image, width) pairing of the request failed
    RequestFailed { diagnostics: Vec<ResizeFailure> },

    // Archive construction errors
    ArchiveFailed(String),

    InternalError(String),
}

impl ResizerError {
    fn kind(&self) -> &'static str {
        match self {
            ResizerError::ValidationFailed(_) => "validation_failed",
            ResizerError::PayloadTooLarge(_) => "payload_too_large",
            ResizerError::RequestFailed { .. } => "request_failed",
            ResizerError::ArchiveFailed(_) => "archive_failed",
            ResizerError::InternalError(_) => "internal_error",
        }
    }
}

impl fmt::Display for ResizerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResizerError::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            ResizerError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ResizerError::RequestFailed { diagnostics } => {
                write!(f, "Error processing images: all {} resizes failed", diagnostics.len())?;
                for failure in diagnostics {
                    write!(f, "; {}", failure)?;
                }
                Ok(())
            }
            ResizerError::ArchiveFailed(msg) => write!(f, "Archive error: {}", msg),
            ResizerError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ResizerError {}

impl ResponseError for ResizerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ResizerError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ResizerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ResizerError::RequestFailed { .. }
            | ResizerError::ArchiveFailed(_)
            | ResizerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let diagnostics = match self {
            ResizerError::RequestFailed { diagnostics } => diagnostics.clone(),
            _ => Vec::new(),
        };

        let error_response = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            code: Some(self.status_code().as_u16().to_string()),
            diagnostics,
        };

        HttpResponse::build(self.status_code()).json(error_response)
    }
}

pub type ResizerResult<T> = Result<T, ResizerError>;

impl From<MultipartError> for ResizerError {
    fn from(error: MultipartError) -> Self {
        ResizerError::ValidationFailed(format!("Multipart error: {}", error))
    }
}

impl From<serde_json::Error> for ResizerError {
    fn from(error: serde_json::Error) -> Self {
        ResizerError::ValidationFailed(error.to_string())
    }
}

impl From<std::io::Error> for ResizerError {
    fn from(error: std::io::Error) -> Self {
        ResizerError::InternalError(format!("IO error: {}", error))
    }
}

impl From<tokio::task::JoinError> for ResizerError {
    fn from(error: tokio::task::JoinError) -> Self {
        ResizerError::InternalError(format!("Background task failed: {}", error))
    }
}

impl From<ArchiveError> for ResizerError {
    fn from(error: ArchiveError) -> Self {
        ResizerError::ArchiveFailed(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resize::types::ResizeFailureKind;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ResizerError::ValidationFailed("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ResizerError::PayloadTooLarge("x".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ResizerError::RequestFailed { diagnostics: vec![] }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_request_failure_message_names_pairings() {
        let err = ResizerError::RequestFailed {
            diagnostics: vec![ResizeFailure {
                source_name: "cat".to_string(),
                width: 100,
                kind: ResizeFailureKind::DecodeFailure,
                detail: "bad header".to_string(),
            }],
        };

        let message = err.to_string();
        assert!(message.contains("all 1 resizes failed"));
        assert!(message.contains("cat"));
        assert!(message.contains("100"));
    }

    #[test]
    fn test_failure_kind_labels() {
        let failure = ResizeFailure {
            source_name: "strip".to_string(),
            width: 10_000,
            kind: ResizeFailureKind::OutputTooLarge,
            detail: "10000x10000000 exceeds max height 10000".to_string(),
        };

        assert!(failure.to_string().contains("output too large"));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "output_too_large");
    }
}
