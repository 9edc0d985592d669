use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mirage_core::HttpError;
use thiserror::Error;

use crate::{scenario::KeySegment, types::SwapKind};

pub type Result<T> = std::result::Result<T, FaceSwapError>;

/// Face-swap pipeline errors with the status codes exposed to callers
#[derive(Debug, Error)]
pub enum FaceSwapError {
    /// Malformed upload or parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Object storage could not be reached or is misconfigured
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Object storage rejected the write
    #[error("Storage permission denied: {0}")]
    StoragePermissionDenied(String),

    /// No usable face landmarks for the image
    ///
    /// The provider does not distinguish "no face" from its own failures, so
    /// neither does this variant.
    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    /// A scenario key segment is not in the table
    #[error("Unknown {segment} '{value}'")]
    UnknownScenario { segment: KeySegment, value: String },

    /// The scenario exists but has no target of the requested kind
    #[error("Scenario '{key}' has no {kind} target")]
    IncompleteScenario { key: String, kind: SwapKind },

    /// The provider refused the job
    #[error("Face-swap submission rejected: {0}")]
    SubmissionRejected(String),

    /// The provider could not be reached or answered with an HTTP error
    #[error("Face-swap provider unreachable: {0}")]
    SubmissionUnreachable(String),

    /// A status query failed; the job itself may still be fine
    #[error("Job status query failed: {0}")]
    PollFailed(String),

    /// Required server configuration is missing
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl HttpError for FaceSwapError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnknownScenario { .. } => StatusCode::NOT_FOUND,
            Self::DetectionFailed(_) | Self::IncompleteScenario { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::SubmissionRejected(_) | Self::PollFailed(_) => StatusCode::BAD_GATEWAY,
            Self::StorageUnavailable(_) | Self::SubmissionUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::StoragePermissionDenied(_) | Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::StoragePermissionDenied(_) => "storage_permission_denied",
            Self::DetectionFailed(_) => "detection_failed",
            Self::UnknownScenario { .. } => "unknown_scenario",
            Self::IncompleteScenario { .. } => "incomplete_scenario",
            Self::SubmissionRejected(_) => "submission_rejected",
            Self::SubmissionUnreachable(_) => "submission_unreachable",
            Self::PollFailed(_) => "poll_failed",
            Self::ConfigError(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for FaceSwapError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::warn!(error = %self, "face-swap request failed");
        } else {
            tracing::debug!(error = %self, "face-swap request rejected");
        }

        (status, Json(self.error_body())).into_response()
    }
}
