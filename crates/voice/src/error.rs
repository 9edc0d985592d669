use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mirage_core::HttpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VoiceError>;

/// Voice cloning and speech errors
#[derive(Debug, Error)]
pub enum VoiceError {
    /// Malformed upload or request body
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request body over the size limit
    #[error("Request body is too large, limit is {0} bytes")]
    PayloadTooLarge(usize),

    /// The voice service answered with an error status
    #[error("Voice service error: {message}")]
    Upstream { status: StatusCode, message: String },

    /// The voice service could not be reached
    #[error("Voice service unreachable: {0}")]
    Unreachable(String),

    /// Required server configuration is missing
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl HttpError for VoiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { status, .. } => {
                if status.is_client_error() || status.is_server_error() {
                    *status
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            Self::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) | Self::PayloadTooLarge(_) => "invalid_request_error",
            Self::Upstream { .. } => "voice_service_error",
            Self::Unreachable(_) => "voice_service_unreachable",
            Self::ConfigError(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::warn!(error = %self, "voice request failed");
        } else {
            tracing::debug!(error = %self, "voice request rejected");
        }

        (status, Json(self.error_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_status_is_passed_through() {
        let err = VoiceError::Upstream {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "text is too long".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_body().error.code, 422);
    }

    #[test]
    fn unreachable_service_is_503() {
        let err = VoiceError::Unreachable("connection reset".to_string());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
