use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mirage_core::HttpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

/// Media relay errors
#[derive(Debug, Error)]
pub enum RelayError {
    /// Missing or unusable source URL
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A CDN refused a signed link, which happens once it has expired
    #[error("Media link has expired, fetch a fresh result URL and retry")]
    UpstreamLinkExpired,

    /// The source could not be fetched
    ///
    /// `status` is the upstream status when one was received.
    #[error("Failed to fetch media: {message}")]
    FetchFailed { status: Option<StatusCode>, message: String },

    /// A trusted host needs a credential that is not configured
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl HttpError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamLinkExpired => StatusCode::SERVICE_UNAVAILABLE,
            Self::FetchFailed { status, .. } => status
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::UpstreamLinkExpired => "upstream_link_expired",
            Self::FetchFailed { .. } => "relay_fetch_failed",
            Self::ConfigError(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::warn!(error = %self, %status, "media relay failed");
        } else {
            tracing::debug!(error = %self, %status, "media relay rejected");
        }

        (status, Json(self.error_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_status_passes_through() {
        let err = RelayError::FetchFailed {
            status: Some(StatusCode::FORBIDDEN),
            message: "AccessDenied".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_type(), "relay_fetch_failed");
    }

    #[test]
    fn transport_failures_and_odd_statuses_are_bad_gateway() {
        let transport = RelayError::FetchFailed {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(transport.status_code(), StatusCode::BAD_GATEWAY);

        let redirect = RelayError::FetchFailed {
            status: Some(StatusCode::NOT_MODIFIED),
            message: String::new(),
        };
        assert_eq!(redirect.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn expired_link_is_unavailable() {
        assert_eq!(
            RelayError::UpstreamLinkExpired.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
