use axum::{
    body::Body,
    extract::{FromRequest, Multipart},
};
use serde::de::DeserializeOwned;

use crate::{error::VoiceError, types::VoiceSample};

/// Body limit for voice recordings (32 MiB)
pub(crate) const AUDIO_LIMIT_BYTES: usize = 32 << 20;

/// Body limit for JSON requests (1 MiB)
const JSON_LIMIT_BYTES: usize = 1 << 20;

/// Extractor for a `multipart/form-data` recording in the `file` part
pub struct ExtractSample(pub VoiceSample);

impl<S> FromRequest<S> for ExtractSample
where
    S: Send + Sync,
{
    type Rejection = VoiceError;

    async fn from_request(request: http::Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| VoiceError::InvalidRequest(format!("expected a multipart form: {}", e.body_text())))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| VoiceError::InvalidRequest(format!("failed to read multipart form: {e}")))?
        {
            if field.name() != Some("file") {
                continue;
            }

            let filename = field.file_name().unwrap_or("recording.wav").to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();

            if !content_type.starts_with("audio/") {
                return Err(VoiceError::InvalidRequest(format!(
                    "file must be audio, got content type '{content_type}'"
                )));
            }

            let audio = field
                .bytes()
                .await
                .map_err(|e| VoiceError::InvalidRequest(format!("failed to read audio data: {e}")))?;

            if audio.is_empty() {
                return Err(VoiceError::InvalidRequest("file is empty".to_string()));
            }

            return Ok(Self(VoiceSample {
                audio,
                filename,
                content_type,
            }));
        }

        Err(VoiceError::InvalidRequest(
            "missing required 'file' field in multipart form".to_string(),
        ))
    }
}

/// Extractor for JSON request bodies
pub struct ExtractPayload<T>(pub T);

const APPLICATION_JSON: &str = "application/json";

impl<S, T: DeserializeOwned> FromRequest<S> for ExtractPayload<T>
where
    S: Send + Sync,
{
    type Rejection = VoiceError;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        let is_json = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(APPLICATION_JSON));

        if !is_json {
            return Err(VoiceError::InvalidRequest(
                "Unsupported Content-Type, expected: 'Content-Type: application/json'".to_string(),
            ));
        }

        let bytes = axum::body::to_bytes(body, JSON_LIMIT_BYTES).await.map_err(|err| {
            if std::error::Error::source(&err).is_some_and(|source| source.is::<http_body_util::LengthLimitError>()) {
                VoiceError::PayloadTooLarge(JSON_LIMIT_BYTES)
            } else {
                VoiceError::InvalidRequest(format!("Failed to read request body: {err}"))
            }
        })?;

        serde_json::from_slice::<T>(&bytes)
            .map(Self)
            .map_err(|e| VoiceError::InvalidRequest(format!("Failed to parse request body: {e}")))
    }
}
