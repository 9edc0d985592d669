use std::time::Duration;

use axum::http::StatusCode;
use reqwest::{Client, multipart};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, VoiceError},
    http_client::http_client,
    types::{Speech, VoiceSample},
};

const API_KEY_HEADER: &str = "xi-api-key";
const CLONE_DESCRIPTION: &str = "Voice cloned from user recording for deepfake awareness.";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Most of an error body read back for its detail message
const ERROR_BODY_LIMIT: usize = 8 << 10;

/// `ElevenLabs` voice API client
pub struct ElevenLabsClient {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f64,
    similarity_boost: f64,
}

#[derive(Deserialize)]
struct AddVoiceResponse {
    #[serde(default)]
    voice_id: Option<String>,
}

/// Error bodies come as `{"detail": "..."}`, `{"detail": {"message": "..."}}`
/// or `{"detail": [{"msg": "..."}]}` depending on the endpoint
#[derive(Deserialize)]
struct ErrorEnvelope {
    detail: Detail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Detail {
    Text(String),
    Object { message: String },
    List(Vec<ListItem>),
}

#[derive(Deserialize)]
struct ListItem {
    msg: String,
}

/// Best human-readable message in an error body
pub(crate) fn error_detail(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorEnvelope>(body).map(|envelope| envelope.detail) {
        Ok(Detail::Text(text) | Detail::Object { message: text }) => text,
        Ok(Detail::List(items)) if !items.is_empty() => items.into_iter().map(|item| item.msg).collect::<Vec<_>>().join("; "),
        _ => mirage_core::truncate_utf8(body, 200),
    }
}

impl ElevenLabsClient {
    pub fn new(config: &mirage_config::VoiceConfig) -> Self {
        Self {
            client: http_client(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            timeout: config.timeout,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .ok_or_else(|| VoiceError::ConfigError("ElevenLabs API key is not configured".to_string()))
    }

    /// Create an instant voice clone from one recording
    pub async fn clone_voice(&self, sample: VoiceSample) -> Result<String> {
        let api_key = self.api_key()?;

        let name = format!("UserClonedVoice_{}", &uuid::Uuid::new_v4().simple().to_string()[..6]);

        let file = multipart::Part::bytes(sample.audio.to_vec())
            .file_name(sample.filename)
            .mime_str(&sample.content_type)
            .map_err(|e| VoiceError::InvalidRequest(format!("invalid audio content type: {e}")))?;

        let form = multipart::Form::new()
            .text("name", name.clone())
            .text("description", CLONE_DESCRIPTION)
            .part("files", file);

        tracing::debug!(%name, "cloning voice");

        let deadline = tokio::time::Instant::now() + self.timeout;

        let response = self
            .client
            .post(format!("{}/voices/add", self.base_url))
            .header(API_KEY_HEADER, api_key)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.unreachable(&e))?;

        let response = check(response, deadline).await?;

        let body: AddVoiceResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::Unreachable(format!("malformed clone response: {e}")))?;

        let voice_id = body.voice_id.filter(|id| !id.is_empty()).ok_or_else(|| VoiceError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            message: "clone response has no voice id".to_string(),
        })?;

        tracing::info!(%voice_id, %name, "voice cloned");

        Ok(voice_id)
    }

    /// Start synthesizing speech; the audio arrives as a stream
    pub async fn synthesize(&self, speech: &Speech) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;

        let body = SpeechBody {
            text: &speech.text,
            model_id: &speech.model_id,
            voice_settings: VoiceSettings {
                stability: speech.stability,
                similarity_boost: speech.similarity_boost,
            },
        };

        tracing::debug!(
            voice_id = %speech.voice_id,
            model = %speech.model_id,
            text_len = speech.text.len(),
            "synthesizing speech"
        );

        let request = self
            .client
            .post(format!("{}/text-to-speech/{}/stream", self.base_url, speech.voice_id))
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header(API_KEY_HEADER, api_key)
            .header(http::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send();

        // Only the response head is bounded; long audio keeps streaming
        let deadline = tokio::time::Instant::now() + self.timeout;
        let response = match tokio::time::timeout_at(deadline, request).await {
            Ok(result) => result.map_err(|e| self.unreachable(&e))?,
            Err(_) => {
                return Err(VoiceError::Unreachable(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        check(response, deadline).await
    }

    fn unreachable(&self, error: &reqwest::Error) -> VoiceError {
        if error.is_timeout() {
            VoiceError::Unreachable(format!("no response within {}s", self.timeout.as_secs()))
        } else {
            VoiceError::Unreachable(error.to_string())
        }
    }
}

async fn check(mut response: reqwest::Response, deadline: tokio::time::Instant) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = Vec::new();
    let read = async {
        while body.len() < ERROR_BODY_LIMIT {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) | Err(_) => break,
            }
        }
    };

    if tokio::time::timeout_at(deadline, read).await.is_err() {
        tracing::debug!("ElevenLabs error body did not arrive before the deadline");
    }

    let message = error_detail(&body);

    tracing::warn!(%status, %message, "ElevenLabs returned an error");

    Err(VoiceError::Upstream { status, message })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use mirage_config::VoiceConfig;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    use super::*;

    fn client(server: &MockServer) -> ElevenLabsClient {
        let config = VoiceConfig {
            api_key: Some("xi-test".into()),
            base_url: server.uri().parse().unwrap(),
            ..VoiceConfig::default()
        };
        ElevenLabsClient::new(&config)
    }

    fn sample() -> VoiceSample {
        VoiceSample {
            audio: Bytes::from_static(b"RIFF....WAVE"),
            filename: "recording.wav".to_string(),
            content_type: "audio/wav".to_string(),
        }
    }

    fn speech() -> Speech {
        Speech {
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            text: "Deepfakes are easy to make.".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            stability: 0.75,
            similarity_boost: 0.75,
        }
    }

    #[test]
    fn error_detail_shapes() {
        assert_eq!(error_detail(br#"{"detail":"voice not found"}"#), "voice not found");
        assert_eq!(
            error_detail(br#"{"detail":{"status":"quota_exceeded","message":"Quota exceeded"}}"#),
            "Quota exceeded"
        );
        assert_eq!(
            error_detail(br#"{"detail":[{"loc":["body","text"],"msg":"field required","type":"missing"}]}"#),
            "field required"
        );
        assert_eq!(error_detail(b"Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn clone_returns_voice_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/voices/add"))
            .and(header("xi-api-key", "xi-test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "voice_id": "c38kUX8pkfYO2kHyqfFy", "requires_verification": false })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let voice_id = client(&server).clone_voice(sample()).await.unwrap();
        assert_eq!(voice_id, "c38kUX8pkfYO2kHyqfFy");

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"name\""));
        assert!(body.contains("UserClonedVoice_"));
        assert!(body.contains("filename=\"recording.wav\""));
    }

    #[tokio::test]
    async fn clone_error_keeps_provider_status_and_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/voices/add"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "detail": { "status": "voice_limit_reached", "message": "You have reached your voice limit." }
            })))
            .mount(&server)
            .await;

        let err = client(&server).clone_voice(sample()).await.unwrap_err();
        match err {
            VoiceError::Upstream { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "You have reached your voice limit.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn synthesize_sends_voice_settings() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/text-to-speech/21m00Tcm4TlvDq8ikWAM/stream"))
            .and(query_param("output_format", "mp3_44100_128"))
            .and(header("accept", "audio/mpeg"))
            .and(body_json(json!({
                "text": "Deepfakes are easy to make.",
                "model_id": "eleven_multilingual_v2",
                "voice_settings": { "stability": 0.75, "similarity_boost": 0.75 }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .set_body_bytes(b"ID3audio".to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server).synthesize(&speech()).await.unwrap();
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"ID3audio");
    }

    #[tokio::test]
    async fn synthesize_validation_error_uses_first_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "detail": [{ "loc": ["body", "text"], "msg": "text must not be empty", "type": "value_error" }]
            })))
            .mount(&server)
            .await;

        let err = client(&server).synthesize(&speech()).await.unwrap_err();
        assert_eq!(err.to_string(), "Voice service error: text must not be empty");
    }

    #[tokio::test]
    async fn endless_error_body_is_cut_short() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0_u8; 8192];
            let _ = socket.read(&mut request).await;

            let head = "HTTP/1.1 500 Internal Server Error\r\ntransfer-encoding: chunked\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }

            let chunk = format!("400\r\n{}\r\n", "x".repeat(0x400));
            while socket.write_all(chunk.as_bytes()).await.is_ok() {}
        });

        let config = VoiceConfig {
            api_key: Some("xi-test".into()),
            base_url: format!("http://{addr}").parse().unwrap(),
            timeout: std::time::Duration::from_secs(1),
            ..VoiceConfig::default()
        };

        let err = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            ElevenLabsClient::new(&config).synthesize(&speech()),
        )
        .await
        .expect("error body must not be read to the end")
        .unwrap_err();

        match err {
            VoiceError::Upstream { status, message } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert!(message.len() <= 200);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_api_key_is_a_config_error() {
        let client = ElevenLabsClient::new(&VoiceConfig::default());

        let err = client.synthesize(&speech()).await.unwrap_err();
        assert!(matches!(err, VoiceError::ConfigError(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_reported() {
        let config = VoiceConfig {
            api_key: Some("xi-test".into()),
            base_url: "http://127.0.0.1:9".parse().unwrap(),
            ..VoiceConfig::default()
        };

        let err = ElevenLabsClient::new(&config).clone_voice(sample()).await.unwrap_err();
        assert!(matches!(err, VoiceError::Unreachable(_)));
    }
}
