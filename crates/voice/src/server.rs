use axum::{
    body::Body,
    http::{HeaderValue, header},
    response::Response,
};

use crate::{
    elevenlabs::ElevenLabsClient,
    error::{Result, VoiceError},
    types::{Speech, SpeechRequest, VoiceSample},
};

const MAX_VOICE_ID_LEN: usize = 64;

/// Voice cloning and speech server
pub struct Server {
    client: ElevenLabsClient,
    default_model: String,
    stability: f64,
    similarity_boost: f64,
}

impl Server {
    pub async fn clone_voice(&self, sample: VoiceSample) -> Result<String> {
        self.client.clone_voice(sample).await
    }

    /// Synthesize speech and stream the audio back as `audio/mpeg`
    pub async fn speak(&self, request: SpeechRequest) -> Result<Response> {
        let speech = self.resolve(request)?;
        let upstream = self.client.synthesize(&speech).await?;

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));

        Ok(response)
    }

    /// Fill in defaults and check the request
    fn resolve(&self, request: SpeechRequest) -> Result<Speech> {
        let voice_id = request.voice_id.trim().to_string();
        if voice_id.is_empty()
            || voice_id.len() > MAX_VOICE_ID_LEN
            || !voice_id.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(VoiceError::InvalidRequest(format!("malformed voice id '{voice_id}'")));
        }

        if request.text.trim().is_empty() {
            return Err(VoiceError::InvalidRequest("text must not be empty".to_string()));
        }

        let stability = request.stability.unwrap_or(self.stability);
        let similarity_boost = request.similarity_boost.unwrap_or(self.similarity_boost);

        for (name, value) in [("stability", stability), ("similarityBoost", similarity_boost)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(VoiceError::InvalidRequest(format!("{name} must be between 0.0 and 1.0")));
            }
        }

        Ok(Speech {
            voice_id,
            text: request.text,
            model_id: request
                .model_id
                .filter(|model| !model.trim().is_empty())
                .unwrap_or_else(|| self.default_model.clone()),
            stability,
            similarity_boost,
        })
    }
}

/// Builder for constructing the voice server from configuration
pub struct VoiceServerBuilder<'a> {
    config: &'a mirage_config::Config,
}

impl<'a> VoiceServerBuilder<'a> {
    pub const fn new(config: &'a mirage_config::Config) -> Self {
        Self { config }
    }

    pub fn build(self) -> Server {
        let voice = &self.config.voice;

        if voice.api_key.is_none() {
            tracing::debug!("No ElevenLabs API key configured");
        }

        Server {
            client: ElevenLabsClient::new(voice),
            default_model: voice.default_model.clone(),
            stability: voice.stability,
            similarity_boost: voice.similarity_boost,
        }
    }
}
