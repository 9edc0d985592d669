#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod elevenlabs;
mod error;
mod http_client;
mod request;
mod server;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    response::Response,
    routing::post,
};

pub use elevenlabs::ElevenLabsClient;
pub use error::{Result, VoiceError};
pub use request::{ExtractPayload, ExtractSample};
pub use server::{Server, VoiceServerBuilder};
pub use types::{CloneResponse, Speech, SpeechRequest, VoiceSample};

/// Build the voice server from configuration
pub fn build_server(config: &mirage_config::Config) -> anyhow::Result<Arc<Server>> {
    Ok(Arc::new(VoiceServerBuilder::new(config).build()))
}

/// Create the endpoint router for voice cloning and speech
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route(
            "/api/voice/clone",
            post(clone_voice).layer(DefaultBodyLimit::max(request::AUDIO_LIMIT_BYTES)),
        )
        .route("/api/voice/speech", post(speak))
}

async fn clone_voice(
    State(server): State<Arc<Server>>,
    ExtractSample(sample): ExtractSample,
) -> Result<Json<CloneResponse>> {
    tracing::debug!(size = sample.audio.len(), content_type = %sample.content_type, "voice clone handler called");

    let voice_id = server.clone_voice(sample).await?;

    Ok(Json(CloneResponse { voice_id }))
}

async fn speak(
    State(server): State<Arc<Server>>,
    ExtractPayload(request): ExtractPayload<SpeechRequest>,
) -> Result<Response> {
    server.speak(request).await
}
