use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A recording to clone a voice from
#[derive(Debug)]
pub struct VoiceSample {
    pub audio: Bytes,
    pub filename: String,
    pub content_type: String,
}

/// Response for a cloned voice
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneResponse {
    pub voice_id: String,
}

/// Speech synthesis request
///
/// Unset model and voice settings fall back to the configured defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SpeechRequest {
    pub voice_id: String,
    pub text: String,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub stability: Option<f64>,
    #[serde(default)]
    pub similarity_boost: Option<f64>,
}

/// Fully resolved synthesis parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Speech {
    pub voice_id: String,
    pub text: String,
    pub model_id: String,
    pub stability: f64,
    pub similarity_boost: f64,
}
