use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// `ElevenLabs` voice cloning and speech configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceConfig {
    /// `ElevenLabs` API key
    #[serde(default, deserialize_with = "crate::blank::secret")]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Model used when a speech request does not name one
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Voice stability used when a request does not set one
    #[serde(default = "default_setting")]
    pub stability: f64,
    /// Similarity boost used when a request does not set one
    #[serde(default = "default_setting")]
    pub similarity_boost: f64,
    /// Deadline for every `ElevenLabs` call
    #[serde(default = "default_timeout", with = "crate::duration")]
    pub timeout: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            default_model: default_model(),
            stability: default_setting(),
            similarity_boost: default_setting(),
            timeout: default_timeout(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("https://api.elevenlabs.io/v1").expect("valid default URL")
}

fn default_model() -> String {
    "eleven_multilingual_v2".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_setting() -> f64 {
    0.75
}

const fn default_timeout() -> Duration {
    Duration::from_secs(60)
}
