use mirage_config::{FaceSwapConfig, FaceSwapTimeouts};
use reqwest::Client;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::{
    error::{FaceSwapError, Result},
    http_client::http_client,
};

/// Result code Akool uses for success in its open API envelope
pub(crate) const SUCCESS_CODE: i64 = 1000;

/// Open API response envelope: `{code, msg, data}`
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn message(&self) -> &str {
        self.msg.as_deref().unwrap_or("no message from provider")
    }
}

/// Connection to the Akool APIs
///
/// Holds everything the detector, submitter and poller need. The API key
/// is optional so the server can start without it; every call then fails
/// with a configuration error.
pub struct AkoolClient {
    pub(crate) client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    pub(crate) detect_url: Url,
    pub(crate) webhook_url: Option<Url>,
    pub(crate) timeouts: FaceSwapTimeouts,
}

impl AkoolClient {
    pub fn new(config: &FaceSwapConfig) -> Self {
        Self {
            client: http_client(),
            api_key: config.akool.api_key.clone(),
            base_url: config.akool.base_url.as_str().trim_end_matches('/').to_string(),
            detect_url: config.akool.detect_url.clone(),
            webhook_url: config.webhook_url.clone(),
            timeouts: config.timeouts.clone(),
        }
    }

    pub(crate) fn api_key(&self) -> Result<&SecretString> {
        self.api_key
            .as_ref()
            .ok_or_else(|| FaceSwapError::ConfigError("Akool API key is not configured".to_string()))
    }

    /// Absolute URL of an open API path
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

/// Shorten a response body for error messages
pub(crate) fn excerpt(body: &[u8]) -> String {
    mirage_core::truncate_utf8(body, 200)
}
