use std::{path::PathBuf, time::Duration};

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Face-swap pipeline configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaceSwapConfig {
    /// Akool API access
    #[serde(default)]
    pub akool: AkoolConfig,
    /// Scenario table file, the built-in table is used when unset
    #[serde(default)]
    pub scenarios: Option<PathBuf>,
    /// Ask the provider for face enhancement unless the request says otherwise
    #[serde(default)]
    pub enhance: bool,
    /// Callback URL handed to the provider for push notifications
    #[serde(default, deserialize_with = "crate::blank::url")]
    pub webhook_url: Option<Url>,
    /// Per-call deadlines
    #[serde(default)]
    pub timeouts: FaceSwapTimeouts,
}

/// Akool API endpoints and credentials
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AkoolConfig {
    /// Bearer API key
    #[serde(default, deserialize_with = "crate::blank::secret")]
    pub api_key: Option<SecretString>,
    /// Base URL of the open API
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Face detection endpoint
    #[serde(default = "default_detect_url")]
    pub detect_url: Url,
}

impl Default for AkoolConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            detect_url: default_detect_url(),
        }
    }
}

/// Deadlines for each outbound face-swap call
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaceSwapTimeouts {
    #[serde(default = "default_upload", with = "crate::duration")]
    pub upload: Duration,
    #[serde(default = "default_detect", with = "crate::duration")]
    pub detect: Duration,
    #[serde(default = "default_submit_image", with = "crate::duration")]
    pub submit_image: Duration,
    #[serde(default = "default_submit_video", with = "crate::duration")]
    pub submit_video: Duration,
    #[serde(default = "default_poll", with = "crate::duration")]
    pub poll: Duration,
}

impl Default for FaceSwapTimeouts {
    fn default() -> Self {
        Self {
            upload: default_upload(),
            detect: default_detect(),
            submit_image: default_submit_image(),
            submit_video: default_submit_video(),
            poll: default_poll(),
        }
    }
}

impl FaceSwapTimeouts {
    pub(crate) fn all(&self) -> [(&'static str, Duration); 5] {
        [
            ("upload", self.upload),
            ("detect", self.detect),
            ("submit_image", self.submit_image),
            ("submit_video", self.submit_video),
            ("poll", self.poll),
        ]
    }
}

fn default_base_url() -> Url {
    Url::parse("https://openapi.akool.com/api/open/v3/").expect("valid default URL")
}

fn default_detect_url() -> Url {
    Url::parse("https://sg3.akool.com/detect").expect("valid default URL")
}

const fn default_upload() -> Duration {
    Duration::from_secs(30)
}

const fn default_detect() -> Duration {
    Duration::from_secs(30)
}

const fn default_submit_image() -> Duration {
    Duration::from_secs(30)
}

const fn default_submit_video() -> Duration {
    Duration::from_secs(60)
}

const fn default_poll() -> Duration {
    Duration::from_secs(20)
}
