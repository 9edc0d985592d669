use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// Media relay configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Credential attached to requests for trusted hosts
    ///
    /// Falls back to the Akool API key when unset.
    #[serde(default, deserialize_with = "crate::blank::secret")]
    pub api_key: Option<SecretString>,
    /// Hosts that receive the bearer credential
    ///
    /// Entries are exact host names or `*.example.com` wildcards that match
    /// subdomains on a label boundary.
    #[serde(default = "default_trusted_hosts")]
    pub trusted_hosts: Vec<String>,
    /// CDN hosts whose 403 responses mean the signed link expired
    #[serde(default = "default_cdn_hosts")]
    pub cdn_hosts: Vec<String>,
    /// `Cache-Control` sent when the upstream does not provide one
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
    /// Deadline for the upstream response headers
    #[serde(default = "default_timeout", with = "crate::duration")]
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            trusted_hosts: default_trusted_hosts(),
            cdn_hosts: default_cdn_hosts(),
            cache_control: default_cache_control(),
            timeout: default_timeout(),
        }
    }
}

fn default_trusted_hosts() -> Vec<String> {
    vec!["openapi.akool.com".to_string(), "sg3.akool.com".to_string()]
}

fn default_cdn_hosts() -> Vec<String> {
    vec!["*.cloudfront.net".to_string()]
}

fn default_cache_control() -> String {
    "public, max-age=3600".to_string()
}

const fn default_timeout() -> Duration {
    Duration::from_secs(60)
}
