//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use mirage_config::{Config, CorsConfig, ServerConfig, StorageBackend, StorageConfig};
use secrecy::SecretString;

pub const AKOOL_KEY: &str = "test-akool-key";
pub const ELEVENLABS_KEY: &str = "test-xi-key";
pub const PUBLIC_BASE_URL: &str = "https://uploads.mirage.test";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal configuration: in-memory storage and no provider credentials
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                storage: StorageConfig {
                    backend: StorageBackend::Memory,
                    public_base_url: Some(PUBLIC_BASE_URL.parse().expect("valid URL")),
                    ..StorageConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Point the Akool detector and open API at a mock backend
    pub fn with_akool(mut self, mock_url: &str) -> Self {
        let akool = &mut self.config.faceswap.akool;
        akool.api_key = Some(SecretString::from(AKOOL_KEY));
        akool.base_url = format!("{mock_url}/api/open/v3/").parse().expect("valid URL");
        akool.detect_url = format!("{mock_url}/detect").parse().expect("valid URL");
        self
    }

    /// Point the voice service at a mock backend
    pub fn with_elevenlabs(mut self, mock_url: &str) -> Self {
        self.config.voice.api_key = Some(SecretString::from(ELEVENLABS_KEY));
        self.config.voice.base_url = format!("{mock_url}/v1").parse().expect("valid URL");
        self
    }

    /// Hosts that receive the relay credential
    pub fn with_trusted_hosts(mut self, hosts: &[&str]) -> Self {
        self.config.relay.trusted_hosts = hosts.iter().map(ToString::to_string).collect();
        self
    }

    /// Hosts whose 403 responses mean an expired link
    pub fn with_cdn_hosts(mut self, hosts: &[&str]) -> Self {
        self.config.relay.cdn_hosts = hosts.iter().map(ToString::to_string).collect();
        self
    }

    pub fn with_relay_key(mut self, key: &str) -> Self {
        self.config.relay.api_key = Some(SecretString::from(key));
        self
    }

    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
