use std::path::Path;

use crate::{Config, StorageBackend};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// Expands `{{ env.VAR }}` placeholders, deserializes, then validates.
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate cross-field rules
    ///
    /// Missing provider credentials are not an error here: the affected
    /// routes report a configuration error at request time instead.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistent setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_server()?;
        self.validate_storage()?;
        self.validate_faceswap()?;
        self.validate_relay()?;
        self.validate_voice()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_server(&self) -> anyhow::Result<()> {
        let health = &self.server.health;
        if health.enabled && !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/', got '{}'", health.path);
        }
        Ok(())
    }

    fn validate_storage(&self) -> anyhow::Result<()> {
        let storage = &self.storage;

        match storage.backend {
            StorageBackend::S3 => {
                if storage.bucket.is_some() && storage.region.is_none() && storage.public_base_url.is_none() {
                    anyhow::bail!("storage.region is required to build public S3 URLs");
                }
                if storage.bucket.is_none() {
                    tracing::warn!("storage.bucket is not set, uploads will be rejected");
                }
            }
            StorageBackend::Memory => {
                if storage.public_base_url.is_none() {
                    anyhow::bail!("storage.public_base_url is required for the memory backend");
                }
            }
        }

        if storage.default_extension.is_empty() || storage.default_extension.contains(['.', '/']) {
            anyhow::bail!(
                "storage.default_extension must be a bare extension, got '{}'",
                storage.default_extension
            );
        }

        Ok(())
    }

    fn validate_faceswap(&self) -> anyhow::Result<()> {
        for (name, timeout) in self.faceswap.timeouts.all() {
            if timeout.is_zero() {
                anyhow::bail!("faceswap.timeouts.{name} must be greater than zero");
            }
        }

        if self.faceswap.akool.api_key.is_none() {
            tracing::warn!("faceswap.akool.api_key is not set, face-swap routes will be unavailable");
        }

        Ok(())
    }

    fn validate_relay(&self) -> anyhow::Result<()> {
        let relay = &self.relay;

        for (list, hosts) in [("trusted_hosts", &relay.trusted_hosts), ("cdn_hosts", &relay.cdn_hosts)] {
            for host in hosts {
                validate_host_pattern(host).map_err(|reason| anyhow::anyhow!("relay.{list}: '{host}' {reason}"))?;
            }
        }

        if relay.timeout.is_zero() {
            anyhow::bail!("relay.timeout must be greater than zero");
        }

        Ok(())
    }

    fn validate_voice(&self) -> anyhow::Result<()> {
        let voice = &self.voice;

        for (name, value) in [("stability", voice.stability), ("similarity_boost", voice.similarity_boost)] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("voice.{name} must be between 0.0 and 1.0");
            }
        }

        if voice.timeout.is_zero() {
            anyhow::bail!("voice.timeout must be greater than zero");
        }

        Ok(())
    }

    fn validate_telemetry(&self) -> anyhow::Result<()> {
        if let Some(ref telemetry) = self.telemetry
            && !(0.0..=1.0).contains(&telemetry.sampling_rate)
        {
            anyhow::bail!("telemetry.sampling_rate must be between 0.0 and 1.0");
        }

        Ok(())
    }
}

/// Check that a relay host entry is a bare host or a `*.` wildcard
fn validate_host_pattern(pattern: &str) -> Result<(), &'static str> {
    let host = pattern.strip_prefix("*.").unwrap_or(pattern);

    if host.is_empty() {
        return Err("is empty");
    }

    if host.contains('*') {
        return Err("may only use a leading '*.' wildcard");
    }

    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err("must be a host name without scheme, port, or path");
    }

    if host.starts_with('.') || host.ends_with('.') || host.contains("..") {
        return Err("has an empty label");
    }

    Ok(())
}
