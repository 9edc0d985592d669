use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Object storage for uploaded user media
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Storage backend
    #[serde(rename = "type", default)]
    pub backend: StorageBackend,
    /// Bucket name (S3)
    #[serde(default, deserialize_with = "crate::blank::string")]
    pub bucket: Option<String>,
    /// Bucket region (S3)
    #[serde(default, deserialize_with = "crate::blank::string")]
    pub region: Option<String>,
    /// Access key id, falls back to the ambient AWS environment when unset
    #[serde(default, deserialize_with = "crate::blank::secret")]
    pub access_key_id: Option<SecretString>,
    /// Secret access key
    #[serde(default, deserialize_with = "crate::blank::secret")]
    pub secret_access_key: Option<SecretString>,
    /// Custom S3-compatible endpoint (`MinIO`, localstack)
    #[serde(default)]
    pub endpoint: Option<Url>,
    /// Base URL that serves stored objects publicly
    ///
    /// Defaults to the virtual-hosted S3 URL of the bucket. Required for
    /// the in-memory backend.
    #[serde(default)]
    pub public_base_url: Option<Url>,
    /// Key prefix for uploads
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Extension used when the uploaded filename has none
    #[serde(default = "default_extension")]
    pub default_extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
            public_base_url: None,
            prefix: default_prefix(),
            default_extension: default_extension(),
        }
    }
}

/// Supported storage backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Amazon S3 or an S3-compatible service
    #[default]
    S3,
    /// Process-local memory, for tests and local development
    Memory,
}

fn default_prefix() -> String {
    "user_uploads".to_string()
}

fn default_extension() -> String {
    "png".to_string()
}
