use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use http::{HeaderMap, HeaderValue};
use mirage_config::{StorageBackend, StorageConfig};
use object_store::{
    Attribute, Attributes, ClientOptions, ObjectStore, PutOptions, PutPayload, aws::AmazonS3Builder, memory::InMemory,
    path::Path as ObjectPath,
};
use secrecy::ExposeSecret;

use crate::error::{FaceSwapError, Result};

const MAX_EXTENSION_LEN: usize = 10;

/// An uploaded object and the public URL it is served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

/// A configured bucket: where bytes go and where they are read back from
struct Bucket {
    store: Arc<dyn ObjectStore>,
    public_base: String,
}

/// Stores user uploads and hands back durable public URLs
///
/// Objects are written world-readable so the face-swap provider can fetch
/// them without credentials.
pub struct ObjectStoreGateway {
    bucket: Option<Bucket>,
    prefix: String,
    default_extension: String,
    timeout: Duration,
}

impl ObjectStoreGateway {
    /// Build the gateway described by `[storage]`
    ///
    /// An S3 backend without a bucket still builds, and every upload then
    /// fails with `StorageUnavailable`.
    pub fn from_config(config: &StorageConfig, timeout: Duration) -> Result<Self> {
        let bucket = match config.backend {
            StorageBackend::S3 => config.bucket.as_deref().map(|name| s3_bucket(name, config)).transpose()?,
            StorageBackend::Memory => {
                let public_base = config.public_base_url.as_ref().ok_or_else(|| {
                    FaceSwapError::ConfigError("storage.public_base_url is required for the memory backend".to_string())
                })?;

                Some(Bucket {
                    store: Arc::new(InMemory::new()),
                    public_base: public_base.as_str().trim_end_matches('/').to_string(),
                })
            }
        };

        Ok(Self {
            bucket,
            prefix: config.prefix.trim_matches('/').to_string(),
            default_extension: config.default_extension.clone(),
            timeout,
        })
    }

    /// Wrap an existing store
    pub fn new(store: Arc<dyn ObjectStore>, public_base: &str, prefix: &str, timeout: Duration) -> Self {
        Self {
            bucket: Some(Bucket {
                store,
                public_base: public_base.trim_end_matches('/').to_string(),
            }),
            prefix: prefix.trim_matches('/').to_string(),
            default_extension: "png".to_string(),
            timeout,
        }
    }

    /// Key for a new upload: `<prefix>/<uuid>.<ext>`
    pub fn object_key(&self, suggested_filename: Option<&str>) -> String {
        let extension = suggested_filename
            .and_then(extension_of)
            .unwrap_or_else(|| self.default_extension.clone());

        let name = format!("{}.{extension}", uuid::Uuid::new_v4());

        if self.prefix.is_empty() {
            name
        } else {
            format!("{}/{name}", self.prefix)
        }
    }

    /// Upload bytes under a fresh key and return where they can be read
    pub async fn store(&self, bytes: Bytes, content_type: &str, suggested_filename: Option<&str>) -> Result<StoredObject> {
        let bucket = self
            .bucket
            .as_ref()
            .ok_or_else(|| FaceSwapError::StorageUnavailable("storage bucket is not configured".to_string()))?;

        let key = self.object_key(suggested_filename);
        let size = bytes.len();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let path = ObjectPath::from(key.as_str());
        let put = bucket.store.put_opts(&path, PutPayload::from(bytes), options);

        match tokio::time::timeout(self.timeout, put).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(classify(e)),
            Err(_) => {
                return Err(FaceSwapError::StorageUnavailable(format!(
                    "upload did not finish within {}s",
                    self.timeout.as_secs()
                )));
            }
        }

        tracing::info!(key = %key, size, content_type, "stored upload");

        Ok(StoredObject {
            url: format!("{}/{key}", bucket.public_base),
            key,
            content_type: content_type.to_string(),
            size,
        })
    }

    #[cfg(test)]
    fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.bucket.as_ref().expect("configured bucket").store
    }
}

fn s3_bucket(name: &str, config: &StorageConfig) -> Result<Bucket> {
    let mut headers = HeaderMap::new();
    headers.insert("x-amz-acl", HeaderValue::from_static("public-read"));

    let mut builder = AmazonS3Builder::from_env()
        .with_bucket_name(name)
        .with_client_options(ClientOptions::new().with_default_headers(headers));

    if let Some(ref region) = config.region {
        builder = builder.with_region(region);
    }

    if let Some(ref key_id) = config.access_key_id {
        builder = builder.with_access_key_id(key_id.expose_secret());
    }

    if let Some(ref secret) = config.secret_access_key {
        builder = builder.with_secret_access_key(secret.expose_secret());
    }

    if let Some(ref endpoint) = config.endpoint {
        builder = builder
            .with_endpoint(endpoint.as_str().trim_end_matches('/'))
            .with_allow_http(endpoint.scheme() == "http");
    }

    let store = builder
        .build()
        .map_err(|e| FaceSwapError::ConfigError(format!("failed to build S3 store: {e}")))?;

    let public_base = match (&config.public_base_url, &config.region) {
        (Some(base), _) => base.as_str().trim_end_matches('/').to_string(),
        (None, Some(region)) => format!("https://{name}.s3.{region}.amazonaws.com"),
        (None, None) => {
            return Err(FaceSwapError::ConfigError(
                "storage.region is required to build public S3 URLs".to_string(),
            ));
        }
    };

    Ok(Bucket {
        store: Arc::new(store),
        public_base,
    })
}

/// Extension after the last `.`, if it is short and alphanumeric
fn extension_of(filename: &str) -> Option<String> {
    let (stem, extension) = filename.rsplit_once('.')?;

    if stem.is_empty()
        || extension.is_empty()
        || extension.len() > MAX_EXTENSION_LEN
        || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }

    Some(extension.to_ascii_lowercase())
}

fn classify(error: object_store::Error) -> FaceSwapError {
    match error {
        object_store::Error::PermissionDenied { .. } | object_store::Error::Unauthenticated { .. } => {
            FaceSwapError::StoragePermissionDenied(error.to_string())
        }
        other => FaceSwapError::StorageUnavailable(other.to_string()),
    }
}
