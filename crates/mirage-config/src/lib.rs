#![allow(clippy::must_use_candidate)]

mod blank;
pub mod cors;
mod duration;
mod env;
pub mod faceswap;
pub mod health;
mod loader;
pub mod relay;
pub mod server;
pub mod storage;
pub mod telemetry;
pub mod voice;

use serde::Deserialize;

pub use cors::*;
pub use faceswap::*;
pub use health::*;
pub use relay::*;
pub use server::*;
pub use storage::*;
pub use telemetry::{ExportProtocol, ExporterConfig, TelemetryConfig};
pub use voice::*;

/// Top-level Mirage configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage for user uploads
    #[serde(default)]
    pub storage: StorageConfig,
    /// Face-swap provider and scenario configuration
    #[serde(default)]
    pub faceswap: FaceSwapConfig,
    /// Media relay configuration
    #[serde(default)]
    pub relay: RelayConfig,
    /// Voice cloning and speech configuration
    #[serde(default)]
    pub voice: VoiceConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
