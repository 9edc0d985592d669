use std::time::Duration;

use serde::Deserialize;

/// CORS configuration for browser clients
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins, `"*"` or an explicit list
    #[serde(default)]
    pub origins: Origins,
    /// Allow credentials
    #[serde(default)]
    pub credentials: bool,
    /// Extra response headers the browser may read
    #[serde(default = "default_expose_headers")]
    pub expose_headers: Vec<String>,
    /// Preflight cache lifetime in seconds
    #[serde(default)]
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: Origins::Any,
            credentials: false,
            expose_headers: default_expose_headers(),
            max_age: None,
        }
    }
}

impl CorsConfig {
    /// Preflight cache lifetime as a `Duration`
    pub fn max_age_duration(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }
}

/// Allowed origins
#[derive(Debug, Clone, Default)]
pub enum Origins {
    /// Any origin
    #[default]
    Any,
    /// Explicit origin list
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for Origins {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        let origins = match Raw::deserialize(deserializer)? {
            Raw::One(origin) => vec![origin],
            Raw::Many(origins) => origins,
        };

        if origins.iter().any(|origin| origin == "*") {
            Ok(Self::Any)
        } else {
            Ok(Self::List(origins))
        }
    }
}

fn default_expose_headers() -> Vec<String> {
    ["content-length", "content-range", "accept-ranges"]
        .into_iter()
        .map(String::from)
        .collect()
}
