use serde::Deserialize;

/// Liveness endpoint for load balancers and container probes
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    /// Serve the probe at all
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Route the probe is mounted on, must start with `/`
    #[serde(default = "probe_path")]
    pub path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: probe_path(),
        }
    }
}

const fn enabled_by_default() -> bool {
    true
}

fn probe_path() -> String {
    "/health".to_string()
}
