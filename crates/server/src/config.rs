use std::path::PathBuf;
use std::time::Duration;

use mediacat_catalog::MaintenanceConfig;
use mediacat_probe::ProbeConfig;
use tracing::warn;

/// Process configuration, read from `MEDIACAT_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: String,
    pub bind_addr: String,
    pub probe: ProbeConfig,
    pub probe_enabled: bool,
    pub maintenance: MaintenanceConfig,
    pub session_lifespan: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: "mediacat.db".to_string(),
            bind_addr: "0.0.0.0:6004".to_string(),
            probe: ProbeConfig::default(),
            probe_enabled: true,
            maintenance: MaintenanceConfig::default(),
            session_lifespan: Duration::from_secs(3600),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or unparsable values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| match lookup(key) {
            None => default,
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n > 0 => Duration::from_secs(n),
                _ => {
                    warn!(key, value = %raw, "ignoring invalid duration");
                    default
                }
            },
        };

        Self {
            db_path: lookup("MEDIACAT_DB").unwrap_or(defaults.db_path),
            bind_addr: lookup("MEDIACAT_BIND").unwrap_or(defaults.bind_addr),
            probe: ProbeConfig {
                ffprobe_path: lookup("MEDIACAT_FFPROBE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.probe.ffprobe_path),
                timeout: secs("MEDIACAT_PROBE_TIMEOUT_SECS", defaults.probe.timeout),
            },
            probe_enabled: lookup("MEDIACAT_DISABLE_PROBE").is_none(),
            maintenance: MaintenanceConfig {
                reconcile_interval: secs(
                    "MEDIACAT_RECONCILE_INTERVAL_SECS",
                    defaults.maintenance.reconcile_interval,
                ),
                session_sweep_interval: secs(
                    "MEDIACAT_SESSION_SWEEP_SECS",
                    defaults.maintenance.session_sweep_interval,
                ),
                metrics_interval: secs(
                    "MEDIACAT_METRICS_INTERVAL_SECS",
                    defaults.maintenance.metrics_interval,
                ),
            },
            session_lifespan: secs("MEDIACAT_SESSION_LIFESPAN_SECS", defaults.session_lifespan),
        }
    }
}
