use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::{DurationProbe, ProbeConfig, ProbeError};

/// `DurationProbe` that shells out to ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeDuration {
    ffprobe_path: PathBuf,
}

impl FfprobeDuration {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            ffprobe_path: config.ffprobe_path.clone(),
        }
    }
}

#[async_trait::async_trait]
impl DurationProbe for FfprobeDuration {
    async fn probe(&self, file: &Path, timeout: Duration) -> Result<Duration, ProbeError> {
        let mut cmd = tokio::process::Command::new(&self.ffprobe_path);
        cmd.args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(file)
            .kill_on_drop(true);

        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| ProbeError::TimedOut(timeout))?
            .map_err(|e| ProbeError::Failed(format!("spawn failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Failed(stderr.into_owned()));
        }

        let raw: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProbeError::Failed(format!("parse JSON: {e}")))?;

        let duration = parse_format_duration(&raw)?;
        debug!(file = %file.display(), ?duration, "probed duration");
        Ok(duration)
    }
}

fn parse_format_duration(raw: &serde_json::Value) -> Result<Duration, ProbeError> {
    let format = raw
        .get("format")
        .ok_or_else(|| ProbeError::Failed("missing 'format'".into()))?;

    let secs: f64 = format
        .get("duration")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ProbeError::Failed("missing or invalid 'format.duration'".into()))?;

    Duration::try_from_secs_f64(secs)
        .map_err(|e| ProbeError::Failed(format!("invalid duration {secs}: {e}")))
}
