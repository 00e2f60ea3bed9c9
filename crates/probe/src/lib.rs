pub mod ffprobe;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub use ffprobe::FfprobeDuration;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("ffprobe failed: {0}")]
    Failed(String),
    #[error("probe timed out after {0:?}")]
    TimedOut(Duration),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Probe configuration.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub ffprobe_path: PathBuf,
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: PathBuf::from("ffprobe"),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Reads the playback duration of a media file.
///
/// Failures are expected (missing binary, corrupt file, slow disk) and callers
/// treat them as "duration unknown".
#[async_trait::async_trait]
pub trait DurationProbe: Send + Sync {
    async fn probe(&self, file: &Path, timeout: Duration) -> Result<Duration, ProbeError>;
}
