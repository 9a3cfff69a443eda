use std::time::Duration;

use crate::window_api::domain::DEFAULT_BROWSERS;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_AFK_THRESHOLD: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_MIN_STOP_FLUSH: Duration = Duration::from_secs(1);

/// Settings of the tracking loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Time between two samples of the focused window.
    pub sample_interval: Duration,
    /// Time between two writes of the usage file while tracking.
    pub autosave_interval: Duration,
    /// Idle time after which samples stop counting. `None` disables idle detection.
    pub afk_threshold: Option<Duration>,
    /// Time still pending when tracking stops is dropped if it is shorter than this.
    pub min_stop_flush: Duration,
    /// Process names whose address bar is read, compared without case and `.exe`.
    pub browsers: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            afk_threshold: Some(DEFAULT_AFK_THRESHOLD),
            min_stop_flush: DEFAULT_MIN_STOP_FLUSH,
            browsers: DEFAULT_BROWSERS.iter().map(|v| v.to_string()).collect(),
        }
    }
}
