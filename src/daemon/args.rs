use std::{path::PathBuf, time::Duration};

use clap::Parser;
use tracing::level_filters::LevelFilter;

use super::config::{
    TrackerConfig, DEFAULT_AFK_THRESHOLD, DEFAULT_AUTOSAVE_INTERVAL, DEFAULT_SAMPLE_INTERVAL,
};

/// Settings of the tracker shared between `screentime-daemon` and `screentime serve`.
#[derive(clap::Args, Debug, Clone)]
pub struct TrackerArgs {
    #[arg(long = "sample-interval", default_value_t = 1, help = "Seconds between two samples")]
    pub sample_interval_s: u64,
    #[arg(long = "autosave-interval", default_value_t = 300, help = "Seconds between two saves")]
    pub autosave_interval_s: u64,
    #[arg(
        long = "afk-threshold",
        default_value_t = 300,
        help = "Seconds of inactivity after which time stops counting. 0 disables idle detection"
    )]
    pub afk_threshold_s: u64,
    #[arg(
        long = "browser",
        help = "Process name of a browser whose address bar is read. Can be repeated, replaces the default list"
    )]
    pub browsers: Vec<String>,
}

impl Default for TrackerArgs {
    fn default() -> Self {
        Self {
            sample_interval_s: DEFAULT_SAMPLE_INTERVAL.as_secs(),
            autosave_interval_s: DEFAULT_AUTOSAVE_INTERVAL.as_secs(),
            afk_threshold_s: DEFAULT_AFK_THRESHOLD.as_secs(),
            browsers: Vec::new(),
        }
    }
}

impl TrackerArgs {
    /// Flags reproducing these settings on another command line.
    pub fn to_command_args(&self) -> Vec<String> {
        let mut args = vec![
            "--sample-interval".to_string(),
            self.sample_interval_s.to_string(),
            "--autosave-interval".to_string(),
            self.autosave_interval_s.to_string(),
            "--afk-threshold".to_string(),
            self.afk_threshold_s.to_string(),
        ];
        for browser in &self.browsers {
            args.push("--browser".to_string());
            args.push(browser.clone());
        }
        args
    }
}

impl From<TrackerArgs> for TrackerConfig {
    fn from(args: TrackerArgs) -> Self {
        let defaults = TrackerConfig::default();
        Self {
            sample_interval: Duration::from_secs(args.sample_interval_s.max(1)),
            autosave_interval: Duration::from_secs(args.autosave_interval_s.max(1)),
            afk_threshold: (args.afk_threshold_s > 0)
                .then(|| Duration::from_secs(args.afk_threshold_s)),
            min_stop_flush: defaults.min_stop_flush,
            browsers: if args.browsers.is_empty() {
                defaults.browsers
            } else {
                args.browsers
            },
        }
    }
}

#[derive(Parser)]
pub struct DaemonArgs {
    #[arg(long)]
    pub force: bool,
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
    #[command(flatten)]
    pub tracker: TrackerArgs,
}
