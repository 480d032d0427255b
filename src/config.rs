use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use crate::capture::CaptureOptions;
use crate::settings::ExportMode;

/// Configuration for one document export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// URL of the document to export
    #[serde(default)]
    pub url: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// CSS selector for addressable blocks
    #[serde(default = "default_block_selector")]
    pub block_selector: String,

    /// Pixels scrolled per capture iteration
    #[serde(default = "default_scroll_step")]
    pub scroll_step: f64,

    /// Pause between capture iterations, in milliseconds
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,

    /// Distance from the bottom treated as the end of the document
    #[serde(default = "default_bottom_tolerance")]
    pub bottom_tolerance: f64,

    /// Iterations without new blocks before the capture ends
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold: u32,

    /// How long to wait for the document to render, in seconds
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,

    /// Interval between readiness checks, in milliseconds
    #[serde(default = "default_ready_poll_ms")]
    pub ready_poll_ms: u64,

    /// Images downloaded at once
    #[serde(default = "default_image_concurrency")]
    pub image_concurrency: usize,

    /// Prefix of generated titles
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,

    /// Target of the folder export mode
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Target of the download export mode, and of the single-file fallback
    #[serde(default = "default_download_dir")]
    pub download_dir: String,

    /// Export mode; when unset the saved setting is used
    #[serde(default)]
    pub export_mode: Option<ExportMode>,
}

impl ExportConfig {
    /// Create a new configuration with default values
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            webdriver_url: default_webdriver_url(),
            block_selector: default_block_selector(),
            scroll_step: default_scroll_step(),
            scroll_delay_ms: default_scroll_delay_ms(),
            bottom_tolerance: default_bottom_tolerance(),
            idle_threshold: default_idle_threshold(),
            ready_timeout_secs: default_ready_timeout_secs(),
            ready_poll_ms: default_ready_poll_ms(),
            image_concurrency: default_image_concurrency(),
            title_prefix: default_title_prefix(),
            output_dir: default_output_dir(),
            download_dir: default_download_dir(),
            export_mode: None,
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Override the WebDriver URL with the `WEBDRIVER_URL` environment variable
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }

    /// Pacing of the scroll loop
    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            scroll_step: self.scroll_step,
            delay: Duration::from_millis(self.scroll_delay_ms),
            bottom_tolerance: self.bottom_tolerance,
            idle_threshold: self.idle_threshold,
        }
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms)
    }
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_block_selector() -> String {
    crate::harvest::DEFAULT_BLOCK_SELECTOR.to_string()
}

fn default_scroll_step() -> f64 {
    300.0
}

fn default_scroll_delay_ms() -> u64 {
    600
}

fn default_bottom_tolerance() -> f64 {
    50.0
}

fn default_idle_threshold() -> u32 {
    5
}

/// 30 checks at the default interval
fn default_ready_timeout_secs() -> u64 {
    15
}

fn default_ready_poll_ms() -> u64 {
    500
}

fn default_image_concurrency() -> usize {
    crate::assets::DEFAULT_FETCH_CONCURRENCY
}

fn default_title_prefix() -> String {
    crate::export::DEFAULT_TITLE_PREFIX.to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

/// `$HOME/Downloads`, or the working directory without a home
fn default_download_dir() -> String {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => Path::new(&home)
            .join("Downloads")
            .to_string_lossy()
            .into_owned(),
        _ => ".".to_string(),
    }
}
