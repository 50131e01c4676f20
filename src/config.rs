use crate::error::SetupError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Size filter passed to the image search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ImageSize {
    /// Value of the `isize` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Small => "small",
            ImageSize::Medium => "medium",
            ImageSize::Large => "large",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a grabbing session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrabberConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Log filter, in `env_logger` syntax
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Also append log records to this file (stderr keeps receiving them)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Number of images to look for
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Size filter for the search
    #[serde(default)]
    pub size: ImageSize,

    /// Consecutive scrolls without new images before giving up
    #[serde(default = "default_stall_limit")]
    pub stall_limit: usize,

    /// Pause after each scroll, in milliseconds
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,

    /// Number of concurrent downloads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-request timeout for downloads, in seconds (transport default if unset)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Folder holding per-query image folders and link files
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Search page the query is appended to
    #[serde(default = "default_search_url")]
    pub search_url: String,
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_limit() -> usize {
    100
}

/// Default number of scrolls without new images
fn default_stall_limit() -> usize {
    10
}

fn default_scroll_delay_ms() -> u64 {
    1000
}

/// Default number of download workers
fn default_workers() -> usize {
    crate::download::DEFAULT_WORKERS
}

fn default_output_root() -> PathBuf {
    PathBuf::from("saved_images")
}

fn default_search_url() -> String {
    "https://yandex.ru/images/search".to_string()
}

impl Default for GrabberConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            log_level: default_log_level(),
            log_file: None,
            limit: default_limit(),
            size: ImageSize::default(),
            stall_limit: default_stall_limit(),
            scroll_delay_ms: default_scroll_delay_ms(),
            workers: default_workers(),
            request_timeout_secs: None,
            output_root: default_output_root(),
            search_url: default_search_url(),
        }
    }
}

impl GrabberConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let read_error = |source| SetupError::ConfigRead {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(read_error)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(read_error)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SetupError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Override the WebDriver URL with the `WEBDRIVER_URL` environment variable if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
