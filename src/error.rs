//! Error types for image-grab.
//!
//! Only [`SetupError`] (and a lost browser session) ever abort a session.
//! [`DriverError`], [`ExtractionError`] and [`FetchError`] are absorbed by the
//! component that raised them.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for session-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a session.
#[derive(Debug, Error)]
pub enum Error {
    /// The session could not be set up.
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// The browser session went away mid-run.
    #[error("Browser session failed: {0}")]
    Driver(#[from] DriverError),
}

/// Fatal errors raised while preparing a session or its outputs.
#[derive(Debug, Error)]
pub enum SetupError {
    /// No WebDriver server accepted a new session.
    #[error("Failed to connect to WebDriver at {url}: {reason}")]
    Connect { url: String, reason: String },

    /// The search page could not be opened.
    #[error("Failed to open search page {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: DriverError,
    },

    /// The search URL could not be built from the configured base.
    #[error("Invalid search URL: {0}")]
    SearchUrl(#[from] url::ParseError),

    /// The destination folder could not be created.
    #[error("Failed to create folder {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The link file could not be written.
    #[error("Failed to write links to {}: {source}", path.display())]
    WriteLinks {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The link file could not be read.
    #[error("Failed to read links from {}: {source}", path.display())]
    ReadLinks {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed.
    #[error("Invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The logger could not be installed.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Errors reported by the browser capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("element query failed: {0}")]
    Query(String),

    #[error("scroll failed: {0}")]
    Scroll(String),

    #[error("click failed: {0}")]
    Click(String),

    #[error("attribute read failed: {0}")]
    Attribute(String),

    #[error("failed to close browser: {0}")]
    Close(String),

    /// The WebDriver session no longer exists.
    #[error("browser session lost: {0}")]
    SessionLost(String),
}

impl DriverError {
    /// Whether the discovery loop may carry on after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DriverError::Navigation(_)
                | DriverError::Query(_)
                | DriverError::Scroll(_)
                | DriverError::Click(_)
                | DriverError::Attribute(_)
        )
    }
}

/// Why an element did not yield an image link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("element has no `{0}` attribute")]
    MissingAttribute(String),

    #[error("attribute is not valid JSON: {0}")]
    Malformed(String),

    #[error("attribute has no `{0}` value")]
    MissingKey(String),

    #[error("attribute could not be read: {0}")]
    Unreadable(#[from] DriverError),
}

/// Why an image could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("server responded with status {0}")]
    Status(u16),
}
