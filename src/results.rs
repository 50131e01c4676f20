use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Direct link to an image, as found on the result page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageLink(String);

impl ImageLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of downloading one link
#[derive(Debug)]
pub enum DownloadResult {
    Saved(PathBuf),
    Failed(DownloadFailure),
}

#[derive(Debug, Error)]
pub enum DownloadFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Aggregate counts for a download batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSummary {
    /// Images written to disk
    pub saved: usize,
    /// Links attempted
    pub total: usize,
}

/// Summary of one grabbing session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionReport {
    pub query: String,

    /// Result elements present when discovery stopped
    pub elements_found: usize,

    /// Links extracted, in discovery order
    pub links: Vec<ImageLink>,

    /// Elements whose link could not be extracted
    pub links_skipped: usize,

    /// Scrolls issued during discovery
    pub scrolls: usize,

    /// Iterations in which the page did not grow
    pub stalled_iterations: usize,

    /// "Load more" clicks tried
    pub load_more_attempts: usize,

    /// Successful "load more" clicks
    pub uploads: usize,

    /// Where the links were written, if requested
    pub links_file: Option<PathBuf>,

    /// Download counts, if images were saved
    pub downloads: Option<DownloadSummary>,

    pub discovery_elapsed: Duration,
    pub extraction_elapsed: Duration,
    pub download_elapsed: Duration,
    pub total_elapsed: Duration,
}

impl SessionReport {
    /// Saved and attempted image counts (zero when nothing was downloaded)
    pub fn saved_of_total(&self) -> (usize, usize) {
        self.downloads
            .map(|summary| (summary.saved, summary.total))
            .unwrap_or((0, 0))
    }
}
