//! Concurrent image downloads.
//!
//! Every link gets its own task; a semaphore keeps at most `workers` of them
//! fetching at once. Successful fetches are written to
//! `<destination>/<index>.jpg`, with indices handed out from an atomic
//! counter as fetches complete. Failed links are counted and logged at debug
//! level, never retried.

use crate::error::{FetchError, SetupError};
use crate::results::{DownloadFailure, DownloadResult, DownloadSummary, ImageLink};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Default number of concurrent downloads
pub const DEFAULT_WORKERS: usize = 24;

/// Fetches the body behind a URL
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// [`Fetcher`] over a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, SetupError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Creates `destination` if it does not exist yet
pub async fn ensure_destination(destination: &Path) -> Result<(), SetupError> {
    tokio::fs::create_dir_all(destination)
        .await
        .map_err(|source| SetupError::CreateDir {
            path: destination.to_path_buf(),
            source,
        })
}

/// Downloads every link into `destination`.
///
/// Only a destination that cannot be created is an error; individual
/// failures show up as `saved < total`.
pub async fn download_all<F: Fetcher>(
    fetcher: Arc<F>,
    links: &[ImageLink],
    destination: &Path,
    workers: usize,
) -> Result<DownloadSummary, SetupError> {
    ensure_destination(destination).await?;
    ::log::info!(
        "Saving {} images to {} with {} workers",
        links.len(),
        destination.display(),
        workers.max(1)
    );

    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let next_index = Arc::new(AtomicUsize::new(0));
    let destination = Arc::new(destination.to_path_buf());
    let mut tasks = JoinSet::new();

    for link in links.iter().cloned() {
        let fetcher = Arc::clone(&fetcher);
        let permits = Arc::clone(&permits);
        let next_index = Arc::clone(&next_index);
        let destination = Arc::clone(&destination);

        tasks.spawn(async move {
            // The semaphore is never closed, so acquiring cannot fail.
            let _permit = permits.acquire_owned().await.ok();
            let result = save_image(fetcher.as_ref(), &link, &destination, &next_index).await;
            (link, result)
        });
    }

    let mut summary = DownloadSummary {
        saved: 0,
        total: links.len(),
    };

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((link, DownloadResult::Saved(path))) => {
                summary.saved += 1;
                ::log::debug!("Img from: {} saved to {}", link, path.display());
            }
            Ok((link, DownloadResult::Failed(reason))) => {
                ::log::debug!("Can't save img from: {}: {}", link, reason);
            }
            Err(e) => {
                ::log::warn!("Download task failed: {}", e);
            }
        }
    }

    ::log::info!("{} of {} images were saved", summary.saved, summary.total);
    Ok(summary)
}

/// Fetches one link and writes it under the next free index
async fn save_image<F: Fetcher>(
    fetcher: &F,
    link: &ImageLink,
    destination: &Path,
    next_index: &AtomicUsize,
) -> DownloadResult {
    let bytes = match fetcher.fetch(link.as_str()).await {
        Ok(bytes) => bytes,
        Err(e) => return DownloadResult::Failed(e.into()),
    };

    let index = next_index.fetch_add(1, Ordering::SeqCst);
    let path: PathBuf = destination.join(format!("{index}.jpg"));
    match tokio::fs::write(&path, &bytes).await {
        Ok(()) => DownloadResult::Saved(path),
        Err(source) => DownloadResult::Failed(DownloadFailure::Write { path, source }),
    }
}
