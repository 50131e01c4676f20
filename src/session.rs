//! One grabbing session: discovery, extraction, link file, downloads.

use crate::browser::{Browser, PageElement};
use crate::config::{GrabberConfig, ImageSize};
use crate::discovery::Discovery;
use crate::download::{Fetcher, download_all};
use crate::error::{Result, SetupError};
use crate::extract::extract_all;
use crate::link_file::write_links;
use crate::results::{ImageLink, SessionReport};
use crate::utils::{format_elapsed, sanitize_filename};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// What to search for and what to keep
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub query: String,
    /// Number of images to look for
    pub count: usize,
    pub size: ImageSize,
    /// Consecutive scrolls without new images before giving up
    pub stall_limit: usize,
    pub save_images: bool,
    pub save_links: bool,
}

impl SessionRequest {
    /// Request for `query` using the configured defaults
    pub fn from_config(query: &str, config: &GrabberConfig) -> Self {
        Self {
            query: query.to_string(),
            count: config.limit,
            size: config.size,
            stall_limit: config.stall_limit,
            save_images: true,
            save_links: false,
        }
    }
}

/// Mutable state of one session
#[derive(Debug)]
pub struct SessionState<E> {
    pub query: String,
    pub target: usize,
    pub size: ImageSize,
    pub stall_limit: usize,

    /// Result elements as of the latest query
    pub elements: Vec<E>,
    pub links: Vec<ImageLink>,
    pub links_skipped: usize,

    pub scrolls: usize,
    pub stalled_iterations: usize,
    pub load_more_attempts: usize,
    /// Successful "load more" clicks
    pub uploads: usize,
}

impl<E> SessionState<E> {
    pub fn new(request: &SessionRequest) -> Self {
        Self {
            query: request.query.clone(),
            target: request.count,
            size: request.size,
            stall_limit: request.stall_limit,
            elements: Vec::new(),
            links: Vec::new(),
            links_skipped: 0,
            scrolls: 0,
            stalled_iterations: 0,
            load_more_attempts: 0,
            uploads: 0,
        }
    }
}

/// Builds the result page URL for a query
pub fn search_url(base: &str, query: &str, size: ImageSize) -> std::result::Result<Url, url::ParseError> {
    Url::parse_with_params(
        base,
        &[
            ("text", query),
            ("nomisspell", "1"),
            ("noreask", "1"),
            ("isize", size.as_str()),
        ],
    )
}

/// Runs sessions against a configuration
pub struct Session<'a> {
    config: &'a GrabberConfig,
}

impl<'a> Session<'a> {
    pub fn new(config: &'a GrabberConfig) -> Self {
        Self { config }
    }

    /// Runs a full session. The browser is closed before this returns,
    /// whether or not discovery succeeded.
    pub async fn run<B: Browser, F: Fetcher>(
        &self,
        browser: B,
        fetcher: F,
        request: SessionRequest,
    ) -> Result<SessionReport> {
        let start = Instant::now();
        let mut state = SessionState::new(&request);

        // elements are only readable while the session is open
        let collected = self.discover(&browser, &mut state).await;
        let discovery_elapsed = start.elapsed();
        let extraction_start = Instant::now();
        if collected.is_ok() {
            extract_links(&mut state).await;
        }
        let extraction_elapsed = extraction_start.elapsed();
        if let Err(e) = browser.close().await {
            ::log::warn!("{}", e);
        }
        collected?;

        ::log::info!("Image search time: {}", format_elapsed(discovery_elapsed));
        ::log::info!("Link extraction time: {}", format_elapsed(extraction_elapsed));

        let mut report = SessionReport {
            query: state.query.clone(),
            elements_found: state.elements.len(),
            links_skipped: state.links_skipped,
            scrolls: state.scrolls,
            stalled_iterations: state.stalled_iterations,
            load_more_attempts: state.load_more_attempts,
            uploads: state.uploads,
            discovery_elapsed,
            extraction_elapsed,
            ..SessionReport::default()
        };
        let name = sanitize_filename(&state.query);

        if request.save_links {
            let path = self.config.output_root.join(format!("{name}_links.txt"));
            ::log::info!("Saving links to images...");
            write_links(&path, &state.links)?;
            report.links_file = Some(path);
        }

        if request.save_images {
            let download_start = Instant::now();
            let destination: PathBuf = self.config.output_root.join(&name);
            let summary = download_all(
                Arc::new(fetcher),
                &state.links,
                &destination,
                self.config.workers,
            )
            .await?;
            report.downloads = Some(summary);
            report.download_elapsed = download_start.elapsed();
            ::log::info!("Saving time: {}", format_elapsed(report.download_elapsed));
        }

        report.links = state.links;
        report.total_elapsed = start.elapsed();
        ::log::info!("Total work time: {}", format_elapsed(report.total_elapsed));
        Ok(report)
    }

    /// Opens the result page and collects result elements into `state`
    async fn discover<B: Browser>(
        &self,
        browser: &B,
        state: &mut SessionState<B::Element>,
    ) -> Result<()> {
        let url = search_url(&self.config.search_url, &state.query, state.size)
            .map_err(SetupError::from)?;
        browser
            .navigate(url.as_str())
            .await
            .map_err(|source| SetupError::Navigation {
                url: url.to_string(),
                source,
            })?;
        ::log::info!("Image search for '{}'", state.query);

        Discovery::new(self.config.scroll_delay())
            .run(browser, state)
            .await?;
        Ok(())
    }
}

/// Turns the collected elements into links, counting the ones without one
async fn extract_links<E: PageElement>(state: &mut SessionState<E>) {
    ::log::info!("Creating links to images...");
    let (links, skipped) = extract_all(&state.elements).await;
    if skipped > 0 {
        ::log::info!("{} elements had no usable image link", skipped);
    }
    state.links = links;
    state.links_skipped = skipped;
}
