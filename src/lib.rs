pub mod browser;
pub mod config;
pub mod discovery;
pub mod download;
pub mod error;
pub mod extract;
pub mod link_file;
pub mod logging;
pub mod results;
pub mod session;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use config::{GrabberConfig, ImageSize};
pub use error::{Error, Result};
pub use results::{DownloadSummary, ImageLink, SessionReport};
pub use session::{Session, SessionRequest};

use browser::WebDriverBrowser;
use download::HttpFetcher;
use std::path::Path;
use std::sync::Arc;

/// Runs a search session against a live WebDriver browser
pub async fn run(config: &GrabberConfig, request: SessionRequest) -> Result<SessionReport> {
    ::log::info!("Connecting to WebDriver at {}", config.webdriver_url);
    let fetcher = HttpFetcher::new(config.request_timeout())?;
    let browser = WebDriverBrowser::connect(&config.webdriver_url, config.headless).await?;

    Session::new(config).run(browser, fetcher, request).await
}

/// Downloads every link listed in `links_file` into `destination`
pub async fn download_links_file(
    config: &GrabberConfig,
    links_file: &Path,
    destination: &Path,
) -> Result<DownloadSummary> {
    let links = link_file::read_links(links_file)?;
    ::log::info!("Urls: {}", links.len());

    let fetcher = Arc::new(HttpFetcher::new(config.request_timeout())?);
    let summary = download::download_all(fetcher, &links, destination, config.workers).await?;
    Ok(summary)
}
