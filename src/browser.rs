//! Browser capability used by the discovery loop.
//!
//! [`Browser`] is the narrow surface discovery needs: navigate, query, scroll
//! and click. [`WebDriverBrowser`] implements it over a WebDriver session; the
//! session must be released with [`Browser::close`] once the caller is done.

use crate::error::{DriverError, SetupError};
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use std::future::Future;

/// One search-result element on the page
pub trait PageElement: Send + Sync {
    /// Reads an attribute, `None` if the element does not carry it
    fn attribute(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, DriverError>> + Send;
}

/// Driving operations over a single page session
pub trait Browser: Send + Sync {
    type Element: PageElement;

    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Returns every element currently matching `selector`, in page order
    fn query_elements(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<Self::Element>, DriverError>> + Send;

    fn scroll_to_bottom(&self) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Clicks the first element matching `selector`.
    ///
    /// Returns `Ok(false)` when nothing matches.
    fn click(&self, selector: &str) -> impl Future<Output = Result<bool, DriverError>> + Send;

    /// Ends the session
    fn close(self) -> impl Future<Output = Result<(), DriverError>> + Send;
}

/// Browser backed by a WebDriver session (ChromeDriver, geckodriver, Selenium)
pub struct WebDriverBrowser {
    client: Client,
}

pub struct WebDriverElement(Element);

impl WebDriverBrowser {
    /// Opens a new WebDriver session
    ///
    /// Tries `webdriver_url` first, then the usual local driver ports.
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self, SetupError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(chrome_capabilities(headless));

        let first_error = match builder.connect(webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", webdriver_url);
                return Ok(Self { client });
            }
            Err(e) => {
                ::log::warn!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
                e.to_string()
            }
        };

        let fallback_urls = [
            "http://localhost:9515", // ChromeDriver default
            "http://127.0.0.1:4444", // Try with IP instead of localhost
        ];

        for url in fallback_urls.iter() {
            if *url == webdriver_url {
                continue;
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = builder.connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(Self { client });
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(SetupError::Connect {
            url: webdriver_url.to_string(),
            reason: first_error,
        })
    }
}

/// Chrome options matching a quiet scraping browser
fn chrome_capabilities(headless: bool) -> Map<String, Value> {
    let mut args = vec!["--disable-extensions", "--disable-gpu"];
    if headless {
        args.push("--headless=new");
    }

    let mut caps = Map::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

/// Maps a WebDriver command error, singling out a dead session
fn classify(error: CmdError, kind: fn(String) -> DriverError) -> DriverError {
    let message = error.to_string();
    if error.is_invalid_session_id() || message.contains("Unable to find session") {
        DriverError::SessionLost(message)
    } else {
        kind(message)
    }
}

/// A missing "load more" button is not an error
fn missing_button(error: CmdError) -> Result<bool, DriverError> {
    if error.is_no_such_element() {
        Ok(false)
    } else {
        Err(classify(error, DriverError::Click))
    }
}

impl PageElement for WebDriverElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        self.0
            .attr(name)
            .await
            .map_err(|e| classify(e, DriverError::Attribute))
    }
}

impl Browser for WebDriverBrowser {
    type Element = WebDriverElement;

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| classify(e, DriverError::Navigation))
    }

    async fn query_elements(&self, selector: &str) -> Result<Vec<WebDriverElement>, DriverError> {
        let found = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| classify(e, DriverError::Query))?;
        Ok(found.into_iter().map(WebDriverElement).collect())
    }

    async fn scroll_to_bottom(&self) -> Result<(), DriverError> {
        self.client
            .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await
            .map(|_| ())
            .map_err(|e| classify(e, DriverError::Scroll))
    }

    async fn click(&self, selector: &str) -> Result<bool, DriverError> {
        match self.client.find(Locator::Css(selector)).await {
            Ok(button) => button
                .click()
                .await
                .map(|_| true)
                .map_err(|e| classify(e, DriverError::Click)),
            Err(e) => missing_button(e),
        }
    }

    async fn close(self) -> Result<(), DriverError> {
        self.client
            .close()
            .await
            .map_err(|e| DriverError::Close(e.to_string()))
    }
}
