//! Test doubles for the browser and fetch capabilities.

use crate::browser::{Browser, PageElement};
use crate::download::Fetcher;
use crate::error::{DriverError, FetchError};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Element with a fixed `data-bem` payload
#[derive(Debug, Clone)]
pub struct FakeElement {
    payload: Option<String>,
    /// Session the element came from; reads fail once it is closed
    session: Option<Arc<BrowserStats>>,
}

impl FakeElement {
    pub fn with_href(href: &str) -> Self {
        Self::with_payload(&format!(r#"{{"serp-item":{{"img_href":"{href}"}}}}"#))
    }

    pub fn with_payload(payload: &str) -> Self {
        Self {
            payload: Some(payload.to_string()),
            session: None,
        }
    }

    pub fn bare() -> Self {
        Self {
            payload: None,
            session: None,
        }
    }

    fn in_session(mut self, stats: &Arc<BrowserStats>) -> Self {
        self.session = Some(Arc::clone(stats));
        self
    }
}

impl PageElement for FakeElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        if self.session.as_ref().is_some_and(|stats| stats.is_closed()) {
            return Err(DriverError::SessionLost("invalid session id".into()));
        }
        if name == "data-bem" {
            Ok(self.payload.clone())
        } else {
            Ok(None)
        }
    }
}

/// Counters observed on a [`ScriptedBrowser`], shared so they survive `close`
#[derive(Debug, Default)]
pub struct BrowserStats {
    pub queries: AtomicUsize,
    pub scrolls: AtomicUsize,
    pub click_attempts: AtomicUsize,
    pub closed: AtomicBool,
    pub navigated_to: std::sync::Mutex<Option<String>>,
}

impl BrowserStats {
    pub fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    pub fn click_attempts(&self) -> usize {
        self.click_attempts.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Browser whose page grows along a scripted list of element counts.
///
/// Each query returns the next count; the last count repeats forever.
pub struct ScriptedBrowser {
    counts: Vec<usize>,
    load_more: bool,
    failing_scrolls: usize,
    failing_queries: usize,
    failing_click: bool,
    failing_navigation: bool,
    lose_session_on_query: Option<usize>,
    stats: Arc<BrowserStats>,
}

impl ScriptedBrowser {
    pub fn new(counts: Vec<usize>) -> Self {
        Self {
            counts,
            load_more: false,
            failing_scrolls: 0,
            failing_queries: 0,
            failing_click: false,
            failing_navigation: false,
            lose_session_on_query: None,
            stats: Arc::new(BrowserStats::default()),
        }
    }

    /// Page shows a "load more" button that can be clicked
    pub fn with_load_more(mut self) -> Self {
        self.load_more = true;
        self
    }

    /// The first `n` scrolls fail
    pub fn with_failing_scrolls(mut self, n: usize) -> Self {
        self.failing_scrolls = n;
        self
    }

    /// The first `n` re-queries after the initial one fail
    pub fn with_failing_queries(mut self, n: usize) -> Self {
        self.failing_queries = n;
        self
    }

    /// Every click on "load more" errors out
    pub fn with_failing_click(mut self) -> Self {
        self.failing_click = true;
        self
    }

    pub fn with_failing_navigation(mut self) -> Self {
        self.failing_navigation = true;
        self
    }

    /// The session disappears on the `n`th query (0-based)
    pub fn losing_session_on_query(mut self, n: usize) -> Self {
        self.lose_session_on_query = Some(n);
        self
    }

    pub fn stats(&self) -> Arc<BrowserStats> {
        Arc::clone(&self.stats)
    }
}

impl Browser for ScriptedBrowser {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        if self.failing_navigation {
            return Err(DriverError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()));
        }
        if let Ok(mut navigated) = self.stats.navigated_to.lock() {
            *navigated = Some(url.to_string());
        }
        Ok(())
    }

    async fn query_elements(&self, _selector: &str) -> Result<Vec<FakeElement>, DriverError> {
        let query = self.stats.queries.fetch_add(1, Ordering::SeqCst);
        if self.lose_session_on_query == Some(query) {
            return Err(DriverError::SessionLost("invalid session id".into()));
        }
        if (1..=self.failing_queries).contains(&query) {
            return Err(DriverError::Query("stale element reference".into()));
        }

        // failed queries do not advance the script
        let served = if query > self.failing_queries {
            query - self.failing_queries
        } else {
            query
        };
        let count = self
            .counts
            .get(served)
            .or_else(|| self.counts.last())
            .copied()
            .unwrap_or(0);
        Ok((0..count)
            .map(|i| {
                FakeElement::with_href(&format!("https://img.example/{i}.jpg"))
                    .in_session(&self.stats)
            })
            .collect())
    }

    async fn scroll_to_bottom(&self) -> Result<(), DriverError> {
        let scroll = self.stats.scrolls.fetch_add(1, Ordering::SeqCst);
        if scroll < self.failing_scrolls {
            return Err(DriverError::Scroll("javascript error".into()));
        }
        Ok(())
    }

    async fn click(&self, _selector: &str) -> Result<bool, DriverError> {
        self.stats.click_attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_click {
            return Err(DriverError::Click("element click intercepted".into()));
        }
        Ok(self.load_more)
    }

    async fn close(self) -> Result<(), DriverError> {
        self.stats.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Fetcher returning each URL's bytes, except for the ones marked failing
#[derive(Debug, Default)]
pub struct FakeFetcher {
    failing: HashSet<String>,
}

impl FakeFetcher {
    pub fn failing<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing: urls.into_iter().map(Into::into).collect(),
        }
    }
}

impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tokio::task::yield_now().await;
        if self.failing.contains(url) {
            return Err(FetchError::Status(404));
        }
        Ok(url.as_bytes().to_vec())
    }
}
