//! Scroll-driven discovery of result elements.
//!
//! The loop scrolls the result page, waits, and re-queries the result
//! elements until the target count is reached or the page stops growing for
//! `stall_limit` consecutive iterations. Once per plateau it tries the
//! "load more" button. Recoverable driver errors count as an iteration
//! without growth; a lost session ends discovery with an error.

use crate::browser::Browser;
use crate::error::DriverError;
use crate::session::SessionState;
use std::time::Duration;

/// Selector matching one search result
pub const ITEM_SELECTOR: &str = "div.serp-item";

/// Selector of the button that loads the next page of results
pub const LOAD_MORE_SELECTOR: &str = ".more__button";

/// Phase of the discovery loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    /// Checking the target, scrolling if it is not met
    Collecting,
    /// Scrolled; waiting for content and re-querying
    AwaitingMore,
    /// Last iteration brought nothing new
    Stalled,
    Done,
}

/// Timing and selectors for a discovery run
#[derive(Debug, Clone)]
pub struct Discovery {
    pub delay: Duration,
    pub item_selector: String,
    pub load_more_selector: String,
}

impl Discovery {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            item_selector: ITEM_SELECTOR.to_string(),
            load_more_selector: LOAD_MORE_SELECTOR.to_string(),
        }
    }

    /// Collects result elements into `state.elements`.
    ///
    /// The browser must already show the result page. Only unrecoverable
    /// driver errors are returned; `state` keeps whatever was collected.
    pub async fn run<B: Browser>(
        &self,
        browser: &B,
        state: &mut SessionState<B::Element>,
    ) -> Result<(), DriverError> {
        state.elements = match browser.query_elements(&self.item_selector).await {
            Ok(found) => found,
            Err(e) => {
                absorb(e)?;
                Vec::new()
            }
        };
        ::log::info!("Found {} images", state.elements.len());

        let mut stalls = 0;
        let mut load_more_armed = true;
        let mut phase = DiscoveryState::Collecting;

        while phase != DiscoveryState::Done {
            ::log::trace!("Discovery phase {:?}, {} stalls", phase, stalls);
            phase = match phase {
                DiscoveryState::Collecting => {
                    if state.elements.len() >= state.target {
                        DiscoveryState::Done
                    } else {
                        state.scrolls += 1;
                        match browser.scroll_to_bottom().await {
                            Ok(()) => DiscoveryState::AwaitingMore,
                            Err(e) => {
                                absorb(e)?;
                                stalls += 1;
                                state.stalled_iterations += 1;
                                DiscoveryState::Stalled
                            }
                        }
                    }
                }
                DiscoveryState::AwaitingMore => {
                    tokio::time::sleep(self.delay).await;
                    let before = state.elements.len();
                    match browser.query_elements(&self.item_selector).await {
                        Ok(found) if found.len() > before => {
                            state.elements = found;
                            stalls = 0;
                            load_more_armed = true;
                            ::log::info!("Found {} images", state.elements.len());
                            DiscoveryState::Collecting
                        }
                        Ok(found) => {
                            // Same count may come back reordered; a shorter list is ignored.
                            if found.len() == before {
                                state.elements = found;
                            }
                            stalls += 1;
                            state.stalled_iterations += 1;
                            DiscoveryState::Stalled
                        }
                        Err(e) => {
                            absorb(e)?;
                            stalls += 1;
                            state.stalled_iterations += 1;
                            DiscoveryState::Stalled
                        }
                    }
                }
                DiscoveryState::Stalled => {
                    if stalls >= state.stall_limit {
                        DiscoveryState::Done
                    } else {
                        if load_more_armed {
                            load_more_armed = false;
                            if self.load_more(browser, state).await? {
                                stalls = 0;
                            }
                        }
                        DiscoveryState::Collecting
                    }
                }
                DiscoveryState::Done => DiscoveryState::Done,
            };
        }

        ::log::info!("Done! {} images found", state.elements.len());
        Ok(())
    }

    /// Clicks "load more" if the page has it; true when the click went through
    async fn load_more<B: Browser>(
        &self,
        browser: &B,
        state: &mut SessionState<B::Element>,
    ) -> Result<bool, DriverError> {
        state.load_more_attempts += 1;
        match browser.click(&self.load_more_selector).await {
            Ok(true) => {
                state.uploads += 1;
                ::log::debug!("Uploading more images...");
                Ok(true)
            }
            Ok(false) => {
                ::log::debug!("No load more button on the page");
                Ok(false)
            }
            Err(e) => {
                absorb(e)?;
                Ok(false)
            }
        }
    }
}

/// Logs a recoverable driver error, hands back anything else
fn absorb(error: DriverError) -> Result<(), DriverError> {
    if error.is_recoverable() {
        ::log::warn!("Error {}. Going next", error);
        Ok(())
    } else {
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageSize;
    use crate::session::SessionRequest;
    use crate::testing::{FakeElement, ScriptedBrowser};

    fn state(target: usize, stall_limit: usize) -> SessionState<FakeElement> {
        SessionState::new(&SessionRequest {
            query: "cats".to_string(),
            count: target,
            size: ImageSize::Medium,
            stall_limit,
            save_images: false,
            save_links: false,
        })
    }

    fn discovery() -> Discovery {
        Discovery::new(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_stops_once_target_is_reached() {
        let browser = ScriptedBrowser::new(vec![4, 7, 10, 13, 16]);
        let stats = browser.stats();
        let mut state = state(11, 3);

        discovery().run(&browser, &mut state).await.unwrap();

        assert_eq!(state.elements.len(), 13);
        assert_eq!(stats.scrolls(), 3);
        assert_eq!(stats.click_attempts(), 0);
        assert_eq!(state.stalled_iterations, 0);
    }

    #[tokio::test]
    async fn test_target_met_at_entry_needs_no_scroll() {
        let browser = ScriptedBrowser::new(vec![30]);
        let stats = browser.stats();
        let mut state = state(20, 3);

        discovery().run(&browser, &mut state).await.unwrap();

        assert_eq!(state.elements.len(), 30);
        assert_eq!(stats.scrolls(), 0);
    }

    #[tokio::test]
    async fn test_plateau_tries_load_more_once_then_gives_up() {
        let browser = ScriptedBrowser::new(vec![5]);
        let stats = browser.stats();
        let mut state = state(100, 3);

        discovery().run(&browser, &mut state).await.unwrap();

        assert_eq!(state.elements.len(), 5);
        assert_eq!(stats.click_attempts(), 1);
        assert_eq!(state.load_more_attempts, 1);
        assert_eq!(state.uploads, 0);
        assert_eq!(state.stalled_iterations, 3);
        assert_eq!(stats.scrolls(), 3);
    }

    #[tokio::test]
    async fn test_successful_load_more_resets_stall_counter_but_still_terminates() {
        let browser = ScriptedBrowser::new(vec![5]).with_load_more();
        let stats = browser.stats();
        let mut state = state(100, 3);

        discovery().run(&browser, &mut state).await.unwrap();

        assert_eq!(state.uploads, 1);
        assert_eq!(stats.click_attempts(), 1);
        // one stall before the click, three after it
        assert_eq!(state.stalled_iterations, 4);
        assert_eq!(state.elements.len(), 5);
    }

    #[tokio::test]
    async fn test_growth_rearms_load_more() {
        // entry 5, stall, click, grow to 8, stall, click, stall x2
        let browser = ScriptedBrowser::new(vec![5, 5, 8, 8]);
        let stats = browser.stats();
        let mut state = state(100, 3);

        discovery().run(&browser, &mut state).await.unwrap();

        assert_eq!(state.elements.len(), 8);
        assert_eq!(stats.click_attempts(), 2);
    }

    #[tokio::test]
    async fn test_terminates_within_stall_limit_after_plateau() {
        for stall_limit in 0..6 {
            let browser = ScriptedBrowser::new(vec![2, 4, 6, 6]);
            let mut state = state(1000, stall_limit);

            discovery().run(&browser, &mut state).await.unwrap();

            assert_eq!(state.elements.len(), 6);
            assert!(state.stalled_iterations <= stall_limit.max(1));
        }
    }

    #[tokio::test]
    async fn test_shrinking_page_keeps_collected_elements() {
        let browser = ScriptedBrowser::new(vec![6, 3, 3, 3]);
        let mut state = state(100, 2);

        discovery().run(&browser, &mut state).await.unwrap();

        assert_eq!(state.elements.len(), 6);
    }

    #[tokio::test]
    async fn test_scroll_errors_count_as_no_progress() {
        let browser = ScriptedBrowser::new(vec![4, 8]).with_failing_scrolls(2);
        let stats = browser.stats();
        let mut state = state(8, 3);

        discovery().run(&browser, &mut state).await.unwrap();

        assert_eq!(state.elements.len(), 8);
        assert_eq!(stats.scrolls(), 3);
        assert_eq!(state.stalled_iterations, 2);
    }

    #[tokio::test]
    async fn test_query_and_click_errors_count_as_no_progress() {
        let browser = ScriptedBrowser::new(vec![5])
            .with_failing_queries(2)
            .with_failing_click();
        let stats = browser.stats();
        let mut state = state(100, 3);

        let result = discovery().run(&browser, &mut state).await;

        assert!(result.is_ok());
        assert_eq!(state.elements.len(), 5);
        assert_eq!(state.stalled_iterations, 3);
        assert_eq!(stats.click_attempts(), 1);
        assert_eq!(state.uploads, 0);
    }

    #[tokio::test]
    async fn test_growth_after_failed_query_is_picked_up() {
        let browser = ScriptedBrowser::new(vec![4, 8]).with_failing_queries(1);
        let mut state = state(8, 3);

        discovery().run(&browser, &mut state).await.unwrap();

        assert_eq!(state.elements.len(), 8);
        assert_eq!(state.stalled_iterations, 1);
    }

    #[tokio::test]
    async fn test_lost_session_is_returned() {
        let browser = ScriptedBrowser::new(vec![4, 7, 10]).losing_session_on_query(2);
        let mut state = state(100, 3);

        let result = discovery().run(&browser, &mut state).await;

        assert!(matches!(result, Err(DriverError::SessionLost(_))));
        assert_eq!(state.elements.len(), 7);
    }
}
