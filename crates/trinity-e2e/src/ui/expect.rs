// Expectations - Polling assertions over a `Ui`
//
// Each assertion re-checks its condition until it holds or the timeout
// elapses, then fails with `AssertionTimeout`. Time is measured with tokio's
// clock so tests can run on paused time.

use crate::error::{Error, Result};
use crate::ui::Ui;
use std::time::Duration;
use tokio::time::Instant;

/// Default timeout for expectations
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default polling interval (100ms)
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Creates an expectation on the element(s) matched by `selector`.
pub fn expect<'a>(ui: &'a dyn Ui, selector: &str) -> Expectation<'a> {
    Expectation {
        ui,
        selector: selector.to_string(),
        timeout: DEFAULT_TIMEOUT,
        poll_interval: DEFAULT_POLL_INTERVAL,
        negate: false,
    }
}

/// Creates an expectation on the page URL.
pub fn expect_url(ui: &dyn Ui) -> UrlExpectation<'_> {
    UrlExpectation {
        ui,
        timeout: DEFAULT_TIMEOUT,
        poll_interval: DEFAULT_POLL_INTERVAL,
    }
}

/// Polls `check` until it returns true or `timeout` elapses.
///
/// Returns whether the condition was met; never errors on timeout.
pub async fn poll_until<F, Fut>(timeout: Duration, poll_interval: Duration, mut check: F) -> Result<bool>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<bool>>,
{
    let start = Instant::now();
    loop {
        if check().await? {
            return Ok(true);
        }
        if start.elapsed() >= timeout {
            return Ok(false);
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// An element expectation with auto-retry.
pub struct Expectation<'a> {
    ui: &'a dyn Ui,
    selector: String,
    timeout: Duration,
    poll_interval: Duration,
    negate: bool,
}

#[allow(clippy::wrong_self_convention)]
impl<'a> Expectation<'a> {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Negates the assertion.
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.negate = true;
        self
    }

    /// Asserts that the element is visible.
    pub async fn to_be_visible(self) -> Result<()> {
        let ui = self.ui;
        let selector = self.selector.as_str();
        let negate = self.negate;
        let met = poll_until(self.timeout, self.poll_interval, || async move {
            let visible = ui.is_visible(selector).await?;
            Ok(visible != negate)
        })
        .await?;

        if met {
            return Ok(());
        }
        let message = if negate {
            format!(
                "Expected element '{}' NOT to be visible, but it was visible after {:?}",
                selector, self.timeout
            )
        } else {
            format!(
                "Expected element '{}' to be visible, but it was not visible after {:?}",
                selector, self.timeout
            )
        };
        Err(Error::AssertionTimeout(message))
    }

    /// Asserts that the element is hidden or absent.
    pub async fn to_be_hidden(self) -> Result<()> {
        let negated = Expectation {
            negate: !self.negate,
            ..self
        };
        negated.to_be_visible().await
    }

    /// Asserts that the element is visible and enabled.
    pub async fn to_be_interactable(self) -> Result<()> {
        let ui = self.ui;
        let selector = self.selector.as_str();
        let negate = self.negate;
        let met = poll_until(self.timeout, self.poll_interval, || async move {
            let ready = ui.is_visible(selector).await? && ui.is_enabled(selector).await?;
            Ok(ready != negate)
        })
        .await?;

        if met {
            Ok(())
        } else {
            Err(Error::AssertionTimeout(format!(
                "Expected element '{}' {}to be visible and enabled after {:?}",
                selector,
                if negate { "NOT " } else { "" },
                self.timeout
            )))
        }
    }

    /// Asserts that the element's text contains `expected`.
    pub async fn to_contain_text(self, expected: &str) -> Result<()> {
        let start = Instant::now();

        loop {
            // Absent elements have no text yet
            let actual = if self.ui.count(&self.selector).await? > 0 {
                self.ui.inner_text(&self.selector).await?
            } else {
                String::new()
            };
            let actual = actual.trim();

            let contains = actual.contains(expected);
            if contains != self.negate {
                return Ok(());
            }

            if start.elapsed() >= self.timeout {
                let message = if self.negate {
                    format!(
                        "Expected element '{}' NOT to contain text '{}', but it did after {:?}",
                        self.selector, expected, self.timeout
                    )
                } else {
                    format!(
                        "Expected element '{}' to contain text '{}', but had '{}' after {:?}",
                        self.selector, expected, actual, self.timeout
                    )
                };
                return Err(Error::AssertionTimeout(message));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Asserts that at least one element matches.
    pub async fn to_exist(self) -> Result<()> {
        let ui = self.ui;
        let selector = self.selector.as_str();
        let negate = self.negate;
        let met = poll_until(self.timeout, self.poll_interval, || async move {
            let exists = ui.count(selector).await? > 0;
            Ok(exists != negate)
        })
        .await?;

        if met {
            Ok(())
        } else {
            Err(Error::AssertionTimeout(format!(
                "Expected element '{}' {}to exist after {:?}",
                selector,
                if negate { "NOT " } else { "" },
                self.timeout
            )))
        }
    }
}

/// A URL expectation with auto-retry.
pub struct UrlExpectation<'a> {
    ui: &'a dyn Ui,
    timeout: Duration,
    poll_interval: Duration,
}

#[allow(clippy::wrong_self_convention)]
impl<'a> UrlExpectation<'a> {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Asserts that the current URL contains `fragment`.
    pub async fn to_contain(self, fragment: &str) -> Result<()> {
        let start = Instant::now();

        loop {
            let url = self.ui.current_url().await?;
            if url.contains(fragment) {
                return Ok(());
            }

            if start.elapsed() >= self.timeout {
                return Err(Error::AssertionTimeout(format!(
                    "Expected URL to contain '{}', but was '{}' after {:?}",
                    fragment, url, self.timeout
                )));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
