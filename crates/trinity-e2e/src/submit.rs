// Submission loop - Bounded retry of a submit action until a post-condition holds
//
// The action is only repeated while the post-condition is false, so a retry
// never re-submits a form whose first submission already went through.

use crate::error::{Error, Result};
use crate::ui::Ui;
use regex::Regex;
use std::future::Future;
use std::time::Duration;

/// Result of a successful submission loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The post-condition held before any attempt; the action never ran.
    AlreadySatisfied,
    /// The post-condition held after `attempts` action runs.
    Succeeded { attempts: u32 },
}

/// Retries an action up to `max_attempts` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitLoop {
    max_attempts: u32,
    settle_delay: Duration,
}

impl Default for SubmitLoop {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(4))
    }
}

impl SubmitLoop {
    /// A zero budget is treated as one attempt.
    pub fn new(max_attempts: u32, settle_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            settle_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Runs `action` until `condition` reports true.
    ///
    /// Each attempt runs the action, sleeps the settle delay, then checks the
    /// condition. Errors from either closure end the loop immediately.
    pub async fn run<A, AF, C, CF>(
        &self,
        label: &str,
        condition_label: &str,
        mut action: A,
        mut condition: C,
    ) -> Result<SubmitOutcome>
    where
        A: FnMut() -> AF,
        AF: Future<Output = Result<()>>,
        C: FnMut() -> CF,
        CF: Future<Output = Result<bool>>,
    {
        if condition().await? {
            tracing::debug!(action = label, "post-condition already satisfied");
            return Ok(SubmitOutcome::AlreadySatisfied);
        }

        let mut attempt = 0;
        while attempt < self.max_attempts {
            attempt += 1;
            tracing::debug!(action = label, attempt, max = self.max_attempts, "submitting");

            action().await?;
            tokio::time::sleep(self.settle_delay).await;

            if condition().await? {
                tracing::info!(action = label, attempts = attempt, "submission confirmed");
                return Ok(SubmitOutcome::Succeeded { attempts: attempt });
            }
            tracing::warn!(
                action = label,
                attempt,
                condition = condition_label,
                "post-condition not met"
            );
        }

        Err(Error::SubmissionFailed {
            action: label.to_string(),
            condition: condition_label.to_string(),
            attempts: attempt,
        })
    }

    /// Clicks `button` until `condition` holds on `ui`.
    pub async fn click_until(
        &self,
        ui: &dyn Ui,
        button: &str,
        condition: &PostCondition,
    ) -> Result<SubmitOutcome> {
        let description = condition.describe();
        self.run(
            button,
            &description,
            || ui.click(button),
            || condition.holds(ui),
        )
        .await
    }
}

/// Observable page states used to confirm a submission.
#[derive(Debug, Clone)]
pub enum PostCondition {
    /// The page URL contains the fragment.
    UrlContains(String),
    /// The page URL matches the pattern.
    UrlMatches(Regex),
    /// No visible element matches the selector (a closed modal).
    ElementAbsent(String),
    /// An element matching the selector is visible.
    ElementVisible(String),
}

impl PostCondition {
    pub fn url_contains(fragment: impl Into<String>) -> Self {
        PostCondition::UrlContains(fragment.into())
    }

    /// Compiles `pattern` into a `UrlMatches` condition.
    pub fn url_matches(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(PostCondition::UrlMatches)
            .map_err(|e| Error::Config(format!("invalid URL pattern '{}': {}", pattern, e)))
    }

    pub fn absent(selector: impl Into<String>) -> Self {
        PostCondition::ElementAbsent(selector.into())
    }

    pub fn visible(selector: impl Into<String>) -> Self {
        PostCondition::ElementVisible(selector.into())
    }

    /// Checks the condition once.
    pub async fn holds(&self, ui: &dyn Ui) -> Result<bool> {
        match self {
            PostCondition::UrlContains(fragment) => {
                Ok(ui.current_url().await?.contains(fragment.as_str()))
            }
            PostCondition::UrlMatches(pattern) => Ok(pattern.is_match(&ui.current_url().await?)),
            PostCondition::ElementAbsent(selector) => Ok(!ui.is_visible(selector).await?),
            PostCondition::ElementVisible(selector) => ui.is_visible(selector).await,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PostCondition::UrlContains(fragment) => format!("URL contains '{}'", fragment),
            PostCondition::UrlMatches(pattern) => format!("URL matches /{}/", pattern),
            PostCondition::ElementAbsent(selector) => format!("'{}' is gone", selector),
            PostCondition::ElementVisible(selector) => format!("'{}' is visible", selector),
        }
    }
}
