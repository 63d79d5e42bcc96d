// Workflows - One `Workflow` per kind of record the suite seeds
//
// UI workflows share a `UiContext` (page, config, and small form helpers)
// and a `UiLogin` describing how to sign in and where the app lands.

pub mod client;
pub mod client_contact;
pub mod contract;
pub mod contractor;
pub mod currency;
pub mod expense;
pub mod project;
pub mod timecard_api;
pub mod timecard_ui;

pub use client::ClientWorkflow;
pub use client_contact::ClientContactWorkflow;
pub use contract::ContractWorkflow;
pub use contractor::ContractorWorkflow;
pub use currency::CurrencyWorkflow;
pub use expense::ExpenseWorkflow;
pub use project::ProjectWorkflow;
pub use timecard_api::TimecardApiWorkflow;
pub use timecard_ui::TimecardUiWorkflow;

use crate::config::RunConfig;
use crate::dates;
use crate::error::{Error, Result};
use crate::fixtures::artifact_path;
use crate::submit::{PostCondition, SubmitOutcome};
use crate::ui::expect::{expect, expect_url};
use crate::ui::{Point, Ui, text};
use crate::widget::{CountingSignal, DataLoadSignal, WidgetDriver};
use std::sync::Arc;
use std::time::Duration;

const USERNAME_INPUT: &str = "input[name=\"username\"]";
const PASSWORD_INPUT: &str = "input[type=\"password\"]";
const LOGIN_BUTTON: &str = "button[type='button']";
const LOGOUT_LINK: &str = "a.bg-red-600";

/// Modal dialog root.
pub const DIALOG: &str = ".p-dialog";

/// The icon-only "add" button on list pages.
pub const ADD_BUTTON: &str = "button:has(span.material-symbols-outlined:text-is(\"add\"))";

/// Clickable icon glyph, e.g. `search` or `chevron_right`.
pub fn icon(name: &str) -> String {
    format!("span.material-symbols-outlined:text-is(\"{}\")", name)
}

/// Radio id suffix for a gender label (`#genderCt-N`).
pub fn gender_code(gender: &str) -> Result<&'static str> {
    match gender.trim() {
        "Male" => Ok("1"),
        "Female" => Ok("2"),
        "Unidentified" => Ok("3"),
        other => Err(Error::InvalidFixtureValue {
            field: "gender".into(),
            value: other.to_string(),
            reason: "expected Male, Female or Unidentified".into(),
        }),
    }
}

/// Radio id suffix for a status label (`#statusCt-N`).
pub fn status_code(status: &str) -> &'static str {
    if status.trim() == "Active" { "1" } else { "2" }
}

/// The page, the run configuration, and helpers shared by UI workflows.
#[derive(Clone)]
pub struct UiContext {
    ui: Arc<dyn Ui>,
    config: Arc<RunConfig>,
}

impl UiContext {
    pub fn new(ui: Arc<dyn Ui>, config: Arc<RunConfig>) -> Self {
        Self { ui, config }
    }

    pub fn ui(&self) -> &dyn Ui {
        self.ui.as_ref()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn widgets(&self) -> WidgetDriver<'_> {
        WidgetDriver::new(self.ui(), self.config.widget_timeouts())
    }

    /// Waits for `selector` to be visible within the action timeout.
    pub async fn visible(&self, selector: &str) -> Result<()> {
        expect(self.ui(), selector)
            .with_timeout(self.config.action_timeout())
            .to_be_visible()
            .await
    }

    /// Waits for `selector` to be hidden or gone within `timeout`.
    pub async fn gone(&self, selector: &str, timeout: Duration) -> Result<()> {
        expect(self.ui(), selector)
            .with_timeout(timeout)
            .to_be_hidden()
            .await
    }

    pub async fn click_visible(&self, selector: &str) -> Result<()> {
        self.visible(selector).await?;
        self.ui.click(selector).await
    }

    /// Clicks the element showing `label` (a navigation link or tab).
    pub async fn click_text(&self, label: &str) -> Result<()> {
        self.click_visible(&text(label)).await
    }

    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.visible(selector).await?;
        self.ui.fill(selector, value).await
    }

    /// Types a `dd/mm/yyyy` fixture date into a date picker, then dismisses
    /// the calendar popup by clicking `dismiss` and blurring the input.
    pub async fn fill_date(&self, selector: &str, fixture_date: &str, dismiss: &str) -> Result<()> {
        let value = dates::ui_date(fixture_date)?;
        self.ui.force_click(selector).await?;
        self.ui.fill(selector, &value).await?;
        self.ui.click_at(dismiss, Point::new(1.0, 1.0)).await?;
        self.ui.blur(selector).await
    }

    /// Uploads a fixture artifact through a file input.
    pub async fn upload(&self, selector: &str, name: &str) -> Result<()> {
        let path = artifact_path(&self.config.fixtures_dir, name);
        self.ui.set_input_file(selector, &path).await
    }

    /// Returns the signal in `slot`, installing the network watch on first use.
    ///
    /// Watches persist for the page, so each pattern is installed once.
    pub async fn watch(
        &self,
        slot: &mut Option<CountingSignal>,
        pattern: &str,
    ) -> Result<CountingSignal> {
        if let Some(signal) = slot {
            return Ok(signal.clone());
        }
        let signal = self.ui.watch_loads(pattern).await?;
        *slot = Some(signal.clone());
        Ok(signal)
    }

    /// Waits for an armed signal outside of a widget selection.
    pub async fn await_load(
        &self,
        what: &str,
        signal: &dyn DataLoadSignal,
        timeout: Duration,
    ) -> Result<()> {
        signal
            .wait(timeout)
            .await
            .map_err(|failure| Error::DataLoadTimeout {
                widget: what.to_string(),
                signal: signal.label().to_string(),
                reason: failure.to_string(),
            })
    }

    /// Clicks `button` until `condition` holds, using the configured loop.
    pub async fn submit_until(
        &self,
        button: &str,
        condition: &PostCondition,
    ) -> Result<SubmitOutcome> {
        self.config
            .submit_loop()
            .click_until(self.ui(), button, condition)
            .await
    }

    pub async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How to sign in and what proves the app is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiLogin {
    landing_text: String,
    /// When set, the landing link is clicked and this selector awaited.
    ready_selector: Option<String>,
}

impl Default for UiLogin {
    fn default() -> Self {
        Self::landing("Contractors")
    }
}

impl UiLogin {
    /// Login is complete once `text` is visible.
    pub fn landing(text: impl Into<String>) -> Self {
        Self {
            landing_text: text.into(),
            ready_selector: None,
        }
    }

    /// Login continues by opening `link_text` and waiting for `ready`.
    pub fn opening(link_text: impl Into<String>, ready: impl Into<String>) -> Self {
        Self {
            landing_text: link_text.into(),
            ready_selector: Some(ready.into()),
        }
    }

    pub async fn login(&self, ctx: &UiContext, username: &str, password: &str) -> Result<()> {
        let ui = ctx.ui();
        let config = ctx.config();
        ui.goto(&config.app_url).await?;
        ctx.fill(USERNAME_INPUT, username).await?;
        ctx.fill(PASSWORD_INPUT, password).await?;
        ui.click(LOGIN_BUTTON).await?;

        let landing = text(&self.landing_text);
        expect(ui, &landing)
            .with_timeout(config.navigation_timeout())
            .to_be_visible()
            .await
            .map_err(|e| e.context(format!("logging in as {}", username)))?;

        if let Some(ready) = &self.ready_selector {
            ui.click(&landing).await?;
            expect(ui, ready)
                .with_timeout(config.navigation_timeout())
                .to_be_visible()
                .await?;
        }

        tracing::info!(username, "logged in");
        ctx.pause(config.login_settle()).await;
        Ok(())
    }

    pub async fn logout(&self, ctx: &UiContext) -> Result<()> {
        ctx.click_visible(LOGOUT_LINK).await?;
        expect(ctx.ui(), USERNAME_INPUT)
            .with_timeout(ctx.config().navigation_timeout())
            .to_be_visible()
            .await?;
        tracing::info!("logged out");
        Ok(())
    }
}

/// Waits until the URL contains `fragment` within the navigation timeout.
pub(crate) async fn await_url(ctx: &UiContext, fragment: &str) -> Result<()> {
    expect_url(ctx.ui())
        .with_timeout(ctx.config().navigation_timeout())
        .to_contain(fragment)
        .await
}
