// Widget driver - Selecting values in overlay dropdowns
//
// Open the trigger, wait for any dependent data, find the overlay, narrow it
// with the filter box, click the matching option, make sure the overlay is
// gone, then confirm the trigger shows the value. Each step is bounded and
// fails with its own error so a halted run says exactly what went wrong.

pub mod signal;
pub mod surface;

pub use signal::{CountingSignal, DataLoadSignal, SignalFailure};
pub use surface::OptionSurface;

use crate::error::{Error, Result};
use crate::ui::expect::poll_until;
use crate::ui::{Point, Ui};
use std::time::Duration;

/// Collapses runs of whitespace so multi-line option labels compare cleanly.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits a `|`-separated fixture cell into trimmed, non-empty values.
pub fn split_multi(value: &str) -> Vec<String> {
    value
        .split('|')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// How an option's text is compared with the requested value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Option text contains the value (case-sensitive).
    #[default]
    Contains,
    /// Option text equals the value after whitespace normalization.
    Exact,
}

impl MatchMode {
    fn matches(&self, option_text: &str, wanted: &str) -> bool {
        let option_text = normalize(option_text);
        match self {
            MatchMode::Contains => option_text.contains(wanted),
            MatchMode::Exact => option_text == normalize(wanted),
        }
    }
}

/// A dropdown-like control: its trigger element and the surface it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    name: String,
    trigger: String,
    surface: OptionSurface,
    match_mode: MatchMode,
}

impl Widget {
    pub fn new(trigger: impl Into<String>, surface: OptionSurface) -> Self {
        let trigger = trigger.into();
        Self {
            name: trigger.clone(),
            trigger,
            surface,
            match_mode: MatchMode::Contains,
        }
    }

    /// Filterable single-value dropdown.
    pub fn dropdown(trigger: impl Into<String>) -> Self {
        Self::new(trigger, OptionSurface::Filterable)
    }

    /// Single-value dropdown without a filter box.
    pub fn plain(trigger: impl Into<String>) -> Self {
        Self::new(trigger, OptionSurface::PlainList)
    }

    pub fn multi(trigger: impl Into<String>) -> Self {
        Self::new(trigger, OptionSurface::MultiSelect)
    }

    /// Sets the name used in logs and errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Requires the option text to equal the value instead of containing it.
    pub fn exact(mut self) -> Self {
        self.match_mode = MatchMode::Exact;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn surface(&self) -> OptionSurface {
        self.surface
    }
}

/// What `select` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The trigger already showed the value; nothing was opened.
    AlreadySelected,
    /// The value was picked from the option surface.
    Selected,
}

/// Bounds for each step of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetTimeouts {
    pub interactable: Duration,
    pub surface: Duration,
    pub data_load: Duration,
    pub filter_settle: Duration,
    pub close: Duration,
    pub reflect: Duration,
    pub poll_interval: Duration,
}

impl Default for WidgetTimeouts {
    fn default() -> Self {
        Self {
            interactable: Duration::from_secs(10),
            surface: Duration::from_secs(15),
            data_load: Duration::from_secs(20),
            filter_settle: Duration::from_millis(500),
            close: Duration::from_secs(5),
            reflect: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Drives widgets on one page.
pub struct WidgetDriver<'a> {
    ui: &'a dyn Ui,
    timeouts: WidgetTimeouts,
}

impl<'a> WidgetDriver<'a> {
    pub fn new(ui: &'a dyn Ui, timeouts: WidgetTimeouts) -> Self {
        Self { ui, timeouts }
    }

    pub fn timeouts(&self) -> &WidgetTimeouts {
        &self.timeouts
    }

    /// Selects the option containing `text`.
    ///
    /// When `signal` is given it must already be armed; the driver waits for
    /// it after opening the trigger and before looking for the surface.
    pub async fn select(
        &self,
        widget: &Widget,
        text: &str,
        signal: Option<&dyn DataLoadSignal>,
    ) -> Result<SelectOutcome> {
        if !widget.surface.is_multi() && self.already_shows(widget, text).await? {
            tracing::debug!(widget = %widget.name, %text, "value already selected");
            return Ok(SelectOutcome::AlreadySelected);
        }

        self.open(widget, text).await?;
        if let Some(signal) = signal {
            self.await_signal(widget, signal).await?;
        }
        let root = self.find_surface(widget, text).await?;
        self.pick(widget, &root, text).await?;
        self.close(widget, text).await?;
        self.verify_reflected(widget, text).await?;

        tracing::debug!(widget = %widget.name, %text, "selected");
        Ok(SelectOutcome::Selected)
    }

    /// Selects every value of a multi-value widget in one open/close cycle.
    pub async fn select_many(
        &self,
        widget: &Widget,
        values: &[String],
        signal: Option<&dyn DataLoadSignal>,
    ) -> Result<()> {
        let Some(first) = values.first() else {
            return Ok(());
        };

        self.open(widget, first).await?;
        if let Some(signal) = signal {
            self.await_signal(widget, signal).await?;
        }
        let root = self.find_surface(widget, first).await?;
        for value in values {
            self.pick(widget, &root, value).await?;
        }
        self.close(widget, first).await?;
        for value in values {
            self.verify_reflected(widget, value).await?;
        }

        tracing::debug!(widget = %widget.name, ?values, "selected values");
        Ok(())
    }

    /// Selects the first offered option and returns its label.
    pub async fn select_first(&self, widget: &Widget) -> Result<String> {
        self.open(widget, "").await?;
        let root = self.find_surface(widget, "").await?;

        let options = widget.surface.options_in(&root);
        let ui = self.ui;
        let selector = options.as_str();
        let present = poll_until(self.timeouts.surface, self.timeouts.poll_interval, || async move {
            Ok(ui.count(selector).await? > 0)
        })
        .await?;
        if !present {
            return Err(Error::OptionNotFound {
                widget: widget.name.clone(),
                text: String::new(),
                seen: Vec::new(),
            });
        }

        let label = normalize(&self.ui.inner_text(&options).await?);
        self.ui.click_nth(&options, 0).await?;
        self.close(widget, &label).await?;
        self.verify_reflected(widget, &label).await?;

        tracing::debug!(widget = %widget.name, %label, "first option selected");
        Ok(label)
    }

    async fn already_shows(&self, widget: &Widget, text: &str) -> Result<bool> {
        if text.trim().is_empty() || self.ui.count(&widget.trigger).await? == 0 {
            return Ok(false);
        }
        let label = self.ui.inner_text(&widget.trigger).await?;
        Ok(widget.match_mode.matches(&label, text))
    }

    async fn label_contains(&self, widget: &Widget, text: &str) -> Result<bool> {
        if self.ui.count(&widget.trigger).await? == 0 {
            return Ok(false);
        }
        let label = self.ui.inner_text(&widget.trigger).await?;
        Ok(normalize(&label).contains(text))
    }

    async fn open(&self, widget: &Widget, text: &str) -> Result<()> {
        let ui = self.ui;
        let trigger = widget.trigger.as_str();
        let ready = poll_until(self.timeouts.interactable, self.timeouts.poll_interval, || async move {
            Ok(ui.is_visible(trigger).await? && ui.is_enabled(trigger).await?)
        })
        .await?;
        if !ready {
            return Err(Error::ElementNotInteractable {
                widget: widget.name.clone(),
                text: text.to_string(),
                waited: self.timeouts.interactable,
            });
        }

        self.ui.scroll_into_view(trigger).await?;
        self.ui.click(trigger).await?;
        tracing::debug!(widget = %widget.name, "opened");
        Ok(())
    }

    async fn await_signal(&self, widget: &Widget, signal: &dyn DataLoadSignal) -> Result<()> {
        signal
            .wait(self.timeouts.data_load)
            .await
            .map_err(|failure| Error::DataLoadTimeout {
                widget: widget.name.clone(),
                signal: signal.label().to_string(),
                reason: failure.to_string(),
            })
    }

    async fn visible_root(&self, surface: OptionSurface) -> Result<Option<&'static str>> {
        for root in surface.roots() {
            if self.ui.is_visible(root).await? {
                return Ok(Some(root));
            }
        }
        Ok(None)
    }

    async fn find_surface(&self, widget: &Widget, text: &str) -> Result<String> {
        let start = tokio::time::Instant::now();
        loop {
            if let Some(root) = self.visible_root(widget.surface).await? {
                tracing::debug!(widget = %widget.name, root, "surface visible");
                return Ok(root.to_string());
            }
            if start.elapsed() >= self.timeouts.surface {
                return Err(Error::SurfaceNotFound {
                    widget: widget.name.clone(),
                    text: text.to_string(),
                    waited: self.timeouts.surface,
                });
            }
            tokio::time::sleep(self.timeouts.poll_interval).await;
        }
    }

    async fn pick(&self, widget: &Widget, root: &str, text: &str) -> Result<()> {
        for filter in widget.surface.filters() {
            if self.ui.is_visible(filter).await? {
                self.ui.fill(filter, text).await?;
                tokio::time::sleep(self.timeouts.filter_settle).await;
                break;
            }
        }

        let options = widget.surface.options_in(root);
        let ui = self.ui;
        let selector = options.as_str();
        let present = poll_until(self.timeouts.surface, self.timeouts.poll_interval, || async move {
            Ok(ui.count(selector).await? > 0)
        })
        .await?;

        let seen = if present {
            self.ui.all_inner_texts(&options).await?
        } else {
            Vec::new()
        };
        let Some(index) = seen
            .iter()
            .position(|option| widget.match_mode.matches(option, text))
        else {
            return Err(Error::OptionNotFound {
                widget: widget.name.clone(),
                text: text.to_string(),
                seen: seen.iter().map(|s| normalize(s)).collect(),
            });
        };

        self.ui.click_nth(&options, index).await?;
        tracing::debug!(widget = %widget.name, %text, index, "option clicked");
        Ok(())
    }

    async fn any_root_visible(&self, surface: OptionSurface) -> Result<bool> {
        Ok(self.visible_root(surface).await?.is_some())
    }

    async fn close(&self, widget: &Widget, text: &str) -> Result<()> {
        let surface = widget.surface;
        let poll = self.timeouts.poll_interval;

        if surface.closes_on_select() {
            // Give the overlay's own close animation a moment first
            let closed = poll_until(self.timeouts.close / 5, poll, || async move {
                Ok(!self.any_root_visible(surface).await?)
            })
            .await?;
            if closed {
                return Ok(());
            }
        }

        if self.any_root_visible(surface).await? {
            self.ui.press("body", "Escape").await?;
        }
        if self.any_root_visible(surface).await? {
            self.ui.click_at("body", Point::new(0.0, 0.0)).await?;
        }

        let closed = poll_until(self.timeouts.close, poll, || async move {
            Ok(!self.any_root_visible(surface).await?)
        })
        .await?;
        if closed {
            Ok(())
        } else {
            Err(Error::SurfaceDidNotClose {
                widget: widget.name.clone(),
                text: text.to_string(),
            })
        }
    }

    async fn verify_reflected(&self, widget: &Widget, text: &str) -> Result<()> {
        let reflected = poll_until(self.timeouts.reflect, self.timeouts.poll_interval, || async move {
            self.label_contains(widget, text).await
        })
        .await?;
        if reflected {
            return Ok(());
        }

        let label = if self.ui.count(&widget.trigger).await? > 0 {
            normalize(&self.ui.inner_text(&widget.trigger).await?)
        } else {
            String::new()
        };
        Err(Error::SelectionNotReflected {
            widget: widget.name.clone(),
            text: text.to_string(),
            label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multi() {
        assert_eq!(split_multi("Admin | Recruiter|"), vec!["Admin", "Recruiter"]);
        assert_eq!(split_multi("Solo"), vec!["Solo"]);
        assert!(split_multi("  ").is_empty());
    }

    #[test]
    fn test_match_modes() {
        assert!(MatchMode::Contains.matches("  Ana   Perez\n", "Ana Perez"));
        assert!(MatchMode::Contains.matches("US Dollar (USD)", "USD"));
        assert!(!MatchMode::Contains.matches("US Dollar", "usd"));
        assert!(MatchMode::Exact.matches("Ana Perez", "Ana Perez"));
        assert!(!MatchMode::Exact.matches("Ana Perez Gomez", "Ana Perez"));
    }

    #[test]
    fn test_widget_builders() {
        let widget = Widget::dropdown("#supervisor").named("supervisor").exact();
        assert_eq!(widget.name(), "supervisor");
        assert_eq!(widget.trigger(), "#supervisor");
        assert_eq!(widget.surface(), OptionSurface::Filterable);
        assert_eq!(Widget::multi("p-multiselect").name(), "p-multiselect");
    }
}
