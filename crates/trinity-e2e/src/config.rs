// Run configuration
//
// Defaults, then an optional JSON file, then environment overrides.

use crate::error::{Error, Result};
use crate::orchestrator::Orchestrator;
use crate::submit::SubmitLoop;
use crate::widget::WidgetTimeouts;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Login credentials for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Browser viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

/// Bounded waits, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Timeouts {
    pub action_ms: u64,
    pub surface_ms: u64,
    pub data_load_ms: u64,
    pub navigation_ms: u64,
    pub submit_confirm_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action_ms: 10_000,
            surface_ms: 15_000,
            data_load_ms: 20_000,
            navigation_ms: 20_000,
            submit_confirm_ms: 60_000,
        }
    }
}

/// Fixed settle pauses, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Delays {
    /// Pause after each work item before the next one starts
    pub item_settle_ms: u64,
    /// Pause after each submit click before the post-condition is checked
    pub submit_settle_ms: u64,
    /// Pause after typing into a dropdown filter
    pub filter_settle_ms: u64,
    /// Pause after login so initial data can load
    pub login_settle_ms: u64,
    /// Short pause between repeated UI steps (week navigation, drags)
    pub step_pause_ms: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            item_settle_ms: 2_000,
            submit_settle_ms: 4_000,
            filter_settle_ms: 500,
            login_settle_ms: 3_000,
            step_pause_ms: 500,
        }
    }
}

/// Everything a run needs to know about the deployment and its pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunConfig {
    /// Frontend URL the browser logs in to
    pub app_url: String,
    /// Backend base URL for API-mode workflows
    pub api_url: String,
    /// Value sent as `Origin`/`Referer` on API calls
    pub frontend_origin: String,
    /// Account used by admin-driven workflows
    pub admin: Credentials,
    /// Directory holding fixture files and upload artifacts
    pub fixtures_dir: PathBuf,
    pub viewport: ViewportSize,
    pub headless: bool,
    pub timeouts: Timeouts,
    pub delays: Delays,
    pub submit_attempts: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            app_url: "http://154.38.173.164:6980".into(),
            api_url: "https://trinity2-qa-backend.tutatordev.com".into(),
            frontend_origin: "https://trinity2-qa-frontend.tutatordev.com".into(),
            admin: Credentials {
                username: "admin".into(),
                password: "sample".into(),
            },
            fixtures_dir: PathBuf::from("fixtures"),
            viewport: ViewportSize {
                width: 1920,
                height: 1080,
            },
            headless: true,
            timeouts: Timeouts::default(),
            delays: Delays::default(),
            submit_attempts: 3,
        }
    }
}

impl RunConfig {
    /// Loads defaults, overlays `path` when given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| Error::from(e).context(format!("reading {}", path.display())))?;
                serde_json::from_str(&text)
                    .map_err(|e| Error::from(e).context(format!("parsing {}", path.display())))?
            }
            None => RunConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `TRINITY_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TRINITY_APP_URL") {
            self.app_url = v;
        }
        if let Some(v) = lookup("TRINITY_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("TRINITY_FRONTEND_ORIGIN") {
            self.frontend_origin = v;
        }
        if let Some(v) = lookup("TRINITY_ADMIN_USER") {
            self.admin.username = v;
        }
        if let Some(v) = lookup("TRINITY_ADMIN_PASSWORD") {
            self.admin.password = v;
        }
        if let Some(v) = lookup("TRINITY_FIXTURES_DIR") {
            self.fixtures_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("TRINITY_HEADLESS") {
            self.headless = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(Error::Config(format!(
                        "TRINITY_HEADLESS must be true or false, got '{}'",
                        other
                    )));
                }
            };
        }
        Ok(())
    }

    /// Rejects settings that would make every run fail.
    pub fn validate(&self) -> Result<()> {
        if self.submit_attempts == 0 {
            return Err(Error::Config("submitAttempts must be at least 1".into()));
        }
        url::Url::parse(&self.app_url)
            .map_err(|e| Error::Config(format!("appUrl '{}': {}", self.app_url, e)))?;
        url::Url::parse(&self.api_url)
            .map_err(|e| Error::Config(format!("apiUrl '{}': {}", self.api_url, e)))?;
        Ok(())
    }

    /// App URL joined with a path such as `home/tr-clients`.
    pub fn app_path(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.app_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn submit_loop(&self) -> SubmitLoop {
        SubmitLoop::new(
            self.submit_attempts,
            Duration::from_millis(self.delays.submit_settle_ms),
        )
    }

    pub fn widget_timeouts(&self) -> WidgetTimeouts {
        WidgetTimeouts {
            interactable: Duration::from_millis(self.timeouts.action_ms),
            surface: Duration::from_millis(self.timeouts.surface_ms),
            data_load: Duration::from_millis(self.timeouts.data_load_ms),
            filter_settle: Duration::from_millis(self.delays.filter_settle_ms),
            ..WidgetTimeouts::default()
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(Duration::from_millis(self.delays.item_settle_ms))
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.action_ms)
    }

    pub fn surface_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.surface_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.navigation_ms)
    }

    pub fn submit_confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.submit_confirm_ms)
    }

    pub fn step_pause(&self) -> Duration {
        Duration::from_millis(self.delays.step_pause_ms)
    }

    pub fn login_settle(&self) -> Duration {
        Duration::from_millis(self.delays.login_settle_ms)
    }

    pub fn submit_settle(&self) -> Duration {
        Duration::from_millis(self.delays.submit_settle_ms)
    }

    pub fn data_load_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.data_load_ms)
    }
}
