// Shared test helpers
//
// `FakeUi` is a scriptable page: tests describe which selectors are visible,
// what text they hold, and hooks that change the scene when an action runs.
// Every call is recorded so tests can assert on the exact interaction.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;
use trinity_e2e::transform::Row;
use trinity_e2e::ui::BoundingBox;
use trinity_e2e::{
    Actor, Authenticator, CountingSignal, Error, Point, Result, Session, Ui, WorkItem, Workflow,
};

/// Installs a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Builds a fixture row from column/value pairs.
pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<BTreeMap<_, _>>()
}

/// Builds an actor with `count` items whose `n` field is the item index.
pub fn actor(key: &str, count: usize) -> Actor {
    let rows = (0..count).map(|n| row(&[("n", &n.to_string())]));
    Actor::with_credentials(key, "secret", rows)
}

/// The page state a `FakeUi` answers queries from.
#[derive(Default)]
pub struct Scene {
    pub url: String,
    visible: HashSet<String>,
    disabled: HashSet<String>,
    texts: HashMap<String, Vec<String>>,
    attributes: HashMap<(String, String), String>,
    boxes: HashMap<String, BoundingBox>,
    values: HashMap<String, String>,
}

impl Scene {
    pub fn show(&mut self, selector: &str) -> &mut Self {
        self.visible.insert(selector.to_string());
        self
    }

    pub fn hide(&mut self, selector: &str) -> &mut Self {
        self.visible.remove(selector);
        self
    }

    pub fn disable(&mut self, selector: &str) -> &mut Self {
        self.disabled.insert(selector.to_string());
        self
    }

    pub fn enable(&mut self, selector: &str) -> &mut Self {
        self.disabled.remove(selector);
        self
    }

    /// One element matching `selector`, showing `text`.
    pub fn set_text(&mut self, selector: &str, text: &str) -> &mut Self {
        self.texts.insert(selector.to_string(), vec![text.to_string()]);
        self
    }

    /// One element per entry of `texts`.
    pub fn set_texts(&mut self, selector: &str, texts: &[&str]) -> &mut Self {
        self.texts.insert(
            selector.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn clear_texts(&mut self, selector: &str) -> &mut Self {
        self.texts.remove(selector);
        self
    }

    pub fn set_attribute(&mut self, selector: &str, name: &str, value: &str) -> &mut Self {
        self.attributes
            .insert((selector.to_string(), name.to_string()), value.to_string());
        self
    }

    pub fn set_box(&mut self, selector: &str, bbox: BoundingBox) -> &mut Self {
        self.boxes.insert(selector.to_string(), bbox);
        self
    }

    pub fn is_visible(&self, selector: &str) -> bool {
        self.visible.contains(selector)
    }

    /// Last value filled into `selector`.
    pub fn value(&self, selector: &str) -> Option<&str> {
        self.values.get(selector).map(String::as_str)
    }

    fn count(&self, selector: &str) -> usize {
        match self.texts.get(selector) {
            Some(texts) => texts.len(),
            None => usize::from(self.visible.contains(selector)),
        }
    }
}

type Hook = Box<dyn FnMut(&mut Scene) + Send>;

#[derive(Default)]
struct FakeState {
    scene: Scene,
    calls: Vec<String>,
    hooks: HashMap<(String, String), Vec<Hook>>,
    failures: HashSet<(String, String)>,
    signals: HashMap<String, CountingSignal>,
}

/// A scripted `Ui`.
#[derive(Default)]
pub struct FakeUi {
    state: Mutex<FakeState>,
}

impl FakeUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutates the scene directly.
    pub fn scene<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> R {
        f(&mut self.state.lock().scene)
    }

    /// Runs `hook` on the scene every time `action` is performed on `selector`.
    ///
    /// Actions are the `Ui` method names (`click`, `fill`, `press`, ...).
    pub fn on(&self, action: &str, selector: &str, hook: impl FnMut(&mut Scene) + Send + 'static) {
        self.state
            .lock()
            .hooks
            .entry((action.to_string(), selector.to_string()))
            .or_default()
            .push(Box::new(hook));
    }

    /// Makes `action` on `selector` fail.
    pub fn fail_on(&self, action: &str, selector: &str) {
        self.state
            .lock()
            .failures
            .insert((action.to_string(), selector.to_string()));
    }

    /// The signal `watch_loads(pattern)` will return, created on first use.
    pub fn signal(&self, pattern: &str) -> CountingSignal {
        self.state
            .lock()
            .signals
            .entry(pattern.to_string())
            .or_insert_with(|| CountingSignal::new(pattern))
            .clone()
    }

    /// Every recorded call, formatted `action selector[ arg]`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Number of `action` calls on `selector`.
    pub fn count_calls(&self, action: &str, selector: &str) -> usize {
        let prefix = format!("{} {}", action, selector);
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| **c == prefix || c.starts_with(&format!("{} ", prefix)))
            .count()
    }

    pub fn called(&self, action: &str, selector: &str) -> bool {
        self.count_calls(action, selector) > 0
    }

    fn act(&self, action: &str, selector: &str, arg: Option<&str>) -> Result<()> {
        let mut state = self.state.lock();
        let call = match arg {
            Some(arg) => format!("{} {} {}", action, selector, arg),
            None => format!("{} {}", action, selector),
        };
        state.calls.push(call);

        if state
            .failures
            .contains(&(action.to_string(), selector.to_string()))
        {
            return Err(Error::ElementNotFound(selector.to_string()));
        }

        let key = (action.to_string(), selector.to_string());
        if let Some(mut hooks) = state.hooks.remove(&key) {
            for hook in hooks.iter_mut() {
                hook(&mut state.scene);
            }
            state.hooks.insert(key, hooks);
        }
        Ok(())
    }
}

#[async_trait]
impl Ui for FakeUi {
    async fn goto(&self, url: &str) -> Result<()> {
        self.act("goto", url, None)?;
        self.state.lock().scene.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().scene.url.clone())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.act("click", selector, None)
    }

    async fn force_click(&self, selector: &str) -> Result<()> {
        self.act("force_click", selector, None)
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<()> {
        self.act("click_nth", selector, Some(&index.to_string()))
    }

    async fn click_at(&self, selector: &str, _offset: Point) -> Result<()> {
        self.act("click_at", selector, None)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.act("fill", selector, Some(text))?;
        self.state
            .lock()
            .scene
            .values
            .insert(selector.to_string(), text.to_string());
        Ok(())
    }

    async fn press(&self, selector: &str, key: &str) -> Result<()> {
        self.act("press", selector, Some(key))
    }

    async fn blur(&self, selector: &str) -> Result<()> {
        self.act("blur", selector, None)
    }

    async fn set_input_file(&self, selector: &str, path: &Path) -> Result<()> {
        self.act("set_input_file", selector, Some(&path.display().to_string()))
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        Ok(self.state.lock().scene.is_visible(selector))
    }

    async fn is_enabled(&self, selector: &str) -> Result<bool> {
        Ok(!self.state.lock().scene.disabled.contains(selector))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.state.lock().scene.count(selector))
    }

    async fn inner_text(&self, selector: &str) -> Result<String> {
        let state = self.state.lock();
        Ok(state
            .scene
            .texts
            .get(selector)
            .and_then(|t| t.first().cloned())
            .unwrap_or_default())
    }

    async fn all_inner_texts(&self, selector: &str) -> Result<Vec<String>> {
        Ok(self
            .state
            .lock()
            .scene
            .texts
            .get(selector)
            .cloned()
            .unwrap_or_default())
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        Ok(self
            .state
            .lock()
            .scene
            .attributes
            .get(&(selector.to_string(), name.to_string()))
            .cloned())
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.act("scroll_into_view", selector, None)
    }

    async fn bounding_box(&self, selector: &str) -> Result<Option<BoundingBox>> {
        Ok(self.state.lock().scene.boxes.get(selector).copied())
    }

    async fn drag(&self, from: Point, to: Point) -> Result<()> {
        let path = format!("{},{}->{},{}", from.x, from.y, to.x, to.y);
        self.act("drag", "mouse", Some(&path))
    }

    async fn watch_loads(&self, pattern: &str) -> Result<CountingSignal> {
        self.act("watch_loads", pattern, None)?;
        Ok(self.signal(pattern))
    }
}

pub const USERNAME: &str = "input[name=\"username\"]";
pub const PASSWORD: &str = "input[type=\"password\"]";
pub const LOGIN: &str = "button[type='button']";
pub const LOGOUT: &str = "a.bg-red-600";
pub const DIALOG: &str = ".p-dialog";

pub const SELECT_OVERLAY: &str = ".p-select-overlay";
pub const SELECT_FILTER: &str = "input.p-select-filter";
pub const SELECT_OPTIONS: &str = ".p-select-overlay li[role=\"option\"]";
pub const MULTI_OVERLAY: &str = ".p-multiselect-overlay";
pub const MULTI_FILTER: &str = "input.p-multiselect-filter";
pub const MULTI_OPTIONS: &str = ".p-multiselect-overlay li[role=\"option\"]";

/// A login form; submitting it reveals `landing` (as `text=` selectors) and
/// the logout link.
pub fn login_page(landing: &[&str]) -> FakeUi {
    let ui = FakeUi::new();
    ui.scene(|s| {
        s.show(USERNAME).show(PASSWORD);
    });
    let landing: Vec<String> = landing.iter().map(|t| format!("text={}", t)).collect();
    ui.on("click", LOGIN, move |s| {
        for selector in &landing {
            s.show(selector);
        }
        s.show(LOGOUT);
    });
    ui
}

impl FakeUi {
    /// Makes every selector visible.
    pub fn show_all(&self, selectors: &[&str]) {
        self.scene(|s| {
            for selector in selectors {
                s.show(selector);
            }
        });
    }

    /// Scripts single-value dropdowns. Each trigger opens the shared overlay
    /// offering one option; picking it closes the overlay and writes the
    /// option into the trigger's label.
    pub fn dropdowns(&self, fields: &[(&str, &str)]) {
        let open: Arc<Mutex<Option<(String, String)>>> = Arc::default();
        for (trigger, option) in fields {
            let (trigger, option) = (trigger.to_string(), option.to_string());
            self.scene(|s| {
                s.show(&trigger);
            });
            let current = open.clone();
            let opened = trigger.clone();
            self.on("click", &trigger, move |s| {
                s.show(SELECT_OVERLAY)
                    .show(SELECT_FILTER)
                    .set_texts(SELECT_OPTIONS, &[option.as_str()]);
                *current.lock() = Some((opened.clone(), option.clone()));
            });
        }
        self.on("click_nth", SELECT_OPTIONS, move |s| {
            if let Some((trigger, option)) = open.lock().take() {
                s.hide(SELECT_OVERLAY)
                    .hide(SELECT_FILTER)
                    .clear_texts(SELECT_OPTIONS)
                    .set_text(&trigger, &option);
            }
        });
    }

    /// Scripts multi-value dropdowns. The overlay offers `options`, stays open
    /// while picking, and closes on Escape.
    pub fn multiselects(&self, fields: &[(&str, &[&str])]) {
        let open: Arc<Mutex<Option<(String, String)>>> = Arc::default();
        for (trigger, options) in fields {
            let trigger = trigger.to_string();
            let options: Vec<String> = options.iter().map(|o| o.to_string()).collect();
            self.scene(|s| {
                s.show(&trigger);
            });
            let current = open.clone();
            let opened = trigger.clone();
            self.on("click", &trigger, move |s| {
                let texts: Vec<&str> = options.iter().map(String::as_str).collect();
                s.show(MULTI_OVERLAY)
                    .show(MULTI_FILTER)
                    .set_texts(MULTI_OPTIONS, &texts);
                *current.lock() = Some((opened.clone(), options.join(", ")));
            });
        }
        let picked = open.clone();
        self.on("click_nth", MULTI_OPTIONS, move |s| {
            if let Some((trigger, label)) = picked.lock().as_ref() {
                s.set_text(trigger, label);
            }
        });
        self.on("press", "body", move |s| {
            if open.lock().take().is_some() {
                s.hide(MULTI_OVERLAY)
                    .hide(MULTI_FILTER)
                    .clear_texts(MULTI_OPTIONS);
            }
        });
    }

    /// Index of the first recorded call equal to `call`.
    pub fn position(&self, call: &str) -> Option<usize> {
        self.state.lock().calls.iter().position(|c| c == call)
    }
}

/// Shares a `FakeUi` between a test and the code under test.
pub fn shared(ui: FakeUi) -> Arc<FakeUi> {
    Arc::new(ui)
}

/// An authenticator that counts calls and rejects unknown passwords.
#[derive(Default)]
pub struct CountingAuthenticator {
    pub calls: AtomicUsize,
}

impl CountingAuthenticator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for CountingAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Session> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if password != "secret" {
            return Err(Error::AuthenticationFailed {
                username: username.to_string(),
                status: 401,
            });
        }
        Ok(Session {
            username: username.to_string(),
            token: format!("token-{}-{}", username, n),
            user_id: format!("id-{}", username),
        })
    }
}

/// A workflow that records every hook and can fail at a chosen point.
#[derive(Default)]
pub struct RecordingWorkflow {
    pub events: Vec<String>,
    /// `(actor, ordinal)` whose `process_item` fails.
    pub fail_item: Option<(String, usize)>,
    /// Actor whose `begin_actor` fails.
    pub fail_begin: Option<String>,
    /// Time each item was processed, for settle-delay assertions.
    pub item_times: Vec<Instant>,
}

impl RecordingWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(actor: &str, ordinal: usize) -> Self {
        Self {
            fail_item: Some((actor.to_string(), ordinal)),
            ..Self::default()
        }
    }

    /// `actor:ordinal` for each processed item, in order.
    pub fn processed(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| e.strip_prefix("item ").map(String::from))
            .collect()
    }
}

#[async_trait]
impl Workflow for RecordingWorkflow {
    fn name(&self) -> &str {
        "recording"
    }

    async fn begin_actor(&mut self, actor: &Actor) -> Result<()> {
        self.events.push(format!("begin {}", actor.key));
        if self.fail_begin.as_deref() == Some(actor.key.as_str()) {
            return Err(Error::AuthenticationFailed {
                username: actor.key.clone(),
                status: 401,
            });
        }
        Ok(())
    }

    async fn process_item(&mut self, actor: &Actor, item: &WorkItem) -> Result<()> {
        if self.fail_item.as_ref() == Some(&(actor.key.clone(), item.ordinal())) {
            return Err(Error::SubmissionFailed {
                action: "save".into(),
                condition: "dialog is gone".into(),
                attempts: 3,
            });
        }
        self.events
            .push(format!("item {}:{}", actor.key, item.ordinal()));
        self.item_times.push(Instant::now());
        Ok(())
    }

    async fn end_actor(&mut self, actor: &Actor) -> Result<()> {
        self.events.push(format!("end {}", actor.key));
        Ok(())
    }
}
