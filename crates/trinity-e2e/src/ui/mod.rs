// UI - Page-level operations the workflows are written against
//
// Selectors use Playwright syntax (CSS plus `:has-text()` and `>> nth=`).
// Every single-element operation acts on the first match.

pub mod expect;
#[cfg(feature = "browser")]
pub mod playwright;

use crate::error::Result;
use crate::widget::CountingSignal;
use async_trait::async_trait;
use std::path::Path;

/// A point in page (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An element's rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Browser operations used by the widget driver and workflows.
///
/// Implemented by [`playwright::PlaywrightUi`] for real runs and by
/// scripted fakes in tests.
#[async_trait]
pub trait Ui: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// Clicks without waiting for actionability (covered or animating elements).
    async fn force_click(&self, selector: &str) -> Result<()>;

    /// Clicks the `index`-th match.
    async fn click_nth(&self, selector: &str, index: usize) -> Result<()>;

    /// Clicks at an offset from the element's top-left corner.
    async fn click_at(&self, selector: &str, offset: Point) -> Result<()>;

    /// Replaces the element's value with `text`.
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    async fn press(&self, selector: &str, key: &str) -> Result<()>;

    /// Removes focus from the element so change handlers run.
    async fn blur(&self, selector: &str) -> Result<()>;

    async fn set_input_file(&self, selector: &str, path: &Path) -> Result<()>;

    /// True when at least one match exists and the first match is visible.
    async fn is_visible(&self, selector: &str) -> Result<bool>;

    async fn is_enabled(&self, selector: &str) -> Result<bool>;

    async fn count(&self, selector: &str) -> Result<usize>;

    async fn inner_text(&self, selector: &str) -> Result<String>;

    /// Rendered text of every match, in document order.
    async fn all_inner_texts(&self, selector: &str) -> Result<Vec<String>>;

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;

    async fn scroll_into_view(&self, selector: &str) -> Result<()>;

    /// `None` when the element is absent or not rendered.
    async fn bounding_box(&self, selector: &str) -> Result<Option<BoundingBox>>;

    /// Presses the primary button at `from`, moves to `to`, and releases.
    async fn drag(&self, from: Point, to: Point) -> Result<()>;

    /// Starts counting requests whose URL matches the glob `pattern`.
    ///
    /// Backends may count a request before its response is received.
    async fn watch_loads(&self, pattern: &str) -> Result<CountingSignal>;
}

/// Selector for the `index`-th match of `selector`.
pub fn nth(selector: &str, index: usize) -> String {
    format!("{} >> nth={}", selector, index)
}

/// Selector for the last match of `selector`.
pub fn last(selector: &str) -> String {
    format!("{} >> nth=-1", selector)
}

/// Selector for the smallest element whose text contains `text`.
pub fn text(text: &str) -> String {
    format!("text={}", text)
}

/// Selector for elements matching `selector` whose text contains `text`.
pub fn with_text(selector: &str, text: &str) -> String {
    format!("{}:has-text(\"{}\")", selector, text.replace('"', "\\\""))
}
