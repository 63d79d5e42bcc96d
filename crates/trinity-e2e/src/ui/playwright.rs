// Playwright backend for `Ui`
//
// One Chromium browser, one context, one page for the whole run. Operations
// Playwright has no locator method for (blur, scrolling, geometry) run as
// page scripts against a CSS selector with an optional `>> nth=` suffix.

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::ui::{BoundingBox, Point, Ui};
use crate::widget::CountingSignal;
use async_trait::async_trait;
use playwright_rs::LaunchOptions;
use playwright_rs::protocol::{
    Browser, BrowserContextOptions, ClickOptions, Locator, MouseOptions, Page, Playwright,
    Position, Viewport,
};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// A launched browser page driven through Playwright.
pub struct PlaywrightUi {
    // Kept alive for the lifetime of the page
    playwright: Playwright,
    browser: Browser,
    page: Page,
    action_timeout: Duration,
}

impl PlaywrightUi {
    /// Launches Chromium with the configured viewport and opens a page.
    pub async fn launch(config: &RunConfig) -> Result<Self> {
        let playwright = Playwright::launch().await?;
        let browser = playwright
            .chromium()
            .launch_with_options(LaunchOptions::new().headless(config.headless))
            .await?;
        let options = BrowserContextOptions::builder()
            .viewport(Viewport {
                width: config.viewport.width,
                height: config.viewport.height,
            })
            .build();
        let context = browser.new_context_with_options(options).await?;
        let page = context.new_page().await?;

        tracing::info!(
            headless = config.headless,
            width = config.viewport.width,
            height = config.viewport.height,
            "browser launched"
        );
        Ok(Self {
            playwright,
            browser,
            page,
            action_timeout: config.action_timeout(),
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Closes the browser and stops the Playwright server.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        self.playwright.shutdown().await?;
        Ok(())
    }

    async fn first(&self, selector: &str) -> Locator {
        self.page.locator(selector).await.first()
    }

    fn click_options(&self) -> ClickOptions {
        ClickOptions::builder()
            .timeout(self.action_timeout.as_millis() as f64)
            .build()
    }

    async fn eval_on<U>(&self, selector: &str, body: &str) -> Result<U>
    where
        U: serde::de::DeserializeOwned,
    {
        let target = DomTarget::parse(selector);
        let script = format!(
            "(t) => {{ let all; \
             try {{ all = document.querySelectorAll(t.css); }} catch (e) {{ return null; }} \
             const el = t.index < 0 ? all[all.length + t.index] : all[t.index]; \
             {} }}",
            body
        );
        Ok(self.page.evaluate(&script, Some(&target)).await?)
    }
}

/// A CSS selector plus match index, for page scripts.
///
/// Selectors using Playwright-only syntax resolve to no element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct DomTarget {
    css: String,
    index: i32,
}

impl DomTarget {
    fn parse(selector: &str) -> Self {
        match selector.rsplit_once(">> nth=") {
            Some((css, index)) => Self {
                css: css.trim().to_string(),
                index: index.trim().parse().unwrap_or(0),
            },
            None => Self {
                css: selector.trim().to_string(),
                index: 0,
            },
        }
    }
}

#[async_trait]
impl Ui for PlaywrightUi {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url, None)
            .await
            .map_err(|e| Error::from(e).context(format!("navigating to {}", url)))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.first(selector)
            .await
            .click(Some(self.click_options()))
            .await?;
        Ok(())
    }

    async fn force_click(&self, selector: &str) -> Result<()> {
        let options = ClickOptions::builder()
            .force(true)
            .timeout(self.action_timeout.as_millis() as f64)
            .build();
        self.first(selector).await.click(Some(options)).await?;
        Ok(())
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<()> {
        let index = i32::try_from(index)
            .map_err(|_| Error::Config(format!("match index {} out of range", index)))?;
        self.page
            .locator(selector)
            .await
            .nth(index)
            .click(Some(self.click_options()))
            .await?;
        Ok(())
    }

    async fn click_at(&self, selector: &str, offset: Point) -> Result<()> {
        let options = ClickOptions::builder()
            .position(Position {
                x: offset.x,
                y: offset.y,
            })
            .force(true)
            .timeout(self.action_timeout.as_millis() as f64)
            .build();
        self.first(selector).await.click(Some(options)).await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.first(selector).await.fill(text, None).await?;
        Ok(())
    }

    async fn press(&self, selector: &str, key: &str) -> Result<()> {
        self.first(selector).await.press(key, None).await?;
        Ok(())
    }

    async fn blur(&self, selector: &str) -> Result<()> {
        self.eval_on::<Option<bool>>(selector, "if (!el) return false; el.blur(); return true;")
            .await?;
        Ok(())
    }

    async fn set_input_file(&self, selector: &str, path: &Path) -> Result<()> {
        self.first(selector)
            .await
            .set_input_files(&path.to_path_buf(), None)
            .await
            .map_err(|e| Error::from(e).context(format!("uploading {}", path.display())))?;
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        Ok(self.first(selector).await.is_visible().await?)
    }

    async fn is_enabled(&self, selector: &str) -> Result<bool> {
        Ok(self.first(selector).await.is_enabled().await?)
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.page.locator(selector).await.count().await?)
    }

    async fn inner_text(&self, selector: &str) -> Result<String> {
        Ok(self.first(selector).await.inner_text().await?)
    }

    async fn all_inner_texts(&self, selector: &str) -> Result<Vec<String>> {
        let locator = self.page.locator(selector).await;
        let count = locator.count().await?;
        let mut texts = Vec::with_capacity(count);
        for index in 0..count {
            let index = i32::try_from(index)
                .map_err(|_| Error::Config(format!("match index {} out of range", index)))?;
            texts.push(locator.nth(index).inner_text().await?);
        }
        Ok(texts)
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        Ok(self.first(selector).await.get_attribute(name).await?)
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.eval_on::<Option<bool>>(
            selector,
            "if (!el) return false; el.scrollIntoView({block: 'center'}); return true;",
        )
        .await?;
        Ok(())
    }

    async fn bounding_box(&self, selector: &str) -> Result<Option<BoundingBox>> {
        self.eval_on(
            selector,
            "if (!el) return null; const r = el.getBoundingClientRect(); \
             if (r.width === 0 && r.height === 0) return null; \
             return {x: r.x, y: r.y, width: r.width, height: r.height};",
        )
        .await
    }

    async fn drag(&self, from: Point, to: Point) -> Result<()> {
        let mouse = self.page.mouse();
        mouse
            .move_to(from.x.round() as i32, from.y.round() as i32, None)
            .await?;
        mouse.down(None).await?;
        let steps = MouseOptions {
            steps: Some(10),
            ..MouseOptions::default()
        };
        mouse
            .move_to(to.x.round() as i32, to.y.round() as i32, Some(steps))
            .await?;
        mouse.up(None).await?;
        Ok(())
    }

    /// A load is counted when the route hands the request on to the network,
    /// not when its response arrives, and a forwarding error counts as a
    /// failed load. A satisfied signal therefore means the request left the
    /// page; callers still wait for the rendered data they depend on.
    async fn watch_loads(&self, pattern: &str) -> Result<CountingSignal> {
        let signal = CountingSignal::new(pattern);
        let hook = signal.clone();
        self.page
            .route(pattern, move |route| {
                let hook = hook.clone();
                async move {
                    let forwarded = route.continue_(None).await;
                    hook.notify(forwarded.is_ok());
                    forwarded
                }
            })
            .await?;
        tracing::debug!(pattern, "watching loads");
        Ok(signal)
    }
}
