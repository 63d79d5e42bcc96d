// Contacts attached to existing clients.

use super::{ADD_BUTTON, UiContext, UiLogin, status_code};
use crate::error::Result;
use crate::orchestrator::Workflow;
use crate::submit::PostCondition;
use crate::transform::{Actor, WorkItem};
use crate::ui::{text, with_text};
use crate::widget::{CountingSignal, DataLoadSignal, Widget};
use async_trait::async_trait;
use std::time::Duration;

const DICTIONARIES: &str = "**/gen/find-many";
/// The form's only single-value dropdown, located by its chevron icon.
const LANGUAGE_TRIGGER: &str = ".p-select:has(.p-icon.p-select-dropdown-icon)";

pub struct ClientContactWorkflow {
    ctx: UiContext,
    login: UiLogin,
    dictionaries: Option<CountingSignal>,
}

impl ClientContactWorkflow {
    pub fn new(ctx: UiContext) -> Self {
        Self {
            ctx,
            login: UiLogin::default(),
            dictionaries: None,
        }
    }
}

#[async_trait]
impl Workflow for ClientContactWorkflow {
    fn name(&self) -> &str {
        "client-contacts"
    }

    async fn begin_actor(&mut self, actor: &Actor) -> Result<()> {
        self.ctx.watch(&mut self.dictionaries, DICTIONARIES).await?;
        self.login.login(&self.ctx, &actor.key, actor.password()).await
    }

    async fn process_item(&mut self, _actor: &Actor, item: &WorkItem) -> Result<()> {
        let dictionaries = self.ctx.watch(&mut self.dictionaries, DICTIONARIES).await?;
        let ctx = &self.ctx;
        let client = item.require("clientName")?;
        let first_name = item.require("firstName")?;
        // Contacts only offer two gender radios
        let gender = match item.get("gender").map(str::trim) {
            Some("Male") => "1",
            _ => "2",
        };

        ctx.click_text("Clients").await?;
        ctx.pause(Duration::from_secs(2)).await;
        ctx.fill("input[placeholder*=\"Search\"]", client).await?;
        ctx.ui().click(&with_text("button", "search")).await?;
        ctx.pause(Duration::from_secs(1)).await;
        ctx.click_visible(&text(client)).await?;

        ctx.click_text("Contacts").await?;
        dictionaries.arm(1);
        ctx.click_visible(ADD_BUTTON).await?;
        ctx.await_load("contact form", &dictionaries, ctx.config().data_load_timeout())
            .await?;

        ctx.fill("#firstName", first_name).await?;
        ctx.fill("#lastName", item.require("lastName")?).await?;
        let status = status_code(item.get("status").unwrap_or_default());
        ctx.ui().click(&format!("#statusCt-{}", status)).await?;
        ctx.ui().click(&format!("#genderCt-{}", gender)).await?;

        let language = Widget::plain(LANGUAGE_TRIGGER).named("language");
        ctx.widgets()
            .select(&language, item.require("preferredLanguage")?, None)
            .await?;

        ctx.fill("#workEmail", item.require("workEmail")?).await?;
        ctx.fill("#officePhone", item.require("officePhone")?).await?;

        let save = with_text("button", "Save Changes");
        ctx.visible(&save).await?;
        ctx.submit_until(&save, &PostCondition::visible(text(first_name)))
            .await?;

        ctx.ui().goto(&ctx.config().app_path("home/tr-clients")).await?;
        ctx.pause(Duration::from_secs(2)).await;

        tracing::info!(client, contact = first_name, "client contact created");
        Ok(())
    }

    async fn end_actor(&mut self, _actor: &Actor) -> Result<()> {
        self.login.logout(&self.ctx).await
    }
}
