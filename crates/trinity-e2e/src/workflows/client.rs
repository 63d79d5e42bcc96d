// Client organizations, created from the admin account.

use super::{DIALOG, UiContext, UiLogin, status_code};
use crate::error::Result;
use crate::orchestrator::Workflow;
use crate::submit::PostCondition;
use crate::transform::{Actor, WorkItem};
use crate::ui::{nth, text, with_text};
use crate::widget::{Widget, split_multi};
use async_trait::async_trait;
use std::time::Duration;

const LOGO: &str = "Test_image_640×426.png";

/// Plain text inputs and the fixture column that fills each.
const TEXT_FIELDS: [(&str, &str); 7] = [
    ("#name", "clientName"),
    ("#shortName", "shortName"),
    ("#website", "website"),
    ("#hqAddress", "hqAddress"),
    ("#phone", "phone"),
    ("#emailAddress", "emailAddress"),
    ("#description", "description"),
];

/// Dropdowns without a filter box.
const LIST_FIELDS: [(&str, &str); 3] = [
    ("#clientTypeCt", "clientType"),
    ("#preferredLanguageCt", "preferredLanguage"),
    ("#sourcedBy", "sourcedBy"),
];

pub struct ClientWorkflow {
    ctx: UiContext,
    login: UiLogin,
}

impl ClientWorkflow {
    pub fn new(ctx: UiContext) -> Self {
        Self {
            ctx,
            login: UiLogin::default(),
        }
    }
}

#[async_trait]
impl Workflow for ClientWorkflow {
    fn name(&self) -> &str {
        "clients"
    }

    async fn begin_actor(&mut self, actor: &Actor) -> Result<()> {
        self.login.login(&self.ctx, &actor.key, actor.password()).await
    }

    async fn process_item(&mut self, _actor: &Actor, item: &WorkItem) -> Result<()> {
        let ctx = &self.ctx;
        let widgets = ctx.widgets();
        let name = item.require("clientName")?;

        ctx.click_text("Clients").await?;
        ctx.click_text("Create New Client").await?;
        ctx.visible(DIALOG).await?;

        for (selector, column) in TEXT_FIELDS {
            ctx.fill(selector, item.require(column)?).await?;
        }
        for (selector, column) in LIST_FIELDS {
            let widget = Widget::plain(selector).named(column);
            widgets.select(&widget, item.require(column)?, None).await?;
        }
        widgets
            .select(&Widget::dropdown("#countryCt").named("country"), item.require("country")?, None)
            .await?;

        let sectors = split_multi(item.require("sectors")?);
        widgets
            .select_many(&Widget::multi(nth(".p-multiselect", 0)).named("sectors"), &sectors, None)
            .await?;
        let languages = split_multi(item.require("languages")?);
        widgets
            .select_many(
                &Widget::multi(nth(".p-multiselect", 1)).named("languages"),
                &languages,
                None,
            )
            .await?;

        let status = status_code(item.get("status").unwrap_or_default());
        ctx.ui().click(&format!("#statusCt-{}", status)).await?;
        ctx.upload("input[data-testid=\"logo\"]", LOGO).await?;

        let submit = format!("{} {}", DIALOG, with_text("button", "Create New Client"));
        ctx.visible(&submit).await?;
        ctx.submit_until(&submit, &PostCondition::absent(DIALOG))
            .await?;
        ctx.visible(&text(name)).await?;

        ctx.ui().goto(&ctx.config().app_path("home/tr-clients")).await?;
        ctx.pause(Duration::from_secs(2)).await;

        tracing::info!(client = name, "client created");
        Ok(())
    }

    async fn end_actor(&mut self, _actor: &Actor) -> Result<()> {
        self.login.logout(&self.ctx).await
    }
}
