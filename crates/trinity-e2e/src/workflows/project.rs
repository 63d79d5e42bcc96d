// Projects linking a client, a contact and two managers.

use super::{ADD_BUTTON, DIALOG, UiContext, UiLogin};
use crate::error::Result;
use crate::orchestrator::Workflow;
use crate::submit::PostCondition;
use crate::transform::{Actor, WorkItem};
use crate::ui::{text, with_text};
use crate::widget::Widget;
use async_trait::async_trait;
use std::time::Duration;

/// A project detail page, not the list itself.
const DETAIL_URL: &str = r"/tr-projects/[^/?#]+";

/// Filterable dropdowns after the status field, with their fixture columns.
const LINKS: [(&str, &str); 5] = [
    ("#organizationId", "clientName"),
    ("#contactId", "contactName"),
    ("#internalManagerUserId", "internalManager"),
    ("#accountManagerUserId", "accountManager"),
    ("#mainLanguageCt", "mainLanguage"),
];

pub struct ProjectWorkflow {
    ctx: UiContext,
    login: UiLogin,
    detail_page: PostCondition,
}

impl ProjectWorkflow {
    pub fn new(ctx: UiContext) -> Result<Self> {
        Ok(Self {
            ctx,
            login: UiLogin::default(),
            detail_page: PostCondition::url_matches(DETAIL_URL)?,
        })
    }
}

#[async_trait]
impl Workflow for ProjectWorkflow {
    fn name(&self) -> &str {
        "projects"
    }

    async fn begin_actor(&mut self, actor: &Actor) -> Result<()> {
        self.login.login(&self.ctx, &actor.key, actor.password()).await
    }

    async fn process_item(&mut self, _actor: &Actor, item: &WorkItem) -> Result<()> {
        let ctx = &self.ctx;
        let widgets = ctx.widgets();
        let name = item.require("projectName")?;

        ctx.click_text("Projects").await?;
        ctx.pause(Duration::from_secs(2)).await;
        ctx.click_visible(ADD_BUTTON).await?;
        ctx.visible(DIALOG).await?;

        ctx.fill("#code", item.require("projectCode")?).await?;
        ctx.fill("#name", name).await?;
        ctx.fill_date("input[name='startDate']", item.require("startDate")?, "body")
            .await?;

        widgets
            .select(
                &Widget::dropdown("#typeProjectCt").named("project type"),
                item.require("projectType")?,
                None,
            )
            .await?;
        ctx.fill("#description", item.require("description")?).await?;

        let status = widgets
            .select_first(&Widget::plain("#statusCt").named("status"))
            .await?;
        tracing::debug!(%status, "project status chosen");

        for (selector, column) in LINKS {
            let widget = Widget::dropdown(selector).named(column);
            widgets.select(&widget, item.require(column)?, None).await?;
        }

        let submit = format!("{} {}", DIALOG, with_text("button", "Create New Project"));
        ctx.submit_until(&submit, &self.detail_page).await?;
        ctx.visible(&text(name)).await?;

        ctx.ui().goto(&ctx.config().app_path("home/tr-projects")).await?;
        ctx.pause(Duration::from_secs(2)).await;

        tracing::info!(project = name, "project created");
        Ok(())
    }

    async fn end_actor(&mut self, _actor: &Actor) -> Result<()> {
        self.login.logout(&self.ctx).await
    }
}
