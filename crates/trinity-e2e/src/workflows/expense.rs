// Expenses, created by each contractor from their own account.

use super::{DIALOG, UiContext, UiLogin};
use crate::error::Result;
use crate::orchestrator::Workflow;
use crate::submit::PostCondition;
use crate::transform::{Actor, WorkItem};
use crate::ui::expect::expect;
use crate::ui::with_text;
use crate::widget::Widget;
use async_trait::async_trait;
use std::time::Duration;

pub struct ExpenseWorkflow {
    ctx: UiContext,
    login: UiLogin,
}

impl ExpenseWorkflow {
    pub fn new(ctx: UiContext) -> Self {
        Self {
            ctx,
            login: UiLogin::landing("My expenses"),
        }
    }
}

#[async_trait]
impl Workflow for ExpenseWorkflow {
    fn name(&self) -> &str {
        "expenses"
    }

    async fn begin_actor(&mut self, actor: &Actor) -> Result<()> {
        self.login.login(&self.ctx, &actor.key, actor.password()).await
    }

    async fn process_item(&mut self, _actor: &Actor, item: &WorkItem) -> Result<()> {
        let ctx = &self.ctx;
        let widgets = ctx.widgets();

        ctx.click_text("My expenses").await?;
        ctx.pause(Duration::from_secs(4)).await;
        ctx.click_visible(&with_text("button", "Create new")).await?;
        expect(ctx.ui(), DIALOG)
            .with_timeout(ctx.config().surface_timeout())
            .to_be_visible()
            .await?;

        ctx.fill_date("input[name='date']", item.require("date")?, "body")
            .await?;
        ctx.pause(ctx.config().step_pause()).await;

        widgets
            .select(&Widget::dropdown("#projectCt").named("project"), item.require("project")?, None)
            .await?;
        widgets
            .select(&Widget::dropdown("#categoryCt").named("category"), item.require("category")?, None)
            .await?;
        ctx.fill("#description", item.require("description")?).await?;
        widgets
            .select(&Widget::dropdown("#currencyCt").named("currency"), item.require("currency")?, None)
            .await?;
        ctx.fill("#amount", item.require("amount")?).await?;
        ctx.fill("input[name='fee']", item.require("fee")?).await?;

        let submit = format!("{} {}", DIALOG, with_text("button", "Create New Expense"));
        expect(ctx.ui(), &submit).to_be_interactable().await?;
        ctx.submit_until(&submit, &PostCondition::absent(DIALOG))
            .await?;

        tracing::info!(date = item.get("date"), amount = item.get("amount"), "expense created");
        Ok(())
    }

    async fn end_actor(&mut self, _actor: &Actor) -> Result<()> {
        self.login.logout(&self.ctx).await
    }
}
