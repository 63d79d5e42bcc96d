// Exchange-rate currencies, created from the admin account.

use super::{DIALOG, UiContext, UiLogin};
use crate::error::Result;
use crate::orchestrator::Workflow;
use crate::submit::PostCondition;
use crate::transform::{Actor, WorkItem};
use crate::ui::{last, text, with_text};
use async_trait::async_trait;

pub struct CurrencyWorkflow {
    ctx: UiContext,
    login: UiLogin,
}

impl CurrencyWorkflow {
    pub fn new(ctx: UiContext) -> Self {
        Self {
            ctx,
            login: UiLogin::default(),
        }
    }
}

#[async_trait]
impl Workflow for CurrencyWorkflow {
    fn name(&self) -> &str {
        "currencies"
    }

    async fn begin_actor(&mut self, actor: &Actor) -> Result<()> {
        self.login.login(&self.ctx, &actor.key, actor.password()).await
    }

    async fn process_item(&mut self, _actor: &Actor, item: &WorkItem) -> Result<()> {
        let ctx = &self.ctx;
        let rate = item.require("Rate")?;
        let code = item.require("Currency")?;

        ctx.click_text("Exchange Rates").await?;
        ctx.pause(ctx.config().step_pause()).await;
        ctx.ui()
            .force_click(&with_text("button", "Add New Currency"))
            .await?;
        ctx.visible(DIALOG).await?;

        ctx.fill(&last(&format!("{} input[name='rate']", DIALOG)), rate)
            .await?;
        let code_input = last(&format!("{} input[type='text']", DIALOG));
        ctx.fill(&code_input, code).await?;
        ctx.ui().blur(&code_input).await?;

        let save = format!("{} {}", DIALOG, with_text("button", "Save rate"));
        ctx.submit_until(&save, &PostCondition::absent(DIALOG))
            .await?;
        ctx.visible(&text(code)).await?;

        tracing::info!(currency = code, rate, "currency created");
        Ok(())
    }

    async fn end_actor(&mut self, _actor: &Actor) -> Result<()> {
        self.login.logout(&self.ctx).await
    }
}
