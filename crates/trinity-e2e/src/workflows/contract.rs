// Contracts attached to existing contractors.
//
// Each row names the contractor by its search term and table label. The
// contract document is uploaded from the fixtures directory.

use super::{DIALOG, UiContext, UiLogin, icon};
use crate::dates::ui_date;
use crate::error::Result;
use crate::orchestrator::Workflow;
use crate::submit::PostCondition;
use crate::transform::{Actor, WorkItem};
use crate::ui::expect::expect;
use crate::ui::{text, with_text};
use crate::widget::{CountingSignal, DataLoadSignal, Widget};
use async_trait::async_trait;
use std::time::Duration;

const CONTRACTORS: &str = "**/user/get-paginated";
const CREATE_CONTRACT: &str = "**/gen/insert-contract";
const DEFAULT_DOCUMENT: &str = "testDoc.txt";
const DIALOG_HEADER: &str = ".p-dialog-header";

pub struct ContractWorkflow {
    ctx: UiContext,
    login: UiLogin,
    contractors: Option<CountingSignal>,
    create: Option<CountingSignal>,
}

impl ContractWorkflow {
    pub fn new(ctx: UiContext) -> Self {
        Self {
            ctx,
            login: UiLogin::default(),
            contractors: None,
            create: None,
        }
    }

    async fn open_contractor(&mut self, search: &str, name: &str) -> Result<()> {
        let contractors = self.ctx.watch(&mut self.contractors, CONTRACTORS).await?;
        let ctx = &self.ctx;

        ctx.click_text("Contractors").await?;
        ctx.fill("input[placeholder=\"Search\"]", search).await?;
        contractors.arm(1);
        ctx.ui().click(&icon("search")).await?;
        ctx.await_load("contractor search", &contractors, Duration::from_secs(30))
            .await?;
        ctx.gone(&text("Loading Data"), ctx.config().navigation_timeout())
            .await?;
        ctx.pause(Duration::from_secs(2)).await;

        ctx.click_visible(&with_text("td.ng-star-inserted", name))
            .await
    }
}

#[async_trait]
impl Workflow for ContractWorkflow {
    fn name(&self) -> &str {
        "contracts"
    }

    async fn begin_actor(&mut self, actor: &Actor) -> Result<()> {
        self.login.login(&self.ctx, &actor.key, actor.password()).await
    }

    async fn process_item(&mut self, _actor: &Actor, item: &WorkItem) -> Result<()> {
        let start = ui_date(item.require("startDate")?)?;
        let rate = item.require("rate")?.replace(',', ".");
        self.open_contractor(item.require("searchName")?, item.require("contractorName")?)
            .await?;
        let create = self.ctx.watch(&mut self.create, CREATE_CONTRACT).await?;

        let ctx = &self.ctx;
        let widgets = ctx.widgets();
        ctx.click_text("Contracts").await?;
        ctx.ui().force_click(&text("Add New Contract")).await?;
        ctx.visible(DIALOG).await?;

        ctx.fill("input[name=\"rateHour\"]", &rate).await?;
        ctx.ui().click("#typeContractCt-1").await?;

        widgets
            .select(&Widget::plain("#currencyCt").named("currency"), item.require("currency")?, None)
            .await?;
        widgets
            .select(
                &Widget::dropdown("#timezoneCt").named("timezone"),
                item.require("timezoneSearch")?,
                None,
            )
            .await?;
        widgets
            .select(&Widget::dropdown("#areaCt").named("area"), item.require("areaSearch")?, None)
            .await?;
        widgets
            .select(&Widget::dropdown("#positionCt").named("position"), item.require("position")?, None)
            .await?;

        ctx.fill_date("input[name=\"startDate\"]", item.require("startDate")?, DIALOG_HEADER)
            .await?;
        ctx.fill_date(
            "input[name=\"finishDate\"]",
            item.get("finishDate").unwrap_or_default(),
            DIALOG_HEADER,
        )
        .await?;

        let document = item.non_empty("documentFile").unwrap_or(DEFAULT_DOCUMENT);
        ctx.upload("input[data-testid=\"document\"]", document).await?;

        let submit = with_text("button", "Create New Contract");
        expect(ctx.ui(), &submit).to_be_interactable().await?;
        create.arm(1);
        ctx.submit_until(&submit, &PostCondition::absent(DIALOG))
            .await?;
        ctx.await_load("contract submit", &create, ctx.config().submit_confirm_timeout())
            .await?;
        ctx.visible(&text(&start)).await?;
        ctx.pause(Duration::from_secs(2)).await;

        tracing::info!(contractor = item.get("contractorName"), start = %start, "contract created");
        Ok(())
    }

    async fn end_actor(&mut self, _actor: &Actor) -> Result<()> {
        self.login.logout(&self.ctx).await
    }
}
