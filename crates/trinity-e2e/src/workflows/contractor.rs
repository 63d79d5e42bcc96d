// Contractor accounts, created from the admin account.

use super::{ADD_BUTTON, DIALOG, UiContext, UiLogin, await_url, gender_code};
use crate::error::Result;
use crate::orchestrator::Workflow;
use crate::submit::PostCondition;
use crate::transform::{Actor, WorkItem};
use crate::ui::{nth, text, with_text};
use crate::widget::{CountingSignal, DataLoadSignal, Widget, split_multi};
use async_trait::async_trait;
use std::time::Duration;

const DICTIONARIES: &str = "**/gen/find-many";
const USERS: &str = "**/user/find-many";
const DEFAULT_PASSWORD: &str = "Sample123.";
const TOAST: &str = ".p-toast-message";

pub struct ContractorWorkflow {
    ctx: UiContext,
    login: UiLogin,
    dictionaries: Option<CountingSignal>,
    users: Option<CountingSignal>,
}

impl ContractorWorkflow {
    pub fn new(ctx: UiContext) -> Self {
        Self {
            ctx,
            login: UiLogin::default(),
            dictionaries: None,
            users: None,
        }
    }

    async fn open_form(&mut self) -> Result<()> {
        let dictionaries = self.ctx.watch(&mut self.dictionaries, DICTIONARIES).await?;
        let users = self.ctx.watch(&mut self.users, USERS).await?;
        let ctx = &self.ctx;

        ctx.click_text("Contractors").await?;
        await_url(ctx, "tr-contractors").await?;
        ctx.visible("table").await?;

        dictionaries.arm(1);
        users.arm(1);
        ctx.click_visible(ADD_BUTTON).await?;
        ctx.visible(DIALOG).await?;
        let timeout = ctx.config().data_load_timeout();
        ctx.await_load("contractor form", &dictionaries, timeout)
            .await?;
        ctx.await_load("contractor form", &users, timeout).await?;

        ctx.ui()
            .force_click(&format!("{} >> {}", DIALOG, text("Active")))
            .await
    }
}

#[async_trait]
impl Workflow for ContractorWorkflow {
    fn name(&self) -> &str {
        "contractors"
    }

    async fn begin_actor(&mut self, actor: &Actor) -> Result<()> {
        let dictionaries = self.ctx.watch(&mut self.dictionaries, DICTIONARIES).await?;
        dictionaries.arm(2);
        self.login
            .login(&self.ctx, &actor.key, actor.password())
            .await?;
        self.ctx
            .await_load("home", &dictionaries, Duration::from_secs(15))
            .await
    }

    async fn process_item(&mut self, _actor: &Actor, item: &WorkItem) -> Result<()> {
        let first_name = item.require("firstName")?;
        let gender = gender_code(item.require("gender")?)?;
        self.ctx.pause(self.ctx.config().submit_settle()).await;
        self.open_form().await?;

        let ctx = &self.ctx;
        let widgets = ctx.widgets();

        ctx.fill("#firstName", first_name).await?;
        ctx.fill("#lastName", item.require("lastName")?).await?;
        ctx.ui().click(&format!("#genderCt-{}", gender)).await?;

        widgets
            .select(&Widget::dropdown("#preferredLanCt").named("language"), "English", None)
            .await?;
        widgets
            .select(
                &Widget::dropdown("#supervisor").named("supervisor").exact(),
                item.require("supervisor")?,
                None,
            )
            .await?;
        widgets
            .select(&Widget::dropdown("#countryCt").named("country"), item.require("country")?, None)
            .await?;
        widgets
            .select(&Widget::dropdown("#timezoneCt").named("timezone"), item.require("timezone")?, None)
            .await?;

        ctx.fill("#username", item.require("username")?).await?;
        ctx.fill("#password input", DEFAULT_PASSWORD).await?;
        ctx.fill("#confirmPassword input", DEFAULT_PASSWORD).await?;

        let roles = split_multi(item.require("role")?);
        widgets
            .select_many(&Widget::multi(nth("p-multiselect", 1)).named("roles"), &roles, None)
            .await?;

        ctx.fill_date("input[name='birthDate']", item.require("birthDate")?, "body")
            .await?;

        ctx.fill("#address", item.require("address")?).await?;
        ctx.fill("#officeEmail", item.require("officeEmail")?).await?;
        ctx.fill("#email", item.require("personalEmail")?).await?;
        let whatsapp = item.require("whatsapp")?;
        ctx.fill("#whatsapp", whatsapp).await?;
        ctx.fill("#phone", whatsapp).await?;

        ctx.gone(TOAST, ctx.config().action_timeout()).await?;
        ctx.pause(Duration::from_secs(2)).await;

        let submit = with_text("button.btn-primary", "Create New Contractor");
        ctx.submit_until(&submit, &PostCondition::url_contains("/info"))
            .await?;
        ctx.visible(&text(first_name)).await?;

        tracing::info!(username = item.get("username"), "contractor created");
        Ok(())
    }

    async fn end_actor(&mut self, _actor: &Actor) -> Result<()> {
        self.login.logout(&self.ctx).await
    }
}
