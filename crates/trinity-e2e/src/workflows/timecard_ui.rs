// Timecards drawn on the weekly calendar.
//
// The calendar is moved to the entry's week, a time range is dragged out in
// the day's column, and the resulting "Add Work Hours" dialog is filled in.

use super::{DIALOG, UiContext, UiLogin, icon};
use crate::dates::{duration_label, monday_of_week, parse_iso_date, subtract_minutes, weeks_between};
use crate::error::{Error, Result};
use crate::orchestrator::Workflow;
use crate::submit::PostCondition;
use crate::transform::{Actor, WorkItem};
use crate::ui::expect::expect;
use crate::ui::{BoundingBox, Point, with_text};
use crate::widget::Widget;
use async_trait::async_trait;
use std::time::Duration;

const CALENDAR_BODY: &str = ".fc-timegrid-body";
const WEEK_HEADER: &str = "th[role=\"columnheader\"][data-date]";
/// Slots are 15 minutes; dragging to the slot before the end time covers it.
const SLOT_MINUTES: i64 = 15;

fn day_column(date: &str) -> String {
    format!(".fc-timegrid-col[data-date=\"{}\"]", date)
}

fn slot(time: &str) -> String {
    format!("td.fc-timegrid-slot-lane[data-time=\"{}:00\"]", time)
}

pub struct TimecardUiWorkflow {
    ctx: UiContext,
    login: UiLogin,
}

impl TimecardUiWorkflow {
    pub fn new(ctx: UiContext) -> Self {
        Self {
            ctx,
            login: UiLogin::opening("My Timecard", CALENDAR_BODY),
        }
    }

    /// Clicks the week chevrons until the calendar shows `date`'s week.
    async fn show_week(&self, date: &str) -> Result<()> {
        let ctx = &self.ctx;
        let target = monday_of_week(parse_iso_date(date)?);
        ctx.visible(WEEK_HEADER).await?;
        let shown = ctx
            .ui()
            .attribute(WEEK_HEADER, "data-date")
            .await?
            .ok_or_else(|| Error::ElementNotFound(WEEK_HEADER.to_string()))?;
        let current = monday_of_week(parse_iso_date(&shown)?);

        let weeks = weeks_between(current, target);
        if weeks == 0 {
            return Ok(());
        }
        let chevron = icon(if weeks > 0 { "chevron_right" } else { "chevron_left" });
        for _ in 0..weeks.unsigned_abs() {
            ctx.ui().click(&chevron).await?;
            ctx.pause(ctx.config().step_pause()).await;
        }
        tracing::debug!(weeks, %target, "calendar moved");
        ctx.pause(Duration::from_secs(1)).await;
        Ok(())
    }

    async fn geometry(&self, selector: &str) -> Result<BoundingBox> {
        self.ctx
            .ui()
            .bounding_box(selector)
            .await?
            .ok_or_else(|| Error::ElementNotFound(selector.to_string()))
    }

    /// Drags from the start slot to the last slot before `end`.
    async fn draw_range(&self, date: &str, start: &str, end: &str) -> Result<()> {
        let ctx = &self.ctx;
        let start_slot = slot(start);
        let end_slot = slot(&subtract_minutes(end, SLOT_MINUTES)?);

        ctx.ui().scroll_into_view(&start_slot).await?;
        ctx.visible(&start_slot).await?;
        ctx.pause(ctx.config().step_pause()).await;

        let column = self.geometry(&day_column(date)).await?;
        let from = self.geometry(&start_slot).await?;
        let to = self.geometry(&end_slot).await?;
        let x = column.center_x();
        ctx.ui()
            .drag(Point::new(x, from.center_y()), Point::new(x, to.center_y()))
            .await?;
        ctx.pause(Duration::from_millis(1500)).await;
        Ok(())
    }
}

#[async_trait]
impl Workflow for TimecardUiWorkflow {
    fn name(&self) -> &str {
        "timecards"
    }

    async fn begin_actor(&mut self, actor: &Actor) -> Result<()> {
        self.login.login(&self.ctx, &actor.key, actor.password()).await
    }

    async fn process_item(&mut self, _actor: &Actor, item: &WorkItem) -> Result<()> {
        let date = item.require("date")?;
        let start = item.require("startTime")?;
        let end = item.require("endTime")?;
        let work_type = item.require("workType")?;
        let duration = duration_label(start, end)?;

        self.show_week(date).await?;
        let ctx = &self.ctx;
        expect(ctx.ui(), &day_column(date)).to_exist().await?;
        self.draw_range(date, start, end).await?;

        expect(ctx.ui(), DIALOG)
            .with_timeout(ctx.config().navigation_timeout())
            .to_be_visible()
            .await?;
        expect(ctx.ui(), DIALOG).to_contain_text("Add Work Hours").await?;
        ctx.pause(Duration::from_secs(2)).await;
        expect(ctx.ui(), DIALOG).to_contain_text(start).await?;
        expect(ctx.ui(), DIALOG).to_contain_text(&duration).await?;

        ctx.click_visible(&format!("{} {}", DIALOG, with_text("label", work_type)))
            .await?;
        ctx.pause(Duration::from_secs(1)).await;
        if let Some(project) = item.non_empty("project").filter(|_| work_type == "Project") {
            let widget = Widget::dropdown("#projectId").named("project");
            ctx.widgets().select(&widget, project, None).await?;
        }

        ctx.ui().force_click(".p-dialog-title").await?;
        ctx.pause(ctx.config().step_pause()).await;
        let task = format!("{} {}", DIALOG, with_text("label", item.require("taskType")?));
        ctx.ui().scroll_into_view(&task).await?;
        ctx.click_visible(&task).await?;
        ctx.fill(
            &format!("{} #description", DIALOG),
            item.get("description").unwrap_or_default(),
        )
        .await?;

        let save = with_text("button", "Save Hours");
        ctx.ui().scroll_into_view(&save).await?;
        ctx.visible(&save).await?;
        ctx.submit_until(&save, &PostCondition::absent(DIALOG))
            .await?;
        ctx.pause(Duration::from_secs(2)).await;

        tracing::info!(date, start, end, %duration, "timecard drawn");
        Ok(())
    }

    async fn end_actor(&mut self, _actor: &Actor) -> Result<()> {
        self.login.logout(&self.ctx).await
    }
}
