// Timecards written straight to the backend.
//
// Each contractor authenticates once; every entry is an insert call carrying
// that contractor's token and user id.

use crate::api::{ApiClient, TimecardRecord};
use crate::error::Result;
use crate::orchestrator::Workflow;
use crate::session::SessionCache;
use crate::transform::{Actor, WorkItem};
use async_trait::async_trait;

pub struct TimecardApiWorkflow {
    sessions: SessionCache<ApiClient>,
}

impl TimecardApiWorkflow {
    pub fn new(api: ApiClient) -> Self {
        Self {
            sessions: SessionCache::new(api),
        }
    }

    pub fn sessions(&self) -> &SessionCache<ApiClient> {
        &self.sessions
    }
}

#[async_trait]
impl Workflow for TimecardApiWorkflow {
    fn name(&self) -> &str {
        "timecards-api"
    }

    async fn begin_actor(&mut self, actor: &Actor) -> Result<()> {
        self.sessions
            .get_session(&actor.key, actor.password())
            .await?;
        Ok(())
    }

    async fn process_item(&mut self, actor: &Actor, item: &WorkItem) -> Result<()> {
        let session = self
            .sessions
            .get_session(&actor.key, actor.password())
            .await?
            .clone();
        let request = TimecardRecord::from_item(item, &session.user_id)?.into_insert()?;
        self.sessions
            .authenticator()
            .insert(&session.token, &request)
            .await?;

        tracing::info!(
            username = %actor.key,
            date = item.get("date"),
            start = item.get("startTime"),
            end = item.get("endTime"),
            "timecard inserted"
        );
        Ok(())
    }

    async fn end_actor(&mut self, _actor: &Actor) -> Result<()> {
        Ok(())
    }
}
