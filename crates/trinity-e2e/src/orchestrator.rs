// Orchestrator - Sequential, resumable processing of actors and their items
//
// Actors run in input order from the resume point. The first failure halts
// the run and reports where it stopped so the next run can resume there.

use crate::error::{Error, Result};
use crate::transform::{Actor, WorkItem};
use async_trait::async_trait;
use std::time::Duration;

/// The per-record behavior driven by the orchestrator.
#[async_trait]
pub trait Workflow: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Prepares to act as `actor` (UI login or credential fetch).
    async fn begin_actor(&mut self, actor: &Actor) -> Result<()>;

    /// Creates the record described by `item`.
    async fn process_item(&mut self, actor: &Actor, item: &WorkItem) -> Result<()>;

    /// Releases the actor (UI logout). Not called after the final actor.
    async fn end_actor(&mut self, actor: &Actor) -> Result<()>;
}

/// Where a run starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumePoint {
    /// Key of the first actor to process; `None` starts at the first actor.
    pub actor_key: Option<String>,
    /// Item index to start at within the first processed actor.
    pub row: usize,
}

impl ResumePoint {
    pub fn new(actor_key: Option<String>, row: usize) -> Self {
        Self { actor_key, row }
    }

    pub fn at(actor_key: impl Into<String>, row: usize) -> Self {
        Self {
            actor_key: Some(actor_key.into()),
            row,
        }
    }

    /// Reads `START_CONTRACTOR` and `START_ROW` through `lookup`.
    ///
    /// Blank values are ignored; an unparsable row is a configuration error.
    pub fn from_env<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let actor_key = lookup("START_CONTRACTOR").filter(|v| !v.trim().is_empty());
        let row = match lookup("START_ROW").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("START_ROW must be a row index, got '{}'", raw)))?,
            None => 0,
        };
        Ok(Self { actor_key, row })
    }
}

/// Counts reported by a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub actors_processed: usize,
    pub items_processed: usize,
    /// Actors before the resume point.
    pub actors_skipped: usize,
}

/// Index of the actor whose key equals `key`.
///
/// Returns 0 when `key` is `None` or matches no actor; an unknown key is
/// logged as a warning.
pub fn resolve_start(actors: &[Actor], key: Option<&str>) -> usize {
    let Some(key) = key else {
        return 0;
    };
    match actors.iter().position(|a| a.key == key) {
        Some(index) => index,
        None => {
            tracing::warn!(key, "resume actor not found, starting from the first actor");
            0
        }
    }
}

/// Drives a workflow over a list of actors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orchestrator {
    item_settle: Duration,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

impl Orchestrator {
    pub fn new(item_settle: Duration) -> Self {
        Self { item_settle }
    }

    /// Runs `workflow` over `actors` starting at `resume`.
    ///
    /// Fails with `RunHalted` naming the actor and absolute item index of the
    /// first error. Errors from `begin_actor`/`end_actor` report the row the
    /// actor would have started or ended at.
    pub async fn run(
        &self,
        workflow: &mut dyn Workflow,
        actors: &[Actor],
        resume: &ResumePoint,
    ) -> Result<RunSummary> {
        let start = resolve_start(actors, resume.actor_key.as_deref());
        let mut summary = RunSummary {
            actors_skipped: start,
            ..RunSummary::default()
        };
        let name = workflow.name().to_string();
        tracing::info!(
            workflow = %name,
            actors = actors.len(),
            start_actor = start,
            start_row = resume.row,
            "run starting"
        );

        for (index, actor) in actors.iter().enumerate().skip(start) {
            let first_row = if index == start { resume.row } else { 0 };
            let halted = |row: usize, source: Error| Error::RunHalted {
                actor: actor.key.clone(),
                row,
                source: Box::new(source),
            };

            tracing::info!(
                workflow = %name,
                actor = %actor.key,
                items = actor.items.len(),
                first_row,
                "actor starting"
            );
            workflow
                .begin_actor(actor)
                .await
                .map_err(|e| halted(first_row, e))?;

            for item in actor.items.iter().skip(first_row) {
                workflow
                    .process_item(actor, item)
                    .await
                    .map_err(|e| halted(item.ordinal(), e))?;
                summary.items_processed += 1;
                tracing::info!(
                    workflow = %name,
                    actor = %actor.key,
                    row = item.ordinal(),
                    total = actor.items.len(),
                    "item done"
                );
                tokio::time::sleep(self.item_settle).await;
            }

            summary.actors_processed += 1;
            if index + 1 < actors.len() {
                workflow
                    .end_actor(actor)
                    .await
                    .map_err(|e| halted(actor.items.len(), e))?;
            }
        }

        tracing::info!(
            workflow = %name,
            actors = summary.actors_processed,
            items = summary.items_processed,
            skipped = summary.actors_skipped,
            "run complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    fn actors(keys: &[&str]) -> Vec<Actor> {
        keys.iter()
            .map(|k| Actor::single(*k, BTreeMap::new(), Vec::new()))
            .collect()
    }

    #[test]
    fn test_resolve_start() {
        let list = actors(&["A1", "A2", "A3"]);
        assert_eq!(resolve_start(&list, None), 0);
        assert_eq!(resolve_start(&list, Some("A3")), 2);
        assert_eq!(resolve_start(&list, Some("nobody")), 0);
        assert_eq!(resolve_start(&[], Some("A1")), 0);
    }

    #[test]
    fn test_resume_from_env() {
        let env: HashMap<&str, &str> = [("START_CONTRACTOR", "Omar"), ("START_ROW", "50")]
            .into_iter()
            .collect();
        let resume = ResumePoint::from_env(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(resume, ResumePoint::at("Omar", 50));

        let empty = ResumePoint::from_env(|_| Some(" ".to_string())).unwrap();
        assert_eq!(empty, ResumePoint::default());

        let bad = ResumePoint::from_env(|k| (k == "START_ROW").then(|| "ten".to_string()));
        assert!(matches!(bad, Err(Error::Config(_))));
    }
}
