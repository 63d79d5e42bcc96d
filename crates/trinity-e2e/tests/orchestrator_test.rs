// Integration tests for the bulk orchestrator
//
// Tests cover:
// - Resume from a named actor and row
// - No release (logout) after the final actor
// - Fail-fast with the halt point reported
// - The settle delay between items
// - End to end: fixture rows grouped and processed in order

mod common;

use common::{RecordingWorkflow, actor, init_tracing, row};
use std::time::Duration;
use trinity_e2e::{Error, GroupingSpec, Orchestrator, ResumePoint, transform};

fn orchestrator() -> Orchestrator {
    Orchestrator::new(Duration::from_secs(2))
}

#[tokio::test(start_paused = true)]
async fn test_full_run_visits_every_item() {
    init_tracing();
    let actors = vec![actor("A1", 2), actor("A2", 1)];
    let mut workflow = RecordingWorkflow::new();

    let summary = orchestrator()
        .run(&mut workflow, &actors, &ResumePoint::default())
        .await
        .unwrap();

    assert_eq!(
        workflow.events,
        vec!["begin A1", "item A1:0", "item A1:1", "end A1", "begin A2", "item A2:0"]
    );
    assert_eq!(summary.actors_processed, 2);
    assert_eq!(summary.items_processed, 3);
    assert_eq!(summary.actors_skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_resume_skips_earlier_actors_and_rows() {
    init_tracing();
    let actors = vec![actor("A1", 3), actor("A2", 3), actor("A3", 8), actor("A4", 2)];
    let mut workflow = RecordingWorkflow::new();

    let summary = orchestrator()
        .run(&mut workflow, &actors, &ResumePoint::at("A3", 5))
        .await
        .unwrap();

    assert_eq!(
        workflow.processed(),
        vec!["A3:5", "A3:6", "A3:7", "A4:0", "A4:1"]
    );
    assert!(!workflow.events.iter().any(|e| e.contains("A1") || e.contains("A2")));
    assert_eq!(summary.actors_skipped, 2);
    assert_eq!(summary.items_processed, 5);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_resume_actor_starts_at_first() {
    init_tracing();
    let actors = vec![actor("A1", 1), actor("A2", 1)];
    let mut workflow = RecordingWorkflow::new();

    orchestrator()
        .run(&mut workflow, &actors, &ResumePoint::at("nobody", 0))
        .await
        .unwrap();

    assert_eq!(workflow.processed(), vec!["A1:0", "A2:0"]);
}

#[tokio::test(start_paused = true)]
async fn test_no_release_after_final_actor() {
    init_tracing();
    let actors = vec![actor("A1", 1), actor("A2", 1), actor("A3", 1)];
    let mut workflow = RecordingWorkflow::new();

    orchestrator()
        .run(&mut workflow, &actors, &ResumePoint::default())
        .await
        .unwrap();

    let ends: Vec<_> = workflow
        .events
        .iter()
        .filter(|e| e.starts_with("end "))
        .collect();
    assert_eq!(ends, vec!["end A1", "end A2"]);
    assert_eq!(workflow.events.last().unwrap(), "item A3:0");
}

#[tokio::test(start_paused = true)]
async fn test_failure_halts_with_position() {
    init_tracing();
    let actors = vec![actor("A1", 2), actor("A2", 4), actor("A3", 2)];
    let mut workflow = RecordingWorkflow::failing_at("A2", 2);

    let err = orchestrator()
        .run(&mut workflow, &actors, &ResumePoint::default())
        .await
        .unwrap_err();

    match &err {
        Error::RunHalted { actor, row, source } => {
            assert_eq!(actor, "A2");
            assert_eq!(*row, 2);
            assert!(matches!(**source, Error::SubmissionFailed { attempts: 3, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(err.root(), Error::SubmissionFailed { .. }));
    // Nothing after the failing item runs, not even the release hook
    assert_eq!(workflow.events.last().unwrap(), "item A2:1");
    assert!(!workflow.events.iter().any(|e| e.contains("A3")));
}

#[tokio::test(start_paused = true)]
async fn test_resumed_failure_reports_absolute_row() {
    init_tracing();
    let actors = vec![actor("A1", 10)];
    let mut workflow = RecordingWorkflow::failing_at("A1", 7);

    let err = orchestrator()
        .run(&mut workflow, &actors, &ResumePoint::at("A1", 5))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RunHalted { ref actor, row: 7, .. } if actor == "A1"));
    assert_eq!(workflow.processed(), vec!["A1:5", "A1:6"]);
}

#[tokio::test(start_paused = true)]
async fn test_begin_failure_reports_first_row() {
    init_tracing();
    let actors = vec![actor("A1", 1), actor("A2", 3)];
    let mut workflow = RecordingWorkflow {
        fail_begin: Some("A2".to_string()),
        ..RecordingWorkflow::new()
    };

    let err = orchestrator()
        .run(&mut workflow, &actors, &ResumePoint::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RunHalted { ref actor, row: 0, .. } if actor == "A2"));
    assert!(matches!(err.root(), Error::AuthenticationFailed { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_settle_delay_between_items() {
    init_tracing();
    let actors = vec![actor("A1", 3)];
    let mut workflow = RecordingWorkflow::new();

    Orchestrator::new(Duration::from_secs(3))
        .run(&mut workflow, &actors, &ResumePoint::default())
        .await
        .unwrap();

    let gaps: Vec<_> = workflow
        .item_times
        .windows(2)
        .map(|w| w[1] - w[0])
        .collect();
    assert_eq!(gaps, vec![Duration::from_secs(3), Duration::from_secs(3)]);
}

#[tokio::test(start_paused = true)]
async fn test_grouped_fixture_rows_run_in_input_order() {
    init_tracing();
    let rows = vec![
        row(&[("username", "x"), ("password", "p1"), ("date", "2025-03-03")]),
        row(&[("username", "y"), ("password", "p2"), ("date", "2025-03-04")]),
        row(&[("username", "x"), ("password", "p1"), ("date", "2025-03-05")]),
    ];
    let actors = transform(rows, &GroupingSpec::by_username());
    assert_eq!(actors.len(), 2);
    assert_eq!(actors[0].password(), "p1");
    assert_eq!(actors[0].items[1].get("date"), Some("2025-03-05"));

    let mut workflow = RecordingWorkflow::new();
    orchestrator()
        .run(&mut workflow, &actors, &ResumePoint::default())
        .await
        .unwrap();

    assert_eq!(
        workflow.events,
        vec!["begin x", "item x:0", "item x:1", "end x", "begin y", "item y:0"]
    );
}
