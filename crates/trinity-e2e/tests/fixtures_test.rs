// Integration tests for loading fixture and config files from disk

mod common;

use common::init_tracing;
use std::io::Write;
use tempfile::NamedTempFile;
use trinity_e2e::{Error, GroupingSpec, RunConfig, fixtures, transform};

fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_csv_file_to_actors() {
    init_tracing();
    let file = write_temp(
        ".csv",
        "username,password,date,startTime,endTime\n\
         x,p1,2025-03-03,09:00,10:00\n\
         ,p9,2025-03-03,09:00,10:00\n\
         y,p2,2025-03-04,13:00,15:30\n\
         x,p1,2025-03-05,08:00,12:00\n",
    );

    let rows = fixtures::load_csv_rows(file.path()).unwrap();
    assert_eq!(rows.len(), 4);

    // The row without a username is skipped
    let actors = transform(rows, &GroupingSpec::by_username());
    let keys: Vec<_> = actors.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(keys, vec!["x", "y"]);
    assert_eq!(actors[0].items.len(), 2);
    assert_eq!(actors[0].items[1].get("startTime"), Some("08:00"));
    assert_eq!(actors[0].items[1].get("password"), None);
    assert_eq!(actors[1].password(), "p2");
}

#[test]
fn test_missing_csv_names_the_path() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.csv");

    let err = fixtures::load_csv_rows(&path).unwrap_err();
    assert!(matches!(err, Error::Context(ref msg, _) if msg.contains("missing.csv")));
}

#[test]
fn test_missing_json_names_the_path() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timecards.json");

    let err = fixtures::load_json_rows(&path).unwrap_err();
    assert!(matches!(err, Error::Context(ref msg, _) if msg.contains("timecards.json")));
    assert!(matches!(err.root(), Error::Io(_)));

    let err = fixtures::load_json_actors(&path, &GroupingSpec::by_username()).unwrap_err();
    assert!(matches!(err, Error::Context(ref msg, _) if msg.contains("timecards.json")));
}

#[test]
fn test_json_files() {
    init_tracing();
    let flat = write_temp(
        ".json",
        r#"[{"Currency": "EUR", "Rate": 0.92}, {"Currency": "MXN", "Rate": "17,1"}]"#,
    );
    let rows = fixtures::load_json_rows(flat.path()).unwrap();
    assert_eq!(rows[0]["Rate"], "0.92");
    assert_eq!(rows[1]["Rate"], "17,1");

    let grouped = write_temp(
        ".json",
        r#"[{"username": "omar", "password": "pw", "entries": [{"date": "2025-01-06", "hours": 8}]}]"#,
    );
    let actors = fixtures::load_json_actors(grouped.path(), &GroupingSpec::by_username()).unwrap();
    assert_eq!(actors.len(), 1);
    assert_eq!(actors[0].items[0].get("hours"), Some("8"));
}

#[test]
fn test_config_file_overlays_defaults() {
    init_tracing();
    let file = write_temp(
        ".json",
        r#"{
            "appUrl": "http://localhost:4200",
            "admin": {"username": "root", "password": "pw"},
            "timeouts": {"surfaceMs": 5000},
            "submitAttempts": 5
        }"#,
    );

    let config = RunConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.admin.username, "root");
    assert_eq!(config.submit_loop().max_attempts(), 5);
    assert_eq!(config.surface_timeout().as_millis(), 5000);
    // Unset sections keep their defaults
    assert_eq!(config.timeouts.action_ms, 10_000);
    assert_eq!(config.viewport.width, 1920);
    assert_eq!(config.app_path("/home/tr-clients"), "http://localhost:4200/home/tr-clients");
}

#[test]
fn test_invalid_config_file_is_rejected() {
    init_tracing();
    let file = write_temp(".json", r#"{"submitAttempts": 0}"#);
    let err = RunConfig::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let broken = write_temp(".json", "{ not json");
    let err = RunConfig::load(Some(broken.path())).unwrap_err();
    assert!(matches!(err, Error::Context(_, _)));
}
