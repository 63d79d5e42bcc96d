// Fixture loading
//
// Turns delimited files and JSON documents into the `Row` shape consumed by
// the transformer. All values become strings, matching how CSV columns arrive.

use crate::error::{Error, Result};
use crate::transform::{Actor, ActorSet, GroupingSpec, Row, grouping_key};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Reads a header-named CSV file into rows.
pub fn load_csv_rows(path: &Path) -> Result<Vec<Row>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::from(e).context(format!("reading {}", path.display())))?;
    read_csv(reader)
}

/// Parses CSV text (with a header row) into rows.
pub fn parse_csv_rows(text: &str) -> Result<Vec<Row>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Row>> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        // A fully blank line carries no data
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Reads a JSON array of flat objects into rows.
pub fn load_json_rows(path: &Path) -> Result<Vec<Row>> {
    let text = read_text(path)?;
    parse_json_rows(&text).map_err(|e| e.context(format!("parsing {}", path.display())))
}

/// Parses a JSON array of flat objects into rows.
pub fn parse_json_rows(text: &str) -> Result<Vec<Row>> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(entries) = value else {
        return Err(Error::InvalidFixtureValue {
            field: "<root>".into(),
            value: kind_of(&value).into(),
            reason: "expected an array of objects".into(),
        });
    };
    entries.iter().map(object_to_row).collect()
}

/// Reads a pre-grouped JSON document: `[{username, password, entries: [...]}]`.
///
/// The key and constant columns of `spec` are read from each actor object.
pub fn load_json_actors(path: &Path, spec: &GroupingSpec) -> Result<Vec<Actor>> {
    let text = read_text(path)?;
    parse_json_actors(&text, spec).map_err(|e| e.context(format!("parsing {}", path.display())))
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::from(e).context(format!("reading {}", path.display())))
}

/// Parses pre-grouped actors.
///
/// An actor listed more than once is merged into its first entry, the same
/// way `transform` groups flat rows.
pub fn parse_json_actors(text: &str, spec: &GroupingSpec) -> Result<Vec<Actor>> {
    #[derive(serde::Deserialize)]
    struct RawActor {
        #[serde(flatten)]
        header: BTreeMap<String, Value>,
        #[serde(default)]
        entries: Vec<Value>,
    }

    let raw: Vec<RawActor> = serde_json::from_str(text)?;
    let mut actors = ActorSet::default();
    for (position, actor) in raw.into_iter().enumerate() {
        let raw_key = actor.header.get(spec.key()).map(scalar_to_string);
        let Some(key) = grouping_key(raw_key.as_deref()) else {
            let skipped = Error::GroupingKeyMissing {
                row: position,
                column: spec.key().to_string(),
            };
            tracing::warn!(%skipped, "skipping fixture actor");
            continue;
        };
        let entries = actor
            .entries
            .iter()
            .map(object_to_row)
            .collect::<Result<Vec<_>>>()?;

        let grouped = actors.entry(key, || {
            spec.constants()
                .iter()
                .filter_map(|c| actor.header.get(c).map(|v| (c.clone(), scalar_to_string(v))))
                .collect()
        });
        if !grouped.items.is_empty() {
            tracing::debug!(key, "merging repeated fixture actor");
        }
        for entry in entries {
            grouped.push_item(entry);
        }
    }
    Ok(actors.into_actors())
}

/// Resolves an upload file name against the fixtures directory.
pub fn artifact_path(fixtures_dir: &Path, name: &str) -> PathBuf {
    let candidate = Path::new(name);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        fixtures_dir.join(candidate)
    }
}

fn object_to_row(value: &Value) -> Result<Row> {
    match value {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), scalar_to_string(v)))
            .collect()),
        other => Err(Error::InvalidFixtureValue {
            field: "<entry>".into(),
            value: kind_of(other).into(),
            reason: "expected an object".into(),
        }),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
