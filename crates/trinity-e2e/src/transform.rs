// Transformer - Flat fixture rows to per-actor work items
//
// A row is one unit of work. Rows are grouped by a key column (usually
// `username`) into Actors, keeping first-seen actor order and the original
// row order inside each actor. Resuming a halted run depends on this
// ordering being reproducible.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// One raw fixture row: column name to literal value.
pub type Row = BTreeMap<String, String>;

/// Describes how rows are grouped into actors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingSpec {
    key: String,
    constants: Vec<String>,
}

impl GroupingSpec {
    /// Groups on `key` with no per-actor constant columns.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            constants: Vec::new(),
        }
    }

    /// Adds a column whose value is taken once per actor (from its first row).
    pub fn constant(mut self, column: impl Into<String>) -> Self {
        self.constants.push(column.into());
        self
    }

    /// The `username`/`password` grouping used by every per-user fixture.
    pub fn by_username() -> Self {
        Self::new("username").constant("password")
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    fn is_item_column(&self, column: &str) -> bool {
        column != self.key && !self.constants.iter().any(|c| c == column)
    }
}

/// One record to create, derived from exactly one input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    ordinal: usize,
    fields: BTreeMap<String, String>,
}

impl WorkItem {
    pub fn new(ordinal: usize, fields: BTreeMap<String, String>) -> Self {
        Self { ordinal, fields }
    }

    /// Zero-based position within the owning actor.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Returns the field, or `MissingField` when absent.
    ///
    /// Empty values are returned as-is; workflows decide whether empty is valid.
    pub fn require(&self, field: &str) -> Result<&str> {
        self.get(field).ok_or_else(|| Error::MissingField {
            field: field.to_string(),
            ordinal: self.ordinal,
        })
    }

    /// Returns the field only if present and non-blank.
    pub fn non_empty(&self, field: &str) -> Option<&str> {
        self.get(field).filter(|v| !v.trim().is_empty())
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

/// A named identity owning an ordered sequence of work items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub key: String,
    pub constants: BTreeMap<String, String>,
    pub items: Vec<WorkItem>,
}

impl Actor {
    /// Places every row under one actor, e.g. the admin account.
    pub fn single(
        key: impl Into<String>,
        constants: BTreeMap<String, String>,
        rows: impl IntoIterator<Item = Row>,
    ) -> Self {
        let items = rows
            .into_iter()
            .enumerate()
            .map(|(ordinal, row)| WorkItem::new(ordinal, row))
            .collect();
        Self {
            key: key.into(),
            constants,
            items,
        }
    }

    /// Shorthand for a `username`/`password` actor.
    pub fn with_credentials(
        username: impl Into<String>,
        password: impl Into<String>,
        rows: impl IntoIterator<Item = Row>,
    ) -> Self {
        let mut constants = BTreeMap::new();
        constants.insert("password".to_string(), password.into());
        Self::single(username, constants, rows)
    }

    pub fn constant(&self, column: &str) -> Option<&str> {
        self.constants.get(column).map(String::as_str)
    }

    /// The actor's password constant, or an empty string.
    pub fn password(&self) -> &str {
        self.constant("password").unwrap_or_default()
    }
}

/// The grouping key of a row, taken verbatim.
///
/// Only a blank key counts as missing. Surrounding whitespace is kept, so
/// `"omar"` and `"omar "` name different actors.
pub(crate) fn grouping_key(value: Option<&str>) -> Option<&str> {
    value.filter(|k| !k.trim().is_empty())
}

/// Actors under construction, in first-seen key order.
#[derive(Debug, Default)]
pub(crate) struct ActorSet {
    actors: Vec<Actor>,
    index: HashMap<String, usize>,
}

impl ActorSet {
    /// The actor for `key`, created with `constants` the first time the key
    /// is seen. Later constants for the same key are ignored.
    pub(crate) fn entry(
        &mut self,
        key: &str,
        constants: impl FnOnce() -> BTreeMap<String, String>,
    ) -> &mut Actor {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                self.actors.push(Actor {
                    key: key.to_string(),
                    constants: constants(),
                    items: Vec::new(),
                });
                let slot = self.actors.len() - 1;
                self.index.insert(key.to_string(), slot);
                slot
            }
        };
        &mut self.actors[slot]
    }

    pub(crate) fn into_actors(self) -> Vec<Actor> {
        self.actors
    }
}

impl Actor {
    /// Appends an item numbered after the existing ones.
    pub(crate) fn push_item(&mut self, fields: BTreeMap<String, String>) {
        let ordinal = self.items.len();
        self.items.push(WorkItem::new(ordinal, fields));
    }
}

/// Groups rows into actors.
///
/// Rows with a blank or missing key are skipped and logged.
pub fn transform(rows: impl IntoIterator<Item = Row>, spec: &GroupingSpec) -> Vec<Actor> {
    let mut actors = ActorSet::default();

    for (row_number, row) in rows.into_iter().enumerate() {
        let Some(key) = grouping_key(row.get(spec.key()).map(String::as_str)) else {
            let skipped = Error::GroupingKeyMissing {
                row: row_number,
                column: spec.key().to_string(),
            };
            tracing::warn!(%skipped, "skipping fixture row");
            continue;
        };

        let actor = actors.entry(key, || {
            spec.constants()
                .iter()
                .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                .collect()
        });
        let fields = row
            .iter()
            .filter(|(column, _)| spec.is_item_column(column))
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect();
        actor.push_item(fields);
    }

    actors.into_actors()
}
