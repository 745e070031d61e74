use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::Value;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One materialized row: column name → value, in the order the store
/// returned the columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: IndexMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self { cells: IndexMap::with_capacity(n) }
    }

    /// Insert or replace a column. A replaced column keeps its position.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Which input dataset a row (or an error) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Lookup key for the key-based strategies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Raw value of the primary-key column.
    Single(Value),
    /// Normalized values of the composite-key columns, in the given order.
    Composite(Vec<String>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Single(v) => write!(f, "{v}"),
            Key::Composite(parts) => write!(f, "({})", parts.join(", ")),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PrimaryKey,
    CompositeKey,
    RowFingerprint,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::PrimaryKey => "Primary Key",
            Strategy::CompositeKey => "Composite Key",
            Strategy::RowFingerprint => "Row Fingerprint",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A row present on one side only.
#[derive(Debug, Clone, Serialize)]
pub struct MissingRow {
    pub key: String,
    pub key_column: String,
    pub row: Row,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMismatch {
    pub column: String,
    pub source_value: Value,
    pub target_value: Value,
}

/// A key present on both sides whose rows differ in at least one column.
#[derive(Debug, Clone, Serialize)]
pub struct MismatchedRow {
    pub key: String,
    pub key_column: String,
    pub mismatches: Vec<ColumnMismatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub strategy_used: Strategy,
    pub total_source_rows: usize,
    pub total_target_rows: usize,
    pub missing_in_target: Vec<MissingRow>,
    pub missing_in_source: Vec<MissingRow>,
    pub mismatched_rows: Vec<MismatchedRow>,
}

impl ComparisonResult {
    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary {
            total_source_rows: self.total_source_rows,
            total_target_rows: self.total_target_rows,
            missing_in_target: self.missing_in_target.len(),
            missing_in_source: self.missing_in_source.len(),
            mismatched_rows: self.mismatched_rows.len(),
        }
    }

    pub fn total_issues(&self) -> usize {
        self.missing_in_target.len() + self.missing_in_source.len() + self.mismatched_rows.len()
    }

    pub fn is_identical(&self) -> bool {
        self.total_issues() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary {
    pub total_source_rows: usize,
    pub total_target_rows: usize,
    pub missing_in_target: usize,
    pub missing_in_source: usize,
    pub mismatched_rows: usize,
}
