// Data sources: materialize a table as rows for the reconciliation engine

pub mod csv;
pub mod error;
pub mod sqlite;

use std::path::{Path, PathBuf};

use sentinel_recon::Row;

pub use error::SourceError;

/// A store that can hand over a whole table as rows.
pub trait RowSource {
    /// Human label used in messages ("source" / "target").
    fn label(&self) -> &str;

    /// All rows of `table`, optionally restricted by a raw SQL filter.
    fn fetch_table(&self, table: &str, filter: Option<&str>) -> Result<Vec<Row>, SourceError>;

    /// Primary-key columns of `table` in key order. Empty when unknown.
    fn primary_key(&self, table: &str) -> Result<Vec<String>, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Sqlite(PathBuf),
    Csv(PathBuf),
}

impl Location {
    /// Parse a SQLite URL or a bare path whose extension picks the format.
    ///
    /// URLs follow the usual convention: `sqlite:///rel.db` is relative,
    /// `sqlite:////abs/path.db` is absolute.
    pub fn parse(location: &str) -> Result<Self, SourceError> {
        let trimmed = location.trim();
        if let Some(rest) = trimmed.strip_prefix("sqlite://") {
            let path = rest.strip_prefix('/').unwrap_or(rest);
            if path.is_empty() {
                return Err(SourceError::UnsupportedLocation(location.to_string()));
            }
            return Ok(Location::Sqlite(PathBuf::from(path)));
        }

        if trimmed.contains("://") {
            return Err(SourceError::UnsupportedLocation(location.to_string()));
        }

        let path = PathBuf::from(trimmed);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("db" | "sqlite" | "sqlite3") => Ok(Location::Sqlite(path)),
            Some("csv") => Ok(Location::Csv(path)),
            _ => Err(SourceError::UnsupportedLocation(location.to_string())),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Location::Sqlite(p) | Location::Csv(p) => p,
        }
    }

    /// Resolve a relative path against `base` (e.g. a job file's directory).
    pub fn relative_to(self, base: &Path) -> Self {
        let rebase = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        match self {
            Location::Sqlite(p) => Location::Sqlite(rebase(p)),
            Location::Csv(p) => Location::Csv(rebase(p)),
        }
    }
}

/// Open a store and verify it is reachable.
pub fn open(location: &Location, label: &str) -> Result<Box<dyn RowSource>, SourceError> {
    match location {
        Location::Sqlite(path) => Ok(Box::new(sqlite::SqliteSource::open(path, label)?)),
        Location::Csv(path) => Ok(Box::new(crate::csv::CsvSource::open(path, label)?)),
    }
}
