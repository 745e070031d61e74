use std::fmt;

use crate::model::Side;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Job config validation error.
    ConfigValidation(String),
    /// Both a primary key and composite keys were supplied.
    ConflictingKeySpec { pk_column: String, composite_keys: Vec<String> },
    /// A key column is absent from a row.
    MissingKeyColumn { side: Side, column: String, row_index: usize },
    /// Duplicate key under the `reject` policy.
    DuplicateKey { side: Side, key: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::ConflictingKeySpec { pk_column, composite_keys } => write!(
                f,
                "primary key '{pk_column}' and composite keys [{}] are mutually exclusive",
                composite_keys.join(", ")
            ),
            Self::MissingKeyColumn { side, column, row_index } => write!(
                f,
                "{side}: key column '{column}' missing from row {}",
                row_index + 1
            ),
            Self::DuplicateKey { side, key } => {
                write!(f, "{side}: duplicate key {key}")
            }
        }
    }
}

impl std::error::Error for ReconError {}
