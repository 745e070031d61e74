use std::fmt;

use sha2::{Digest, Sha256};

use crate::model::Row;

const UNIT_SEP: u8 = 0x1f;
const RECORD_SEP: u8 = 0x1e;

/// Hex SHA-256 over a row's sorted (column, normalized value) pairs.
///
/// Content hash only: two rows with the same fingerprint are treated as the
/// same row. Independent of column insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form shown as the key of fingerprint-strategy entries.
    pub fn short(&self) -> String {
        format!("{}...", &self.0[..8])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn fingerprint(row: &Row) -> Fingerprint {
    let mut cells: Vec<_> = row.iter().collect();
    cells.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut hasher = Sha256::new();
    for (column, value) in cells {
        hasher.update(column.as_bytes());
        hasher.update([UNIT_SEP]);
        hasher.update(value.normalized().as_bytes());
        hasher.update([RECORD_SEP]);
    }

    let digest = hasher.finalize();
    Fingerprint(digest.iter().map(|b| format!("{b:02x}")).collect())
}
