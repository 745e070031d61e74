use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ReconError;
use crate::model::{Key, Row, Side};
use crate::observer::{ReconEvent, ReconObserver};

/// What to do when two rows on the same side produce the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Later row replaces the earlier one.
    #[default]
    KeepLast,
    /// Earlier row is kept, later ones dropped.
    KeepFirst,
    /// Fail the comparison.
    Reject,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::KeepLast => "keep_last",
            DuplicatePolicy::KeepFirst => "keep_first",
            DuplicatePolicy::Reject => "reject",
        }
    }
}

/// Columns that identify a row for the key-based strategies.
#[derive(Debug, Clone, Copy)]
pub enum KeySpec<'a> {
    Primary(&'a str),
    Composite(&'a [String]),
}

impl KeySpec<'_> {
    /// `key_column` label carried by every result entry.
    pub fn label(&self) -> String {
        match self {
            KeySpec::Primary(col) => (*col).to_string(),
            KeySpec::Composite(cols) => format!("[{}]", cols.join(", ")),
        }
    }

    fn key_of(&self, row: &Row, side: Side, row_index: usize) -> Result<Key, ReconError> {
        let lookup = |column: &str| {
            row.get(column).ok_or_else(|| ReconError::MissingKeyColumn {
                side,
                column: column.to_string(),
                row_index,
            })
        };

        match self {
            KeySpec::Primary(col) => Ok(Key::Single(lookup(col)?.clone())),
            KeySpec::Composite(cols) => cols
                .iter()
                .map(|c| lookup(c).map(|v| v.normalized()))
                .collect::<Result<Vec<_>, _>>()
                .map(Key::Composite),
        }
    }
}

/// Build an ordered key → row lookup in one pass over `rows`.
///
/// Keys keep the position of their first occurrence regardless of policy.
pub fn extract_keys<'r>(
    rows: &'r [Row],
    spec: &KeySpec<'_>,
    side: Side,
    policy: DuplicatePolicy,
    observer: &mut dyn ReconObserver,
) -> Result<IndexMap<Key, &'r Row>, ReconError> {
    let mut map: IndexMap<Key, &'r Row> = IndexMap::with_capacity(rows.len());

    for (row_index, row) in rows.iter().enumerate() {
        let key = spec.key_of(row, side, row_index)?;
        match map.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(mut slot) => {
                let key = slot.key().to_string();
                match policy {
                    DuplicatePolicy::Reject => {
                        return Err(ReconError::DuplicateKey { side, key });
                    }
                    DuplicatePolicy::KeepLast => {
                        slot.insert(row);
                    }
                    DuplicatePolicy::KeepFirst => {}
                }
                log::warn!(
                    "{side}: duplicate key {key} at row {} ({})",
                    row_index + 1,
                    policy.as_str()
                );
                observer.on_event(&ReconEvent::DuplicateKey { side, key });
            }
        }
    }

    Ok(map)
}
