use indexmap::IndexMap;

use crate::error::ReconError;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::keys::{extract_keys, DuplicatePolicy, KeySpec};
use crate::mismatch::find_mismatches;
use crate::model::{ComparisonResult, MismatchedRow, MissingRow, Row, Side, Strategy};
use crate::observer::{NoopObserver, ReconEvent, ReconObserver};

const FINGERPRINT_LABEL: &str = "Row Fingerprint";

/// Key identifiers supplied by the caller. Strategy selection depends only
/// on which of these are present.
#[derive(Debug, Clone, Default)]
pub struct ReconOptions {
    pub pk_column: Option<String>,
    pub composite_keys: Option<Vec<String>>,
    pub on_duplicate: DuplicatePolicy,
}

impl ReconOptions {
    pub fn primary_key(column: impl Into<String>) -> Self {
        Self { pk_column: Some(column.into()), ..Self::default() }
    }

    pub fn composite<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            composite_keys: Some(columns.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn fingerprint() -> Self {
        Self::default()
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.on_duplicate = policy;
        self
    }

    /// Primary key > composite key > fingerprint. Empty identifiers count as
    /// absent; supplying both kinds is rejected.
    pub fn key_spec(&self) -> Result<Option<KeySpec<'_>>, ReconError> {
        let pk = self.pk_column.as_deref().filter(|c| !c.is_empty());
        let composite = self.composite_keys.as_deref().filter(|c| !c.is_empty());

        match (pk, composite) {
            (Some(pk), Some(cols)) => Err(ReconError::ConflictingKeySpec {
                pk_column: pk.to_string(),
                composite_keys: cols.to_vec(),
            }),
            (Some(pk), None) => Ok(Some(KeySpec::Primary(pk))),
            (None, Some(cols)) => Ok(Some(KeySpec::Composite(cols))),
            (None, None) => Ok(None),
        }
    }

    pub fn strategy(&self) -> Result<Strategy, ReconError> {
        Ok(match self.key_spec()? {
            Some(KeySpec::Primary(_)) => Strategy::PrimaryKey,
            Some(KeySpec::Composite(_)) => Strategy::CompositeKey,
            None => Strategy::RowFingerprint,
        })
    }
}

/// Reconcile `source` against `target`.
pub fn reconcile(
    source: &[Row],
    target: &[Row],
    options: &ReconOptions,
) -> Result<ComparisonResult, ReconError> {
    reconcile_with_observer(source, target, options, &mut NoopObserver)
}

/// Like [`reconcile`], reporting progress to `observer`.
pub fn reconcile_with_observer(
    source: &[Row],
    target: &[Row],
    options: &ReconOptions,
    observer: &mut dyn ReconObserver,
) -> Result<ComparisonResult, ReconError> {
    let spec = options.key_spec()?;
    let strategy = options.strategy()?;
    let key_column = spec.as_ref().map(KeySpec::label).unwrap_or_else(|| FINGERPRINT_LABEL.to_string());

    log::debug!("strategy: {strategy} on {key_column}");
    observer.on_event(&ReconEvent::StrategySelected { strategy, key_column: key_column.clone() });

    log::debug!("rows: {} source, {} target", source.len(), target.len());
    observer.on_event(&ReconEvent::RowsReceived { source: source.len(), target: target.len() });

    let mut result = ComparisonResult {
        strategy_used: strategy,
        total_source_rows: source.len(),
        total_target_rows: target.len(),
        missing_in_target: Vec::new(),
        missing_in_source: Vec::new(),
        mismatched_rows: Vec::new(),
    };

    match spec {
        Some(spec) => diff_by_key(source, target, &spec, options.on_duplicate, &mut result, observer)?,
        None => diff_by_fingerprint(source, target, &mut result, observer),
    }

    let summary = result.summary();
    log::debug!(
        "done: {} missing in target, {} missing in source, {} mismatched",
        summary.missing_in_target,
        summary.missing_in_source,
        summary.mismatched_rows
    );
    observer.on_event(&ReconEvent::Completed { summary });

    Ok(result)
}

fn diff_by_key(
    source: &[Row],
    target: &[Row],
    spec: &KeySpec<'_>,
    policy: DuplicatePolicy,
    result: &mut ComparisonResult,
    observer: &mut dyn ReconObserver,
) -> Result<(), ReconError> {
    let source_map = extract_keys(source, spec, Side::Source, policy, observer)?;
    let target_map = extract_keys(target, spec, Side::Target, policy, observer)?;
    let key_column = spec.label();

    for (key, &source_row) in &source_map {
        match target_map.get(key) {
            None => result.missing_in_target.push(MissingRow {
                key: key.to_string(),
                key_column: key_column.clone(),
                row: source_row.clone(),
            }),
            Some(&target_row) => {
                let mismatches = find_mismatches(source_row, target_row);
                if !mismatches.is_empty() {
                    result.mismatched_rows.push(MismatchedRow {
                        key: key.to_string(),
                        key_column: key_column.clone(),
                        mismatches,
                    });
                }
            }
        }
    }

    for (key, &target_row) in &target_map {
        if !source_map.contains_key(key) {
            result.missing_in_source.push(MissingRow {
                key: key.to_string(),
                key_column: key_column.clone(),
                row: target_row.clone(),
            });
        }
    }

    Ok(())
}

/// Keyless fallback. A row whose content changed has a new fingerprint, so
/// it is reported once in each missing list and never as a mismatch.
fn diff_by_fingerprint(
    source: &[Row],
    target: &[Row],
    result: &mut ComparisonResult,
    observer: &mut dyn ReconObserver,
) {
    let source_map = fingerprint_rows(source, Side::Source, observer);
    let target_map = fingerprint_rows(target, Side::Target, observer);

    for (fp, &row) in &source_map {
        if !target_map.contains_key(fp) {
            result.missing_in_target.push(MissingRow {
                key: fp.short(),
                key_column: FINGERPRINT_LABEL.to_string(),
                row: row.clone(),
            });
        }
    }

    for (fp, &row) in &target_map {
        if !source_map.contains_key(fp) {
            result.missing_in_source.push(MissingRow {
                key: fp.short(),
                key_column: FINGERPRINT_LABEL.to_string(),
                row: row.clone(),
            });
        }
    }
}

fn fingerprint_rows<'r>(
    rows: &'r [Row],
    side: Side,
    observer: &mut dyn ReconObserver,
) -> IndexMap<Fingerprint, &'r Row> {
    let mut map = IndexMap::with_capacity(rows.len());
    for row in rows {
        let fp = fingerprint(row);
        if map.contains_key(&fp) {
            log::debug!("{side}: identical rows collapsed under {}", fp.short());
            observer.on_event(&ReconEvent::DuplicateFingerprint { side, fingerprint: fp.to_string() });
        }
        map.insert(fp, row);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::CollectingObserver;
    use crate::value::Value;

    fn emp(id: i64, name: &str, dept: &str, salary: i64) -> Row {
        [
            ("id", Value::Integer(id)),
            ("name", Value::from(name)),
            ("department", Value::from(dept)),
            ("salary", Value::Integer(salary)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn strategy_priority() {
        assert_eq!(ReconOptions::primary_key("id").strategy().unwrap(), Strategy::PrimaryKey);
        assert_eq!(ReconOptions::composite(["a", "b"]).strategy().unwrap(), Strategy::CompositeKey);
        assert_eq!(ReconOptions::fingerprint().strategy().unwrap(), Strategy::RowFingerprint);
    }

    #[test]
    fn empty_identifiers_fall_through() {
        let opts = ReconOptions {
            pk_column: Some(String::new()),
            composite_keys: Some(Vec::new()),
            ..ReconOptions::default()
        };
        assert_eq!(opts.strategy().unwrap(), Strategy::RowFingerprint);

        let opts = ReconOptions {
            pk_column: Some(String::new()),
            composite_keys: Some(vec!["a".into()]),
            ..ReconOptions::default()
        };
        assert_eq!(opts.strategy().unwrap(), Strategy::CompositeKey);
    }

    #[test]
    fn both_key_kinds_rejected() {
        let opts = ReconOptions {
            pk_column: Some("id".into()),
            composite_keys: Some(vec!["name".into()]),
            ..ReconOptions::default()
        };
        let err = reconcile(&[], &[], &opts).unwrap_err();
        assert!(matches!(err, ReconError::ConflictingKeySpec { .. }));
    }

    #[test]
    fn empty_inputs() {
        let result = reconcile(&[], &[], &ReconOptions::primary_key("id")).unwrap();
        assert!(result.is_identical());
        assert_eq!(result.total_source_rows, 0);
    }

    #[test]
    fn primary_key_entries_carry_label_and_rows() {
        let source = vec![emp(1, "Alice", "Engineering", 50000), emp(4, "Diana", "Finance", 70000)];
        let target = vec![emp(1, "Alice", "Engineering", 55000), emp(6, "Frank", "Finance", 72000)];
        let result = reconcile(&source, &target, &ReconOptions::primary_key("id")).unwrap();

        assert_eq!(result.missing_in_target.len(), 1);
        assert_eq!(result.missing_in_target[0].key, "4");
        assert_eq!(result.missing_in_target[0].key_column, "id");
        assert_eq!(result.missing_in_target[0].row, source[1]);

        assert_eq!(result.missing_in_source[0].key, "6");
        assert_eq!(result.missing_in_source[0].row, target[1]);

        assert_eq!(result.mismatched_rows.len(), 1);
        assert_eq!(result.mismatched_rows[0].key, "1");
        assert_eq!(result.mismatched_rows[0].mismatches[0].column, "salary");
    }

    #[test]
    fn missing_key_column_in_target_fails_fast() {
        let source = vec![emp(1, "Alice", "Engineering", 50000)];
        let target: Vec<Row> = vec![[("name", Value::from("Alice"))].into_iter().collect()];
        let err = reconcile(&source, &target, &ReconOptions::primary_key("id")).unwrap_err();
        assert!(matches!(err, ReconError::MissingKeyColumn { side: Side::Target, .. }));
    }

    #[test]
    fn fingerprint_duplicates_collapse() {
        let source = vec![emp(2, "Bob", "Engineering", 60000), emp(2, "Bob", "Engineering", 60000)];
        let target = vec![emp(2, "Bob", "Engineering", 60000)];
        let mut obs = CollectingObserver::default();
        let result = reconcile_with_observer(&source, &target, &ReconOptions::fingerprint(), &mut obs).unwrap();

        assert!(result.is_identical());
        assert_eq!(result.total_source_rows, 2);
        assert!(obs.events.iter().any(|e| matches!(
            e,
            ReconEvent::DuplicateFingerprint { side: Side::Source, .. }
        )));
    }

    #[test]
    fn fingerprint_keys_are_abbreviated() {
        let source = vec![emp(4, "Diana", "Finance", 70000)];
        let result = reconcile(&source, &[], &ReconOptions::fingerprint()).unwrap();
        let entry = &result.missing_in_target[0];
        assert_eq!(entry.key_column, "Row Fingerprint");
        assert_eq!(entry.key.len(), 11);
        assert!(entry.key.ends_with("..."));
        assert_eq!(entry.row, source[0]);
    }

    #[test]
    fn observer_sees_lifecycle() {
        let source = vec![emp(1, "Alice", "Engineering", 50000)];
        let mut obs = CollectingObserver::default();
        reconcile_with_observer(&source, &source, &ReconOptions::primary_key("id"), &mut obs).unwrap();

        assert_eq!(
            obs.events[0],
            ReconEvent::StrategySelected { strategy: Strategy::PrimaryKey, key_column: "id".into() }
        );
        assert_eq!(obs.events[1], ReconEvent::RowsReceived { source: 1, target: 1 });
        assert!(matches!(obs.events.last(), Some(ReconEvent::Completed { .. })));
    }
}
