// Property-based tests for the reconciliation engine.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use sentinel_recon::engine::{reconcile, ReconOptions};
use sentinel_recon::fingerprint::fingerprint;
use sentinel_recon::model::{ComparisonResult, Row};
use sentinel_recon::Value;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        1 => Just(Value::Null),
        3 => (-100_000i64..100_000).prop_map(Value::Integer),
        1 => (-1000.0f64..1000.0).prop_map(Value::Float),
        3 => r"[a-zA-Z ]{0,8}".prop_map(Value::Text),
        1 => any::<bool>().prop_map(Value::Boolean),
    ]
}

const COLUMNS: [&str; 3] = ["a", "b", "c"];

/// Rows with a unique integer `id` plus three value columns.
fn arb_rows(max: usize) -> impl Strategy<Value = Vec<Row>> {
    proptest::collection::btree_set(0i64..500, 0..=max).prop_flat_map(|ids| {
        let ids: Vec<i64> = ids.into_iter().collect();
        let n = ids.len();
        (Just(ids), proptest::collection::vec(proptest::collection::vec(arb_value(), 3), n))
            .prop_map(|(ids, values)| {
                ids.into_iter()
                    .zip(values)
                    .map(|(id, vals)| {
                        let mut row = Row::new();
                        row.insert("id", Value::Integer(id));
                        for (col, v) in COLUMNS.iter().zip(vals) {
                            row.insert(*col, v);
                        }
                        row
                    })
                    .collect()
            })
    })
}

/// A second dataset derived from `rows`: some dropped, some edited, some added.
fn arb_pair(max: usize) -> impl Strategy<Value = (Vec<Row>, Vec<Row>)> {
    arb_rows(max).prop_flat_map(|source| {
        let n = source.len();
        (
            Just(source),
            proptest::collection::vec((0u8..4, arb_value()), n),
            arb_rows(3),
        )
            .prop_map(|(source, edits, extra)| {
                let mut target = Vec::new();
                for (row, (op, v)) in source.iter().zip(edits) {
                    match op {
                        0 => {}
                        1 => {
                            let mut edited = row.clone();
                            edited.insert("b", v);
                            target.push(edited);
                        }
                        _ => target.push(row.clone()),
                    }
                }
                // Extra rows get ids that cannot collide with the source range.
                for mut row in extra {
                    if let Some(Value::Integer(id)) = row.get("id").cloned() {
                        row.insert("id", Value::Integer(id + 1000));
                    }
                    target.push(row);
                }
                (source, target)
            })
    })
}

/// Rows plus an arbitrary permutation of the same rows.
fn arb_permuted(max: usize) -> impl Strategy<Value = (Vec<Row>, Vec<Row>)> {
    arb_rows(max).prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle()))
}

fn reversed_columns(row: &Row) -> Row {
    let mut cells: Vec<(String, Value)> = row.iter().map(|(c, v)| (c.to_string(), v.clone())).collect();
    cells.reverse();
    cells.into_iter().collect()
}

fn missing_keys(result: &ComparisonResult) -> (BTreeSet<String>, BTreeSet<String>) {
    (
        result.missing_in_target.iter().map(|m| m.key.clone()).collect(),
        result.missing_in_source.iter().map(|m| m.key.clone()).collect(),
    )
}

fn all_options() -> Vec<ReconOptions> {
    vec![
        ReconOptions::primary_key("id"),
        ReconOptions::composite(["id", "a"]),
        ReconOptions::fingerprint(),
    ]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn identical_permuted_inputs_are_clean((rows, shuffled) in arb_permuted(12)) {
        for options in all_options() {
            let result = reconcile(&rows, &shuffled, &options).unwrap();
            prop_assert!(result.is_identical(), "strategy {:?}", result.strategy_used);
        }
    }

    #[test]
    fn swapping_sides_swaps_results((source, target) in arb_pair(12)) {
        for options in all_options() {
            let forward = reconcile(&source, &target, &options).unwrap();
            let backward = reconcile(&target, &source, &options).unwrap();

            let (fwd_t, fwd_s) = missing_keys(&forward);
            let (bwd_t, bwd_s) = missing_keys(&backward);
            prop_assert_eq!(&fwd_t, &bwd_s);
            prop_assert_eq!(&fwd_s, &bwd_t);

            let fwd: BTreeMap<_, _> = forward
                .mismatched_rows
                .iter()
                .map(|m| (m.key.clone(), m.mismatches.clone()))
                .collect();
            let bwd: BTreeMap<_, _> = backward
                .mismatched_rows
                .iter()
                .map(|m| (m.key.clone(), m.mismatches.clone()))
                .collect();
            prop_assert_eq!(fwd.keys().collect::<Vec<_>>(), bwd.keys().collect::<Vec<_>>());

            for (key, mismatches) in &fwd {
                let mirrored = &bwd[key];
                prop_assert_eq!(mismatches.len(), mirrored.len());
                for (m, r) in mismatches.iter().zip(mirrored) {
                    prop_assert_eq!(&m.column, &r.column);
                    prop_assert_eq!(&m.source_value, &r.target_value);
                    prop_assert_eq!(&m.target_value, &r.source_value);
                }
            }
        }
    }

    #[test]
    fn column_order_never_causes_mismatch(rows in arb_rows(12)) {
        let reordered: Vec<Row> = rows.iter().map(reversed_columns).collect();
        let result = reconcile(&rows, &reordered, &ReconOptions::primary_key("id")).unwrap();
        prop_assert!(result.mismatched_rows.is_empty());
        prop_assert!(result.is_identical());
    }

    #[test]
    fn key_strategies_partition_the_keys((source, target) in arb_pair(12)) {
        let result = reconcile(&source, &target, &ReconOptions::primary_key("id")).unwrap();
        let (missing_t, missing_s) = missing_keys(&result);
        let mismatched: BTreeSet<String> = result.mismatched_rows.iter().map(|m| m.key.clone()).collect();

        prop_assert!(missing_t.is_disjoint(&mismatched));
        prop_assert!(missing_s.is_disjoint(&mismatched));
        prop_assert!(missing_t.is_disjoint(&missing_s));
        prop_assert!(missing_t.len() + mismatched.len() <= source.len());
        prop_assert!(missing_s.len() + mismatched.len() <= target.len());
    }

    #[test]
    fn fingerprint_tracks_content(rows in arb_rows(4), v in arb_value()) {
        for row in &rows {
            prop_assert_eq!(fingerprint(row), fingerprint(&reversed_columns(row)));

            let mut edited = row.clone();
            edited.insert("c", v.clone());
            let same = row.get("c").map(|old| old.normalized() == v.normalized()).unwrap_or(false);
            prop_assert_eq!(fingerprint(row) == fingerprint(&edited), same);
        }
    }

    #[test]
    fn fingerprint_never_reports_mismatches((source, target) in arb_pair(12)) {
        let result = reconcile(&source, &target, &ReconOptions::fingerprint()).unwrap();
        prop_assert!(result.mismatched_rows.is_empty());
    }
}
