//! # Result Semantics Test Suite
//!
//! End-to-end tests of `LocalResult` through its public write and read
//! contracts.
//!
//! ## Test Categories
//!
//! 1. **Distinct**: Whole-row and subset distinctness, removal, lookups
//! 2. **Ordering**: Sort stability, null ordering, collations, hidden columns
//! 3. **Windows**: Offset, limit, fetch percent, with ties
//! 4. **Cursor**: Round trips, random access, contains_null reset
//! 5. **Lifecycle**: State errors, configuration errors, close
//!
//! ## Usage
//!
//! ```sh
//! cargo test --test result_semantics
//! ```

use resultset::{
    row, Collation, ColumnDef, DataType, LocalResult, OwnedValue, ResultError, ResultState,
    RowSink, RowSource, SortColumn, SortOrder,
};
use tempfile::{tempdir, TempDir};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn create_result() -> (TempDir, LocalResult) {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = LocalResult::builder()
        .column(ColumnDef::new("k", DataType::Int8))
        .column(ColumnDef::new("v", DataType::Text))
        .spill_dir(dir.path())
        .build()
        .expect("Failed to build result");
    (dir, result)
}

fn drain(result: &mut LocalResult) -> Vec<(i64, String)> {
    result.reset().unwrap();
    let mut rows = Vec::new();
    while result.next().unwrap() {
        let row = result.current_row().unwrap();
        let k = match &row[0] {
            OwnedValue::Int(k) => *k,
            other => panic!("Expected Int at index 0, got {:?}", other),
        };
        rows.push((k, row[1].display_string()));
    }
    rows
}

fn pairs(expected: &[(i64, &str)]) -> Vec<(i64, String)> {
    expected.iter().map(|(k, v)| (*k, v.to_string())).collect()
}

fn assert_result_error(err: &eyre::Report, check: impl Fn(&ResultError) -> bool) {
    match err.downcast_ref::<ResultError>() {
        Some(e) => assert!(check(e), "unexpected result error: {}", e),
        None => panic!("expected ResultError, got: {:?}", err),
    }
}

fn is_invalid_state(e: &ResultError) -> bool {
    matches!(e, ResultError::InvalidState { .. })
}

fn is_invalid_config(e: &ResultError) -> bool {
    matches!(e, ResultError::InvalidConfig(_))
}

// ============================================================================
// DISTINCT TESTS
// ============================================================================

mod distinct_tests {
    use super::*;

    #[test]
    fn whole_row_distinct_counts_unique_rows() {
        let inputs = [
            vec![(1, "a"), (2, "b"), (1, "a"), (3, "c"), (2, "b"), (1, "a")],
            vec![(3, "c"), (1, "a"), (1, "a"), (2, "b"), (3, "c"), (2, "b")],
        ];

        for input in inputs {
            let (_dir, mut result) = create_result();
            result.set_distinct().unwrap();
            for (k, v) in &input {
                result.append(row![*k as i64, *v]).unwrap();
            }
            result.done().unwrap();
            assert_eq!(result.row_count().unwrap(), 3);
        }
    }

    #[test]
    fn distinct_keeps_first_occurrence_in_append_order() {
        let (_dir, mut result) = create_result();
        result.set_distinct().unwrap();
        for (k, v) in [(2, "b"), (1, "a"), (2, "b"), (3, "c")] {
            result.append(row![k as i64, v]).unwrap();
        }
        result.done().unwrap();
        assert_eq!(drain(&mut result), pairs(&[(2, "b"), (1, "a"), (3, "c")]));
    }

    #[test]
    fn subset_distinct_collapses_rows_differing_outside_key() {
        let (_dir, mut result) = create_result();
        result.set_distinct_columns(&[0]).unwrap();
        result.append(row![1i64, "a"]).unwrap();
        result.append(row![1i64, "b"]).unwrap();
        result.append(row![1i64, "c"]).unwrap();
        result.done().unwrap();

        assert_eq!(result.row_count().unwrap(), 1);
        assert_eq!(drain(&mut result), pairs(&[(1, "a")]));
    }

    #[test]
    fn null_keys_are_equal_for_distinct() {
        let (_dir, mut result) = create_result();
        result.set_distinct().unwrap();
        result.append(row![OwnedValue::Null, "a"]).unwrap();
        result.append(row![OwnedValue::Null, "a"]).unwrap();
        result.done().unwrap();
        assert_eq!(result.row_count().unwrap(), 1);
    }

    #[test]
    fn nocase_column_folds_distinct_keys() {
        let dir = tempdir().unwrap();
        let mut result = LocalResult::builder()
            .column(ColumnDef::new("name", DataType::Text).with_collation(Collation::NoCase))
            .spill_dir(dir.path())
            .build()
            .unwrap();
        result.set_distinct().unwrap();
        result.append(row!["Alice"]).unwrap();
        result.append(row!["ALICE"]).unwrap();
        result.append(row!["bob"]).unwrap();
        result.done().unwrap();
        assert_eq!(result.row_count().unwrap(), 2);
    }

    #[test]
    fn nocase_distinct_folds_final_sigma_like_comparison() {
        let dir = tempdir().unwrap();
        let mut result = LocalResult::builder()
            .column(ColumnDef::new("word", DataType::Text).with_collation(Collation::NoCase))
            .spill_dir(dir.path())
            .build()
            .unwrap();
        result.set_distinct().unwrap();
        result.append(row!["ΟΔΟΣ"]).unwrap();
        result.append(row!["οδοσ"]).unwrap();
        result.append(row!["Οδός"]).unwrap();
        result.done().unwrap();
        assert_eq!(result.row_count().unwrap(), 2);
    }

    #[test]
    fn decimal_distinct_matches_numeric_equality() {
        let dir = tempdir().unwrap();
        let mut result = LocalResult::builder()
            .column(ColumnDef::new("amount", DataType::Decimal))
            .spill_dir(dir.path())
            .build()
            .unwrap();
        result.set_distinct().unwrap();
        for value in [
            OwnedValue::Decimal(1, -1),
            OwnedValue::Decimal(10, 0),
            OwnedValue::Decimal(1000, 2),
            OwnedValue::Decimal(100, 0),
        ] {
            result.append(row![value]).unwrap();
        }
        result.done().unwrap();
        assert_eq!(result.row_count().unwrap(), 2);
    }

    #[test]
    fn contains_distinct_does_not_register_key() {
        let (_dir, mut result) = create_result();
        result.set_distinct().unwrap();
        result.append(row![1i64, "a"]).unwrap();

        assert!(result.contains_distinct(&row![1i64, "a"]).unwrap());
        assert!(!result.contains_distinct(&row![2i64, "b"]).unwrap());
        assert!(!result.contains_distinct(&row![2i64, "b"]).unwrap());
        assert_eq!(result.row_count().unwrap(), 1);
    }

    #[test]
    fn remove_distinct_excludes_row_and_is_idempotent() {
        let (_dir, mut result) = create_result();
        result.set_distinct().unwrap();
        result.append(row![1i64, "a"]).unwrap();
        result.append(row![2i64, "b"]).unwrap();
        result.append(row![3i64, "c"]).unwrap();

        result.remove_distinct(&row![2i64, "b"]).unwrap();
        result.remove_distinct(&row![2i64, "b"]).unwrap();
        result.remove_distinct(&row![9i64, "z"]).unwrap();
        assert_eq!(result.row_count().unwrap(), 2);
        assert!(!result.contains_distinct(&row![2i64, "b"]).unwrap());

        result.done().unwrap();
        assert_eq!(drain(&mut result), pairs(&[(1, "a"), (3, "c")]));
    }

    #[test]
    fn removed_key_can_be_appended_again() {
        let (_dir, mut result) = create_result();
        result.set_distinct().unwrap();
        result.append(row![1i64, "a"]).unwrap();
        result.append(row![2i64, "b"]).unwrap();
        result.remove_distinct(&row![1i64, "a"]).unwrap();
        result.append(row![1i64, "a"]).unwrap();
        result.done().unwrap();

        assert_eq!(drain(&mut result), pairs(&[(2, "b"), (1, "a")]));
    }

    #[test]
    fn remove_distinct_is_write_side_only() {
        let (_dir, mut result) = create_result();
        result.set_distinct().unwrap();
        result.append(row![1i64, "a"]).unwrap();
        result.done().unwrap();

        let err = result.remove_distinct(&row![1i64, "a"]).unwrap_err();
        assert_result_error(&err, is_invalid_state);
        assert_eq!(result.row_count().unwrap(), 1);
    }

    #[test]
    fn remove_distinct_without_distinct_mode_is_config_error() {
        let (_dir, mut result) = create_result();
        result.append(row![1i64, "a"]).unwrap();
        let err = result.remove_distinct(&row![1i64, "a"]).unwrap_err();
        assert_result_error(&err, is_invalid_config);
    }

    #[test]
    fn contains_distinct_without_distinct_mode_tracks_appends() {
        let (_dir, mut result) = create_result();
        result.append(row![1i64, "a"]).unwrap();
        assert!(result.contains_distinct(&row![1i64, "a"]).unwrap());
        assert!(!result.contains_distinct(&row![2i64, "b"]).unwrap());

        result.append(row![2i64, "b"]).unwrap();
        assert!(result.contains_distinct(&row![2i64, "b"]).unwrap());
    }

    #[test]
    fn contains_distinct_after_done_sees_only_window() {
        let (_dir, mut result) = create_result();
        result.set_distinct_columns(&[0]).unwrap();
        for k in 0..5i64 {
            result.append(row![k, "x"]).unwrap();
        }
        result.set_limit(2).unwrap();
        result.done().unwrap();

        assert!(result.contains_distinct(&row![1i64, "other"]).unwrap());
        assert!(!result.contains_distinct(&row![3i64, "x"]).unwrap());
    }

    #[test]
    fn distinct_configuration_conflicts_are_rejected() {
        let (_dir, mut result) = create_result();
        result.set_distinct().unwrap();
        result.set_distinct().unwrap();
        let err = result.set_distinct_columns(&[0]).unwrap_err();
        assert_result_error(&err, is_invalid_config);

        let (_dir, mut result) = create_result();
        result.append(row![1i64, "a"]).unwrap();
        let err = result.set_distinct().unwrap_err();
        assert_result_error(&err, is_invalid_config);

        let (_dir, mut result) = create_result();
        let err = result.set_distinct_columns(&[7]).unwrap_err();
        assert_result_error(&err, is_invalid_config);
    }
}

// ============================================================================
// ORDERING TESTS
// ============================================================================

mod ordering_tests {
    use super::*;

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let (_dir, mut result) = create_result();
        result
            .set_sort_order(SortOrder::new().then(SortColumn::asc(0)))
            .unwrap();
        for (k, v) in [(2, "x"), (1, "a"), (2, "y"), (1, "b"), (2, "z")] {
            result.append(row![k as i64, v]).unwrap();
        }
        result.done().unwrap();

        assert_eq!(
            drain(&mut result),
            pairs(&[(1, "a"), (1, "b"), (2, "x"), (2, "y"), (2, "z")])
        );
    }

    #[test]
    fn descending_sort_puts_nulls_last_by_default() {
        let (_dir, mut result) = create_result();
        result
            .set_sort_order(SortOrder::new().then(SortColumn::desc(0)))
            .unwrap();
        result.append(row![OwnedValue::Null, "n"]).unwrap();
        result.append(row![1i64, "a"]).unwrap();
        result.append(row![3i64, "c"]).unwrap();
        result.done().unwrap();

        let order: Vec<String> = drain(&mut result).into_iter().map(|(_, v)| v).collect();
        assert_eq!(order, vec!["c", "a", "n"]);
    }

    #[test]
    fn explicit_nulls_last_on_ascending_sort() {
        let (_dir, mut result) = create_result();
        result
            .set_sort_order(SortOrder::new().then(SortColumn::asc(0).nulls_last()))
            .unwrap();
        result.append(row![OwnedValue::Null, "n"]).unwrap();
        result.append(row![2i64, "b"]).unwrap();
        result.append(row![1i64, "a"]).unwrap();
        result.done().unwrap();

        let order: Vec<String> = drain(&mut result).into_iter().map(|(_, v)| v).collect();
        assert_eq!(order, vec!["a", "b", "n"]);
    }

    #[test]
    fn hidden_sort_column_orders_but_is_not_exposed() {
        let dir = tempdir().unwrap();
        let mut result = LocalResult::builder()
            .column(ColumnDef::new("name", DataType::Text))
            .column(ColumnDef::new("rank", DataType::Int8))
            .visible_columns(1)
            .spill_dir(dir.path())
            .build()
            .unwrap();
        result
            .set_sort_order(SortOrder::new().then(SortColumn::desc(1)))
            .unwrap();
        result.append(row!["low", 1i64]).unwrap();
        result.append(row!["high", 9i64]).unwrap();
        result.append(row!["none", OwnedValue::Null]).unwrap();
        result.done().unwrap();

        assert!(!result.contains_null().unwrap());
        let mut names = Vec::new();
        while result.next().unwrap() {
            let row = result.current_row().unwrap();
            assert_eq!(row.len(), 1);
            names.push(row[0].display_string());
        }
        assert_eq!(names, vec!["high", "low", "none"]);
    }

    #[test]
    fn sort_order_with_bad_column_is_rejected() {
        let (_dir, mut result) = create_result();
        let err = result
            .set_sort_order(SortOrder::new().then(SortColumn::asc(2)))
            .unwrap_err();
        assert_result_error(&err, is_invalid_config);
    }
}

// ============================================================================
// WINDOW TESTS
// ============================================================================

mod window_tests {
    use super::*;

    fn five_rows() -> (TempDir, LocalResult) {
        let (dir, mut result) = create_result();
        for k in 0..5i64 {
            result.append(row![k, format!("r{}", k)]).unwrap();
        }
        (dir, result)
    }

    fn keys(result: &mut LocalResult) -> Vec<i64> {
        drain(result).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn with_ties_includes_rows_tied_with_cutoff() {
        let (_dir, mut result) = create_result();
        result
            .set_sort_order(SortOrder::new().then(SortColumn::asc(0)))
            .unwrap();
        result.set_limit(1).unwrap();
        result.set_with_ties(true).unwrap();
        result.append(row![1i64, "a"]).unwrap();
        result.append(row![1i64, "b"]).unwrap();
        result.append(row![2i64, "c"]).unwrap();
        result.done().unwrap();

        assert_eq!(result.row_count().unwrap(), 2);
        assert_eq!(drain(&mut result), pairs(&[(1, "a"), (1, "b")]));
    }

    #[test]
    fn offset_with_unbounded_limit_returns_tail() {
        let (_dir, mut result) = five_rows();
        result.set_offset(3).unwrap();
        result.set_limit(-1).unwrap();
        result.done().unwrap();
        assert_eq!(keys(&mut result), vec![3, 4]);
    }

    #[test]
    fn offset_past_end_returns_empty_window() {
        let (_dir, mut result) = five_rows();
        result.set_offset(10).unwrap();
        result.done().unwrap();
        assert_eq!(result.row_count().unwrap(), 0);
        assert!(!result.next().unwrap());
    }

    #[test]
    fn zero_limit_returns_empty_window_regardless_of_offset() {
        for offset in [0, 2, 10] {
            let (_dir, mut result) = five_rows();
            result.set_offset(offset).unwrap();
            result.set_limit(0).unwrap();
            result.done().unwrap();
            assert_eq!(result.row_count().unwrap(), 0);
        }
    }

    #[test]
    fn offset_and_limit_select_middle_rows() {
        let (_dir, mut result) = five_rows();
        result.set_offset(1).unwrap();
        result.set_limit(2).unwrap();
        result.done().unwrap();
        assert_eq!(keys(&mut result), vec![1, 2]);
    }

    #[test]
    fn fetch_percent_rounds_up() {
        let (_dir, mut result) = create_result();
        for k in 0..10i64 {
            result.append(row![k, "x"]).unwrap();
        }
        result.set_fetch_percent(true).unwrap();
        result.set_limit(25).unwrap();
        result.done().unwrap();
        assert_eq!(result.row_count().unwrap(), 3);
        assert_eq!(keys(&mut result), vec![0, 1, 2]);
    }

    #[test]
    fn fetch_percent_counts_rows_after_distinct() {
        let (_dir, mut result) = create_result();
        result.set_distinct().unwrap();
        for k in 0..10i64 {
            result.append(row![k % 4, "x"]).unwrap();
        }
        result.set_fetch_percent(true).unwrap();
        result.set_limit(50).unwrap();
        result.done().unwrap();
        assert_eq!(result.row_count().unwrap(), 2);
    }

    #[test]
    fn fetch_percent_out_of_range_fails_at_done_and_keeps_building() {
        let (_dir, mut result) = five_rows();
        result.set_fetch_percent(true).unwrap();
        result.set_limit(150).unwrap();

        let err = result.done().unwrap_err();
        assert_result_error(&err, is_invalid_config);
        assert_eq!(result.state(), ResultState::Building);

        result.set_limit(100).unwrap();
        result.done().unwrap();
        assert_eq!(result.row_count().unwrap(), 5);
    }

    #[test]
    fn fetch_percent_without_limit_fails_at_done() {
        let (_dir, mut result) = five_rows();
        result.set_fetch_percent(true).unwrap();
        result.set_limit(-1).unwrap();

        let err = result.done().unwrap_err();
        assert_result_error(&err, is_invalid_config);
        assert_eq!(result.state(), ResultState::Building);

        result.set_fetch_percent(false).unwrap();
        result.done().unwrap();
        assert_eq!(result.row_count().unwrap(), 5);
    }

    #[test]
    fn with_ties_without_sort_fails_at_done() {
        let (_dir, mut result) = five_rows();
        result.set_limit(1).unwrap();
        result.set_with_ties(true).unwrap();
        let err = result.done().unwrap_err();
        assert_result_error(&err, is_invalid_config);
    }

    #[test]
    fn sorted_window_with_offset() {
        let (_dir, mut result) = five_rows();
        result
            .set_sort_order(SortOrder::new().then(SortColumn::desc(0)))
            .unwrap();
        result.set_offset(1).unwrap();
        result.set_limit(3).unwrap();
        result.done().unwrap();
        assert_eq!(keys(&mut result), vec![3, 2, 1]);
    }
}

// ============================================================================
// CURSOR TESTS
// ============================================================================

mod cursor_tests {
    use super::*;

    #[test]
    fn round_trip_iterations_are_identical() {
        let (_dir, mut result) = create_result();
        for k in 0..50i64 {
            result.append(row![k * 3 % 17, format!("v{}", k)]).unwrap();
        }
        result.done().unwrap();

        let first = drain(&mut result);
        let second = drain(&mut result);
        assert_eq!(first.len(), 50);
        assert_eq!(first, second);
    }

    #[test]
    fn contains_null_resets_cursor() {
        let dir = tempdir().unwrap();
        let mut result = LocalResult::builder()
            .column(ColumnDef::new("a", DataType::Int8))
            .column(ColumnDef::new("b", DataType::Int8))
            .spill_dir(dir.path())
            .build()
            .unwrap();
        result.append(row![1i64, OwnedValue::Null]).unwrap();
        result.append(row![2i64, 3i64]).unwrap();
        result.done().unwrap();

        assert!(result.next().unwrap());
        assert_eq!(result.row_id().unwrap(), 0);

        assert!(result.contains_null().unwrap());
        assert_eq!(result.row_id().unwrap(), -1);

        let mut seen = Vec::new();
        while result.next().unwrap() {
            seen.push(result.current_row().unwrap().to_vec());
        }
        assert_eq!(
            seen,
            vec![
                vec![OwnedValue::Int(1), OwnedValue::Null],
                vec![OwnedValue::Int(2), OwnedValue::Int(3)],
            ]
        );

        result.next().unwrap();
        assert!(result.contains_null().unwrap());
        assert_eq!(result.row_id().unwrap(), -1);
    }

    #[test]
    fn contains_null_while_building() {
        let (_dir, mut result) = create_result();
        result.append(row![1i64, "a"]).unwrap();
        assert!(!result.contains_null().unwrap());
        result.append(row![OwnedValue::Null, "b"]).unwrap();
        assert!(result.contains_null().unwrap());
    }

    #[test]
    fn contains_null_ignores_removed_rows() {
        let (_dir, mut result) = create_result();
        result.set_distinct().unwrap();
        result.append(row![OwnedValue::Null, "a"]).unwrap();
        result.append(row![1i64, "b"]).unwrap();
        assert!(result.contains_null().unwrap());

        result.remove_distinct(&row![OwnedValue::Null, "a"]).unwrap();
        assert!(!result.contains_null().unwrap());
    }

    #[test]
    fn random_access_by_position() {
        let (_dir, mut result) = create_result();
        for k in 0..10i64 {
            result.append(row![k, "x"]).unwrap();
        }
        result.done().unwrap();

        assert_eq!(result.row_id().unwrap(), -1);
        assert!(result.absolute(7).unwrap());
        assert_eq!(result.current_row().unwrap()[0], OwnedValue::Int(7));
        assert!(result.has_next().unwrap());
        assert!(result.next().unwrap());
        assert_eq!(result.row_id().unwrap(), 8);

        assert_eq!(result.row_at(2).unwrap()[0], OwnedValue::Int(2));
        assert_eq!(result.row_id().unwrap(), 8);

        assert!(!result.absolute(10).unwrap());
        assert!(result.is_after_last().unwrap());
        assert!(result.current_row().is_none());
    }

    #[test]
    fn shallow_copy_reads_independently() {
        let (_dir, mut result) = create_result();
        for k in 0..3i64 {
            result.append(row![k, "x"]).unwrap();
        }
        result.done().unwrap();
        result.next().unwrap();
        result.next().unwrap();

        let mut copy = result.shallow_copy().unwrap();
        assert_eq!(copy.row_count().unwrap(), 3);
        assert!(copy.next().unwrap());
        assert_eq!(copy.current_row().unwrap()[0], OwnedValue::Int(0));
        assert_eq!(result.current_row().unwrap()[0], OwnedValue::Int(1));

        result.close();
        assert_eq!(drain(&mut copy).len(), 3);
    }

    #[test]
    fn shallow_copy_requires_ready() {
        let (_dir, result) = create_result();
        let err = result.shallow_copy().unwrap_err();
        assert_result_error(&err, is_invalid_state);
    }

    #[test]
    fn add_rows_appends_in_order() {
        let (_dir, mut result) = create_result();
        result
            .add_rows((0..4i64).map(|k| row![k, "x"]))
            .unwrap();
        result.done().unwrap();
        let keys: Vec<i64> = drain(&mut result).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![0, 1, 2, 3]);
    }
}

// ============================================================================
// LIFECYCLE TESTS
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn mutation_after_done_is_state_error() {
        let (_dir, mut result) = create_result();
        result.append(row![1i64, "a"]).unwrap();
        result.done().unwrap();

        assert_result_error(&result.append(row![2i64, "b"]).unwrap_err(), is_invalid_state);
        assert_result_error(&result.set_limit(1).unwrap_err(), is_invalid_state);
        assert_result_error(&result.set_offset(1).unwrap_err(), is_invalid_state);
        assert_result_error(&result.set_distinct().unwrap_err(), is_invalid_state);
        assert_result_error(&result.set_max_memory_rows(5).unwrap_err(), is_invalid_state);
        assert_result_error(
            &result
                .set_sort_order(SortOrder::new().then(SortColumn::asc(0)))
                .unwrap_err(),
            is_invalid_state,
        );
    }

    #[test]
    fn current_row_after_close_is_distinguishable() {
        let (_dir, mut result) = create_result();
        result.append(row![1i64, "a"]).unwrap();
        result.done().unwrap();

        assert_eq!(result.try_current_row().unwrap(), None);
        assert!(result.next().unwrap());
        assert!(result.try_current_row().unwrap().is_some());

        result.close();
        assert!(result.current_row().is_none());
        assert_result_error(&result.try_current_row().unwrap_err(), is_invalid_state);
    }

    #[test]
    fn second_done_is_noop() {
        let (_dir, mut result) = create_result();
        result.append(row![1i64, "a"]).unwrap();
        result.done().unwrap();
        result.next().unwrap();
        result.done().unwrap();
        assert_eq!(result.row_id().unwrap(), 0);
        assert_eq!(result.state(), ResultState::Ready);
    }

    #[test]
    fn reads_before_done_are_state_errors() {
        let (_dir, mut result) = create_result();
        result.append(row![1i64, "a"]).unwrap();
        assert_result_error(&result.next().unwrap_err(), is_invalid_state);
        assert_result_error(&result.reset().unwrap_err(), is_invalid_state);
        assert_eq!(result.row_count().unwrap(), 1);
    }

    #[test]
    fn reads_after_close_are_state_errors() {
        let (_dir, mut result) = create_result();
        result.append(row![1i64, "a"]).unwrap();
        result.done().unwrap();
        result.close();
        result.close();

        assert!(result.is_closed());
        assert_result_error(&result.next().unwrap_err(), is_invalid_state);
        assert_result_error(&result.row_count().unwrap_err(), is_invalid_state);
        assert_result_error(&result.contains_null().unwrap_err(), is_invalid_state);
        assert_result_error(
            &result.contains_distinct(&row![1i64, "a"]).unwrap_err(),
            is_invalid_state,
        );
        assert_result_error(&result.done().unwrap_err(), is_invalid_state);
        assert!(result.current_row().is_none());
    }

    #[test]
    fn row_shape_errors() {
        let (_dir, mut result) = create_result();

        let err = result.append(row![1i64]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResultError>(),
            Some(&ResultError::ArityMismatch {
                expected: 2,
                found: 1
            })
        );

        let err = result.append(row!["a", "b"]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResultError>(),
            Some(&ResultError::TypeMismatch {
                column: 0,
                expected: DataType::Int8,
                found: DataType::Text
            })
        );

        let err = result.contains_distinct(&row![1.5f64, "b"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResultError>(),
            Some(ResultError::TypeMismatch { column: 0, .. })
        ));

        assert_eq!(result.row_count().unwrap(), 0);
    }

    #[test]
    fn max_memory_rows_validation() {
        let (_dir, mut result) = create_result();
        result.set_max_memory_rows(-1).unwrap();
        result.set_max_memory_rows(0).unwrap();
        let err = result.set_max_memory_rows(-2).unwrap_err();
        assert_result_error(&err, is_invalid_config);
    }

    #[test]
    fn empty_result_finalizes() {
        let (_dir, mut result) = create_result();
        result
            .set_sort_order(SortOrder::new().then(SortColumn::asc(0)))
            .unwrap();
        result.done().unwrap();
        assert_eq!(result.row_count().unwrap(), 0);
        assert!(!result.next().unwrap());
        assert!(!result.contains_null().unwrap());
    }
}
