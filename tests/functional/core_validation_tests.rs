//! Functional tests for the core filtering, merging and comparison rules

use crate::common::assertions::{assert_validation_failure, column_values};
use tabfixture::compare::comparison_columns;
use tabfixture::identifier::{column_ids, scenario_ids};
use tabfixture::{
    compare_datasets, compare_tables, exclude_columns, filter_by_scenario, include_columns, match_columns,
    merge_tables, CellValue, ColumnId, Comparer, DataType, Dataset, DefaultFailureHandler, Difference,
    FailureHandler, Table, TabfixtureError, Verdict, DEFAULT_SCENARIO_MARKER,
};

fn tagged() -> Table {
    Table::from_records(
        "users",
        &["[scenario]", "id", "name"],
        vec![
            vec![Some("s1"), Some("1"), Some("ann")],
            vec![Some("s2"), Some("2"), Some("bob")],
            vec![Some("s1"), Some("3"), Some("")],
            vec![None, Some("4"), Some("dee")],
        ],
    )
    .unwrap()
}

#[test]
fn test_filter_leaves_untagged_tables_alone() {
    let plain = Table::from_records("t", &["id", "v"], vec![vec!["1", ""]]).unwrap();
    let filtered = filter_by_scenario(&plain, &scenario_ids(["s1"]).unwrap(), DEFAULT_SCENARIO_MARKER).unwrap();
    assert_eq!(filtered, plain);
    // no empty-string normalisation on untagged tables
    assert_eq!(column_values(&filtered, "v"), vec![Some(String::new())]);
}

#[test]
fn test_filter_without_request_keeps_every_row() {
    let filtered = filter_by_scenario(&tagged(), &[], DEFAULT_SCENARIO_MARKER).unwrap();
    assert_eq!(filtered.row_count(), 4);
    assert_eq!(filtered.column_names(), vec!["id", "name"]);
}

#[test]
fn test_filter_selects_requested_and_blank_rows() {
    let filtered = filter_by_scenario(&tagged(), &scenario_ids(["s1"]).unwrap(), DEFAULT_SCENARIO_MARKER).unwrap();
    assert_eq!(
        column_values(&filtered, "id"),
        vec![Some("1".to_string()), Some("3".to_string()), Some("4".to_string())]
    );
    // present-but-empty becomes absent on tagged tables
    assert_eq!(column_values(&filtered, "name")[1], None);
}

#[test]
fn test_merge_identity_and_order() {
    let a = Table::from_records("t", &["x"], vec![vec!["1"], vec!["2"]]).unwrap();
    let b = Table::from_records("t", &["x"], vec![vec!["2"], vec!["3"]]).unwrap();

    assert_eq!(merge_tables(&[a.clone()]).unwrap(), a);

    let merged = merge_tables(&[a, b]).unwrap();
    assert_eq!(
        column_values(&merged, "x"),
        vec![
            Some("1".to_string()),
            Some("2".to_string()),
            Some("2".to_string()),
            Some("3".to_string())
        ]
    );
}

#[test]
fn test_merge_rejects_empty_and_mismatched_input() {
    assert!(merge_tables(&[]).unwrap_err().is_config());

    let a = Table::from_records("t", &["x", "y"], Vec::<Vec<&str>>::new()).unwrap();
    let renamed = Table::from_records("u", &["x", "y"], Vec::<Vec<&str>>::new()).unwrap();
    let reordered = Table::from_records("t", &["y", "x"], Vec::<Vec<&str>>::new()).unwrap();

    let error = merge_tables(&[a.clone(), renamed]).unwrap_err();
    assert!(error.to_string().contains("'t'") && error.to_string().contains("'u'"));

    let error = merge_tables(&[a, reordered]).unwrap_err();
    assert!(error.is_config());
}

#[test]
fn test_structural_short_circuit() {
    let dataset = Dataset::new(vec![Table::from_records("t", &["x"], vec![vec!["1"]]).unwrap()]);
    struct Panicking;
    impl FailureHandler for Panicking {
        fn handle(&mut self, _difference: &Difference<'_>) -> Verdict {
            panic!("handler must not be consulted");
        }
    }
    compare_datasets(&dataset, &dataset, &mut Panicking).unwrap();
}

#[test]
fn test_count_mismatch_skips_content() {
    let expected = Dataset::new(vec![
        Table::from_records("a", &["x"], vec![vec!["1"]]).unwrap(),
        Table::from_records("b", &["x"], vec![vec!["1"]]).unwrap(),
    ]);
    let actual = Dataset::new(vec![Table::from_records("a", &["x"], vec![vec!["999"]]).unwrap()]);

    let error = compare_datasets(&expected, &actual, &mut DefaultFailureHandler::new()).unwrap_err();
    match error {
        TabfixtureError::Validation(failure) => {
            assert_eq!(failure.discrepancies.len(), 1);
            assert!(!failure.message.contains("999"));
        }
        other => panic!("unexpected error {}", other),
    }
}

#[test]
fn test_content_failures_aggregate_rows_one_and_three() {
    let expected = Table::from_records("t", &["v"], vec![vec!["a"], vec!["b"], vec!["c"]]).unwrap();
    let actual = Table::from_records("t", &["v"], vec![vec!["x"], vec!["b"], vec!["z"]]).unwrap();
    let columns = comparison_columns(&expected, &DataType::Unknown);

    let error = compare_tables(&expected, &actual, &columns, &mut DefaultFailureHandler::new()).unwrap_err();
    assert_validation_failure(&error, &["2 error(s)", "at row 1,", "at row 3,"]);
    assert!(!error.to_string().contains("at row 2,"));
}

#[test]
fn test_always_skip_predicate() {
    let expected = Table::from_records("t", &["v"], vec![vec!["a"]]).unwrap();
    let actual = Table::from_records("t", &["v"], vec![vec!["b"]]).unwrap();
    let columns = comparison_columns(&expected, &DataType::Unknown);
    let skip_all = |_: &ColumnId, _: &CellValue, _: &CellValue| true;

    Comparer::new()
        .with_skip(&skip_all)
        .compare_tables(&expected, &actual, &columns, &mut DefaultFailureHandler::new())
        .unwrap();
}

#[test]
fn test_projections_do_not_modify_source() {
    let source = Table::from_records("t", &["a", "b", "c"], vec![vec!["1", "2", "3"]]).unwrap();
    let snapshot = source.clone();

    let included = include_columns(&source, &column_ids(["c", "a"]).unwrap());
    let excluded = exclude_columns(&source, &column_ids(["a"]).unwrap());
    let template = Table::from_records("t", &["c", "b"], Vec::<Vec<&str>>::new()).unwrap();
    let matched = match_columns(&source, &template);

    assert_eq!(included.column_names(), vec!["a", "c"]);
    assert_eq!(excluded.column_names(), vec!["b", "c"]);
    assert_eq!(matched.column_names(), vec!["c", "b"]);
    assert_eq!(source, snapshot);
}
