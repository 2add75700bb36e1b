//! Edge case tests for file system handling

use crate::common::{arg, CliTestRunner, TestFixture};
use std::fs;
use std::sync::Arc;
use tabfixture::config::{FixtureConfig, CONFIG_FILE_NAME};
use tabfixture::loader::{DatasetLoader, FormatRegistry};
use tabfixture::TabfixtureError;

#[test]
fn test_missing_input_path() {
    let runner = CliTestRunner::new().unwrap();
    let missing = runner.fixture().root().join("does-not-exist.csv");

    let error = runner.expect_failure(&["filter", arg(&missing)]);
    assert!(matches!(error, TabfixtureError::NotFound { .. }));
}

#[test]
fn test_unsupported_file_given_directly() {
    let runner = CliTestRunner::new().unwrap();
    let path = runner.fixture().create_csv_raw("notes.txt", "a,b\n1,2\n").unwrap();

    let error = runner.expect_failure(&["filter", arg(&path)]);
    assert!(matches!(error, TabfixtureError::UnsupportedFormat { .. }));
}

#[test]
fn test_directory_skips_unknown_files_and_empty_dirs() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_dir("data/empty").unwrap();
    fixture.create_csv_raw("data/README.md", "# notes").unwrap();
    fixture.create_csv_raw("data/users.csv", "id\n1\n").unwrap();
    fixture.create_csv_raw("data/nested/orders.tsv", "id\tamount\n1\t2.50\n").unwrap();

    let loader = DatasetLoader::new(Arc::new(FormatRegistry::with_defaults()));
    let dataset = loader.load(&[fixture.root().join("data")], &[]).unwrap();

    let names: Vec<&str> = dataset.table_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["orders", "users"]);
}

#[test]
fn test_empty_directory_loads_empty_dataset() {
    let fixture = TestFixture::new().unwrap();
    let dir = fixture.create_dir("nothing").unwrap();

    let loader = DatasetLoader::new(Arc::new(FormatRegistry::with_defaults()));
    assert!(loader.load(&[dir], &[]).unwrap().is_empty());
}

#[test]
fn test_config_discovered_from_subdirectory() {
    let fixture = TestFixture::new_empty().unwrap();
    fixture
        .create_config(&serde_json::json!({"scenario_marker": "@case"}))
        .unwrap();
    let nested = fixture.create_dir("a/b/c").unwrap();

    let found = FixtureConfig::find_config_file(&nested).unwrap();
    assert_eq!(found, fixture.root().join(CONFIG_FILE_NAME));
    assert_eq!(FixtureConfig::from_file(&found).unwrap().scenario_marker, "@case");
}

#[test]
fn test_explicit_config_must_exist() {
    let runner = CliTestRunner::new().unwrap();
    let path = runner.fixture().create_csv_raw("t.csv", "a\n1\n").unwrap();
    let missing = runner.fixture().root().join("missing.json");

    let error = runner.expect_failure(&["filter", arg(&path), "--config", arg(&missing)]);
    assert!(matches!(error, TabfixtureError::NotFound { .. }));
}

#[test]
fn test_malformed_config_file() {
    let runner = CliTestRunner::new().unwrap();
    fs::write(runner.fixture().config_path(), "{ not json").unwrap();
    let path = runner.fixture().create_csv_raw("t.csv", "a\n1\n").unwrap();

    let error = runner.expect_failure(&["filter", arg(&path)]);
    assert!(matches!(error, TabfixtureError::Json(_)));
}
