//! Functional tests for the filter, merge and compare commands

use crate::common::{arg, assertions, sample_data, CliTestRunner};

#[test]
fn test_filter_command_pretty_and_json() {
    let runner = CliTestRunner::new().unwrap();
    let path = runner.fixture().create_csv("users.csv", &sample_data::tagged_users()).unwrap();

    runner.expect_success(&["filter", arg(&path)]);
    runner.expect_success(&["filter", arg(&path), "-s", "s1", "--format", "json"]);
}

#[test]
fn test_filter_command_rejects_bad_format() {
    let runner = CliTestRunner::new().unwrap();
    let path = runner.fixture().create_csv("users.csv", &sample_data::users()).unwrap();

    let error = runner.expect_failure(&["filter", arg(&path), "--format", "xml"]);
    assert!(error.to_string().contains("Invalid output format"));
}

#[test]
fn test_filter_command_rejects_blank_scenario() {
    let runner = CliTestRunner::new().unwrap();
    let path = runner.fixture().create_csv("users.csv", &sample_data::tagged_users()).unwrap();

    let error = runner.expect_failure(&["filter", arg(&path), "--scenario", " "]);
    assert!(matches!(error, tabfixture::TabfixtureError::InvalidInput { .. }));
}

#[test]
fn test_merge_command() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let first = fixture.create_csv("one/users.csv", &sample_data::users()).unwrap();
    let second = fixture
        .create_csv_raw("two/users.csv", "id,name,email\n3,cy,cy@example.com\n")
        .unwrap();

    runner.expect_success(&["merge", arg(&first), arg(&second), "--format", "json"]);
}

#[test]
fn test_compare_command_match_and_mismatch() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let expected = fixture.create_csv("expected/users.csv", &sample_data::users()).unwrap();
    let same = fixture.create_csv("same/users.csv", &sample_data::users()).unwrap();
    let changed = fixture
        .create_csv_raw(
            "changed/users.csv",
            "id,name,email\n1,ann,ann@example.com\n2,bob,bob@example.org\n",
        )
        .unwrap();

    runner.expect_success(&["compare", arg(&expected), arg(&same)]);

    let error = runner.expect_failure(&["compare", arg(&expected), arg(&changed), "--key", "id"]);
    assertions::assert_validation_failure(&error, &["1 discrepancy(ies) found"]);

    runner.expect_success(&["compare", arg(&expected), arg(&changed), "--ignore", "email"]);
}

#[test]
fn test_compare_command_uses_configured_wildcard() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture
        .create_config(&serde_json::json!({"wildcard": "*"}))
        .unwrap();
    let expected = fixture
        .create_csv_raw("expected/users.csv", "id,name,email\n1,ann,*\n")
        .unwrap();
    let actual = fixture
        .create_csv_raw("actual/users.csv", "id,name,email\n1,ann,ann@example.com\n")
        .unwrap();

    runner.expect_success(&["compare", arg(&expected), arg(&actual), "--format", "json"]);
}

#[test]
fn test_compare_command_structural_mismatch() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let expected = fixture.create_dir("expected").unwrap();
    fixture.create_csv("expected/customers.csv", &sample_data::customers()).unwrap();
    fixture.create_csv("expected/orders.csv", &sample_data::orders()).unwrap();
    let actual = fixture.create_csv("actual/customers.csv", &sample_data::customers()).unwrap();

    let error = runner.expect_failure(&["compare", arg(&expected), arg(&actual)]);
    assertions::assert_validation_failure(&error, &["1 discrepancy(ies) found"]);
}
