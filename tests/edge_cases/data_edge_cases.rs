//! Edge case tests for data-related scenarios

use crate::common::{assertions::column_values, TestFixture};
use std::sync::Arc;
use tabfixture::identifier::scenario_ids;
use tabfixture::loader::{DatasetLoader, FormatRegistry};
use tabfixture::{compare_datasets, DefaultFailureHandler};

fn loader() -> DatasetLoader {
    DatasetLoader::new(Arc::new(FormatRegistry::with_defaults()))
}

#[test]
fn test_quoted_fields_with_commas_and_quotes() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw(
            "products.csv",
            "id,name\n1,\"Product,D\"\n2,\"Product \"\"C\"\"\"\n",
        )
        .unwrap();

    let dataset = loader().load(&[path], &[]).unwrap();
    assert_eq!(
        column_values(&dataset.tables()[0], "name"),
        vec![Some("Product,D".to_string()), Some("Product \"C\"".to_string())]
    );
}

#[test]
fn test_unicode_values() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw("places.csv", "id,name\n1,Café\n2,北京\n3,🚀\n")
        .unwrap();

    let dataset = loader().load(&[path], &[]).unwrap();
    assert_eq!(
        column_values(&dataset.tables()[0], "name"),
        vec![
            Some("Café".to_string()),
            Some("北京".to_string()),
            Some("🚀".to_string())
        ]
    );
}

#[test]
fn test_empty_cells_load_as_null() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_csv_raw("t.csv", "a,b\n1,\n,2\n").unwrap();

    let dataset = loader().load(&[path], &[]).unwrap();
    let table = &dataset.tables()[0];
    assert_eq!(column_values(table, "a"), vec![Some("1".to_string()), None]);
    assert_eq!(column_values(table, "b"), vec![None, Some("2".to_string())]);
}

#[test]
fn test_marker_must_be_first_column() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw("t.csv", "id,[scenario]\n1,s1\n2,s2\n")
        .unwrap();

    let dataset = loader().load(&[path], &scenario_ids(["s1"]).unwrap()).unwrap();
    let table = &dataset.tables()[0];
    assert_eq!(table.column_names(), vec!["id", "[scenario]"]);
    assert_eq!(table.row_count(), 2);
}

#[test]
fn test_whitespace_around_scenario_tags() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw("t.csv", "[scenario],v\n\" s1 \",a\n\"   \",b\ns1x,c\n")
        .unwrap();

    let dataset = loader().load(&[path], &scenario_ids(["s1"]).unwrap()).unwrap();
    assert_eq!(
        column_values(&dataset.tables()[0], "v"),
        vec![Some("a".to_string()), Some("b".to_string())]
    );
}

#[test]
fn test_scenario_names_are_case_sensitive() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_csv_raw("t.csv", "[scenario],v\nS1,a\ns1,b\n").unwrap();

    let dataset = loader().load(&[path], &scenario_ids(["s1"]).unwrap()).unwrap();
    assert_eq!(column_values(&dataset.tables()[0], "v"), vec![Some("b".to_string())]);
}

#[test]
fn test_null_differs_from_value() {
    let fixture = TestFixture::new().unwrap();
    let expected = fixture.create_csv_raw("e/t.csv", "a,b\n1,\n").unwrap();
    let actual = fixture.create_csv_raw("a/t.csv", "a,b\n1,x\n").unwrap();

    let expected = loader().load(&[expected], &[]).unwrap();
    let actual = loader().load(&[actual], &[]).unwrap();
    let error = compare_datasets(&expected, &actual, &mut DefaultFailureHandler::new()).unwrap_err();
    assert!(error.to_string().contains("expected <null> but was \"x\""));
}

#[test]
fn test_mismatched_merge_shapes_fail() {
    let fixture = TestFixture::new().unwrap();
    let first = fixture.create_csv_raw("one/users.csv", "id,name\n1,ann\n").unwrap();
    let second = fixture.create_csv_raw("two/users.csv", "name,id\nbob,2\n").unwrap();

    let error = loader().load(&[first, second], &[]).unwrap_err();
    assert!(error.is_config());
    let message = error.to_string();
    assert!(message.contains("[id, name]"), "{}", message);
    assert!(message.contains("[name, id]"), "{}", message);
}
