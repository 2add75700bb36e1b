//! Unit tests for the public table model

use tabfixture::identifier::column_ids;
use tabfixture::{CellValue, ColumnId, Dataset, Row, ScenarioId, Table, TableId};

#[test]
fn test_identifiers_are_trimmed_and_non_blank() {
    let column = ColumnId::new("  name ").unwrap();
    assert_eq!(column.as_str(), "name");
    assert_eq!(column, ColumnId::new("name").unwrap());
    assert_ne!(column, ColumnId::new("Name").unwrap());

    assert!(ColumnId::new("   ").is_err());
    assert!(TableId::new("").is_err());
    assert!(ScenarioId::new("\t").is_err());
}

#[test]
fn test_cell_values() {
    assert!(CellValue::null().is_null());
    assert!(!CellValue::new("").is_null());
    assert!(CellValue::new(" ").is_blank());
    assert!(CellValue::new("").normalize_empty().is_null());
    assert_eq!(CellValue::new("x").to_string(), "\"x\"");
    assert_eq!(CellValue::null().to_string(), "<null>");
}

#[test]
fn test_row_lookup_of_missing_column_is_null() {
    let row = Row::new().with(ColumnId::new("a").unwrap(), "1");
    assert_eq!(row.get(&ColumnId::new("a").unwrap()).as_str(), Some("1"));
    assert!(row.get(&ColumnId::new("b").unwrap()).is_null());
}

#[test]
fn test_table_rejects_duplicate_columns() {
    let result = Table::new(
        TableId::new("t").unwrap(),
        column_ids(["a", "b", "a"]).unwrap(),
        Vec::new(),
    );
    assert!(result.unwrap_err().is_config());
}

#[test]
fn test_table_value_errors() {
    let table = Table::from_records("t", &["a"], vec![vec!["1"]]).unwrap();
    assert!(table.value(0, &ColumnId::new("zzz").unwrap()).is_err());
    assert!(table.value(1, &ColumnId::new("a").unwrap()).is_err());
    assert_eq!(table.record(0).unwrap()[0].as_str(), Some("1"));
    assert!(table.record(3).is_none());
}

#[test]
fn test_dataset_lookup() {
    let dataset = Dataset::new(vec![
        Table::from_records("b", &["x"], Vec::<Vec<&str>>::new()).unwrap(),
        Table::from_records("a", &["x"], Vec::<Vec<&str>>::new()).unwrap(),
        Table::from_records("b", &["x"], Vec::<Vec<&str>>::new()).unwrap(),
    ]);

    let names: Vec<&str> = dataset.sorted_table_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "b"]);

    assert!(dataset.table(&TableId::new("a").unwrap()).is_ok());
    assert!(dataset.table(&TableId::new("b").unwrap()).unwrap_err().is_config());
    assert!(matches!(
        dataset.table(&TableId::new("c").unwrap()),
        Err(tabfixture::TabfixtureError::NotFound { .. })
    ));
}

#[test]
fn test_table_serializes_positionally() {
    let table = Table::from_records("t", &["a", "b"], vec![vec![Some("1"), None]]).unwrap();
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["name"], "t");
    assert_eq!(json["columns"], serde_json::json!(["a", "b"]));
    assert_eq!(json["rows"], serde_json::json!([["1", null]]));
}
