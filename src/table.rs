//! Rows, tables and datasets
//!
//! Tables are immutable once built. Row storage sits behind an `Arc` so that
//! projections and copies of a table share it instead of cloning cells.

use crate::error::{Result, TabfixtureError};
use crate::identifier::{ColumnId, TableId};
use crate::value::CellValue;
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

static NULL_CELL: CellValue = CellValue::NULL;

/// Why a cell could not be read from a table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellReadError {
    #[error("column '{column}' is not declared in table '{table}'")]
    NoSuchColumn { table: TableId, column: ColumnId },

    #[error("row {row} is out of bounds for table '{table}' ({row_count} rows)")]
    RowOutOfBounds {
        table: TableId,
        row: usize,
        row_count: usize,
    },
}

/// A mapping from column to value, iterated in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: IndexMap<ColumnId, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, column: ColumnId, value: impl Into<CellValue>) -> Self {
        self.values.insert(column, value.into());
        self
    }

    pub fn insert(&mut self, column: ColumnId, value: CellValue) {
        self.values.insert(column, value);
    }

    /// Value for a column; a column the row does not carry reads as NULL
    pub fn get(&self, column: &ColumnId) -> &CellValue {
        self.values.get(column).unwrap_or(&NULL_CELL)
    }

    pub fn contains(&self, column: &ColumnId) -> bool {
        self.values.contains_key(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnId, &CellValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(ColumnId, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (ColumnId, CellValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A named table with an ordered, duplicate-free column list
#[derive(Debug, Clone)]
pub struct Table {
    name: TableId,
    columns: Vec<ColumnId>,
    rows: Arc<Vec<Row>>,
}

impl Table {
    /// Create a table, rejecting duplicate column names
    pub fn new(name: TableId, columns: Vec<ColumnId>, rows: Vec<Row>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column) {
                return Err(TabfixtureError::config(format!(
                    "Duplicate column '{}' in table '{}'",
                    column, name
                )));
            }
        }

        Ok(Self {
            name,
            columns,
            rows: Arc::new(rows),
        })
    }

    /// Create a table from positional records
    pub fn from_records<S, V>(name: &str, columns: &[S], records: Vec<Vec<V>>) -> Result<Self>
    where
        S: AsRef<str>,
        V: Into<CellValue>,
    {
        let name = TableId::new(name)?;
        let columns = columns
            .iter()
            .map(ColumnId::new)
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            if record.len() != columns.len() {
                return Err(TabfixtureError::invalid_input(format!(
                    "Row {} of table '{}' has {} values but {} columns are declared",
                    index,
                    name,
                    record.len(),
                    columns.len()
                )));
            }
            rows.push(
                columns
                    .iter()
                    .cloned()
                    .zip(record.into_iter().map(Into::into))
                    .collect(),
            );
        }

        Self::new(name, columns, rows)
    }

    /// Same rows, different declared columns. Callers guarantee the columns
    /// are a duplicate-free subset of this table's columns.
    pub(crate) fn with_columns(&self, columns: Vec<ColumnId>) -> Self {
        Self {
            name: self.name.clone(),
            columns,
            rows: Arc::clone(&self.rows),
        }
    }

    pub fn name(&self) -> &TableId {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.as_str()).collect()
    }

    pub fn has_column(&self, column: &ColumnId) -> bool {
        self.columns.contains(column)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Read a cell through the declared column list
    pub fn value(&self, row: usize, column: &ColumnId) -> std::result::Result<&CellValue, CellReadError> {
        if !self.has_column(column) {
            return Err(CellReadError::NoSuchColumn {
                table: self.name.clone(),
                column: column.clone(),
            });
        }

        let record = self.rows.get(row).ok_or_else(|| CellReadError::RowOutOfBounds {
            table: self.name.clone(),
            row,
            row_count: self.rows.len(),
        })?;

        Ok(record.get(column))
    }

    /// Values of one row in declared column order
    pub fn record(&self, row: usize) -> Option<Vec<&CellValue>> {
        let record = self.rows.get(row)?;
        Some(self.columns.iter().map(|c| record.get(c)).collect())
    }

    /// Whether both tables read from the same row storage
    pub fn shares_rows_with(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.columns == other.columns
            && self.rows.len() == other.rows.len()
            && self.rows.iter().zip(other.rows.iter()).all(|(a, b)| {
                self.columns.iter().all(|c| a.get(c) == b.get(c))
            })
    }
}

/// Serializes as `{name, columns, rows}` with rows as positional arrays
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct Records<'a>(&'a Table);

        impl Serialize for Records<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                let table = self.0;
                let mut seq = serializer.serialize_seq(Some(table.row_count()))?;
                for row in table.rows() {
                    let values: Vec<&CellValue> = table.columns.iter().map(|c| row.get(c)).collect();
                    seq.serialize_element(&values)?;
                }
                seq.end()
            }
        }

        let mut state = serializer.serialize_struct("Table", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("rows", &Records(self))?;
        state.end()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in &self.values {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// An ordered collection of tables. Names may repeat until merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    tables: Vec<Table>,
}

impl Dataset {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Table> {
        self.tables.iter()
    }

    /// Table names in declaration order
    pub fn table_names(&self) -> Vec<&TableId> {
        self.tables.iter().map(Table::name).collect()
    }

    /// Table names in canonical (ascending) order
    pub fn sorted_table_names(&self) -> Vec<&TableId> {
        let mut names = self.table_names();
        names.sort();
        names
    }

    /// Look up the single table with this name
    pub fn table(&self, name: &TableId) -> Result<&Table> {
        let mut matches = self.tables.iter().filter(|t| t.name() == name);
        let found = matches
            .next()
            .ok_or_else(|| TabfixtureError::not_found(format!("table '{}' is not in the dataset", name)))?;

        if matches.next().is_some() {
            return Err(TabfixtureError::config(format!(
                "table '{}' appears more than once in the dataset; merge it first",
                name
            )));
        }

        Ok(found)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Table;
    type IntoIter = std::slice::Iter<'a, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

impl From<Vec<Table>> for Dataset {
    fn from(tables: Vec<Table>) -> Self {
        Self::new(tables)
    }
}
