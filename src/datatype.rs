//! Comparison types
//!
//! Cells are stored as text. A comparison type decides how two cells order
//! against each other, e.g. numerically or as calendar dates. Nulls order
//! before every present value and equal each other.

use crate::error::TabfixtureError;
use crate::identifier::{ColumnId, TableId};
use crate::value::CellValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A present value could not be interpreted as the comparison type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot read {value:?} as {type_name}: {reason}")]
pub struct TypeCastError {
    pub type_name: String,
    pub value: String,
    pub reason: String,
}

impl TypeCastError {
    pub fn new(type_name: &str, value: &str, reason: impl fmt::Display) -> Self {
        Self {
            type_name: type_name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Ordering semantics for one column, supplied by the caller
pub trait ComparisonType: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn compare(&self, expected: &CellValue, actual: &CellValue) -> Result<Ordering, TypeCastError>;
}

/// Built-in comparison types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// Exact string comparison
    #[default]
    Unknown,
    /// Exact string comparison, declared explicitly
    Text,
    Integer,
    Numeric,
    Boolean,
    Date,
    Timestamp,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Unknown => "unknown",
            DataType::Text => "text",
            DataType::Integer => "integer",
            DataType::Numeric => "numeric",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::Timestamp => "timestamp",
        }
    }

    fn compare_present(&self, expected: &str, actual: &str) -> Result<Ordering, TypeCastError> {
        match self {
            DataType::Unknown | DataType::Text => Ok(expected.cmp(actual)),
            DataType::Integer => Ok(self.parse_integer(expected)?.cmp(&self.parse_integer(actual)?)),
            DataType::Numeric => {
                let e = self.parse_numeric(expected)?;
                let a = self.parse_numeric(actual)?;
                e.partial_cmp(&a)
                    .ok_or_else(|| TypeCastError::new(self.as_str(), expected, "NaN has no ordering"))
            }
            DataType::Boolean => Ok(self.parse_boolean(expected)?.cmp(&self.parse_boolean(actual)?)),
            DataType::Date => Ok(self.parse_date(expected)?.cmp(&self.parse_date(actual)?)),
            DataType::Timestamp => Ok(self.parse_timestamp(expected)?.cmp(&self.parse_timestamp(actual)?)),
        }
    }

    fn parse_integer(&self, raw: &str) -> Result<i64, TypeCastError> {
        raw.trim()
            .parse::<i64>()
            .map_err(|e| TypeCastError::new(self.as_str(), raw, e))
    }

    fn parse_numeric(&self, raw: &str) -> Result<f64, TypeCastError> {
        raw.trim()
            .parse::<f64>()
            .map_err(|e| TypeCastError::new(self.as_str(), raw, e))
    }

    fn parse_boolean(&self, raw: &str) -> Result<bool, TypeCastError> {
        match raw.trim().to_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" => Ok(true),
            "false" | "f" | "0" | "no" | "n" => Ok(false),
            _ => Err(TypeCastError::new(self.as_str(), raw, "not a boolean literal")),
        }
    }

    fn parse_date(&self, raw: &str) -> Result<NaiveDate, TypeCastError> {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|e| TypeCastError::new(self.as_str(), raw, e))
    }

    fn parse_timestamp(&self, raw: &str) -> Result<NaiveDateTime, TypeCastError> {
        let trimmed = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(parsed.naive_utc());
        }

        const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
        for format in FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(parsed);
            }
        }

        // A bare date reads as midnight
        self.parse_date(trimmed)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| TypeCastError::new(self.as_str(), raw, "not a recognised timestamp"))
    }
}

impl ComparisonType for DataType {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn compare(&self, expected: &CellValue, actual: &CellValue) -> Result<Ordering, TypeCastError> {
        match (expected.as_str(), actual.as_str()) {
            (None, None) => Ok(Ordering::Equal),
            (None, Some(_)) => Ok(Ordering::Less),
            (Some(_), None) => Ok(Ordering::Greater),
            (Some(e), Some(a)) => self.compare_present(e, a),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = TabfixtureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "text" | "string" | "varchar" => Ok(Self::Text),
            "integer" | "int" | "bigint" => Ok(Self::Integer),
            "numeric" | "decimal" | "double" | "float" => Ok(Self::Numeric),
            "boolean" | "bool" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "timestamp" | "datetime" => Ok(Self::Timestamp),
            other => Err(TabfixtureError::config(format!(
                "Unknown comparison type '{}'. Use unknown, text, integer, numeric, boolean, date or timestamp",
                other
            ))),
        }
    }
}

/// Comparison types per column, looked up table-first then by bare column
/// name, falling back to [`DataType::Unknown`].
#[derive(Debug, Clone, Default)]
pub struct ColumnTypes {
    by_table: HashMap<(TableId, ColumnId), DataType>,
    by_column: HashMap<ColumnId, DataType>,
}

impl ColumnTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, table: TableId, column: ColumnId, data_type: DataType) {
        self.by_table.insert((table, column), data_type);
    }

    pub fn set_for_all_tables(&mut self, column: ColumnId, data_type: DataType) {
        self.by_column.insert(column, data_type);
    }

    /// Parse a `table.column` or bare `column` key
    pub fn set_from_key(&mut self, key: &str, data_type: DataType) -> Result<(), TabfixtureError> {
        match key.split_once('.') {
            Some((table, column)) => self.set(TableId::new(table)?, ColumnId::new(column)?, data_type),
            None => self.set_for_all_tables(ColumnId::new(key)?, data_type),
        }
        Ok(())
    }

    pub fn resolve(&self, table: &TableId, column: &ColumnId) -> DataType {
        self.by_table
            .get(&(table.clone(), column.clone()))
            .or_else(|| self.by_column.get(column))
            .copied()
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_table.is_empty() && self.by_column.is_empty()
    }
}
