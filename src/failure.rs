//! Failure reporting for dataset comparison
//!
//! The comparison engine hands every content mismatch to a [`FailureHandler`].
//! The handler answers with a [`Verdict`]: `Abort` records the mismatch as an
//! error, `Continue` treats it as logged. Errors are collected and raised once
//! as a single [`ValidationFailure`] after every cell has been visited.

use crate::identifier::{ColumnId, TableId};
use crate::table::Table;
use crate::value::CellValue;
use serde::Serialize;
use std::fmt;

/// Which structural property of two datasets differed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralKind {
    Count,
    Names,
}

/// One problem found while comparing. Row indexes are zero-based; rendered
/// messages number rows from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    StructuralMismatch {
        structure: StructuralKind,
        expected: String,
        actual: String,
    },
    TableMismatch {
        table: TableId,
        message: String,
    },
    ContentMismatch {
        table: TableId,
        row: usize,
        column: ColumnId,
        expected: CellValue,
        actual: CellValue,
    },
    CellReadError {
        table: TableId,
        row: usize,
        column: ColumnId,
        cause: String,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::StructuralMismatch {
                structure: StructuralKind::Count,
                expected,
                actual,
            } => write!(f, "table count mismatch: expected {} but was {}", expected, actual),
            Discrepancy::StructuralMismatch {
                structure: StructuralKind::Names,
                expected,
                actual,
            } => write!(f, "tables mismatch: expected {} but was {}", expected, actual),
            Discrepancy::TableMismatch { table, message } => write!(f, "table '{}': {}", table, message),
            Discrepancy::ContentMismatch {
                table,
                row,
                column,
                expected,
                actual,
            } => write!(
                f,
                "value mismatch in '{}' at row {}, column '{}': expected {} but was {}",
                table,
                row + 1,
                column,
                expected,
                actual
            ),
            Discrepancy::CellReadError {
                table,
                row,
                column,
                cause,
            } => write!(
                f,
                "cannot read '{}' at row {}, column '{}': {}",
                table,
                row + 1,
                column,
                cause
            ),
        }
    }
}

/// A content mismatch as seen by a [`FailureHandler`]
#[derive(Debug, Clone, Copy)]
pub struct Difference<'a> {
    pub expected_table: &'a Table,
    pub actual_table: &'a Table,
    pub row: usize,
    pub column: &'a ColumnId,
    pub expected: &'a CellValue,
    pub actual: &'a CellValue,
    /// Name of the comparison type that found the values unequal
    pub comparison: &'a str,
}

impl Difference<'_> {
    pub fn to_discrepancy(&self) -> Discrepancy {
        Discrepancy::ContentMismatch {
            table: self.expected_table.name().clone(),
            row: self.row,
            column: self.column.clone(),
            expected: self.expected.clone(),
            actual: self.actual.clone(),
        }
    }
}

/// What the engine should do with a reported mismatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The mismatch was handled; it does not fail the comparison
    Continue,
    /// The mismatch is an error with this message
    Abort(String),
}

/// The aggregated error raised by the comparison engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub discrepancies: Vec<Discrepancy>,
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: None,
            actual: None,
            discrepancies: Vec::new(),
        }
    }

    pub fn with_values(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    pub fn with_discrepancies(mut self, discrepancies: Vec<Discrepancy>) -> Self {
        self.discrepancies = discrepancies;
        self
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, "\n  expected: {}\n  actual:   {}", expected, actual)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Pluggable reaction to comparison mismatches
pub trait FailureHandler {
    /// Called once per content mismatch
    fn handle(&mut self, difference: &Difference<'_>) -> Verdict;

    /// Build the error the engine raises
    fn create_failure(&self, message: &str, expected: Option<&str>, actual: Option<&str>) -> ValidationFailure {
        let failure = ValidationFailure::new(message);
        match (expected, actual) {
            (Some(e), Some(a)) => failure.with_values(e, a),
            _ => failure,
        }
    }

    /// Extra diagnostic text for a mismatching cell
    fn additional_info(&self, _expected: &Table, _actual: &Table, _row: usize, _column: &ColumnId) -> String {
        String::new()
    }
}

/// Treats every mismatch as an error, optionally naming extra columns of the
/// offending row (typically the primary key) to help locate it.
#[derive(Debug, Clone, Default)]
pub struct DefaultFailureHandler {
    additional_columns: Vec<ColumnId>,
}

impl DefaultFailureHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_additional_columns(columns: Vec<ColumnId>) -> Self {
        Self {
            additional_columns: columns,
        }
    }
}

impl FailureHandler for DefaultFailureHandler {
    fn handle(&mut self, difference: &Difference<'_>) -> Verdict {
        let info = self.additional_info(
            difference.expected_table,
            difference.actual_table,
            difference.row,
            difference.column,
        );
        let message = difference.to_discrepancy().to_string();
        if info.is_empty() {
            Verdict::Abort(message)
        } else {
            Verdict::Abort(format!("{} {}", message, info))
        }
    }

    fn additional_info(&self, expected: &Table, actual: &Table, row: usize, _column: &ColumnId) -> String {
        if self.additional_columns.is_empty() {
            return String::new();
        }

        let render = |table: &Table| {
            self.additional_columns
                .iter()
                .map(|c| match table.value(row, c) {
                    Ok(v) => format!("{}={}", c, v),
                    Err(_) => format!("{}=<n/a>", c),
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        format!("(expected row: {}; actual row: {})", render(expected), render(actual))
    }
}

/// Records mismatches instead of failing, for callers that want the full
/// diff as data.
#[derive(Debug, Clone, Default)]
pub struct DiffCollector {
    differences: Vec<Discrepancy>,
}

impl DiffCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn differences(&self) -> &[Discrepancy] {
        &self.differences
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }
}

impl FailureHandler for DiffCollector {
    fn handle(&mut self, difference: &Difference<'_>) -> Verdict {
        log::debug!("Collected difference: {}", difference.to_discrepancy());
        self.differences.push(difference.to_discrepancy());
        Verdict::Continue
    }
}
