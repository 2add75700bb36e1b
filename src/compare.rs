//! Structural and content comparison of datasets and tables
//!
//! Comparison runs in two phases. Scanning walks every row and listed column
//! and is pure, so tables are scanned in parallel. Reporting then feeds each
//! finding to the [`FailureHandler`] in canonical table order, collects the
//! errors and raises them together as one [`ValidationFailure`].
//!
//! [`ValidationFailure`]: crate::failure::ValidationFailure

use crate::database::QueryExecutor;
use crate::datatype::{ColumnTypes, ComparisonType, DataType};
use crate::error::{Result, TabfixtureError};
use crate::failure::{Difference, Discrepancy, FailureHandler, StructuralKind, Verdict};
use crate::identifier::{ColumnId, TableId};
use crate::projection::{exclude_columns, match_columns};
use crate::table::{Dataset, Table};
use crate::value::CellValue;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Decides per cell whether a pair of values is exempt from comparison
pub trait SkipPredicate: Send + Sync {
    fn should_skip(&self, column: &ColumnId, expected: &CellValue, actual: &CellValue) -> bool;
}

impl<F> SkipPredicate for F
where
    F: Fn(&ColumnId, &CellValue, &CellValue) -> bool + Send + Sync,
{
    fn should_skip(&self, column: &ColumnId, expected: &CellValue, actual: &CellValue) -> bool {
        self(column, expected, actual)
    }
}

/// Skips cells whose expected value is the sentinel token, e.g. `[ANY]`
#[derive(Debug, Clone)]
pub struct Wildcard {
    token: String,
}

impl Wildcard {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl SkipPredicate for Wildcard {
    fn should_skip(&self, _column: &ColumnId, expected: &CellValue, _actual: &CellValue) -> bool {
        expected.as_str() == Some(self.token.as_str())
    }
}

/// A column to compare and the semantics to compare it with
pub type ComparisonColumn<'a> = (ColumnId, &'a dyn ComparisonType);

/// Every column of `table`, compared with the same type
pub fn comparison_columns<'a>(table: &Table, comparison: &'a dyn ComparisonType) -> Vec<ComparisonColumn<'a>> {
    table.columns().iter().map(|c| (c.clone(), comparison)).collect()
}

/// A cell that did not simply match
#[derive(Debug, Clone)]
enum Finding {
    Mismatch {
        row: usize,
        column: ColumnId,
        comparison: String,
    },
    ReadError {
        row: usize,
        column: ColumnId,
        cause: String,
    },
}

/// Outcome of scanning one expected table against the dataset under test
struct TableScan<'a> {
    name: &'a TableId,
    problems: Vec<String>,
    content: Option<(&'a Table, &'a Table, Vec<Finding>)>,
}

/// Messages and structured discrepancies gathered while reporting
#[derive(Default)]
struct Report {
    messages: Vec<String>,
    discrepancies: Vec<Discrepancy>,
}

impl Report {
    fn push(&mut self, message: String, discrepancy: Discrepancy) {
        self.messages.push(message);
        self.discrepancies.push(discrepancy);
    }

    fn push_discrepancy(&mut self, discrepancy: Discrepancy) {
        self.push(discrepancy.to_string(), discrepancy);
    }

    fn into_result(self, handler: &dyn FailureHandler, header: String) -> Result<()> {
        if self.messages.is_empty() {
            return Ok(());
        }

        log::debug!("{}", header);
        let message = format!("{}\n{}", header, self.messages.join("\n"));
        let failure = handler
            .create_failure(&message, None, None)
            .with_discrepancies(self.discrepancies);
        Err(TabfixtureError::Validation(failure))
    }
}

/// Comparison engine with an optional skip predicate and per-column types
#[derive(Default)]
pub struct Comparer<'s> {
    skip: Option<&'s dyn SkipPredicate>,
    column_types: ColumnTypes,
}

impl<'s> Comparer<'s> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip(mut self, skip: &'s dyn SkipPredicate) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Comparison types used by [`Comparer::compare_datasets`]
    pub fn with_column_types(mut self, column_types: ColumnTypes) -> Self {
        self.column_types = column_types;
        self
    }

    /// Compare table names first, then every table's shape and content
    pub fn compare_datasets(&self, expected: &Dataset, actual: &Dataset, handler: &mut dyn FailureHandler) -> Result<()> {
        if std::ptr::eq(expected, actual) {
            log::debug!("Dataset compared against itself");
            return Ok(());
        }

        let expected_names = expected.sorted_table_names();
        let actual_names = actual.sorted_table_names();

        if expected_names.len() != actual_names.len() {
            return Err(structural_failure(
                handler,
                Discrepancy::StructuralMismatch {
                    structure: StructuralKind::Count,
                    expected: expected_names.len().to_string(),
                    actual: actual_names.len().to_string(),
                },
            ));
        }

        if expected_names != actual_names {
            return Err(structural_failure(
                handler,
                Discrepancy::StructuralMismatch {
                    structure: StructuralKind::Names,
                    expected: render_names(&expected_names),
                    actual: render_names(&actual_names),
                },
            ));
        }

        let scans: Vec<TableScan<'_>> = expected_names
            .par_iter()
            .map(|name| self.scan_dataset_table(name, expected, actual))
            .collect();

        report_scans(scans, handler)
    }

    /// Compare every expected table against the table `lookup` fetches for it.
    ///
    /// A failed lookup is recorded against its table and the remaining tables
    /// are still compared.
    pub fn compare_with_lookup<F>(&self, expected: &Dataset, mut lookup: F, handler: &mut dyn FailureHandler) -> Result<()>
    where
        F: FnMut(&Table) -> Result<Table>,
    {
        let names = expected.sorted_table_names();
        let mut fetched = Vec::with_capacity(names.len());
        let mut failed = Vec::new();
        for name in &names {
            match expected.table(name).and_then(&mut lookup) {
                Ok(table) => fetched.push(table),
                Err(e) => {
                    log::debug!("Lookup of table '{}' failed: {}", name, e);
                    failed.push((*name, e.to_string()));
                }
            }
        }
        let actual = Dataset::new(fetched);

        let mut scans: Vec<TableScan<'_>> = names
            .par_iter()
            .filter(|name| !failed.iter().any(|(f, _)| f == *name))
            .map(|name| self.scan_dataset_table(name, expected, &actual))
            .collect();
        scans.extend(failed.into_iter().map(|(name, cause)| TableScan {
            name,
            problems: vec![format!("could not be read: {}", cause)],
            content: None,
        }));
        scans.sort_by(|a, b| a.name.cmp(b.name));

        report_scans(scans, handler)
    }

    /// Compare the listed columns of two tables row by row
    pub fn compare_tables(
        &self,
        expected: &Table,
        actual: &Table,
        columns: &[ComparisonColumn<'_>],
        handler: &mut dyn FailureHandler,
    ) -> Result<()> {
        let findings = self.scan_content(expected, actual, columns);
        let mut report = Report::default();
        report_findings(expected, actual, findings, handler, &mut report);

        let header = format!(
            "Table '{}' comparison failed with {} error(s):",
            expected.name(),
            report.messages.len()
        );
        report.into_result(handler, header)
    }

    /// Compare after dropping the ignored columns from both tables
    pub fn compare_tables_ignoring(
        &self,
        expected: &Table,
        actual: &Table,
        ignored: &[ColumnId],
        columns: &[ComparisonColumn<'_>],
        handler: &mut dyn FailureHandler,
    ) -> Result<()> {
        let expected = exclude_columns(expected, ignored);
        let actual = exclude_columns(actual, ignored);
        let columns: Vec<ComparisonColumn<'_>> = columns
            .iter()
            .filter(|(c, _)| !ignored.contains(c))
            .cloned()
            .collect();
        self.compare_tables(&expected, &actual, &columns, handler)
    }

    /// Compare expected data against the rows a query returns
    pub fn compare_with_query(
        &self,
        expected: &Table,
        executor: &dyn QueryExecutor,
        sql: &str,
        columns: &[ComparisonColumn<'_>],
        handler: &mut dyn FailureHandler,
    ) -> Result<()> {
        let result = executor.query(expected.name().as_str(), sql)?;
        let actual = match_columns(&result, expected);

        if actual.row_count() != expected.row_count() {
            let discrepancy = Discrepancy::TableMismatch {
                table: expected.name().clone(),
                message: row_count_message(expected, &actual),
            };
            let failure = handler
                .create_failure(
                    &discrepancy.to_string(),
                    Some(&expected.row_count().to_string()),
                    Some(&actual.row_count().to_string()),
                )
                .with_discrepancies(vec![discrepancy]);
            return Err(failure.into());
        }

        self.compare_tables(expected, &actual, columns, handler)
    }

    fn scan_dataset_table<'a>(&self, name: &'a TableId, expected: &'a Dataset, actual: &'a Dataset) -> TableScan<'a> {
        let mut scan = TableScan {
            name,
            problems: Vec::new(),
            content: None,
        };

        let (expected_table, actual_table) = match (expected.table(name), actual.table(name)) {
            (Ok(e), Ok(a)) => (e, a),
            (Err(e), _) | (_, Err(e)) => {
                scan.problems.push(e.to_string());
                return scan;
            }
        };

        if expected_table.row_count() != actual_table.row_count() {
            scan.problems.push(row_count_message(expected_table, actual_table));
        }

        let mut expected_columns = expected_table.column_names();
        let mut actual_columns = actual_table.column_names();
        expected_columns.sort_unstable();
        actual_columns.sort_unstable();
        if expected_columns != actual_columns {
            scan.problems.push(format!(
                "column mismatch: expected [{}] but was [{}]",
                expected_columns.join(", "),
                actual_columns.join(", ")
            ));
        }

        if !scan.problems.is_empty() {
            return scan;
        }

        let types: Vec<DataType> = expected_table
            .columns()
            .iter()
            .map(|c| self.column_types.resolve(name, c))
            .collect();
        let columns: Vec<ComparisonColumn<'_>> = expected_table
            .columns()
            .iter()
            .zip(&types)
            .map(|(c, t)| (c.clone(), t as &dyn ComparisonType))
            .collect();

        let findings = self.scan_content(expected_table, actual_table, &columns);
        log::debug!(
            "Scanned table '{}': {} rows, {} finding(s)",
            name,
            expected_table.row_count(),
            findings.len()
        );
        scan.content = Some((expected_table, actual_table, findings));
        scan
    }

    fn scan_content(&self, expected: &Table, actual: &Table, columns: &[ComparisonColumn<'_>]) -> Vec<Finding> {
        let mut findings = Vec::new();

        for row in 0..expected.row_count() {
            for (column, comparison) in columns {
                let cells = expected
                    .value(row, column)
                    .and_then(|e| actual.value(row, column).map(|a| (e, a)));
                let (e, a) = match cells {
                    Ok(pair) => pair,
                    Err(cause) => {
                        findings.push(Finding::ReadError {
                            row,
                            column: column.clone(),
                            cause: cause.to_string(),
                        });
                        continue;
                    }
                };

                if self.skip.map_or(false, |skip| skip.should_skip(column, e, a)) {
                    continue;
                }

                match comparison.compare(e, a) {
                    Ok(Ordering::Equal) => {}
                    Ok(_) => findings.push(Finding::Mismatch {
                        row,
                        column: column.clone(),
                        comparison: comparison.name().to_string(),
                    }),
                    Err(cause) => findings.push(Finding::ReadError {
                        row,
                        column: column.clone(),
                        cause: cause.to_string(),
                    }),
                }
            }
        }

        findings
    }
}

fn report_scans(scans: Vec<TableScan<'_>>, handler: &mut dyn FailureHandler) -> Result<()> {
    let mut report = Report::default();
    for scan in scans {
        for problem in scan.problems {
            report.push_discrepancy(Discrepancy::TableMismatch {
                table: scan.name.clone(),
                message: problem,
            });
        }
        if let Some((expected_table, actual_table, findings)) = scan.content {
            report_findings(expected_table, actual_table, findings, handler, &mut report);
        }
    }

    let header = format!("Dataset comparison failed with {} error(s):", report.messages.len());
    report.into_result(handler, header)
}

fn report_findings(
    expected: &Table,
    actual: &Table,
    findings: Vec<Finding>,
    handler: &mut dyn FailureHandler,
    report: &mut Report,
) {
    for finding in findings {
        match finding {
            Finding::Mismatch { row, column, comparison } => {
                let difference = Difference {
                    expected_table: expected,
                    actual_table: actual,
                    row,
                    column: &column,
                    expected: expected.rows()[row].get(&column),
                    actual: actual.rows()[row].get(&column),
                    comparison: &comparison,
                };
                match handler.handle(&difference) {
                    Verdict::Continue => log::debug!("Mismatch handled: {}", difference.to_discrepancy()),
                    Verdict::Abort(message) => report.push(message, difference.to_discrepancy()),
                }
            }
            Finding::ReadError { row, column, cause } => {
                report.push_discrepancy(Discrepancy::CellReadError {
                    table: expected.name().clone(),
                    row,
                    column,
                    cause,
                });
            }
        }
    }
}

fn structural_failure(handler: &dyn FailureHandler, discrepancy: Discrepancy) -> TabfixtureError {
    log::debug!("Structural mismatch: {}", discrepancy);
    let values = match &discrepancy {
        Discrepancy::StructuralMismatch { expected, actual, .. } => Some((expected.clone(), actual.clone())),
        _ => None,
    };
    let failure = match values {
        Some((expected, actual)) => handler.create_failure(&discrepancy.to_string(), Some(&expected), Some(&actual)),
        None => handler.create_failure(&discrepancy.to_string(), None, None),
    };
    failure.with_discrepancies(vec![discrepancy]).into()
}

fn render_names(names: &[&TableId]) -> String {
    let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
    format!("[{}]", names.join(", "))
}

fn row_count_message(expected: &Table, actual: &Table) -> String {
    format!(
        "row count mismatch: expected {} but was {}",
        expected.row_count(),
        actual.row_count()
    )
}

/// Compare two datasets with exact string semantics and no skip predicate
pub fn compare_datasets(expected: &Dataset, actual: &Dataset, handler: &mut dyn FailureHandler) -> Result<()> {
    Comparer::new().compare_datasets(expected, actual, handler)
}

pub fn compare_tables(
    expected: &Table,
    actual: &Table,
    columns: &[ComparisonColumn<'_>],
    handler: &mut dyn FailureHandler,
) -> Result<()> {
    Comparer::new().compare_tables(expected, actual, columns, handler)
}

pub fn compare_tables_ignoring(
    expected: &Table,
    actual: &Table,
    ignored: &[ColumnId],
    columns: &[ComparisonColumn<'_>],
    handler: &mut dyn FailureHandler,
) -> Result<()> {
    Comparer::new().compare_tables_ignoring(expected, actual, ignored, columns, handler)
}

pub fn compare_with_query(
    expected: &Table,
    executor: &dyn QueryExecutor,
    sql: &str,
    columns: &[ComparisonColumn<'_>],
    handler: &mut dyn FailureHandler,
) -> Result<()> {
    Comparer::new().compare_with_query(expected, executor, sql, columns, handler)
}
