//! Output formatting utilities

use crate::database::{DatabaseOperation, OperationSummary};
use crate::error::Result;
use crate::failure::Discrepancy;
use crate::table::{Dataset, Table};
use serde::Serialize;

/// Outcome of a dataset comparison, as shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub matched: bool,
    pub tables: usize,
    pub discrepancies: Vec<Discrepancy>,
}

impl ComparisonReport {
    pub fn matched(tables: usize) -> Self {
        Self {
            matched: true,
            tables,
            discrepancies: Vec::new(),
        }
    }

    pub fn failed(tables: usize, discrepancies: Vec<Discrepancy>) -> Self {
        Self {
            matched: false,
            tables,
            discrepancies,
        }
    }
}

/// Pretty printer for tabfixture output
pub struct PrettyPrinter;

impl PrettyPrinter {
    pub fn print_dataset(dataset: &Dataset) {
        if dataset.is_empty() {
            println!("No tables found.");
            return;
        }

        for table in dataset {
            Self::print_table(table);
        }
    }

    pub fn print_table(table: &Table) {
        for line in render_table(table) {
            println!("{}", line);
        }
    }

    pub fn print_comparison(report: &ComparisonReport) {
        for line in render_comparison(report) {
            println!("{}", line);
        }
    }

    pub fn print_operation_summary(operation: DatabaseOperation, location: &str, summary: &OperationSummary) {
        println!("💾 Applied {} to {}", operation, location);
        println!("├─ Deleted: {}", summary.deleted);
        println!("└─ Inserted: {}", summary.inserted);
    }
}

fn render_table(table: &Table) -> Vec<String> {
    let mut lines = vec![format!("📋 Table: {} ({} rows)", table.name(), table.row_count())];

    let columns = table.column_names();
    let last_prefix = |last: bool| if last { "└─" } else { "├─" };
    lines.push(format!("{} Columns: {}", last_prefix(table.is_empty()), columns.join(", ")));

    for (i, row) in table.rows().iter().enumerate() {
        let cells = table
            .columns()
            .iter()
            .map(|c| format!("{}={}", c, row.get(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let prefix = last_prefix(i == table.row_count() - 1);
        lines.push(format!("{} {}: {}", prefix, i + 1, cells));
    }

    lines
}

fn render_comparison(report: &ComparisonReport) -> Vec<String> {
    if report.matched {
        return vec![format!("✅ Datasets match ({} tables)", report.tables)];
    }

    let mut lines = vec![format!(
        "❌ Datasets differ: {} discrepancy(ies) across {} tables",
        report.discrepancies.len(),
        report.tables
    )];
    for (i, discrepancy) in report.discrepancies.iter().enumerate() {
        let prefix = if i == report.discrepancies.len() - 1 { "└─" } else { "├─" };
        lines.push(format!("{} {}", prefix, discrepancy));
    }
    lines
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    pub fn format_operation_summary(operation: DatabaseOperation, location: &str, summary: &OperationSummary) -> Result<String> {
        let json = serde_json::json!({
            "operation": operation.to_string(),
            "location": location,
            "deleted": summary.deleted,
            "inserted": summary.inserted,
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }
}
