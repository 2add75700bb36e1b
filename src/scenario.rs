//! Scenario row filtering
//!
//! A source table may reserve its first column as a scenario marker. Each row
//! names the scenario it belongs to, so a single file can carry the fixtures
//! for several tests. Filtering strips the marker column and keeps the rows
//! for the requested scenarios. Rows with a blank marker belong to every
//! scenario.

use crate::error::Result;
use crate::identifier::ScenarioId;
use crate::table::{Row, Table};

/// Derive the table for the requested scenarios.
///
/// An empty `requested` list keeps every row. When the first column is not
/// named `marker` the table is returned as-is.
pub fn filter_by_scenario(source: &Table, requested: &[ScenarioId], marker: &str) -> Result<Table> {
    let marker = marker.trim();
    let marker_column = match source.columns().first() {
        Some(first) if first.as_str() == marker => first.clone(),
        _ => {
            log::debug!(
                "Table '{}' has no '{}' marker column, skipping scenario filter",
                source.name(),
                marker
            );
            return Ok(source.clone());
        }
    };

    let columns = source.columns()[1..].to_vec();
    let rows: Vec<Row> = source
        .rows()
        .iter()
        .filter(|row| {
            let tag = row.get(&marker_column);
            requested.is_empty() || tag.is_blank() || matches_any(tag.as_str(), requested)
        })
        .map(|row| {
            columns
                .iter()
                .map(|column| (column.clone(), row.get(column).clone().normalize_empty()))
                .collect::<Row>()
        })
        .collect();

    log::debug!(
        "Scenario filter kept {} of {} rows of '{}'",
        rows.len(),
        source.row_count(),
        source.name()
    );

    Table::new(source.name().clone(), columns, rows)
}

fn matches_any(tag: Option<&str>, requested: &[ScenarioId]) -> bool {
    match tag {
        Some(tag) => {
            let tag = tag.trim();
            requested.iter().any(|scenario| scenario.as_str() == tag)
        }
        None => false,
    }
}
