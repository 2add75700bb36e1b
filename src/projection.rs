//! Column projection views
//!
//! Projected tables share row storage with their source and only narrow the
//! declared column list, so the source is never copied or modified.

use crate::identifier::ColumnId;
use crate::table::Table;
use std::collections::HashSet;

/// Keep the named columns in the table's own order; unknown names are ignored
pub fn include_columns(table: &Table, names: &[ColumnId]) -> Table {
    let wanted: HashSet<&ColumnId> = names.iter().collect();
    let columns = table
        .columns()
        .iter()
        .filter(|c| wanted.contains(c))
        .cloned()
        .collect();
    table.with_columns(columns)
}

/// Keep every column that is not named
pub fn exclude_columns(table: &Table, names: &[ColumnId]) -> Table {
    let dropped: HashSet<&ColumnId> = names.iter().collect();
    let columns = table
        .columns()
        .iter()
        .filter(|c| !dropped.contains(c))
        .cloned()
        .collect();
    table.with_columns(columns)
}

/// Align `source` to the template's column list, in the template's order
pub fn match_columns(source: &Table, template: &Table) -> Table {
    let mut seen = HashSet::new();
    let columns = template
        .columns()
        .iter()
        .filter(|c| source.has_column(c) && seen.insert(*c))
        .cloned()
        .collect();
    source.with_columns(columns)
}
