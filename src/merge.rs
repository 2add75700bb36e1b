//! Merging same-named tables from several declarations

use crate::error::{Result, TabfixtureError};
use crate::identifier::TableId;
use crate::table::{Dataset, Row, Table};
use indexmap::IndexMap;

/// Concatenate the rows of same-named tables with identical column lists.
///
/// Columns come from the first table; rows keep input order and duplicates
/// are preserved.
pub fn merge_tables(tables: &[Table]) -> Result<Table> {
    let (first, rest) = tables
        .split_first()
        .ok_or_else(|| TabfixtureError::config("Cannot merge an empty list of tables"))?;

    if rest.is_empty() {
        return Ok(first.clone());
    }

    for table in rest {
        if table.name() != first.name() {
            return Err(TabfixtureError::config(format!(
                "Cannot merge tables with different names: expected '{}', got '{}'",
                first.name(),
                table.name()
            )));
        }

        if table.columns() != first.columns() {
            return Err(TabfixtureError::config(format!(
                "Cannot merge table '{}': expected columns [{}], got [{}]",
                first.name(),
                first.column_names().join(", "),
                table.column_names().join(", ")
            )));
        }
    }

    let rows: Vec<Row> = tables
        .iter()
        .flat_map(|table| table.rows().iter().cloned())
        .collect();

    log::debug!(
        "Merged {} declarations of '{}' into {} rows",
        tables.len(),
        first.name(),
        rows.len()
    );

    Table::new(first.name().clone(), first.columns().to_vec(), rows)
}

/// Merge every group of same-named tables, in order of first appearance
pub fn merge_datasets<'a, I>(datasets: I) -> Result<Dataset>
where
    I: IntoIterator<Item = &'a Dataset>,
{
    let mut groups: IndexMap<TableId, Vec<Table>> = IndexMap::new();
    for dataset in datasets {
        for table in dataset {
            groups
                .entry(table.name().clone())
                .or_insert_with(Vec::new)
                .push(table.clone());
        }
    }

    let tables = groups
        .values()
        .map(|group| merge_tables(group))
        .collect::<Result<Vec<_>>>()?;

    Ok(Dataset::new(tables))
}
