//! Database connections, queries and write operations using DuckDB

use crate::error::{Result, TabfixtureError};
use crate::identifier::{ColumnId, TableId};
use crate::table::{Dataset, Table};
use crate::value::CellValue;
use duckdb::Connection;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

const QUERY_VIEW: &str = "__tabfixture_query";

/// Runs an ad-hoc query and materialises the result as a table
pub trait QueryExecutor: Send + Sync {
    fn query(&self, table_name: &str, sql: &str) -> Result<Table>;
}

/// A DuckDB database used as a fixture target
pub struct DuckDbSource {
    location: String,
    connection: Mutex<Connection>,
}

impl std::fmt::Debug for DuckDbSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbSource")
            .field("location", &self.location)
            .finish()
    }
}

impl DuckDbSource {
    /// Open a database file, or an in-memory database for `:memory:`
    pub fn open(path: &Path) -> Result<Self> {
        let location = path.to_string_lossy().to_string();
        let connection = if location == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        log::debug!("Opened DuckDB data source at {}", location);

        Ok(Self {
            location,
            connection: Mutex::new(connection),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            location: ":memory:".to_string(),
            connection: Mutex::new(Connection::open_in_memory()?),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| TabfixtureError::data_processing(format!("Connection to {} is poisoned", self.location)))
    }

    /// Run one or more statements, e.g. schema setup
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.connection()?.execute_batch(sql)?;
        Ok(())
    }

    /// Read a table, restricted to `columns` when given, optionally ordered
    pub fn read_table(&self, table: &TableId, columns: &[ColumnId], order_by: &[ColumnId]) -> Result<Table> {
        let conn = self.connection()?;
        let columns = if columns.is_empty() {
            describe(&conn, &quote_ident(table.as_str()))?
        } else {
            columns.to_vec()
        };

        let mut sql = format!("SELECT {} FROM {}", select_list(&columns), quote_ident(table.as_str()));
        if !order_by.is_empty() {
            let keys: Vec<String> = order_by.iter().map(|c| quote_ident(c.as_str())).collect();
            sql.push_str(&format!(" ORDER BY {}", keys.join(", ")));
        }

        let records = fetch_records(&conn, &sql, columns.len())?;
        log::debug!("Read {} rows from '{}' in {}", records.len(), table, self.location);
        Table::from_records(table.as_str(), &columns, records)
    }

    /// Apply a write operation to every table of the dataset in one transaction
    pub fn apply(&self, operation: DatabaseOperation, dataset: &Dataset) -> Result<OperationSummary> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let mut summary = OperationSummary::default();

        if operation.deletes_all() {
            for table in dataset.tables().iter().rev() {
                let sql = format!("DELETE FROM {}", quote_ident(table.name().as_str()));
                summary.deleted += tx.execute(&sql, [])?;
            }
        }

        if operation == DatabaseOperation::Delete {
            for table in dataset.tables().iter().rev() {
                summary.deleted += delete_rows(&tx, table)?;
            }
        }

        if operation.inserts() {
            for table in dataset.tables() {
                summary.inserted += insert_rows(&tx, table)?;
            }
        }

        tx.commit()?;
        log::info!(
            "Applied {} to {}: {} rows deleted, {} rows inserted",
            operation,
            self.location,
            summary.deleted,
            summary.inserted
        );
        Ok(summary)
    }
}

impl QueryExecutor for DuckDbSource {
    fn query(&self, table_name: &str, sql: &str) -> Result<Table> {
        let conn = self.connection()?;
        let view = quote_ident(QUERY_VIEW);
        conn.execute(&format!("CREATE OR REPLACE TEMPORARY VIEW {} AS {}", view, sql), [])
            .map_err(|e| TabfixtureError::data_processing(format!("Invalid query '{}': {}", sql, e)))?;

        let columns = describe(&conn, &view)?;
        let records = fetch_records(&conn, &format!("SELECT {} FROM {}", select_list(&columns), view), columns.len());
        conn.execute(&format!("DROP VIEW IF EXISTS {}", view), [])?;

        Table::from_records(table_name, &columns, records?)
    }
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Every column cast to text so temporal and numeric values keep DuckDB's
/// canonical rendering
pub(crate) fn select_list(columns: &[ColumnId]) -> String {
    columns
        .iter()
        .map(|c| {
            let quoted = quote_ident(c.as_str());
            format!("CAST({} AS VARCHAR) AS {}", quoted, quoted)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn describe(conn: &Connection, relation: &str) -> Result<Vec<ColumnId>> {
    let mut stmt = conn
        .prepare(&format!("DESCRIBE {}", relation))
        .map_err(|e| TabfixtureError::data_processing(format!("Failed to describe {}: {}", relation, e)))?;

    let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut columns = Vec::new();
    for name in names {
        columns.push(ColumnId::new(name?)?);
    }
    Ok(columns)
}

pub(crate) fn fetch_records(conn: &Connection, sql: &str, width: usize) -> Result<Vec<Vec<CellValue>>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| TabfixtureError::data_processing(format!("Failed to prepare '{}': {}", sql, e)))?;

    let rows = stmt.query_map([], |row| {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(cell_from_ref(row.get_ref(i)?));
        }
        Ok(values)
    })?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row.map_err(|e| TabfixtureError::data_processing(format!("Failed to read row: {}", e)))?);
    }
    Ok(records)
}

fn cell_from_ref(value: duckdb::types::ValueRef<'_>) -> CellValue {
    use duckdb::types::ValueRef;

    match value {
        ValueRef::Null => CellValue::null(),
        ValueRef::Text(s) => CellValue::new(String::from_utf8_lossy(s)),
        ValueRef::Boolean(b) => CellValue::new(b.to_string()),
        ValueRef::Int(i) => CellValue::new(i.to_string()),
        ValueRef::BigInt(i) => CellValue::new(i.to_string()),
        ValueRef::Double(f) => CellValue::new(f.to_string()),
        other => CellValue::new(format!("{:?}", other)),
    }
}

fn insert_rows(conn: &Connection, table: &Table) -> Result<usize> {
    if table.columns().is_empty() || table.is_empty() {
        return Ok(0);
    }

    let columns: Vec<String> = table.columns().iter().map(|c| quote_ident(c.as_str())).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table.name().as_str()),
        columns.join(", "),
        placeholders
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut inserted = 0;
    for row in table.rows() {
        let values: Vec<Option<String>> = table
            .columns()
            .iter()
            .map(|c| row.get(c).as_str().map(str::to_string))
            .collect();
        inserted += stmt.execute(duckdb::params_from_iter(values))?;
    }
    Ok(inserted)
}

/// Rows are matched on every declared column, each fixture value cast to the
/// column's declared type so `19.9` matches a DECIMAL `19.90`
fn delete_rows(conn: &Connection, table: &Table) -> Result<usize> {
    if table.columns().is_empty() || table.is_empty() {
        return Ok(0);
    }

    let relation = quote_ident(table.name().as_str());
    let types = column_types(conn, &relation)?;
    let predicate = table
        .columns()
        .iter()
        .map(|c| {
            let column = quote_ident(c.as_str());
            match types.get(c.as_str()) {
                Some(ty) => format!("{} IS NOT DISTINCT FROM CAST(? AS {})", column, ty),
                None => format!("{} IS NOT DISTINCT FROM ?", column),
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ");
    let sql = format!("DELETE FROM {} WHERE {}", relation, predicate);

    let mut stmt = conn.prepare(&sql)?;
    let mut deleted = 0;
    for row in table.rows() {
        let values: Vec<Option<String>> = table
            .columns()
            .iter()
            .map(|c| row.get(c).as_str().map(str::to_string))
            .collect();
        deleted += stmt.execute(duckdb::params_from_iter(values))?;
    }
    Ok(deleted)
}

/// Declared type of each column, keyed by column name
fn column_types(conn: &Connection, relation: &str) -> Result<HashMap<String, String>> {
    let mut stmt = conn
        .prepare(&format!("DESCRIBE {}", relation))
        .map_err(|e| TabfixtureError::data_processing(format!("Failed to describe {}: {}", relation, e)))?;

    let pairs = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
    let mut types = HashMap::new();
    for pair in pairs {
        let (name, ty) = pair?;
        types.insert(name, ty);
    }
    Ok(types)
}

/// Write operation applied to a data source before a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseOperation {
    None,
    Insert,
    Delete,
    DeleteAll,
    #[default]
    CleanInsert,
}

impl DatabaseOperation {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "none" => Ok(Self::None),
            "insert" => Ok(Self::Insert),
            "delete" => Ok(Self::Delete),
            "delete-all" => Ok(Self::DeleteAll),
            "clean-insert" => Ok(Self::CleanInsert),
            _ => Err(format!(
                "Invalid operation: {}. Use 'none', 'insert', 'delete', 'delete-all' or 'clean-insert'",
                s
            )),
        }
    }

    fn deletes_all(&self) -> bool {
        matches!(self, Self::DeleteAll | Self::CleanInsert)
    }

    fn inserts(&self) -> bool {
        matches!(self, Self::Insert | Self::CleanInsert)
    }
}

impl std::fmt::Display for DatabaseOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::DeleteAll => "delete-all",
            Self::CleanInsert => "clean-insert",
        };
        f.write_str(name)
    }
}

/// Row counts touched by a write operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct OperationSummary {
    pub deleted: usize,
    pub inserted: usize,
}

/// Named data sources plus a default slot.
///
/// Readers never block each other; a later registration under the same name
/// replaces the earlier one.
#[derive(Debug)]
pub struct DataSourceRegistry<S = DuckDbSource> {
    default: RwLock<Option<Arc<S>>>,
    sources: RwLock<HashMap<String, Arc<S>>>,
}

impl<S> Default for DataSourceRegistry<S> {
    fn default() -> Self {
        Self {
            default: RwLock::new(None),
            sources: RwLock::new(HashMap::new()),
        }
    }
}

impl<S> DataSourceRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named source, returning the one it replaced
    pub fn register(&self, name: impl Into<String>, source: Arc<S>) -> Option<Arc<S>> {
        let name = name.into();
        let previous = self
            .sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), source);
        if previous.is_some() {
            log::warn!("Data source '{}' was replaced", name);
        }
        previous
    }

    pub fn set_default(&self, source: Arc<S>) {
        *self.default.write().unwrap_or_else(PoisonError::into_inner) = Some(source);
    }

    pub fn default_source(&self) -> Result<Arc<S>> {
        self.default
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| TabfixtureError::not_found("no default data source is registered"))
    }

    pub fn get(&self, name: &str) -> Result<Arc<S>> {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| TabfixtureError::not_found(format!("data source '{}' is not registered", name)))
    }

    /// The named source, or the default one when no name is given
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<S>> {
        match name {
            Some(name) => self.get(name),
            None => self.default_source(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
