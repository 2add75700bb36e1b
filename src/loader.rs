//! Loading fixture files into datasets

use crate::database::{describe, fetch_records, quote_ident, select_list};
use crate::error::{Result, TabfixtureError};
use crate::identifier::ScenarioId;
use crate::merge::merge_datasets;
use crate::scenario::filter_by_scenario;
use crate::table::{Dataset, Table};
use crate::DEFAULT_SCENARIO_MARKER;
use duckdb::Connection;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use walkdir::WalkDir;

/// Reads one file into one or more tables
pub trait FormatProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Lower-case file extensions this provider handles, without the dot
    fn extensions(&self) -> &[&str];

    fn load(&self, path: &Path) -> Result<Vec<Table>>;
}

/// Delimited text files, one table per file named after the file stem
#[derive(Debug, Clone, Default)]
pub struct CsvProvider;

impl CsvProvider {
    pub fn new() -> Self {
        Self
    }

    fn delimiter(path: &Path) -> &'static str {
        match extension_of(path).as_deref() {
            Some("tsv") => "\t",
            _ => ",",
        }
    }
}

impl FormatProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn extensions(&self) -> &[&str] {
        &["csv", "tsv"]
    }

    fn load(&self, path: &Path) -> Result<Vec<Table>> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| TabfixtureError::invalid_input(format!("Cannot derive a table name from {}", path.display())))?;

        let conn = Connection::open_in_memory()?;
        let relation = format!(
            "read_csv('{}', header = true, all_varchar = true, delim = '{}')",
            path.to_string_lossy().replace('\'', "''"),
            Self::delimiter(path)
        );
        let view = quote_ident("fixture_file");
        conn.execute(&format!("CREATE VIEW {} AS SELECT * FROM {}", view, relation), [])
            .map_err(|e| convert_csv_error(e, path))?;

        let columns = describe(&conn, &view)?;
        let records = fetch_records(&conn, &format!("SELECT {} FROM {}", select_list(&columns), view), columns.len())?;
        log::debug!("Read {} rows from {}", records.len(), path.display());

        Ok(vec![Table::from_records(name, &columns, records)?])
    }
}

fn convert_csv_error(error: duckdb::Error, path: &Path) -> TabfixtureError {
    let message = error.to_string();
    if message.contains("No files found") || message.contains("does not exist") {
        TabfixtureError::not_found(format!("File not found: {}", path.display()))
    } else if message.contains("CSV Error") || message.contains("Invalid") || message.contains("Unterminated") {
        TabfixtureError::invalid_input(format!("Malformed CSV file '{}': {}", path.display(), message))
    } else {
        TabfixtureError::DuckDb(error)
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Maps file extensions to format providers
#[derive(Default)]
pub struct FormatRegistry {
    providers: RwLock<HashMap<String, Arc<dyn FormatProvider>>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in providers
    pub fn with_defaults() -> Self {
        let mut providers = HashMap::new();
        insert_provider(&mut providers, Arc::new(CsvProvider::new()));
        Self {
            providers: RwLock::new(providers),
        }
    }

    /// Register a provider for each of its extensions. Later registrations
    /// replace earlier ones for the same extension.
    pub fn register(&self, provider: Arc<dyn FormatProvider>) -> Result<()> {
        if provider.extensions().is_empty() {
            return Err(TabfixtureError::config(format!(
                "Format provider '{}' declares no file extensions",
                provider.name()
            )));
        }

        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        insert_provider(&mut providers, provider);
        Ok(())
    }

    pub fn provider_for(&self, path: &Path) -> Option<Arc<dyn FormatProvider>> {
        let extension = extension_of(path)?;
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&extension)
            .cloned()
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let mut extensions: Vec<String> = providers.keys().cloned().collect();
        extensions.sort();
        extensions
    }
}

fn insert_provider(providers: &mut HashMap<String, Arc<dyn FormatProvider>>, provider: Arc<dyn FormatProvider>) {
    for extension in provider.extensions() {
        let key = extension.trim_start_matches('.').to_lowercase();
        if let Some(previous) = providers.insert(key.clone(), Arc::clone(&provider)) {
            log::warn!(
                "Format provider '{}' replaces '{}' for .{} files",
                provider.name(),
                previous.name(),
                key
            );
        }
    }
}

/// Loads files and directories, filters them by scenario and merges tables
/// that share a name
pub struct DatasetLoader {
    registry: Arc<FormatRegistry>,
    marker: String,
}

impl DatasetLoader {
    pub fn new(registry: Arc<FormatRegistry>) -> Self {
        Self {
            registry,
            marker: DEFAULT_SCENARIO_MARKER.to_string(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Every table found under `paths`, unfiltered, in path order
    pub fn load_tables(&self, paths: &[PathBuf]) -> Result<Vec<Table>> {
        let mut tables = Vec::new();
        for path in paths {
            for file in self.expand(path)? {
                let provider = self
                    .registry
                    .provider_for(&file)
                    .ok_or_else(|| TabfixtureError::UnsupportedFormat { path: file.clone() })?;
                log::debug!("Loading {} with the {} provider", file.display(), provider.name());
                tables.extend(provider.load(&file)?);
            }
        }
        Ok(tables)
    }

    /// Load, keep the rows of the requested scenarios and merge same-named
    /// tables into one dataset
    pub fn load(&self, paths: &[PathBuf], scenarios: &[ScenarioId]) -> Result<Dataset> {
        let filtered = self
            .load_tables(paths)?
            .iter()
            .map(|table| filter_by_scenario(table, scenarios, &self.marker))
            .collect::<Result<Vec<_>>>()?;

        let dataset = merge_datasets([&Dataset::new(filtered)])?;
        log::info!(
            "Loaded {} table(s) from {} path(s)",
            dataset.len(),
            paths.len()
        );
        Ok(dataset)
    }

    /// Files to load for one path: the file itself, or every supported file
    /// below a directory in sorted order
    fn expand(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !path.exists() {
            return Err(TabfixtureError::not_found(format!("Path does not exist: {}", path.display())));
        }
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if self.registry.provider_for(entry.path()).is_some() {
                files.push(entry.into_path());
            } else {
                log::debug!("Skipping {}: no format provider", entry.path().display());
            }
        }
        Ok(files)
    }
}
