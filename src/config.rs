//! Fixture configuration
//!
//! Settings live in a `tabfixture.json` file, found by walking up from the
//! working directory. `TABFIXTURE_CONFIG` names a file to use instead.

use crate::database::{DataSourceRegistry, DuckDbSource};
use crate::datatype::{ColumnTypes, DataType};
use crate::error::{Result, TabfixtureError};
use crate::DEFAULT_SCENARIO_MARKER;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIG_FILE_NAME: &str = "tabfixture.json";
pub const CONFIG_ENV_VAR: &str = "TABFIXTURE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Name of the first column that tags rows with scenarios
    pub scenario_marker: String,
    /// Expected cells holding this token match any actual value
    pub wildcard: Option<String>,
    pub default_data_source: Option<String>,
    /// Data source name to DuckDB database path, `:memory:` allowed
    pub data_sources: BTreeMap<String, PathBuf>,
    /// `table.column` or `column` to comparison type name
    pub column_types: BTreeMap<String, String>,
    /// Directory relative data source paths resolve against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            scenario_marker: DEFAULT_SCENARIO_MARKER.to_string(),
            wildcard: None,
            default_data_source: None,
            data_sources: BTreeMap::new(),
            column_types: BTreeMap::new(),
            base_dir: None,
        }
    }
}

impl FixtureConfig {
    /// Resolve configuration for `start_dir`: the environment override if
    /// set, else the nearest `tabfixture.json`, else defaults
    pub fn discover(start_dir: Option<&Path>) -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            log::debug!("Using configuration from ${}", CONFIG_ENV_VAR);
            return Self::from_file(Path::new(&path));
        }

        let current_dir = std::env::current_dir()?;
        let start = start_dir.unwrap_or(&current_dir);
        match Self::find_config_file(start) {
            Some(path) => Self::from_file(&path),
            None => {
                log::debug!("No {} found above {}, using defaults", CONFIG_FILE_NAME, start.display());
                Ok(Self::default())
            }
        }
    }

    /// Nearest config file at or above `start_dir`
    pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
        let mut current = start_dir;
        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            current = current.parent()?;
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(TabfixtureError::not_found(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scenario_marker.trim().is_empty() {
            return Err(TabfixtureError::config("scenario_marker must not be blank"));
        }
        if let Some(name) = &self.default_data_source {
            if !self.data_sources.contains_key(name) {
                return Err(TabfixtureError::config(format!(
                    "default_data_source '{}' is not listed in data_sources",
                    name
                )));
            }
        }
        self.column_types().map(|_| ())
    }

    pub fn column_types(&self) -> Result<ColumnTypes> {
        let mut types = ColumnTypes::new();
        for (key, name) in &self.column_types {
            types.set_from_key(key, name.parse::<DataType>()?)?;
        }
        Ok(types)
    }

    /// Path of a configured data source; relative paths resolve against the
    /// directory holding the config file
    pub fn data_source_path(&self, name: &str) -> Option<PathBuf> {
        let path = self.data_sources.get(name)?;
        if path.as_os_str() == ":memory:" || path.is_absolute() {
            return Some(path.clone());
        }
        Some(match &self.base_dir {
            Some(base) => base.join(path),
            None => path.clone(),
        })
    }

    /// Open every configured data source into `registry`
    pub fn open_data_sources(&self, registry: &DataSourceRegistry) -> Result<()> {
        for name in self.data_sources.keys() {
            let path = self
                .data_source_path(name)
                .ok_or_else(|| TabfixtureError::config(format!("Unknown data source '{}'", name)))?;
            let source = Arc::new(DuckDbSource::open(&path)?);
            if self.default_data_source.as_deref() == Some(name.as_str()) {
                registry.set_default(Arc::clone(&source));
            }
            registry.register(name.clone(), source);
        }
        Ok(())
    }
}
