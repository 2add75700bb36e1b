//! Declarative fixture workflow: seed a database before a test and verify its
//! contents afterwards

use crate::compare::{Comparer, Wildcard};
use crate::config::FixtureConfig;
use crate::database::{DataSourceRegistry, DatabaseOperation, DuckDbSource, OperationSummary};
use crate::error::Result;
use crate::failure::{DefaultFailureHandler, FailureHandler};
use crate::identifier::{ColumnId, ScenarioId};
use crate::loader::{DatasetLoader, FormatRegistry};
use crate::table::Dataset;
use std::path::PathBuf;
use std::sync::Arc;

/// Which files to load, for which scenarios, and what to do with them
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    pub files: Vec<PathBuf>,
    pub scenarios: Vec<ScenarioId>,
    pub operation: DatabaseOperation,
    /// Named data source; the registry default when absent
    pub data_source: Option<String>,
    /// Row order used when reading actual tables back for verification
    pub order_by: Vec<ColumnId>,
}

impl Declaration {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_scenarios(mut self, scenarios: Vec<ScenarioId>) -> Self {
        self.scenarios = scenarios;
        self
    }

    pub fn with_operation(mut self, operation: DatabaseOperation) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_data_source(mut self, name: impl Into<String>) -> Self {
        self.data_source = Some(name.into());
        self
    }

    pub fn with_order_by(mut self, columns: Vec<ColumnId>) -> Self {
        self.order_by = columns;
        self
    }
}

pub struct Fixture {
    config: FixtureConfig,
    loader: DatasetLoader,
    sources: Arc<DataSourceRegistry>,
}

impl Fixture {
    pub fn new(config: FixtureConfig, formats: Arc<FormatRegistry>, sources: Arc<DataSourceRegistry>) -> Self {
        let loader = DatasetLoader::new(formats).with_marker(config.scenario_marker.clone());
        Self {
            config,
            loader,
            sources,
        }
    }

    /// Built-in formats and every data source the configuration names
    pub fn from_config(config: FixtureConfig) -> Result<Self> {
        let sources = Arc::new(DataSourceRegistry::new());
        config.open_data_sources(&sources)?;
        Ok(Self::new(config, Arc::new(FormatRegistry::with_defaults()), sources))
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn sources(&self) -> &DataSourceRegistry {
        &self.sources
    }

    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    /// The declared files, filtered and merged
    pub fn load(&self, declaration: &Declaration) -> Result<Dataset> {
        self.loader.load(&declaration.files, &declaration.scenarios)
    }

    /// Seed the data source with the declared dataset
    pub fn prepare(&self, declaration: &Declaration) -> Result<OperationSummary> {
        let dataset = self.load(declaration)?;
        let source = self.resolve_source(declaration)?;
        log::info!(
            "Applying {} to {} with {} table(s)",
            declaration.operation,
            source.location(),
            dataset.len()
        );
        source.apply(declaration.operation, &dataset)
    }

    /// Check the data source against the declared dataset with the default
    /// failure handler
    pub fn verify(&self, declaration: &Declaration) -> Result<()> {
        self.verify_with(declaration, &mut DefaultFailureHandler::new())
    }

    pub fn verify_with(&self, declaration: &Declaration, handler: &mut dyn FailureHandler) -> Result<()> {
        let expected = self.load(declaration)?;
        self.verify_dataset(declaration, &expected, handler)
    }

    /// Check the data source against an already loaded dataset. Tables that
    /// cannot be read back are reported alongside the other tables' failures.
    pub fn verify_dataset(
        &self,
        declaration: &Declaration,
        expected: &Dataset,
        handler: &mut dyn FailureHandler,
    ) -> Result<()> {
        let source = self.resolve_source(declaration)?;

        let wildcard = self.config.wildcard.as_deref().map(Wildcard::new);
        let mut comparer = Comparer::new().with_column_types(self.config.column_types()?);
        if let Some(wildcard) = &wildcard {
            comparer = comparer.with_skip(wildcard);
        }

        log::info!("Verifying {} table(s) in {}", expected.len(), source.location());
        comparer.compare_with_lookup(
            expected,
            |table| source.read_table(table.name(), table.columns(), &declaration.order_by),
            handler,
        )
    }

    fn resolve_source(&self, declaration: &Declaration) -> Result<Arc<DuckDbSource>> {
        self.sources.resolve(declaration.data_source.as_deref())
    }
}
