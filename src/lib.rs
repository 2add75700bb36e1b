//! # tabfixture
//!
//! Declarative tabular fixtures for database tests. Fixture files are loaded
//! into tables, narrowed to the rows of the scenarios under test, merged by
//! table name and either written to a database or compared against its
//! contents.

pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod database;
pub mod datatype;
pub mod error;
pub mod failure;
pub mod fixture;
pub mod identifier;
pub mod loader;
pub mod merge;
pub mod output;
pub mod projection;
pub mod scenario;
pub mod table;
pub mod value;

pub use compare::{
    compare_datasets, compare_tables, compare_tables_ignoring, compare_with_query, Comparer, SkipPredicate,
    Wildcard,
};
pub use config::FixtureConfig;
pub use database::{DataSourceRegistry, DatabaseOperation, DuckDbSource, QueryExecutor};
pub use datatype::{ColumnTypes, ComparisonType, DataType};
pub use error::{Result, TabfixtureError};
pub use failure::{DefaultFailureHandler, Difference, DiffCollector, Discrepancy, FailureHandler, ValidationFailure, Verdict};
pub use fixture::{Declaration, Fixture};
pub use identifier::{ColumnId, ScenarioId, TableId};
pub use merge::{merge_datasets, merge_tables};
pub use projection::{exclude_columns, include_columns, match_columns};
pub use scenario::filter_by_scenario;
pub use table::{Dataset, Row, Table};
pub use value::CellValue;

/// First-column name that marks a table as scenario-tagged
pub const DEFAULT_SCENARIO_MARKER: &str = "[scenario]";
