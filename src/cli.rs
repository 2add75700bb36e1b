//! Command-line interface for tabfixture

use crate::database::DatabaseOperation;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabfixture")]
#[command(about = "Declarative tabular fixtures for database tests")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the nearest tabfixture.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a fixture file after scenario filtering
    Filter {
        /// Fixture file or directory
        file: PathBuf,

        /// Scenario to keep (repeatable; all rows when omitted)
        #[arg(long = "scenario", short = 's')]
        scenarios: Vec<String>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Merge same-named tables from several fixture files
    Merge {
        /// Fixture files or directories, in merge order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Compare two fixture datasets
    Compare {
        /// Expected fixture file or directory
        expected: PathBuf,

        /// Actual fixture file or directory
        actual: PathBuf,

        /// Scenario to keep on both sides (repeatable)
        #[arg(long = "scenario", short = 's')]
        scenarios: Vec<String>,

        /// Column to leave out of the comparison (repeatable)
        #[arg(long = "ignore")]
        ignore: Vec<String>,

        /// Column shown alongside each mismatch to identify the row (repeatable)
        #[arg(long = "key")]
        keys: Vec<String>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Write fixture data into a database
    Load {
        /// Fixture files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// DuckDB database file (defaults to the configured data source)
        #[arg(long)]
        database: Option<PathBuf>,

        /// Write operation: none, insert, delete, delete-all, clean-insert
        #[arg(long, default_value = "clean-insert", value_parser = DatabaseOperation::parse)]
        operation: DatabaseOperation,

        /// Scenario to load (repeatable)
        #[arg(long = "scenario", short = 's')]
        scenarios: Vec<String>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Check database contents against fixture data
    Verify {
        /// Expected fixture files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// DuckDB database file (defaults to the configured data source)
        #[arg(long)]
        database: Option<PathBuf>,

        /// Scenario to verify (repeatable)
        #[arg(long = "scenario", short = 's')]
        scenarios: Vec<String>,

        /// Column to order actual rows by (repeatable)
        #[arg(long = "order-by")]
        order_by: Vec<String>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}
