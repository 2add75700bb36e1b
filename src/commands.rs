//! Command implementations for tabfixture CLI

use crate::cli::{Commands, OutputFormat};
use crate::compare::{Comparer, Wildcard};
use crate::config::FixtureConfig;
use crate::database::{DataSourceRegistry, DatabaseOperation, DuckDbSource};
use crate::error::{Result, TabfixtureError};
use crate::failure::{DefaultFailureHandler, ValidationFailure};
use crate::fixture::{Declaration, Fixture};
use crate::identifier::{column_ids, scenario_ids};
use crate::loader::{DatasetLoader, FormatRegistry};
use crate::output::{ComparisonReport, JsonFormatter, PrettyPrinter};
use crate::projection::exclude_columns;
use crate::table::Dataset;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Execute a command
pub fn execute_command(command: Commands, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    match command {
        Commands::Filter {
            file,
            scenarios,
            format,
        } => filter_command(&config, &file, &scenarios, &format),
        Commands::Merge { files, format } => merge_command(&config, &files, &format),
        Commands::Compare {
            expected,
            actual,
            scenarios,
            ignore,
            keys,
            format,
        } => compare_command(&config, &expected, &actual, &scenarios, &ignore, &keys, &format),
        Commands::Load {
            paths,
            database,
            operation,
            scenarios,
            format,
        } => load_command(config, paths, database.as_deref(), operation, &scenarios, &format),
        Commands::Verify {
            paths,
            database,
            scenarios,
            order_by,
            format,
        } => verify_command(config, paths, database.as_deref(), &scenarios, &order_by, &format),
    }
}

fn load_config(config_path: Option<&Path>) -> Result<FixtureConfig> {
    match config_path {
        Some(path) => FixtureConfig::from_file(path),
        None => FixtureConfig::discover(None),
    }
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::parse(format).map_err(TabfixtureError::invalid_input)
}

fn dataset_loader(config: &FixtureConfig) -> DatasetLoader {
    DatasetLoader::new(Arc::new(FormatRegistry::with_defaults())).with_marker(config.scenario_marker.clone())
}

fn print_dataset(dataset: &Dataset, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Pretty => PrettyPrinter::print_dataset(dataset),
        OutputFormat::Json => println!("{}", JsonFormatter::format(dataset)?),
    }
    Ok(())
}

/// Show fixture files after scenario filtering
fn filter_command(config: &FixtureConfig, file: &Path, scenarios: &[String], format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let scenarios = scenario_ids(scenarios)?;
    let dataset = dataset_loader(config).load(&[file.to_path_buf()], &scenarios)?;
    print_dataset(&dataset, format)
}

/// Merge same-named tables across files
fn merge_command(config: &FixtureConfig, files: &[PathBuf], format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let dataset = dataset_loader(config).load(files, &[])?;
    print_dataset(&dataset, format)
}

/// Compare two fixture datasets
fn compare_command(
    config: &FixtureConfig,
    expected: &Path,
    actual: &Path,
    scenarios: &[String],
    ignore: &[String],
    keys: &[String],
    format: &str,
) -> Result<()> {
    let format = parse_format(format)?;
    let scenarios = scenario_ids(scenarios)?;
    let ignore = column_ids(ignore)?;
    let loader = dataset_loader(config);

    let without_ignored = |dataset: Dataset| -> Dataset {
        dataset.iter().map(|t| exclude_columns(t, &ignore)).collect::<Vec<_>>().into()
    };
    let expected = without_ignored(loader.load(&[expected.to_path_buf()], &scenarios)?);
    let actual = without_ignored(loader.load(&[actual.to_path_buf()], &scenarios)?);

    let wildcard = config.wildcard.as_deref().map(Wildcard::new);
    let mut comparer = Comparer::new().with_column_types(config.column_types()?);
    if let Some(wildcard) = &wildcard {
        comparer = comparer.with_skip(wildcard);
    }
    let mut handler = DefaultFailureHandler::with_additional_columns(column_ids(keys)?);

    let result = comparer.compare_datasets(&expected, &actual, &mut handler);
    report_comparison(result, expected.len(), format)
}

/// Write fixture data into the target database
fn load_command(
    config: FixtureConfig,
    paths: Vec<PathBuf>,
    database: Option<&Path>,
    operation: DatabaseOperation,
    scenarios: &[String],
    format: &str,
) -> Result<()> {
    let format = parse_format(format)?;
    let fixture = fixture_for(config, database)?;
    let declaration = Declaration::new(paths)
        .with_scenarios(scenario_ids(scenarios)?)
        .with_operation(operation);

    let source = fixture.sources().resolve(None)?;
    let summary = fixture.prepare(&declaration)?;
    match format {
        OutputFormat::Pretty => PrettyPrinter::print_operation_summary(operation, source.location(), &summary),
        OutputFormat::Json => println!(
            "{}",
            JsonFormatter::format_operation_summary(operation, source.location(), &summary)?
        ),
    }
    Ok(())
}

/// Check database contents against fixture data
fn verify_command(
    config: FixtureConfig,
    paths: Vec<PathBuf>,
    database: Option<&Path>,
    scenarios: &[String],
    order_by: &[String],
    format: &str,
) -> Result<()> {
    let format = parse_format(format)?;
    let fixture = fixture_for(config, database)?;
    let declaration = Declaration::new(paths)
        .with_scenarios(scenario_ids(scenarios)?)
        .with_order_by(column_ids(order_by)?);

    let expected = fixture.load(&declaration)?;
    let result = fixture.verify_dataset(&declaration, &expected, &mut DefaultFailureHandler::new());
    report_comparison(result, expected.len(), format)
}

/// Fixture targeting `database` when given, else the configured default
fn fixture_for(config: FixtureConfig, database: Option<&Path>) -> Result<Fixture> {
    match database {
        Some(path) => {
            let sources = Arc::new(DataSourceRegistry::new());
            sources.set_default(Arc::new(DuckDbSource::open(path)?));
            Ok(Fixture::new(config, Arc::new(FormatRegistry::with_defaults()), sources))
        }
        None => Fixture::from_config(config),
    }
}

/// Print the outcome; a failed comparison still fails the command
fn report_comparison(result: Result<()>, tables: usize, format: OutputFormat) -> Result<()> {
    let (report, failure) = match result {
        Ok(()) => (ComparisonReport::matched(tables), None),
        Err(TabfixtureError::Validation(failure)) => (
            ComparisonReport::failed(tables, failure.discrepancies.clone()),
            Some(failure),
        ),
        Err(e) => return Err(e),
    };

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_comparison(&report),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&report)?),
    }

    match failure {
        Some(failure) => Err(ValidationFailure::new(format!(
            "{} discrepancy(ies) found",
            failure.discrepancies.len()
        ))
        .into()),
        None => Ok(()),
    }
}
