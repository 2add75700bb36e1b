//! Unit tests for CLI argument parsing and validation

use clap::Parser;
use std::path::PathBuf;
use tabfixture::cli::{Cli, Commands, OutputFormat};
use tabfixture::DatabaseOperation;

#[test]
fn test_cli_filter_command() {
    let cli = Cli::try_parse_from(&["tabfixture", "filter", "users.csv"]).unwrap();
    match cli.command {
        Commands::Filter {
            file,
            scenarios,
            format,
        } => {
            assert_eq!(file, PathBuf::from("users.csv"));
            assert!(scenarios.is_empty());
            assert_eq!(format, "pretty");
        }
        _ => panic!("Expected Filter command"),
    }
}

#[test]
fn test_cli_filter_with_scenarios() {
    let cli = Cli::try_parse_from(&[
        "tabfixture",
        "filter",
        "users.csv",
        "--scenario",
        "s1",
        "-s",
        "s2",
        "--format",
        "json",
    ])
    .unwrap();

    match cli.command {
        Commands::Filter { scenarios, format, .. } => {
            assert_eq!(scenarios, vec!["s1", "s2"]);
            assert_eq!(OutputFormat::parse(&format), Ok(OutputFormat::Json));
        }
        _ => panic!("Expected Filter command"),
    }
}

#[test]
fn test_cli_merge_keeps_file_order() {
    let cli = Cli::try_parse_from(&["tabfixture", "merge", "b.csv", "a.csv"]).unwrap();
    match cli.command {
        Commands::Merge { files, .. } => {
            assert_eq!(files, vec![PathBuf::from("b.csv"), PathBuf::from("a.csv")]);
        }
        _ => panic!("Expected Merge command"),
    }
}

#[test]
fn test_cli_compare_command() {
    let cli = Cli::try_parse_from(&[
        "tabfixture",
        "compare",
        "expected/",
        "actual/",
        "--ignore",
        "updated_at",
        "--key",
        "id",
    ])
    .unwrap();

    match cli.command {
        Commands::Compare {
            expected,
            actual,
            ignore,
            keys,
            ..
        } => {
            assert_eq!(expected, PathBuf::from("expected/"));
            assert_eq!(actual, PathBuf::from("actual/"));
            assert_eq!(ignore, vec!["updated_at"]);
            assert_eq!(keys, vec!["id"]);
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_cli_load_defaults_to_clean_insert() {
    let cli = Cli::try_parse_from(&["tabfixture", "load", "seed/"]).unwrap();
    match cli.command {
        Commands::Load {
            database, operation, ..
        } => {
            assert!(database.is_none());
            assert_eq!(operation, DatabaseOperation::CleanInsert);
        }
        _ => panic!("Expected Load command"),
    }
}

#[test]
fn test_cli_verify_command() {
    let cli = Cli::try_parse_from(&[
        "tabfixture",
        "verify",
        "expected/",
        "--database",
        "app.duckdb",
        "--order-by",
        "id",
        "--verbose",
    ])
    .unwrap();

    assert!(cli.verbose);
    match cli.command {
        Commands::Verify {
            database, order_by, ..
        } => {
            assert_eq!(database, Some(PathBuf::from("app.duckdb")));
            assert_eq!(order_by, vec!["id"]);
        }
        _ => panic!("Expected Verify command"),
    }
}

#[test]
fn test_cli_global_config() {
    let cli = Cli::try_parse_from(&["tabfixture", "merge", "a.csv", "--config", "ci/tabfixture.json"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("ci/tabfixture.json")));
}

#[test]
fn test_operation_parse() {
    assert_eq!(DatabaseOperation::parse("insert"), Ok(DatabaseOperation::Insert));
    assert_eq!(DatabaseOperation::parse("DELETE_ALL"), Ok(DatabaseOperation::DeleteAll));
    assert_eq!(DatabaseOperation::parse("none"), Ok(DatabaseOperation::None));
    assert!(DatabaseOperation::parse("truncate").is_err());
}

#[test]
fn test_cli_rejects_unknown_operation() {
    assert!(Cli::try_parse_from(&["tabfixture", "load", "seed/", "--operation", "upsert"]).is_err());
}
