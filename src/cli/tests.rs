//! Unit tests for CLI parsing and run configuration

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::cli::{Cli, Commands};
use crate::config::{Action, Platform, Settings};
use clap::Parser;
use serde_json::json;
use std::path::Path;

#[test]
fn test_build_command_minimal() {
    let cli =
        Cli::try_parse_from(["stubsmith", "build", "--input", "e.json", "--output", "out"]).unwrap();

    assert!(!cli.verbose);
    assert_eq!(cli.command.action(), Action::Build);
    match &cli.command {
        Commands::Build(run) => {
            assert_eq!(run.input, Path::new("e.json"));
            assert_eq!(run.output, Path::new("out"));
            assert!(run.key.is_none());
            assert!(!run.overwrite);
            assert!(run.args.is_empty());
        }
        Commands::Update(_) => panic!("Expected Build command"),
    }
}

#[test]
fn test_update_command_with_flags() {
    let cli = Cli::try_parse_from([
        "stubsmith",
        "-v",
        "update",
        "-i",
        "e.yaml",
        "-o",
        "app",
        "--key",
        "demo",
        "--spec",
        "--spec-type",
        "ios",
        "--pbx-force",
        "--pid",
        "7",
        "--previous",
        "old.json",
        "--arg",
        "prefix=NE",
        "--arg",
        "retries=3",
    ])
    .unwrap();

    assert!(cli.verbose);
    let Commands::Update(run) = &cli.command else {
        panic!("Expected Update command");
    };
    assert_eq!(run.key.as_deref(), Some("demo"));
    assert!(run.spec);
    assert!(run.pbx_force);
    assert_eq!(run.pid, Some(7));
    assert_eq!(run.previous.as_deref(), Some(Path::new("old.json")));
    assert_eq!(
        run.args,
        vec![
            ("prefix".to_string(), json!("NE")),
            ("retries".to_string(), json!(3)),
        ]
    );

    let config = run.build_config(cli.command.action(), &Settings::default());
    assert_eq!(config.args.spec_type, Platform::Ios);
    assert!(config.args.is_incremental());
    assert_eq!(config.config_root, Path::new("app/.stubsmith"));
    assert_eq!(config.args.extra["retries"], 3);
}

#[test]
fn test_malformed_arg_is_rejected() {
    let result = Cli::try_parse_from([
        "stubsmith", "build", "--input", "e.json", "--output", "out", "--arg", "novalue",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_input_and_output_are_required() {
    assert!(Cli::try_parse_from(["stubsmith", "build", "--output", "out"]).is_err());
    assert!(Cli::try_parse_from(["stubsmith", "update", "--input", "e.json"]).is_err());
    assert!(Cli::try_parse_from(["stubsmith", "generate"]).is_err());
}

#[test]
fn test_flags_win_over_settings() {
    let cli = Cli::try_parse_from([
        "stubsmith",
        "build",
        "--input",
        "e.json",
        "--output",
        "out",
        "--spec-type",
        "android",
        "--arg",
        "prefix=NE",
    ])
    .unwrap();
    let settings: Settings = serde_yaml::from_str(
        "spec_type: ios\noverwrite: true\nconfig_root: /etc/stubsmith\npid: 4\nargs:\n  prefix: XX\n  theme: dark\n",
    )
    .unwrap();

    let config = cli
        .command
        .run_args()
        .build_config(Action::Build, &settings);
    assert_eq!(config.args.spec_type, Platform::Android);
    assert!(config.args.overwrite);
    assert_eq!(config.args.pid, Some(4));
    assert_eq!(config.args.extra["prefix"], "NE");
    assert_eq!(config.args.extra["theme"], "dark");
    assert_eq!(config.config_root, Path::new("/etc/stubsmith"));
}

#[test]
fn test_config_root_flag_wins() {
    let cli = Cli::try_parse_from([
        "stubsmith",
        "build",
        "--input",
        "e.json",
        "--output",
        "out",
        "--config-root",
        "cfg",
    ])
    .unwrap();
    let settings = Settings {
        config_root: Some("/elsewhere".into()),
        ..Default::default()
    };
    let config = cli
        .command
        .run_args()
        .build_config(Action::Build, &settings);
    assert_eq!(config.config_root, Path::new("cfg"));
}
