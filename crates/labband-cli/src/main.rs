//! `labband` command-line harness.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use labband_cli::logging::{LogConfig, LogFormat, init_logging};
use serde::Serialize;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;
mod types;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg, OutputFormatArg};
use crate::commands::{load_registry, run_classify, run_compare};
use crate::summary::{print_classification, print_comparison, print_reference_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32> {
    let (registry, reference) = load_registry(cli.reference_dir.as_deref())?;
    match &cli.command {
        Command::Classify(args) => {
            let result = run_classify(args, &registry)?;
            emit(cli.format, &result, print_classification)?;
            Ok(if result.report.is_some() { 0 } else { 1 })
        }
        Command::Compare(args) => {
            let result = run_compare(args, &registry)?;
            emit(cli.format, &result, print_comparison)?;
            Ok(0)
        }
        Command::Reference => {
            emit(cli.format, &reference, print_reference_summary)?;
            Ok(0)
        }
    }
}

fn emit<T: Serialize>(format: OutputFormatArg, value: &T, print_table: fn(&T)) -> Result<()> {
    match format {
        OutputFormatArg::Table => print_table(value),
        OutputFormatArg::Json => {
            let json = serde_json::to_string_pretty(value).context("serialize output")?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
