//! `tsd` command-line tool.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use tsd_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use tsd_cli::commands::{RunOutcome, run_inspect, run_pipeline, run_roll};
use tsd_cli::logging::{LogConfig, LogFormat, init_logging};
use tsd_cli::summary::{print_inspection, print_run, print_run_json};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Inspect(args) => match run_inspect(args) {
            Ok(outcome) => {
                print_inspection(&outcome);
                if outcome.report.is_valid() { 0 } else { 1 }
            }
            Err(error) => report_error(&error),
        },
        Command::Run(args) => finish(run_pipeline(args), args.json),
        Command::Roll(args) => finish(run_roll(args), args.json),
    };
    std::process::exit(exit_code);
}

fn finish(result: anyhow::Result<RunOutcome>, json: bool) -> i32 {
    match result {
        Ok(outcome) if json => match print_run_json(&outcome) {
            Ok(()) => 0,
            Err(error) => report_error(&error.into()),
        },
        Ok(outcome) => {
            print_run(&outcome);
            0
        }
        Err(error) => report_error(&error),
    }
}

fn report_error(error: &anyhow::Error) -> i32 {
    eprintln!("error: {error:#}");
    1
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let level_filter = match cli.log_level {
        Some(LogLevelArg::Error) => LevelFilter::ERROR,
        Some(LogLevelArg::Warn) => LevelFilter::WARN,
        Some(LogLevelArg::Info) => LevelFilter::INFO,
        Some(LogLevelArg::Debug) => LevelFilter::DEBUG,
        Some(LogLevelArg::Trace) => LevelFilter::TRACE,
        None => cli.verbosity.tracing_level_filter(),
    };
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let mut config = LogConfig::default()
        .with_level_filter(level_filter)
        .with_format(format)
        .with_log_file(cli.log_file.clone());
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
