//! CLI argument definitions for the `tsd` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "tsd",
    version,
    about = "Prepare multi-entity time-series tables for forecasting models",
    long_about = "Load a CSV of time-stamped observations, check its dataset invariants,\n\
                  apply preprocessing steps and cut it into (x, y) training windows."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the schema and invariant report of a CSV table.
    Inspect(InspectArgs),

    /// Apply a JSON pipeline configuration to a CSV table.
    Run(RunArgs),

    /// Cut a CSV table into rolling windows and print their shapes.
    Roll(RollArgs),
}

/// Input file and parsing options shared by every subcommand.
#[derive(Args, Clone)]
pub struct InputArgs {
    /// CSV file with a header row.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Field separator.
    #[arg(long = "separator", default_value_t = ',')]
    pub separator: char,
}

/// Column role assignment given on the command line.
#[derive(Args, Clone)]
pub struct RoleArgs {
    /// Timestamp column.
    #[arg(long = "datetime-col", value_name = "COLUMN")]
    pub datetime_col: String,

    /// Target column (repeat or comma-separate for several).
    #[arg(long = "target-col", value_name = "COLUMN", value_delimiter = ',', required = true)]
    pub target_col: Vec<String>,

    /// Entity id column; omit for a single-series table.
    #[arg(long = "id-col", value_name = "COLUMN")]
    pub id_col: Option<String>,

    /// Extra feature column (repeat or comma-separate for several).
    #[arg(long = "feature-col", value_name = "COLUMN", value_delimiter = ',')]
    pub feature_col: Vec<String>,
}

#[derive(Parser)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub roles: RoleArgs,

    /// Also require unique timestamps per entity.
    #[arg(long = "strict")]
    pub strict: bool,
}

#[derive(Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// JSON file with roles and an ordered list of steps.
    #[arg(long = "config", value_name = "JSON")]
    pub config: PathBuf,

    /// Print the roll summary as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct RollArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub roles: RoleArgs,

    /// Number of past rows in each x window.
    #[arg(long = "lookback", value_name = "N")]
    pub lookback: usize,

    /// Number of future rows in each y window.
    #[arg(long = "horizon", value_name = "N", default_value_t = 1)]
    pub horizon: usize,

    /// Roll once over the wide entity x column table instead of per entity.
    #[arg(long = "id-sensitive")]
    pub id_sensitive: bool,

    /// Include past target values as x channels.
    #[arg(long = "target-as-feature")]
    pub target_as_feature: bool,

    /// Drop rows that repeat an earlier timestamp before rolling.
    #[arg(long = "deduplicate")]
    pub deduplicate: bool,

    /// Print the roll summary as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_roll_arguments() {
        let cli = Cli::try_parse_from([
            "tsd",
            "roll",
            "sales.csv",
            "--datetime-col",
            "ts",
            "--target-col",
            "units,revenue",
            "--id-col",
            "store",
            "--lookback",
            "7",
            "--horizon",
            "2",
            "--id-sensitive",
        ])
        .unwrap();
        let Command::Roll(args) = cli.command else {
            panic!("expected roll");
        };
        assert_eq!(args.roles.target_col, vec!["units", "revenue"]);
        assert_eq!(args.roles.id_col.as_deref(), Some("store"));
        assert_eq!(args.lookback, 7);
        assert_eq!(args.horizon, 2);
        assert!(args.id_sensitive);
        assert!(!args.target_as_feature);
        assert_eq!(args.input.separator, ',');
    }

    #[test]
    fn test_target_col_is_required() {
        let result = Cli::try_parse_from(["tsd", "inspect", "a.csv", "--datetime-col", "ts"]);
        assert!(result.is_err());
    }
}
