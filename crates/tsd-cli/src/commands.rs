use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use polars::prelude::DataFrame;
use tracing::{info, info_span, warn};

use tsd_core::{IngestOptions, TsDataset, inspect, resolve_roles};
use tsd_ingest::{CsvOptions, coerce_datetime_column, load_csv};
use tsd_model::{ColumnRole, ColumnRoles, OneOrMany, PipelineConfig, RollOptions};
use tsd_roll::RollSummary;
use tsd_validate::{CheckLevel, ValidationReport};

use crate::cli::{InputArgs, InspectArgs, RoleArgs, RollArgs, RunArgs};

/// One column of a printed schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    /// Role labels joined with `/`; empty for unassigned columns.
    pub role: String,
    pub null_count: usize,
}

#[derive(Debug, Clone)]
pub struct InspectOutcome {
    pub rows: usize,
    /// Distinct ids, when the table is keyed and the id column exists.
    pub entities: Option<usize>,
    pub columns: Vec<ColumnInfo>,
    pub report: ValidationReport,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub rows: usize,
    pub entities: usize,
    pub columns: Vec<ColumnInfo>,
    /// Present when the last roll is still current.
    pub summary: Option<RollSummary>,
    pub elapsed_ms: u64,
}

pub fn run_inspect(args: &InspectArgs) -> Result<InspectOutcome> {
    let options = ingest_options(&args.roles);
    let roles = resolve_roles(&options);
    let df = load_for_inspection(&args.input, &roles.datetime)?;
    let level = if args.strict {
        CheckLevel::Strict
    } else {
        CheckLevel::Structural
    };
    let report = inspect(&df, &roles, level);
    let entities = match roles.id_column() {
        Some(id) => match df.column(id) {
            Ok(column) => Some(column.as_materialized_series().n_unique()?),
            Err(_) => None,
        },
        None => Some(1),
    };
    info!(
        rows = df.height(),
        issues = report.issues.len(),
        "inspection complete"
    );
    Ok(InspectOutcome {
        rows: df.height(),
        entities,
        columns: describe_columns(&df, &roles),
        report,
    })
}

pub fn run_pipeline(args: &RunArgs) -> Result<RunOutcome> {
    let config = load_config(&args.config)?;
    let span = info_span!("run", steps = config.steps.len());
    let _guard = span.enter();
    let start = Instant::now();
    let df = load_input(&args.input, Some(&config.roles.datetime_col))?;
    let dataset = TsDataset::run_pipeline(&df, &config)
        .with_context(|| format!("run pipeline from {}", args.config.display()))?;
    outcome(&dataset, start)
}

pub fn run_roll(args: &RollArgs) -> Result<RunOutcome> {
    let options = ingest_options(&args.roles);
    let span = info_span!("roll", lookback = args.lookback, horizon = args.horizon);
    let _guard = span.enter();
    let start = Instant::now();
    let df = load_input(&args.input, Some(&options.datetime_col))?;
    let mut dataset = TsDataset::from_polars(&df, &options).context("ingest table")?;
    if args.deduplicate {
        dataset.deduplicate()?;
    }
    let roll = RollOptions::new(args.lookback, args.horizon)
        .with_id_sensitive(args.id_sensitive)
        .with_target_as_feature(args.target_as_feature);
    dataset.roll(&roll).context("roll windows")?;
    outcome(&dataset, start)
}

/// Parse a pipeline configuration file.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
}

pub fn ingest_options(args: &RoleArgs) -> IngestOptions {
    let options = IngestOptions::new(
        args.datetime_col.as_str(),
        OneOrMany::Many(args.target_col.clone()),
    )
    .with_extra_feature_col(OneOrMany::Many(args.feature_col.clone()));
    match &args.id_col {
        Some(id) => options.with_id_col(id.as_str()),
        None => options,
    }
}

fn load_input(input: &InputArgs, datetime_col: Option<&str>) -> Result<DataFrame> {
    if !input.separator.is_ascii() {
        bail!("separator must be a single ASCII character");
    }
    let mut options = CsvOptions::default().with_separator(input.separator as u8);
    if let Some(column) = datetime_col {
        options = options.with_datetime_col(column);
    }
    load_csv(&input.csv, &options).with_context(|| format!("load {}", input.csv.display()))
}

/// Load without failing on a missing or unparseable datetime column, so the
/// report can describe the problem instead.
fn load_for_inspection(input: &InputArgs, datetime_col: &str) -> Result<DataFrame> {
    let mut df = load_input(input, None)?;
    if df.column(datetime_col).is_ok()
        && let Err(error) = coerce_datetime_column(&mut df, datetime_col)
    {
        warn!(%error, column = datetime_col, "datetime column left as text");
    }
    Ok(df)
}

fn outcome(dataset: &TsDataset, start: Instant) -> Result<RunOutcome> {
    let table = dataset.to_polars();
    Ok(RunOutcome {
        rows: dataset.height(),
        entities: dataset.entity_ids()?.len(),
        columns: describe_columns(&table, dataset.roles()),
        summary: dataset.roll_summary().cloned(),
        elapsed_ms: start.elapsed().as_millis() as u64,
    })
}

fn describe_columns(df: &DataFrame, roles: &ColumnRoles) -> Vec<ColumnInfo> {
    df.get_columns()
        .iter()
        .map(|column| ColumnInfo {
            name: column.name().to_string(),
            dtype: column.dtype().to_string(),
            role: roles
                .roles_of(column.name())
                .iter()
                .map(ColumnRole::label)
                .collect::<Vec<_>>()
                .join("/"),
            null_count: column.null_count(),
        })
        .collect()
}
