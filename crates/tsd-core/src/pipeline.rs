//! Config-driven step execution.

use std::time::Instant;

use polars::prelude::DataFrame;
use tracing::info;
use tsd_model::{PipelineConfig, PipelineStep, ResampleOptions};

use crate::dataset::TsDataset;
use crate::error::Result;

impl TsDataset {
    /// Apply one configured step.
    pub fn apply_step(&mut self, step: &PipelineStep) -> Result<&mut Self> {
        match step {
            PipelineStep::Deduplicate => self.deduplicate(),
            PipelineStep::Impute { mode } => self.impute(*mode),
            PipelineStep::Resample {
                interval,
                mode,
                allow_na,
            } => self.resample(
                &ResampleOptions::new(*interval)
                    .with_mode(*mode)
                    .with_allow_na(*allow_na),
            ),
            PipelineStep::GenDtFeature { features } => self.gen_dt_feature(features.as_deref()),
            PipelineStep::GenGlobalFeature { features } => {
                self.gen_global_feature(features.as_deref())
            }
            PipelineStep::Roll(options) => self.roll(options),
        }
    }

    /// Ingest `df` and apply every configured step in order.
    pub fn run_pipeline(df: &DataFrame, config: &PipelineConfig) -> Result<Self> {
        let mut dataset = Self::from_polars(df, &config.roles)?;
        for (index, step) in config.steps.iter().enumerate() {
            let start = Instant::now();
            dataset.apply_step(step)?;
            info!(
                step = index + 1,
                op = step.name(),
                rows = dataset.height(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "pipeline step complete"
            );
        }
        Ok(dataset)
    }
}
