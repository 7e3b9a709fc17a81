//! Stage pipeline and its configuration.
//!
//! The pipeline owns an ordered list of stages and threads a panel through
//! them. Each stage fully consumes the previous stage's output; nothing is
//! shared between runs.

use crate::{
    PipelineError, Result,
    columns::{DATE, SYMBOL},
    liquidity::{
        RollingTurnover, RollingTurnoverConfig, TurnoverCalculator, TurnoverRankConfig,
        TurnoverRanker,
    },
    momentum::{MomentumRankConfig, MomentumRanker, ReturnConfig, ReturnEngine},
    normalize::{DailyLoader, LoaderConfig},
    resample::MonthlyResampler,
    traits::{ConfigurableStage, Stage},
};
use derive_more::Display;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Formation periods, in monthly records, used by default.
pub const DEFAULT_HORIZONS: [usize; 4] = [3, 6, 9, 12];

/// Stage kind for grouping related stages.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Normalize - typing and unit conversion of raw rows
    Normalize,
    /// Liquidity - turnover measures
    Liquidity,
    /// Resample - daily to monthly reduction
    Resample,
    /// Momentum - trailing return measures
    Momentum,
    /// CrossSection - per-date ranks and buckets
    CrossSection,
}

/// Metadata for stage introspection.
#[derive(Debug, Clone)]
pub struct StageInfo {
    /// Stage name (unique identifier)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Stage kind
    pub kind: StageKind,
    /// Required input columns
    pub required_columns: Vec<String>,
    /// Columns added by the stage
    pub produced_columns: Vec<String>,
}

/// Configuration of the default seven-stage pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Loader settings
    pub loader: LoaderConfig,
    /// Formation periods shared by returns, ranks and turnover averages
    pub horizons: Vec<usize>,
    /// Buckets for return ranks (default: 10)
    pub return_buckets: usize,
    /// Buckets for turnover ranks (default: 3)
    pub turnover_buckets: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            horizons: DEFAULT_HORIZONS.to_vec(),
            return_buckets: 10,
            turnover_buckets: 3,
        }
    }
}

impl PipelineConfig {
    /// Check horizons and bucket counts.
    pub fn validate(&self) -> Result<()> {
        if self.horizons.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one horizon is required".to_string(),
            ));
        }
        if self.horizons.contains(&0) {
            return Err(PipelineError::InvalidConfig(
                "horizons must be positive".to_string(),
            ));
        }
        let unique: HashSet<usize> = self.horizons.iter().copied().collect();
        if unique.len() != self.horizons.len() {
            return Err(PipelineError::InvalidConfig(format!(
                "duplicate horizons in {:?}",
                self.horizons
            )));
        }
        if self.return_buckets == 0 || self.turnover_buckets == 0 {
            return Err(PipelineError::InvalidConfig(
                "bucket counts must be positive".to_string(),
            ));
        }
        if !self.loader.shares_multiplier.is_finite() || self.loader.shares_multiplier <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "shares multiplier must be positive, got {}",
                self.loader.shares_multiplier
            )));
        }
        Ok(())
    }
}

/// Ordered collection of stages.
#[derive(Debug, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub const fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// The seven standard stages with default settings.
    pub fn with_defaults() -> Self {
        Self::build(&PipelineConfig::default())
    }

    /// The seven standard stages built from a validated configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &PipelineConfig) -> Self {
        let horizons = config.horizons.clone();
        let mut pipeline = Self::new();

        pipeline.push(Arc::new(DailyLoader::with_config(config.loader.clone())));
        pipeline.push(Arc::new(TurnoverCalculator));
        pipeline.push(Arc::new(MonthlyResampler));
        pipeline.push(Arc::new(ReturnEngine::with_config(ReturnConfig {
            horizons: horizons.clone(),
        })));
        pipeline.push(Arc::new(MomentumRanker::with_config(MomentumRankConfig {
            horizons: horizons.clone(),
            buckets: config.return_buckets,
        })));
        pipeline.push(Arc::new(RollingTurnover::with_config(
            RollingTurnoverConfig {
                horizons: horizons.clone(),
                min_periods: 1,
            },
        )));
        pipeline.push(Arc::new(TurnoverRanker::with_config(TurnoverRankConfig {
            horizons,
            buckets: config.turnover_buckets,
        })));

        pipeline
    }

    /// Append a stage to the end of the pipeline.
    pub fn push(&mut self, stage: Arc<dyn Stage>) {
        self.stages.push(stage);
    }

    /// Get a stage by name.
    pub fn get(&self, name: &str) -> Option<&dyn Stage> {
        self.stages
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    /// Get all stage metadata, in execution order.
    pub fn all_info(&self) -> Vec<StageInfo> {
        self.stages
            .iter()
            .map(|s| StageInfo {
                name: s.name().to_string(),
                description: s.description().to_string(),
                kind: s.kind(),
                required_columns: s.required_columns(),
                produced_columns: s.produced_columns(),
            })
            .collect()
    }

    /// Get all stage names, in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order.
    ///
    /// Returns the final panel sorted by `Date`, then `Symbol`.
    pub fn run(&self, data: &DataFrame) -> Result<DataFrame> {
        info!(
            stages = self.stages.len(),
            rows = data.height(),
            "Running ranking pipeline"
        );

        let mut current = data.clone();
        for stage in &self.stages {
            current = stage.run(&current)?;
            debug!(
                stage = stage.name(),
                rows = current.height(),
                columns = current.width(),
                "Stage complete"
            );
        }

        if current.get_column_index(DATE).is_some() && current.get_column_index(SYMBOL).is_some() {
            current = current
                .lazy()
                .sort(
                    [DATE, SYMBOL],
                    SortMultipleOptions::default()
                        .with_order_descending_multi([false, false])
                        .with_maintain_order(true),
                )
                .collect()?;
        }

        info!(
            rows = current.height(),
            columns = current.width(),
            "Ranking pipeline finished"
        );

        Ok(current)
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Run the default pipeline on a raw daily table.
pub fn compute_rankings(data: &DataFrame) -> Result<DataFrame> {
    Pipeline::with_defaults().run(data)
}
