//! Trailing average turnover over the formation periods.

use crate::{
    PipelineError, Result,
    columns::{SYMBOL, TURNOVER, avg_turnover_column},
    pipeline::{DEFAULT_HORIZONS, StageKind},
    traits::{ConfigurableStage, Stage},
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for [`RollingTurnover`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingTurnoverConfig {
    /// Window lengths in monthly records (default: 3, 6, 9, 12)
    pub horizons: Vec<usize>,
    /// Minimum observations for a valid mean (default: 1)
    pub min_periods: usize,
}

impl Default for RollingTurnoverConfig {
    fn default() -> Self {
        Self {
            horizons: DEFAULT_HORIZONS.to_vec(),
            min_periods: 1,
        }
    }
}

/// Rolling average turnover per symbol.
///
/// For each horizon `k`, `{k}M_Avg_Turnover` is the mean monthly turnover over
/// the `k` most recent records of the symbol, current record included. With
/// the default `min_periods` of 1 the average is populated from a symbol's
/// first month onward, using whatever history exists. Null turnovers are
/// skipped inside the window.
///
/// Expects the panel ordered by `Date` within each `Symbol`.
#[derive(Debug, Clone, Default)]
pub struct RollingTurnover {
    config: RollingTurnoverConfig,
}

impl Stage for RollingTurnover {
    fn name(&self) -> &str {
        "rolling_turnover"
    }

    fn description(&self) -> &str {
        "Trailing mean of monthly turnover per symbol over each horizon"
    }

    fn kind(&self) -> StageKind {
        StageKind::Liquidity
    }

    fn required_columns(&self) -> Vec<String> {
        vec![SYMBOL.to_string(), TURNOVER.to_string()]
    }

    fn produced_columns(&self) -> Vec<String> {
        self.config
            .horizons
            .iter()
            .map(|&k| avg_turnover_column(k))
            .collect()
    }

    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        if self.config.min_periods == 0 {
            return Err(PipelineError::InvalidConfig(
                "rolling turnover min_periods must be positive".to_string(),
            ));
        }

        let averages: Vec<Expr> = self
            .config
            .horizons
            .iter()
            .map(|&k| {
                col(TURNOVER)
                    .rolling_mean(RollingOptionsFixedWindow {
                        window_size: k,
                        min_periods: self.config.min_periods.min(k),
                        ..Default::default()
                    })
                    .over([col(SYMBOL)])
                    .alias(avg_turnover_column(k))
            })
            .collect();

        let result = data.clone().lazy().with_columns(averages).collect()?;

        Ok(result)
    }
}

impl ConfigurableStage for RollingTurnover {
    type Config = RollingTurnoverConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
