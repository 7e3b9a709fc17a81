//! Single-period and cumulative multi-period returns.

use crate::{
    Result,
    columns::{ADJ_CLOSE, MONTHLY_RETURN, SYMBOL, return_column},
    pipeline::{DEFAULT_HORIZONS, StageKind},
    traits::{ConfigurableStage, Stage},
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for [`ReturnEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnConfig {
    /// Formation periods in monthly records (default: 3, 6, 9, 12)
    pub horizons: Vec<usize>,
}

impl Default for ReturnConfig {
    fn default() -> Self {
        Self {
            horizons: DEFAULT_HORIZONS.to_vec(),
        }
    }
}

/// Return engine.
///
/// Within each symbol, ordered by date:
/// - `Monthly_Return[t] = P_t / P_{t-1} - 1`
/// - `{k}M_Return[t] = P_t / P_{t-k} - 1`
///
/// where `P` is the monthly `Adj Close`. A symbol's first `k` records have no
/// `k`-period return (null); a `0 / 0` ratio is also stored as null.
#[derive(Debug, Clone, Default)]
pub struct ReturnEngine {
    config: ReturnConfig,
}

impl ReturnEngine {
    /// `P_t / P_{t-periods} - 1` within each symbol.
    fn pct_change(periods: usize) -> Expr {
        let change = (col(ADJ_CLOSE)
            / col(ADJ_CLOSE)
                .shift(lit(periods as i64))
                .over([col(SYMBOL)]))
            - lit(1.0);
        when(change.clone().is_nan())
            .then(lit(NULL).cast(DataType::Float64))
            .otherwise(change)
    }
}

impl Stage for ReturnEngine {
    fn name(&self) -> &str {
        "returns"
    }

    fn description(&self) -> &str {
        "Monthly and cumulative 3/6/9/12-month returns per symbol"
    }

    fn kind(&self) -> StageKind {
        StageKind::Momentum
    }

    fn required_columns(&self) -> Vec<String> {
        vec![SYMBOL.to_string(), ADJ_CLOSE.to_string()]
    }

    fn produced_columns(&self) -> Vec<String> {
        std::iter::once(MONTHLY_RETURN.to_string())
            .chain(self.config.horizons.iter().map(|&k| return_column(k)))
            .collect()
    }

    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        let returns: Vec<Expr> = std::iter::once(Self::pct_change(1).alias(MONTHLY_RETURN))
            .chain(
                self.config
                    .horizons
                    .iter()
                    .map(|&k| Self::pct_change(k).alias(return_column(k))),
            )
            .collect();

        let result = data.clone().lazy().with_columns(returns).collect()?;

        Ok(result)
    }
}

impl ConfigurableStage for ReturnEngine {
    type Config = ReturnConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
