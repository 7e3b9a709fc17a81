//! Daily turnover.
//!
//! Measures liquidity through trading volume relative to shares outstanding.
//! Higher turnover indicates more liquid securities with lower transaction costs.

use crate::{
    Result,
    columns::{OUTSTANDING_SHARES, TURNOVER, VOLUME},
    pipeline::StageKind,
    traits::Stage,
};
use polars::prelude::*;

/// Per-row turnover calculator.
///
/// Computes `turnover_t = volume_t / shares_outstanding_t` on every daily row.
/// A missing or zero share count yields a null turnover instead of an
/// infinite value, so one bad row never aborts the pipeline.
///
/// # Required Columns
///
/// - `Volume`: Daily trading volume
/// - `Outstanding_Shares`: Shares outstanding, already converted to an absolute count
///
/// # References
///
/// - Datar, V. T., Y. Naik, and R. Radcliffe (1998). "Liquidity and stock returns:
///   An alternative test," Journal of Financial Markets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnoverCalculator;

impl Stage for TurnoverCalculator {
    fn name(&self) -> &str {
        "turnover"
    }

    fn description(&self) -> &str {
        "Daily trading volume as a fraction of shares outstanding"
    }

    fn kind(&self) -> StageKind {
        StageKind::Liquidity
    }

    fn required_columns(&self) -> Vec<String> {
        vec![VOLUME.to_string(), OUTSTANDING_SHARES.to_string()]
    }

    fn produced_columns(&self) -> Vec<String> {
        vec![TURNOVER.to_string()]
    }

    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        let result = data
            .clone()
            .lazy()
            .with_column(
                when(col(OUTSTANDING_SHARES).neq(lit(0.0)))
                    .then(col(VOLUME) / col(OUTSTANDING_SHARES))
                    .otherwise(lit(NULL).cast(DataType::Float64))
                    .alias(TURNOVER),
            )
            .collect()?;

        Ok(result)
    }
}
