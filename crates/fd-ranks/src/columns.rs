//! Column names of the daily and monthly panels.
//!
//! Names follow the source data layout (`Adj Close`, `Outstanding_Shares`)
//! and the `{k}M_*` convention for horizon-dependent columns.

use crate::{PipelineError, Result};
use polars::prelude::DataFrame;

/// Security identifier.
pub const SYMBOL: &str = "Symbol";
/// Observation date (daily) or business-month-start label (monthly).
pub const DATE: &str = "Date";
/// Adjusted closing price.
pub const ADJ_CLOSE: &str = "Adj Close";
/// Traded shares.
pub const VOLUME: &str = "Volume";
/// Shares outstanding, absolute count once normalized.
pub const OUTSTANDING_SHARES: &str = "Outstanding_Shares";
/// Volume as a fraction of shares outstanding.
pub const TURNOVER: &str = "Turnover";
/// One-period return.
pub const MONTHLY_RETURN: &str = "Monthly_Return";

/// Row-index columns left behind by CSV round trips.
pub const INDEX_COLUMNS: [&str; 2] = ["", "Unnamed: 0"];

/// `{k}M_Return`
pub fn return_column(horizon: usize) -> String {
    format!("{horizon}M_Return")
}

/// `{k}M_Rank`
pub fn rank_column(horizon: usize) -> String {
    format!("{horizon}M_Rank")
}

/// `{k}M_Quintile`.
///
/// The historical name is kept for output compatibility; the column holds
/// ten buckets (deciles).
pub fn decile_column(horizon: usize) -> String {
    format!("{horizon}M_Quintile")
}

/// `{k}M_Avg_Turnover`
pub fn avg_turnover_column(horizon: usize) -> String {
    format!("{horizon}M_Avg_Turnover")
}

/// `{k}M_Turnover_Rank`
pub fn turnover_rank_column(horizon: usize) -> String {
    format!("{horizon}M_Turnover_Rank")
}

/// `{k}M_Turnover_Tercile`
pub fn turnover_tercile_column(horizon: usize) -> String {
    format!("{horizon}M_Turnover_Tercile")
}

/// Fails with [`PipelineError::MissingColumn`] on the first absent column.
pub fn ensure_columns<S: AsRef<str>>(df: &DataFrame, required: &[S]) -> Result<()> {
    for name in required {
        let name = name.as_ref();
        if df.get_column_index(name).is_none() {
            return Err(PipelineError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}
