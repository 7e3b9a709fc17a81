//! Daily panel loader and normalizer.
//!
//! Turns a raw table (as read from the source CSV) into typed Daily Records:
//! string dates become `Date`, numeric fields become `Float64`, share counts
//! are converted from crores to absolute counts and rows are ordered by date
//! within each symbol.

use crate::{
    PipelineError, Result,
    columns::{ADJ_CLOSE, DATE, INDEX_COLUMNS, OUTSTANDING_SHARES, SYMBOL, VOLUME},
    pipeline::StageKind,
    traits::{ConfigurableStage, Stage},
};
use derive_more::Display;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One crore (10,000,000), the unit of the raw share counts.
pub const CRORE: f64 = 10_000_000.0;

/// What to do with date strings that do not match the configured format.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePolicy {
    /// Fail the whole load with [`PipelineError::InvalidDate`]
    #[default]
    Reject,
    /// Drop the offending rows and log a warning
    Drop,
}

/// Configuration for the daily loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// chrono format of the raw date strings (default: `%d/%m/%Y`)
    pub date_format: String,
    /// Multiplier applied to `Outstanding_Shares` (default: one crore)
    pub shares_multiplier: f64,
    /// Handling of unparseable dates (default: reject)
    pub date_policy: DatePolicy,
    /// Row-index columns dropped when present
    pub index_columns: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            date_format: "%d/%m/%Y".to_string(),
            shares_multiplier: CRORE,
            date_policy: DatePolicy::Reject,
            index_columns: INDEX_COLUMNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// `Float64` cast of a raw numeric column. NaN (including the strings
/// `"nan"`/`"NaN"`) is a missing marker, not a value, and becomes null.
fn numeric(name: &str) -> Expr {
    col(name).cast(DataType::Float64).fill_nan(lit(NULL))
}

/// Loader/normalizer for raw daily rows.
///
/// # Computation
///
/// 1. Drop spurious row-index columns (`""`, `"Unnamed: 0"`)
/// 2. Parse `Date` with the exact configured format
/// 3. Coerce `Adj Close`, `Volume` and `Outstanding_Shares` to `Float64`,
///    turning unparseable values and NaN into nulls
/// 4. Scale `Outstanding_Shares` by the configured multiplier
/// 5. Sort by `Symbol`, then `Date`
///
/// Rows with a null date cannot be placed in a month and are dropped.
#[derive(Debug, Clone, Default)]
pub struct DailyLoader {
    config: LoaderConfig,
}

impl DailyLoader {
    /// Creates a loader with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    fn date_expr(&self, dtype: &DataType) -> Expr {
        match dtype {
            DataType::String => col(DATE).str().to_date(StrptimeOptions {
                format: Some(self.config.date_format.as_str().into()),
                strict: false,
                exact: true,
                cache: true,
            }),
            DataType::Date => col(DATE),
            _ => col(DATE).cast(DataType::Date),
        }
    }
}

impl Stage for DailyLoader {
    fn name(&self) -> &str {
        "normalize"
    }

    fn description(&self) -> &str {
        "Parse dates, coerce numeric fields and convert share counts from crores"
    }

    fn kind(&self) -> StageKind {
        StageKind::Normalize
    }

    fn required_columns(&self) -> Vec<String> {
        [SYMBOL, DATE, ADJ_CLOSE, VOLUME, OUTSTANDING_SHARES]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn produced_columns(&self) -> Vec<String> {
        [DATE, ADJ_CLOSE, VOLUME, OUTSTANDING_SHARES]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        let mut raw = data.clone();
        for index in &self.config.index_columns {
            if raw.get_column_index(index).is_some() {
                debug!(column = %index, "Dropping row-index column");
                raw = raw.drop(index)?;
            }
        }

        let date_dtype = raw.column(DATE)?.dtype().clone();
        let raw_null_dates = raw.column(DATE)?.null_count();
        let raw_null_shares = raw.column(OUTSTANDING_SHARES)?.null_count();

        let typed = raw
            .lazy()
            .with_columns([
                col(SYMBOL).cast(DataType::String),
                self.date_expr(&date_dtype).alias(DATE),
                numeric(ADJ_CLOSE),
                numeric(VOLUME),
                (numeric(OUTSTANDING_SHARES) * lit(self.config.shares_multiplier))
                    .alias(OUTSTANDING_SHARES),
            ])
            .collect()?;

        let coerced_shares = typed
            .column(OUTSTANDING_SHARES)?
            .null_count()
            .saturating_sub(raw_null_shares);
        if coerced_shares > 0 {
            warn!(
                rows = coerced_shares,
                "Unparseable or NaN Outstanding_Shares values coerced to null"
            );
        }

        let unparsed = typed.column(DATE)?.null_count().saturating_sub(raw_null_dates);
        if unparsed > 0 {
            match self.config.date_policy {
                DatePolicy::Reject => {
                    return Err(PipelineError::InvalidDate {
                        count: unparsed,
                        format: self.config.date_format.clone(),
                    });
                }
                DatePolicy::Drop => {
                    warn!(
                        rows = unparsed,
                        format = %self.config.date_format,
                        "Dropping rows with unparseable dates"
                    );
                }
            }
        }

        let result = typed
            .lazy()
            .filter(col(DATE).is_not_null())
            .sort(
                [SYMBOL, DATE],
                SortMultipleOptions::default()
                    .with_order_descending_multi([false, false])
                    .with_maintain_order(true),
            )
            .collect()?;

        debug!(
            rows = result.height(),
            dropped = data.height() - result.height(),
            "Normalized daily panel"
        );

        Ok(result)
    }
}

impl ConfigurableStage for DailyLoader {
    type Config = LoaderConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
