//! Cross-sectional turnover ranks and terciles.

use crate::{
    Result,
    columns::{DATE, avg_turnover_column, turnover_rank_column, turnover_tercile_column},
    cross_section::{cross_sectional_bucket, cross_sectional_rank},
    pipeline::{DEFAULT_HORIZONS, StageKind},
    traits::{ConfigurableStage, Stage},
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for [`TurnoverRanker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnoverRankConfig {
    /// Horizons whose average turnover is ranked (default: 3, 6, 9, 12)
    pub horizons: Vec<usize>,
    /// Number of equal-frequency buckets (default: 3)
    pub buckets: usize,
}

impl Default for TurnoverRankConfig {
    fn default() -> Self {
        Self {
            horizons: DEFAULT_HORIZONS.to_vec(),
            buckets: 3,
        }
    }
}

/// Turnover ranker.
///
/// For each horizon `k` and each date:
/// - `{k}M_Turnover_Rank`: ordinal rank of `{k}M_Avg_Turnover`, ascending
///   (least liquid stock = 1), ties broken by row order
/// - `{k}M_Turnover_Tercile`: equal-frequency bucket of the rank, 1..=3,
///   null when the date has fewer than three distinct ranks
#[derive(Debug, Clone, Default)]
pub struct TurnoverRanker {
    config: TurnoverRankConfig,
}

impl Stage for TurnoverRanker {
    fn name(&self) -> &str {
        "turnover_rank"
    }

    fn description(&self) -> &str {
        "Cross-sectional ascending rank and terciles of average turnover"
    }

    fn kind(&self) -> StageKind {
        StageKind::CrossSection
    }

    fn required_columns(&self) -> Vec<String> {
        std::iter::once(DATE.to_string())
            .chain(self.config.horizons.iter().map(|&k| avg_turnover_column(k)))
            .collect()
    }

    fn produced_columns(&self) -> Vec<String> {
        self.config
            .horizons
            .iter()
            .flat_map(|&k| [turnover_rank_column(k), turnover_tercile_column(k)])
            .collect()
    }

    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        let mut result = data.clone();
        for &k in &self.config.horizons {
            let rank = turnover_rank_column(k);
            result = cross_sectional_rank(&result, &avg_turnover_column(k), &rank, false)?;
            result = cross_sectional_bucket(
                &result,
                &rank,
                &turnover_tercile_column(k),
                self.config.buckets,
            )?;
        }

        Ok(result)
    }
}

impl ConfigurableStage for TurnoverRanker {
    type Config = TurnoverRankConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn monthly(dates: Vec<&str>, averages: Vec<Option<f64>>) -> DataFrame {
        df!["Date" => dates, "3M_Avg_Turnover" => averages]
            .unwrap()
            .lazy()
            .with_column(col("Date").cast(DataType::Date))
            .collect()
            .unwrap()
    }

    fn u32s(df: &DataFrame, name: &str) -> Vec<Option<u32>> {
        df.column(name).unwrap().u32().unwrap().into_iter().collect()
    }

    fn ranker() -> TurnoverRanker {
        TurnoverRanker::with_config(TurnoverRankConfig {
            horizons: vec![3],
            buckets: 3,
        })
    }

    #[test]
    fn test_turnover_rank_ascending_terciles() {
        let df = monthly(
            vec!["2024-01-01"; 6],
            vec![Some(0.6), Some(0.1), Some(0.5), Some(0.2), Some(0.4), Some(0.3)],
        );

        let result = ranker().run(&df).unwrap();

        assert_eq!(
            u32s(&result, "3M_Turnover_Rank"),
            [Some(6), Some(1), Some(5), Some(2), Some(4), Some(3)]
        );
        assert_eq!(
            u32s(&result, "3M_Turnover_Tercile"),
            [Some(3), Some(1), Some(3), Some(1), Some(2), Some(2)]
        );
    }

    #[test]
    fn test_turnover_tercile_needs_three_ranks() {
        let df = monthly(
            vec!["2024-01-01", "2024-01-01", "2024-02-01", "2024-02-01", "2024-02-01"],
            vec![Some(0.2), Some(0.1), Some(0.2), None, Some(0.1)],
        );

        let result = ranker().run(&df).unwrap();

        assert_eq!(
            u32s(&result, "3M_Turnover_Rank"),
            [Some(2), Some(1), Some(2), None, Some(1)]
        );
        assert!(u32s(&result, "3M_Turnover_Tercile").iter().all(Option::is_none));
    }

    #[test]
    fn test_turnover_ranker_metadata() {
        let stage = TurnoverRanker::default();
        assert_eq!(stage.name(), "turnover_rank");
        assert_eq!(stage.config().buckets, 3);
        assert_eq!(stage.required_columns().len(), 5);
        assert_eq!(stage.produced_columns().len(), 8);
    }
}
