//! Cross-sectional momentum ranks and deciles.

use crate::{
    Result,
    columns::{DATE, decile_column, rank_column, return_column},
    cross_section::{cross_sectional_bucket, cross_sectional_rank},
    pipeline::{DEFAULT_HORIZONS, StageKind},
    traits::{ConfigurableStage, Stage},
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for [`MomentumRanker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumRankConfig {
    /// Horizons whose cumulative return is ranked (default: 3, 6, 9, 12)
    pub horizons: Vec<usize>,
    /// Number of equal-frequency buckets (default: 10)
    pub buckets: usize,
}

impl Default for MomentumRankConfig {
    fn default() -> Self {
        Self {
            horizons: DEFAULT_HORIZONS.to_vec(),
            buckets: 10,
        }
    }
}

/// Cross-sectional momentum ranker.
///
/// For each horizon `k` and each date:
/// - `{k}M_Rank`: ordinal rank of `{k}M_Return`, descending (best performer
///   = 1), ties broken by row order, null where the return is null
/// - `{k}M_Quintile`: equal-frequency decile of the rank, 1..=10 with bucket 1
///   holding the best performers; null on dates with fewer than ten distinct
///   ranks
///
/// The decile column keeps its historical `Quintile` name.
#[derive(Debug, Clone, Default)]
pub struct MomentumRanker {
    config: MomentumRankConfig,
}

impl Stage for MomentumRanker {
    fn name(&self) -> &str {
        "momentum_rank"
    }

    fn description(&self) -> &str {
        "Cross-sectional descending rank and deciles of cumulative returns"
    }

    fn kind(&self) -> StageKind {
        StageKind::CrossSection
    }

    fn required_columns(&self) -> Vec<String> {
        std::iter::once(DATE.to_string())
            .chain(self.config.horizons.iter().map(|&k| return_column(k)))
            .collect()
    }

    fn produced_columns(&self) -> Vec<String> {
        self.config
            .horizons
            .iter()
            .flat_map(|&k| [rank_column(k), decile_column(k)])
            .collect()
    }

    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        let mut result = data.clone();
        for &k in &self.config.horizons {
            let rank = rank_column(k);
            result = cross_sectional_rank(&result, &return_column(k), &rank, true)?;
            result =
                cross_sectional_bucket(&result, &rank, &decile_column(k), self.config.buckets)?;
        }

        Ok(result)
    }
}

impl ConfigurableStage for MomentumRanker {
    type Config = MomentumRankConfig;

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

    fn ranker() -> MomentumRanker {
        MomentumRanker::with_config(MomentumRankConfig {
            horizons: vec![3],
            buckets: 10,
        })
    }

    fn cross_section(n: usize) -> DataFrame {
        // Returns increase with the row number, so the last row ranks first
        let returns: Vec<f64> = (0..n).map(|i| i as f64 / 100.0).collect();
        df!["Date" => vec!["2024-03-01"; n], "3M_Return" => returns]
            .unwrap()
            .lazy()
            .with_column(col("Date").cast(DataType::Date))
            .collect()
            .unwrap()
    }

    fn u32s(df: &DataFrame, name: &str) -> Vec<Option<u32>> {
        df.column(name).unwrap().u32().unwrap().into_iter().collect()
    }

    #[test]
    fn test_momentum_rank_descending_deciles() {
        let result = ranker().run(&cross_section(20)).unwrap();

        let ranks = u32s(&result, "3M_Rank");
        let expected: Vec<Option<u32>> = (1..=20).rev().map(Some).collect();
        assert_eq!(ranks, expected);

        let deciles = u32s(&result, "3M_Quintile");
        // Best two performers (last rows) land in bucket 1, worst two in bucket 10
        assert_eq!(deciles[19], Some(1));
        assert_eq!(deciles[18], Some(1));
        assert_eq!(deciles[1], Some(10));
        assert_eq!(deciles[0], Some(10));
        for bucket in 1..=10 {
            assert_eq!(deciles.iter().filter(|d| **d == Some(bucket)).count(), 2);
        }
    }

    #[test]
    fn test_momentum_deciles_missing_below_ten_stocks() {
        let result = ranker().run(&cross_section(9)).unwrap();

        assert!(u32s(&result, "3M_Rank").iter().all(Option::is_some));
        assert!(u32s(&result, "3M_Quintile").iter().all(Option::is_none));
    }

    #[test]
    fn test_momentum_ties_get_distinct_ranks() {
        let df = df![
            "Date" => vec!["2024-03-01"; 4],
            "3M_Return" => [0.1, 0.1, 0.1, 0.2],
        ]
        .unwrap()
        .lazy()
        .with_column(col("Date").cast(DataType::Date))
        .collect()
        .unwrap();

        let result = ranker().run(&df).unwrap();
        assert_eq!(
            u32s(&result, "3M_Rank"),
            [Some(2), Some(3), Some(4), Some(1)]
        );
    }

    #[test]
    fn test_momentum_ranker_requires_returns() {
        let df = df!["Date" => ["2024-03-01"]].unwrap();
        assert!(ranker().run(&df).is_err());
    }
}
