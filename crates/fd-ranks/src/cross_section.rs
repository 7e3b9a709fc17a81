//! Cross-sectional ranking and bucketing utilities.
//!
//! Both operations are scoped to the rows sharing a `Date`: a stock's rank or
//! bucket never depends on observations from another month.

use crate::{PipelineError, Result, columns::DATE};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Cross-sectional ordinal rank.
///
/// Ranks `value_column` within each date, starting at 1. Ties are broken by
/// row order (the first row among equal values gets the lower rank), so the
/// non-null ranks of a date with `n` non-null values are exactly `1..=n`.
/// Null values keep a null rank.
///
/// # Arguments
///
/// * `df` - DataFrame with columns: `Date` and `value_column`
/// * `value_column` - Name of the column to rank
/// * `rank_column` - Name of the output column (`UInt32`)
/// * `descending` - Rank the largest value first
pub fn cross_sectional_rank(
    df: &DataFrame,
    value_column: &str,
    rank_column: &str,
    descending: bool,
) -> Result<DataFrame> {
    let result = df
        .clone()
        .lazy()
        .with_column(
            col(value_column)
                .rank(
                    RankOptions {
                        method: RankMethod::Ordinal,
                        descending,
                    },
                    None,
                )
                .over([col(DATE)])
                .cast(DataType::UInt32)
                .alias(rank_column),
        )
        .collect()?;

    Ok(result)
}

/// Cross-sectional equal-frequency buckets.
///
/// Splits the values of `rank_column` into `buckets` groups per date using
/// [`quantile_bucket_labels`]. Dates with fewer than `buckets` distinct
/// non-null values get a null bucket on every row.
///
/// The distinct-value threshold counts non-null values only; unranked rows
/// never count as a distinct value of their own.
///
/// # Returns
///
/// DataFrame with `bucket_column` (`UInt32`, labels `1..=buckets`) added.
pub fn cross_sectional_bucket(
    df: &DataFrame,
    rank_column: &str,
    bucket_column: &str,
    buckets: usize,
) -> Result<DataFrame> {
    let dates = df.column(DATE)?.cast(&DataType::Int32)?;
    let dates = dates.i32()?;
    let values = df.column(rank_column)?.cast(&DataType::Float64)?;
    let values = values.f64()?;

    let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (row, date) in dates.into_iter().enumerate() {
        if let Some(date) = date {
            groups.entry(date).or_default().push(row);
        }
    }

    let mut labels: Vec<Option<u32>> = vec![None; df.height()];
    let mut undersized = 0usize;
    for rows in groups.values() {
        let group: Vec<Option<f64>> = rows.iter().map(|&row| values.get(row)).collect();
        let group_labels = quantile_bucket_labels(&group, buckets)?;
        if group_labels.iter().all(Option::is_none) {
            undersized += 1;
        }
        for (&row, label) in rows.iter().zip(group_labels) {
            labels[row] = label;
        }
    }

    debug!(
        column = bucket_column,
        dates = groups.len(),
        undersized,
        "Assigned cross-sectional buckets"
    );

    let mut result = df.clone();
    result.with_column(
        UInt32Chunked::from_iter_options(bucket_column.into(), labels.into_iter()).into_series(),
    )?;

    Ok(result)
}

/// Equal-frequency bucket labels for one cross-section.
///
/// Bin edges are the linearly interpolated quantiles at `i / buckets` of the
/// non-null values. Bins are right-closed with the lowest edge included, so
/// bucket 1 holds the smallest values. Nulls stay null. If there are fewer
/// than `buckets` distinct values every label is null.
///
/// # Errors
///
/// Returns [`PipelineError::Computation`] if `buckets` is zero or the bin
/// edges are not strictly increasing (heavily tied values).
pub fn quantile_bucket_labels(values: &[Option<f64>], buckets: usize) -> Result<Vec<Option<u32>>> {
    if buckets == 0 {
        return Err(PipelineError::Computation(
            "bucket count must be positive".to_string(),
        ));
    }

    let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
    observed.sort_by(f64::total_cmp);
    let mut distinct = observed.clone();
    distinct.dedup();
    if distinct.len() < buckets {
        return Ok(vec![None; values.len()]);
    }

    let edges: Vec<f64> = (0..=buckets)
        .map(|i| linear_quantile(&observed, i, buckets))
        .collect();
    if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(PipelineError::Computation(format!(
            "bucket edges must be unique: {edges:?}"
        )));
    }

    let labels = values
        .iter()
        .map(|value| {
            value.map(|x| {
                let bucket = edges[1..]
                    .iter()
                    .position(|&edge| x <= edge)
                    .unwrap_or(buckets - 1);
                bucket as u32 + 1
            })
        })
        .collect();

    Ok(labels)
}

/// Quantile `step / steps` of sorted, non-empty `sorted` with linear interpolation.
fn linear_quantile(sorted: &[f64], step: usize, steps: usize) -> f64 {
    let position = (sorted.len() - 1) as f64 * step as f64 / steps as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use rstest::rstest;

    fn ranked_frame() -> DataFrame {
        df![
            "Symbol" => ["A", "B", "C", "D", "A", "B"],
            "Date" => ["2024-01-01", "2024-01-01", "2024-01-01", "2024-01-01", "2024-02-01", "2024-02-01"],
            "value" => [Some(0.1), Some(0.3), Some(0.1), None, Some(-0.2), Some(0.5)],
        ]
        .unwrap()
        .lazy()
        .with_column(col("Date").cast(DataType::Date))
        .collect()
        .unwrap()
    }

    #[test]
    fn test_cross_sectional_rank_descending_first_tiebreak() {
        let result = cross_sectional_rank(&ranked_frame(), "value", "rank", true).unwrap();
        let ranks: Vec<Option<u32>> = result.column("rank").unwrap().u32().unwrap().into_iter().collect();

        // January: B (0.3) first, then the tied A and C in row order, D null
        assert_eq!(ranks[..4], [Some(2), Some(1), Some(3), None]);
        // February ranks independently of January
        assert_eq!(ranks[4..], [Some(2), Some(1)]);
    }

    #[test]
    fn test_cross_sectional_rank_ascending() {
        let result = cross_sectional_rank(&ranked_frame(), "value", "rank", false).unwrap();
        let ranks: Vec<Option<u32>> = result.column("rank").unwrap().u32().unwrap().into_iter().collect();

        assert_eq!(ranks, [Some(1), Some(3), Some(2), None, Some(1), Some(2)]);
    }

    #[rstest]
    #[case(20, 10, vec![1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10])]
    #[case(10, 10, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10])]
    #[case(4, 3, vec![1, 1, 2, 3])]
    #[case(6, 3, vec![1, 1, 2, 2, 3, 3])]
    #[case(3, 3, vec![1, 2, 3])]
    fn test_quantile_bucket_labels(
        #[case] n: usize,
        #[case] buckets: usize,
        #[case] expected: Vec<u32>,
    ) {
        let ranks: Vec<Option<f64>> = (1..=n).map(|r| Some(r as f64)).collect();
        let labels = quantile_bucket_labels(&ranks, buckets).unwrap();
        let expected: Vec<Option<u32>> = expected.into_iter().map(Some).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_quantile_bucket_labels_too_few_distinct() {
        let ranks: Vec<Option<f64>> = (1..=9).map(|r| Some(r as f64)).collect();
        let labels = quantile_bucket_labels(&ranks, 10).unwrap();
        assert!(labels.iter().all(Option::is_none));

        // Nulls do not count towards the distinct values
        let mut with_nulls = ranks;
        with_nulls.push(None);
        with_nulls.push(None);
        let labels = quantile_bucket_labels(&with_nulls, 10).unwrap();
        assert_eq!(labels.len(), 11);
        assert!(labels.iter().all(Option::is_none));
    }

    #[test]
    fn test_quantile_bucket_labels_keeps_nulls() {
        let ranks = [Some(3.0), None, Some(1.0), Some(2.0)];
        let labels = quantile_bucket_labels(&ranks, 3).unwrap();
        assert_eq!(labels, [Some(3), None, Some(1), Some(2)]);
    }

    #[test]
    fn test_quantile_bucket_labels_rejects_duplicate_edges() {
        let values = [Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(2.0), Some(3.0)];
        assert!(quantile_bucket_labels(&values, 3).is_err());
        assert!(quantile_bucket_labels(&values, 0).is_err());
    }

    #[test]
    fn test_cross_sectional_bucket_per_date() {
        let dates: Vec<&str> = std::iter::repeat_n("2024-01-01", 10)
            .chain(std::iter::repeat_n("2024-02-01", 3))
            .collect();
        let ranks: Vec<u32> = (1..=10).chain(1..=3).collect();
        let df = df!["Date" => dates, "rank" => ranks]
            .unwrap()
            .lazy()
            .with_column(col("Date").cast(DataType::Date))
            .collect()
            .unwrap();

        let result = cross_sectional_bucket(&df, "rank", "bucket", 10).unwrap();
        let labels: Vec<Option<u32>> = result.column("bucket").unwrap().u32().unwrap().into_iter().collect();

        let january: Vec<Option<u32>> = (1..=10).map(Some).collect();
        assert_eq!(labels[..10], january[..]);
        // Three stocks cannot fill ten buckets
        assert_eq!(labels[10..], [None, None, None]);
    }
}
