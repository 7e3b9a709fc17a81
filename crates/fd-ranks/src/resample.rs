//! Monthly resampling on a business-month-start grid.
//!
//! Each daily row is assigned to the window `[BMS(m), BMS(m + 1))`, where
//! `BMS(m)` is the first Monday-to-Friday day of month `m`, and every
//! (symbol, window) pair keeps its first observation.

use crate::{
    Result,
    columns::{DATE, SYMBOL},
    pipeline::StageKind,
    traits::Stage,
};
use chrono::{Datelike, Months, NaiveDate, Weekday};
use polars::prelude::*;
use tracing::debug;

/// Days from 0001-01-01 (CE) to 1970-01-01, the epoch of polars dates.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Temporary window label column.
const WINDOW: &str = "__business_month_start";

/// First business day (Monday to Friday) of the given month.
pub fn first_business_day(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = match first.weekday() {
        Weekday::Sat => 2,
        Weekday::Sun => 1,
        _ => 0,
    };
    first.checked_add_days(chrono::Days::new(offset))
}

/// Business-month-start label of the window containing `date`.
///
/// Weekend days before the first business day of a month (for example a
/// Saturday the 1st) belong to the previous month's window.
pub fn business_month_start(date: NaiveDate) -> Option<NaiveDate> {
    let start = first_business_day(date.year(), date.month())?;
    if date >= start {
        return Some(start);
    }
    let previous = date.checked_sub_months(Months::new(1))?;
    first_business_day(previous.year(), previous.month())
}

fn business_month_start_days(days: i32) -> Option<i32> {
    let date = NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)?;
    business_month_start(date).map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

/// Monthly resampler.
///
/// Collapses the daily panel into one Monthly Record per (symbol, month)
/// actually observed; months without observations produce no record. Every
/// other column keeps its first non-null value inside the window, and `Date`
/// becomes the business-month-start label.
///
/// Expects the panel ordered by `Date` within each `Symbol`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthlyResampler;

impl Stage for MonthlyResampler {
    fn name(&self) -> &str {
        "monthly_resample"
    }

    fn description(&self) -> &str {
        "First observation per symbol on a business-month-start grid"
    }

    fn kind(&self) -> StageKind {
        StageKind::Resample
    }

    fn required_columns(&self) -> Vec<String> {
        vec![SYMBOL.to_string(), DATE.to_string()]
    }

    fn produced_columns(&self) -> Vec<String> {
        vec![DATE.to_string()]
    }

    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        let days = data.column(DATE)?.cast(&DataType::Int32)?;
        let windows = Int32Chunked::from_iter_options(
            WINDOW.into(),
            days.i32()?
                .into_iter()
                .map(|d| d.and_then(business_month_start_days)),
        )
        .into_series()
        .cast(&DataType::Date)?;

        let values: Vec<String> = data
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| name != SYMBOL && name != DATE)
            .collect();

        let mut daily = data.clone();
        daily.with_column(windows)?;

        let firsts: Vec<Expr> = values
            .iter()
            .map(|name| col(name.as_str()).drop_nulls().first())
            .collect();
        let layout: Vec<Expr> = [col(SYMBOL), col(WINDOW).alias(DATE)]
            .into_iter()
            .chain(values.iter().map(|name| col(name.as_str())))
            .collect();

        let result = daily
            .lazy()
            .filter(col(WINDOW).is_not_null())
            .group_by_stable([col(SYMBOL), col(WINDOW)])
            .agg(firsts)
            .select(layout)
            .sort(
                [SYMBOL, DATE],
                SortMultipleOptions::default()
                    .with_order_descending_multi([false, false])
                    .with_maintain_order(true),
            )
            .collect()?;

        debug!(
            daily_rows = data.height(),
            monthly_rows = result.height(),
            "Resampled to business-month starts"
        );

        Ok(result)
    }
}
