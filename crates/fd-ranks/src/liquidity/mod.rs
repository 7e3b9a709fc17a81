//! Liquidity stages - turnover and its cross-sectional ranking
//!
//! Turnover is computed on daily rows, then averaged over trailing monthly
//! windows and bucketed into terciles per month.

pub mod average;
pub mod ranking;
pub mod turnover;

pub use average::{RollingTurnover, RollingTurnoverConfig};
pub use ranking::{TurnoverRankConfig, TurnoverRanker};
pub use turnover::TurnoverCalculator;
