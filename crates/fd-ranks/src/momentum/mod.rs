//! Momentum stages - trailing returns and their cross-sectional ranking
//!
//! Cumulative returns over 3, 6, 9 and 12 monthly records capture the
//! tendency of recent winners to keep outperforming; ranks and deciles make
//! them comparable within each month.

pub mod ranking;
pub mod returns;

pub use ranking::{MomentumRankConfig, MomentumRanker};
pub use returns::{ReturnConfig, ReturnEngine};
