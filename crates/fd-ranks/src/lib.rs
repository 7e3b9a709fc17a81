#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod columns;
pub mod cross_section;
pub mod error;
pub mod liquidity;
pub mod momentum;
pub mod normalize;
pub mod pipeline;
pub mod resample;
pub mod traits;

// Re-export core types
pub use cross_section::{cross_sectional_bucket, cross_sectional_rank, quantile_bucket_labels};
pub use error::{PipelineError, Result};
pub use normalize::{DailyLoader, DatePolicy, LoaderConfig};
pub use pipeline::{Pipeline, PipelineConfig, StageInfo, StageKind, compute_rankings};
pub use resample::MonthlyResampler;
pub use traits::{ConfigurableStage, Stage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
