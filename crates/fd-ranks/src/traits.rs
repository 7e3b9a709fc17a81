//! Core trait definitions for pipeline stages.
//!
//! Every stage implements [`Stage`], a pure transformation from one panel to
//! a wider (or, for resampling, coarser) panel.

use crate::{Result, columns::ensure_columns, pipeline::StageKind};
use polars::prelude::*;

/// One step of the ranking pipeline.
///
/// Stages are value-in/value-out: `apply` never mutates its input and keeps
/// no state between calls.
pub trait Stage: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this stage.
    ///
    /// Should be snake_case and stable across versions.
    fn name(&self) -> &str;

    /// Human-readable description of what this stage does.
    fn description(&self) -> &str;

    /// Stage kind for grouping and introspection.
    fn kind(&self) -> StageKind;

    /// Columns required in the input DataFrame.
    fn required_columns(&self) -> Vec<String>;

    /// Columns added (or replaced) by this stage.
    fn produced_columns(&self) -> Vec<String>;

    /// Transform the panel without validating its schema first.
    fn apply(&self, data: &DataFrame) -> Result<DataFrame>;

    /// Validate the input schema, then transform the panel.
    ///
    /// This is the primary entry point used by the pipeline.
    fn run(&self, data: &DataFrame) -> Result<DataFrame> {
        ensure_columns(data, &self.required_columns())?;
        self.apply(data)
    }
}

/// A stage that supports runtime configuration.
pub trait ConfigurableStage: Stage {
    /// Configuration type for this stage.
    type Config: Default + Clone + Send + Sync + std::fmt::Debug;

    /// Create a new stage with the given configuration.
    fn with_config(config: Self::Config) -> Self;

    /// Returns the current configuration.
    fn config(&self) -> &Self::Config;
}
