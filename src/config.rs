//! Run configuration.
//!
//! Values arrive from the command line (see `main.rs`) and are validated
//! here before any record is processed.

use thiserror::Error;

use crate::layout::DEFAULT_TOLERANCE;
use crate::projection::{Window, DEFAULT_SIGNIFICANCE};

/// Largest window accepted, in positions.
pub const MAX_WINDOW_LEN: u64 = 10_000_000;

/// Errors in user-supplied parameters.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Window {start}..{stop} spans {len} positions (maximum is {MAX_WINDOW_LEN})")]
    WindowTooLarge { start: i64, stop: i64, len: u64 },

    #[error("Merge tolerance must be a non-negative number (got {0})")]
    InvalidTolerance(f64),

    #[error("P-value threshold must be a positive number (got {0})")]
    InvalidThreshold(f64),
}

/// What to do when a record fails fatally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Abort the whole batch on the first fatal record
    #[default]
    FailFast,
    /// Keep going; the record gets no alignment and the error is reported
    Collect,
}

/// Names of the input table columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub label: String,
    pub source: String,
    pub start: String,
    pub stop: String,
    pub strand: String,
    pub score: String,
    /// Accepted names for the matched sequence column, first match wins
    pub sequence: Vec<String>,
    pub mode: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            label: "TF".to_string(),
            source: "Source".to_string(),
            start: "Start".to_string(),
            stop: "Stop".to_string(),
            strand: "Strand".to_string(),
            score: "Pvalue".to_string(),
            sequence: vec!["Mached Sequence".to_string(), "Matched Sequence".to_string()],
            mode: "Mode".to_string(),
        }
    }
}

/// Derived columns appended to the enriched table.
pub const SEQ_COLUMN: &str = "SEQ";
pub const ALIGNMENT_COLUMN: &str = "alignment";
pub const LAYER_COLUMN: &str = "Layer";

/// Validated parameters for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub window: Window,
    /// Merge tolerance for the layout, in genomic units
    pub tolerance: f64,
    /// Records need a score strictly below this to be projected
    pub significance: f64,
    pub policy: BatchPolicy,
    /// Leave records without a regulatory mode out of the layout
    pub mode_required: bool,
}

impl PipelineConfig {
    /// Creates a configuration with default tolerance, threshold and policy.
    pub fn new(window: Window) -> Self {
        Self {
            window,
            tolerance: DEFAULT_TOLERANCE,
            significance: DEFAULT_SIGNIFICANCE,
            policy: BatchPolicy::default(),
            mode_required: false,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set when the table carries a mode column: annotated tables lay out
    /// only the hits whose mode is filled in.
    pub fn with_mode_required(mut self, required: bool) -> Self {
        self.mode_required = required;
        self
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let len = self.window.stop().abs_diff(self.window.start()).saturating_add(1);
        if len > MAX_WINDOW_LEN {
            return Err(ConfigError::WindowTooLarge {
                start: self.window.start(),
                stop: self.window.stop(),
                len,
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        if !self.significance.is_finite() || self.significance <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.significance));
        }
        Ok(())
    }
}
