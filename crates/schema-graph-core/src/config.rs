//! Immutable pipeline configuration (§9 Design Notes, "Global state").
//!
//! Passed into the pipeline by its caller rather than read from process-wide
//! state, so profiler output stays deterministic and testable in isolation.

use std::time::Duration;

use crate::dal::HARD_CAP;

/// Tunable bounds for the Data Profiler and DAL, held as a plain value
/// rather than module-level constants so callers (tests, the CLI, the
/// batch runner) can vary them without global state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Per-table upper bound on rows read for profiling.
    pub hard_cap: usize,
    /// Maximum number of `samples` retained per column.
    pub sample_size: usize,
    /// Maximum character length before a textual sample is truncated.
    pub truncate_len: usize,
    /// Maximum distinct non-null values for `categories` to be emitted.
    pub category_threshold: usize,
    /// Maximum entries in `word_frequency`.
    pub word_freq_top_k: usize,
    /// SQLite busy timeout for the DAL's connection.
    pub busy_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hard_cap: HARD_CAP,
            sample_size: 6,
            truncate_len: 30,
            category_threshold: 6,
            word_freq_top_k: 10,
            busy_timeout: Duration::from_secs(5),
        }
    }
}
