//! Progress tracking
//!
//! Academic statistics, blocker detection, and completion estimates.

#![warn(missing_docs)]

pub mod stats;
pub mod blocker;
pub mod estimator;

pub use stats::{aggregate, BasicAggregator, SemesterStats, StateCounts, Stats, StatsAggregator};
pub use blocker::{BlockedCourse, BlockerAnalysis, BlockerAnalyzer, BlockerStats, Bottleneck};
pub use estimator::{CompletionEstimate, CompletionEstimator, EstimatorConfig};
