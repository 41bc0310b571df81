//! Typed errors for the sampling core and its configuration.
//!
//! The application edges wrap these in `color_eyre::Report`; inside the
//! core they stay typed so a failed cycle can be told apart from bad input.

use thiserror::Error;

use crate::sample::ProcessId;

/// The metrics provider could not produce a snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("process metrics unavailable: {0}")]
    Unavailable(String),

    #[error("access denied reading process metrics: {0}")]
    AccessDenied(String),
}

/// Input the ranking engine refuses to work with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RankError {
    #[error("current snapshot is empty")]
    EmptySnapshot,

    #[error("top-N must be a positive integer, got {0}")]
    InvalidTopN(usize),

    #[error("throughput needs a non-zero interval")]
    ZeroInterval,

    #[error("snapshot not sorted by process id at position {index}: {previous} then {current}")]
    AlignmentPrecondition {
        index: usize,
        previous: ProcessId,
        current: ProcessId,
    },
}

/// A failed sampling cycle. The retained previous snapshot is untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Rank(#[from] RankError),
}

/// Settings rejected when they are applied, before any cycle uses them.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("top_n must be a positive integer, got {0}")]
    InvalidTopN(i64),

    #[error("interval_secs must be a positive number, got {0}")]
    InvalidInterval(f64),

    #[error("unknown metric {0:?}, expected one of cpu, memory, io")]
    UnknownMetric(String),

    #[error("unknown underflow policy {0:?}, expected clamp or treat-as-new")]
    UnknownUnderflowPolicy(String),

    #[error("hot_cpu_percent must be between 0 and 100, got {0}")]
    InvalidHotThreshold(f64),

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
