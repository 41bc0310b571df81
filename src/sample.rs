//! Process sampling: counter snapshots, alignment, ranking and formatting.

pub mod align;
pub mod counter;
pub mod cycle;
pub mod format;
pub mod provider;
pub mod rank;
pub mod sampler;
pub mod snapshot;

pub use counter::CounterValue;
pub use cycle::{CycleOutput, SamplingContext};
pub use provider::{MetricsProvider, SysinfoProvider};
pub use sampler::Sampler;
pub use snapshot::{ProcessId, ProcessSample, Snapshot};
