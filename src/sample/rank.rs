//! Interval deltas and top-N selection.
//!
//! CPU and I/O rankings diff each current sample against its aligned
//! previous sample; a process with no previous sample is new and its whole
//! cumulative counter is its delta. Memory ranks the instantaneous working
//! set as is. All sorts are stable, so equal values keep snapshot (pid)
//! order and ranking the same pair twice gives the same result.

use std::{fmt, str::FromStr, time::Duration};

use log::*;

use crate::{
    error::{ConfigError, RankError},
    sample::{
        CounterValue, ProcessId, ProcessSample, Snapshot,
        align::{Aligned, align},
    },
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    #[default]
    Cpu,
    Memory,
    IoBytes,
}

impl Metric {
    /// Cycle to the next metric
    pub fn next(self) -> Self {
        match self {
            Metric::Cpu => Metric::Memory,
            Metric::Memory => Metric::IoBytes,
            Metric::IoBytes => Metric::Cpu,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Cpu => "cpu",
            Metric::Memory => "memory",
            Metric::IoBytes => "io",
        }
    }

    /// Column heading for the value column.
    pub fn heading(&self) -> &'static str {
        match self {
            Metric::Cpu => "CPU%",
            Metric::Memory => "Memory",
            Metric::IoBytes => "I/O",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Metric::Cpu),
            "memory" | "mem" => Ok(Metric::Memory),
            "io" | "iobytes" | "io_bytes" => Ok(Metric::IoBytes),
            _ => Err(ConfigError::UnknownMetric(s.to_string())),
        }
    }
}

/// What to do when a monotonic counter reads lower than last time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum UnderflowPolicy {
    /// The interval delta is zero.
    #[default]
    Clamp,
    /// The process is treated as new: its delta is the whole counter.
    TreatAsNew,
}

impl fmt::Display for UnderflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnderflowPolicy::Clamp => f.write_str("clamp"),
            UnderflowPolicy::TreatAsNew => f.write_str("treat-as-new"),
        }
    }
}

impl FromStr for UnderflowPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(UnderflowPolicy::Clamp),
            "treat-as-new" | "treat_as_new" | "new" => Ok(UnderflowPolicy::TreatAsNew),
            _ => Err(ConfigError::UnknownUnderflowPolicy(s.to_string())),
        }
    }
}

/// Keeps the idle/system pseudo process out of the CPU and I/O lists. Its
/// delta still counts towards the system total, which lowers every other
/// process's share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdlePolicy {
    pub exclude: bool,
    pub sentinel: ProcessId,
}

impl IdlePolicy {
    pub fn excludes(&self, id: ProcessId) -> bool {
        self.exclude && id == self.sentinel
    }
}

impl Default for IdlePolicy {
    fn default() -> Self {
        Self {
            exclude: true,
            sentinel: ProcessId(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankRequest {
    pub metric: Metric,
    pub top_n: usize,
    /// Length of the sampling interval, the divisor for throughput.
    pub interval: Duration,
    pub idle: IdlePolicy,
    pub underflow: UnderflowPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankValue {
    Cpu {
        delta: CounterValue,
        /// Share of the system total in hundredths of a percent.
        share: u128,
    },
    Memory(CounterValue),
    Io {
        delta: CounterValue,
        per_second: CounterValue,
    },
}

impl RankValue {
    /// CPU share as a percentage with two decimals of precision.
    pub fn percent(&self) -> Option<f64> {
        match self {
            RankValue::Cpu { share, .. } => Some(*share as f64 / 100.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub sample: ProcessSample,
    pub value: RankValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    CpuTime,
    IoBytes,
}

impl CounterKind {
    fn read(&self, sample: &ProcessSample) -> CounterValue {
        match self {
            CounterKind::CpuTime => sample.kernel_time() + sample.user_time(),
            CounterKind::IoBytes => sample.read_bytes() + sample.write_bytes(),
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterKind::CpuTime => f.write_str("cpu time"),
            CounterKind::IoBytes => f.write_str("i/o bytes"),
        }
    }
}

/// A monotonic counter that went backwards, and how it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterUnderflow {
    pub id: ProcessId,
    pub name: String,
    pub counter: CounterKind,
    pub previous: CounterValue,
    pub current: CounterValue,
    pub resolution: UnderflowPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    pub metric: Metric,
    pub entries: Vec<RankedEntry>,
    /// Sum of every process's delta, for the percentage metrics.
    pub system_total: Option<CounterValue>,
    pub underflows: Vec<CounterUnderflow>,
}

/// Rank `current` against `previous` for the requested metric.
pub fn rank(
    current: &Snapshot,
    previous: &Snapshot,
    request: &RankRequest,
) -> Result<Ranking, RankError> {
    if current.is_empty() {
        return Err(RankError::EmptySnapshot);
    }
    if request.top_n == 0 {
        return Err(RankError::InvalidTopN(request.top_n));
    }
    let ranking = match request.metric {
        Metric::Cpu => rank_cpu(current, previous, request),
        Metric::Memory => rank_memory(current, request),
        Metric::IoBytes => rank_io(current, previous, request)?,
    };
    debug!(
        target: "Rank",
        "Ranked {} of {} processes by {}",
        ranking.entries.len(),
        current.len(),
        request.metric
    );
    Ok(ranking)
}

fn rank_cpu(current: &Snapshot, previous: &Snapshot, request: &RankRequest) -> Ranking {
    let deltas = DeltaPass::run(current, previous, CounterKind::CpuTime, request);
    let total = deltas.total;
    let entries = deltas
        .top(request.top_n)
        .into_iter()
        .map(|(sample, delta)| RankedEntry {
            sample: sample.clone(),
            value: RankValue::Cpu {
                delta,
                share: delta.share_hundredths(total),
            },
        })
        .collect();
    Ranking {
        metric: Metric::Cpu,
        entries,
        system_total: Some(total),
        underflows: deltas.underflows,
    }
}

fn rank_io(
    current: &Snapshot,
    previous: &Snapshot,
    request: &RankRequest,
) -> Result<Ranking, RankError> {
    if request.interval.is_zero() {
        return Err(RankError::ZeroInterval);
    }
    let deltas = DeltaPass::run(current, previous, CounterKind::IoBytes, request);
    let mut entries = Vec::with_capacity(request.top_n);
    for (sample, delta) in deltas.top(request.top_n) {
        let per_second = delta
            .per_second(request.interval)
            .ok_or(RankError::ZeroInterval)?;
        entries.push(RankedEntry {
            sample: sample.clone(),
            value: RankValue::Io { delta, per_second },
        });
    }
    Ok(Ranking {
        metric: Metric::IoBytes,
        entries,
        system_total: Some(deltas.total),
        underflows: deltas.underflows,
    })
}

fn rank_memory(current: &Snapshot, request: &RankRequest) -> Ranking {
    let mut candidates: Vec<&ProcessSample> = current.iter().collect();
    candidates.sort_by(|a, b| b.working_set().cmp(&a.working_set()));
    let entries = candidates
        .into_iter()
        .take(request.top_n)
        .map(|sample| RankedEntry {
            sample: sample.clone(),
            value: RankValue::Memory(sample.working_set()),
        })
        .collect();
    Ranking {
        metric: Metric::Memory,
        entries,
        system_total: None,
        underflows: Vec::new(),
    }
}

/// Per-process deltas of one cumulative counter, with the system total.
struct DeltaPass<'a> {
    candidates: Vec<(&'a ProcessSample, CounterValue)>,
    total: CounterValue,
    underflows: Vec<CounterUnderflow>,
}

impl<'a> DeltaPass<'a> {
    fn run(
        current: &'a Snapshot,
        previous: &'a Snapshot,
        counter: CounterKind,
        request: &RankRequest,
    ) -> Self {
        let mut pass = DeltaPass {
            candidates: Vec::with_capacity(current.len()),
            total: CounterValue::ZERO,
            underflows: Vec::new(),
        };
        for aligned in align(current.samples(), previous.samples()) {
            let delta = pass.delta(&aligned, counter, request.underflow);
            pass.total += delta;
            if request.idle.excludes(aligned.current.id()) {
                continue;
            }
            pass.candidates.push((aligned.current, delta));
        }
        pass
    }

    fn delta(
        &mut self,
        aligned: &Aligned<'_, ProcessSample>,
        counter: CounterKind,
        policy: UnderflowPolicy,
    ) -> CounterValue {
        let current = counter.read(aligned.current);
        let Some(previous) = aligned.previous.map(|p| counter.read(p)) else {
            return current;
        };
        if let Some(delta) = current.checked_sub(previous) {
            return delta;
        }
        let sample = aligned.current;
        warn!(
            target: "Rank",
            "{} of {} ({}) went backwards from {} to {}, {}",
            counter,
            sample.display_name(),
            sample.id(),
            previous,
            current,
            policy
        );
        self.underflows.push(CounterUnderflow {
            id: sample.id(),
            name: sample.display_name(),
            counter,
            previous,
            current,
            resolution: policy,
        });
        match policy {
            UnderflowPolicy::Clamp => CounterValue::ZERO,
            UnderflowPolicy::TreatAsNew => current,
        }
    }

    /// The `n` largest deltas, ties in snapshot order.
    fn top(&self, n: usize) -> Vec<(&'a ProcessSample, CounterValue)> {
        let mut ranked = self.candidates.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}
