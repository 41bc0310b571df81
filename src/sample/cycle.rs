//! One sampling cycle: fetch, sort, rank against the retained snapshot, format.

use log::*;

use crate::{
    config::Settings,
    error::{CycleError, RankError},
    sample::{
        MetricsProvider, Snapshot,
        format::{DisplayRow, display_rows},
        rank::{Ranking, rank},
    },
};

/// Result of a successful cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutput {
    pub ranking: Ranking,
    pub rows: Vec<DisplayRow>,
    /// Number of processes in the snapshot that was ranked.
    pub processes: usize,
}

/// State carried from one cycle to the next: the previous snapshot.
///
/// A cycle only replaces the snapshot when it succeeds, so a failed cycle
/// leaves everything as it was and the next one retries against the same
/// baseline.
#[derive(Debug, Default)]
pub struct SamplingContext {
    previous: Snapshot,
    cycles: u64,
}

impl SamplingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> &Snapshot {
        &self.previous
    }

    /// Completed cycles so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Take a baseline snapshot without ranking anything.
    pub fn prime(&mut self, provider: &mut dyn MetricsProvider) -> Result<usize, CycleError> {
        self.previous = Snapshot::from_unsorted(provider.fetch_snapshot()?)?;
        debug!(target: "Sampler", "Baseline of {} processes", self.previous.len());
        Ok(self.previous.len())
    }

    pub fn run_cycle(
        &mut self,
        provider: &mut dyn MetricsProvider,
        settings: &Settings,
    ) -> Result<CycleOutput, CycleError> {
        let current = Snapshot::from_unsorted(provider.fetch_snapshot()?)?;
        Ok(self.advance(current, settings)?)
    }

    /// Rank `current` against the retained snapshot and keep it for next time.
    pub fn advance(&mut self, current: Snapshot, settings: &Settings) -> Result<CycleOutput, RankError> {
        let ranking = rank(&current, &self.previous, &settings.request())?;
        let rows = display_rows(&ranking, &settings.hot);
        let processes = current.len();
        self.previous = current;
        self.cycles += 1;
        Ok(CycleOutput {
            ranking,
            rows,
            processes,
        })
    }
}
