use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use log::*;
use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{MissedTickBehavior, interval_at},
};

use crate::{
    config::Settings,
    error::CycleError,
    event::{AppEvent, Event},
    sample::{
        CycleOutput, MetricsProvider, SamplingContext,
        format::DisplayRow,
        rank::Metric,
    },
};

/// Delay between the startup baseline and the first ranked cycle.
pub const FIRST_SAMPLE_DELAY: Duration = Duration::from_millis(500);

/// Drives sampling cycles from a recurring timer task.
///
/// The timer only posts [`AppEvent::Sample`]; the cycle itself runs on the
/// application loop via [`Sampler::tick`]. A single pending slot stops the
/// timer from queueing a second request while one is outstanding, so a slow
/// cycle skips ticks instead of piling them up.
pub struct Sampler {
    provider: Box<dyn MetricsProvider + Send>,
    context: SamplingContext,
    settings: Settings,
    sender: UnboundedSender<Event>,
    pending: Arc<AtomicBool>,
    ticker: Option<JoinHandle<()>>,
    pub rows: Vec<DisplayRow>,
    pub last_output: Option<CycleOutput>,
    pub last_error: Option<CycleError>,
    pub last_sample: Option<Instant>,
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("settings", &self.settings)
            .field("cycles", &self.context.cycles())
            .field("previous", &self.context.previous().len())
            .field("pending", &self.pending.load(Ordering::Acquire))
            .field("rows", &self.rows)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl Sampler {
    /// Take a baseline snapshot and start the timer.
    pub fn new(
        mut provider: Box<dyn MetricsProvider + Send>,
        settings: Settings,
        sender: UnboundedSender<Event>,
    ) -> Self {
        let mut context = SamplingContext::new();
        match context.prime(provider.as_mut()) {
            Ok(count) => info!(target: "Sampler", "Baseline taken of {} processes", count),
            Err(err) => warn!(target: "Sampler", "No baseline, first cycle ranks since start: {}", err),
        }
        let mut sampler = Self {
            provider,
            context,
            settings,
            sender,
            pending: Arc::new(AtomicBool::new(false)),
            ticker: None,
            rows: Vec::new(),
            last_output: None,
            last_error: None,
            last_sample: None,
        };
        sampler.restart_ticker(FIRST_SAMPLE_DELAY);
        sampler
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Switch to new, already validated, settings.
    pub fn apply(&mut self, settings: Settings) {
        let interval_changed = settings.interval != self.settings.interval;
        self.settings = settings;
        if interval_changed {
            info!(target: "Sampler", "Sampling every {:?}", self.settings.interval);
            self.restart_ticker(self.settings.interval);
        }
    }

    pub fn set_metric(&mut self, metric: Metric) {
        info!(target: "Sampler", "Ranking by {}", metric);
        self.settings.metric = metric;
    }

    /// Grow or shrink the list, never below one entry.
    pub fn adjust_top_n(&mut self, by: i64) {
        let top_n = (self.settings.top_n as i64).saturating_add(by).max(1);
        self.settings.top_n = top_n as usize;
        debug!(target: "Sampler", "Showing top {}", self.settings.top_n);
    }

    /// Run one cycle. On failure the last rows stay on display and the timer
    /// keeps running, so the next tick retries.
    pub fn tick(&mut self) {
        let started = Instant::now();
        match self.context.run_cycle(self.provider.as_mut(), &self.settings) {
            Ok(output) => {
                debug!(
                    target: "Sampler",
                    "Cycle {} ranked {} processes in {:?}",
                    self.context.cycles(),
                    output.processes,
                    started.elapsed()
                );
                self.rows = output.rows.clone();
                self.last_output = Some(output);
                self.last_error = None;
                self.last_sample = Some(started);
            }
            Err(err) => {
                warn!(target: "Sampler", "Sampling failed, keeping last results: {}", err);
                self.last_error = Some(err);
            }
        }
        self.pending.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn shutdown(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn restart_ticker(&mut self, first: Duration) {
        self.shutdown();
        self.ticker = Some(spawn_ticker(
            first,
            self.settings.interval,
            self.sender.clone(),
            self.pending.clone(),
        ));
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Claim the single pending slot. False when a request is already queued.
fn claim(pending: &AtomicBool) -> bool {
    !pending.swap(true, Ordering::AcqRel)
}

fn spawn_ticker(
    first: Duration,
    period: Duration,
    sender: UnboundedSender<Event>,
    pending: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(tokio::time::Instant::now() + first, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if !claim(&pending) {
                debug!(target: "Sampler", "Previous cycle still pending, skipping tick");
                continue;
            }
            if sender.send(Event::App(AppEvent::Sample)).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ProviderError,
        sample::{ProcessSample, provider::testing::ScriptedProvider},
    };
    use tokio::sync::mpsc;

    fn cpu(id: u32, user: u64) -> ProcessSample {
        ProcessSample::new(id, format!("p{id}")).with_cpu(0, user)
    }

    #[test]
    fn pending_slot_is_single() {
        let pending = AtomicBool::new(false);
        assert!(claim(&pending));
        assert!(!claim(&pending));
        pending.store(false, Ordering::Release);
        assert!(claim(&pending));
    }

    #[tokio::test]
    async fn ticker_skips_while_a_cycle_is_pending() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicBool::new(false));
        let ticker = spawn_ticker(
            Duration::from_millis(1),
            Duration::from_millis(5),
            sender,
            pending.clone(),
        );
        tokio::time::sleep(Duration::from_millis(60)).await;
        ticker.abort();
        let mut requests = 0;
        while let Ok(event) = receiver.try_recv() {
            assert!(matches!(event, Event::App(AppEvent::Sample)));
            requests += 1;
        }
        assert_eq!(requests, 1, "nothing released the pending slot");
        assert!(pending.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn failed_cycles_keep_the_last_rows() {
        let provider = ScriptedProvider::new()
            .then(vec![cpu(1, 0), cpu(2, 0)])
            .then(vec![cpu(1, 10), cpu(2, 30)])
            .then_fail(ProviderError::Unavailable("gone".to_string()))
            .then(vec![cpu(1, 40), cpu(2, 30)]);
        let (sender, _receiver) = mpsc::unbounded_channel();
        let mut sampler = Sampler::new(Box::new(provider), Settings::default(), sender);

        sampler.tick();
        let names: Vec<&str> = sampler.rows.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["p2", "p1"]);
        assert_eq!(sampler.rows[0].display_value, "75.00%");
        assert!(sampler.last_error.is_none());

        sampler.tick();
        assert!(sampler.last_error.is_some());
        assert_eq!(sampler.rows[0].display_value, "75.00%");
        assert!(!sampler.is_pending());

        sampler.tick();
        assert!(sampler.last_error.is_none());
        assert_eq!(sampler.rows[0].display_name, "p1");
        assert_eq!(sampler.rows[0].display_value, "100.00%");
        sampler.shutdown();
    }

    #[tokio::test]
    async fn runtime_adjustments() {
        let provider = ScriptedProvider::new()
            .then(vec![])
            .then(vec![cpu(1, 1), cpu(2, 2), cpu(3, 3)]);
        let (sender, _receiver) = mpsc::unbounded_channel();
        let mut sampler = Sampler::new(Box::new(provider), Settings::default(), sender);

        sampler.adjust_top_n(-5);
        assert_eq!(sampler.settings().top_n, 1);
        sampler.adjust_top_n(1);
        assert_eq!(sampler.settings().top_n, 2);
        sampler.set_metric(Metric::Memory);
        assert_eq!(sampler.settings().metric, Metric::Memory);

        sampler.tick();
        assert_eq!(sampler.rows.len(), 2);
        assert_eq!(sampler.rows[0].display_value, "0B");

        let slower = Settings {
            interval: Duration::from_secs(10),
            ..sampler.settings().clone()
        };
        sampler.apply(slower.clone());
        assert_eq!(sampler.settings(), &slower);
    }
}
