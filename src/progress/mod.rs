//! Cosmetic progress shown while an analysis request is outstanding.
//!
//! The simulator advances a step index on a fixed period. It knows nothing
//! about the real request and must never be used as a completion signal.

use crate::config::ProgressConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Labels shown for each simulated step, in order.
pub const ANALYSIS_STEPS: [&str; 7] = [
    "Parsing resume content...",
    "Retrieving ATS best practices...",
    "Analyzing formatting & structure...",
    "Evaluating keyword optimization...",
    "Assessing work experience...",
    "Reviewing skills presentation...",
    "Generating final report...",
];

/// Snapshot published on every step change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressTick {
    /// Current step index.
    pub step: usize,
    /// Bumped on every stop; a timer task only mutates its own epoch.
    epoch: u64,
}

/// Periodic step counter, owned by the orchestrator for the Awaiting phase.
pub struct ProgressSimulator {
    total_steps: usize,
    period: Duration,
    state: Arc<watch::Sender<ProgressTick>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressSimulator {
    pub fn new(total_steps: usize, period: Duration) -> Self {
        let (tx, _rx) = watch::channel(ProgressTick::default());
        Self {
            total_steps,
            period,
            state: Arc::new(tx),
            handle: None,
        }
    }

    /// Simulator over [`ANALYSIS_STEPS`] with the configured period.
    pub fn from_config(config: &ProgressConfig) -> Self {
        Self::new(ANALYSIS_STEPS.len(), config.step_period())
    }

    /// Begin ticking. Calling `start` while already running does nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        let epoch = self.state.borrow().epoch;
        let state = Arc::clone(&self.state);
        let total_steps = self.total_steps;
        let period = self.period;

        debug!("Progress simulator started (period {:?})", period);

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let mut stale = false;
                state.send_if_modified(|tick| {
                    if tick.epoch != epoch {
                        stale = true;
                        return false;
                    }
                    let next = advance(tick.step, total_steps);
                    let changed = next != tick.step;
                    tick.step = next;
                    changed
                });

                if stale {
                    break;
                }
            }
        }));
    }

    /// Cancel the timer and reset the step to 0.
    ///
    /// The epoch bump happens under the channel lock, so a tick that is
    /// already executing cannot mutate the state after this returns.
    pub fn stop(&mut self) {
        self.state.send_modify(|tick| {
            tick.epoch = tick.epoch.wrapping_add(1);
            tick.step = 0;
        });

        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Progress simulator stopped");
        }
    }

    #[cfg(test)]
    pub fn step(&self) -> usize {
        self.state.borrow().step
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Receive every step change.
    pub fn subscribe(&self) -> watch::Receiver<ProgressTick> {
        self.state.subscribe()
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Next step index, capped at the last step.
pub fn advance(step: usize, total_steps: usize) -> usize {
    let last = total_steps.saturating_sub(1);
    (step + 1).min(last)
}

/// Display state of a single step label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Active,
    Pending,
}

impl StepStatus {
    pub fn glyph(&self) -> &'static str {
        match self {
            StepStatus::Done => "✓",
            StepStatus::Active => "⟳",
            StepStatus::Pending => "○",
        }
    }
}

/// Status of every step label given the current step index.
pub fn step_statuses(current: usize) -> Vec<(&'static str, StepStatus)> {
    ANALYSIS_STEPS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let status = if i < current {
                StepStatus::Done
            } else if i == current {
                StepStatus::Active
            } else {
                StepStatus::Pending
            };
            (*label, status)
        })
        .collect()
}
