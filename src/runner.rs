//! Trial orchestration.
//!
//! A run sends the initial conditions once, then for every reference entry
//! receives one device result, scores it and accumulates failures. The run
//! stops early once the failure count exceeds the configured cap.

use std::io::{Read, Write};

use crate::config::RunConfig;
use crate::decoder::{self, TrialResult};
use crate::error::Result;
use crate::reference::{ExpectedOutput, GoldenReference};
use crate::scoring::{Scorer, TrialScore};
use crate::transport::LineTransport;

/// Everything known about one finished trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome<'a> {
    /// 0-based trial index.
    pub index: usize,
    pub result: TrialResult,
    pub expected: &'a ExpectedOutput,
    /// Device-reported duration in milliseconds.
    pub elapsed_ms: f64,
    pub score: TrialScore,
}

/// Final state of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Number of failing trials. Zero means the run passed.
    pub failures: usize,
    pub trials_run: usize,
    pub total_trials: usize,
    /// Set when the failure cap cut the run short.
    pub stopped_early: bool,
    /// Per-trial duration in milliseconds, in trial order.
    pub elapsed_history: Vec<f64>,
    pub mean_scalar_error: f64,
    pub mean_vector_error: f64,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.failures == 0
    }

    pub fn mean_elapsed_ms(&self) -> Option<f64> {
        if self.elapsed_history.is_empty() {
            return None;
        }
        Some(self.elapsed_history.iter().sum::<f64>() / self.elapsed_history.len() as f64)
    }

    pub fn max_elapsed_ms(&self) -> Option<f64> {
        self.elapsed_history.iter().copied().reduce(f64::max)
    }
}

// Mutable per-run accumulator.
#[derive(Debug, Default)]
struct RunState {
    failures: usize,
    elapsed_history: Vec<f64>,
    scalar_error_sum: f64,
    vector_error_sum: f64,
}

impl RunState {
    fn record(&mut self, elapsed_ms: f64, score: &TrialScore) {
        self.elapsed_history.push(elapsed_ms);
        self.scalar_error_sum += score.scalar_error;
        self.vector_error_sum += score.vector_error;
        if !score.passed {
            self.failures += 1;
        }
    }

    fn finish(self, total_trials: usize, stopped_early: bool) -> RunReport {
        let trials_run = self.elapsed_history.len();
        let mean = |sum: f64| {
            if trials_run == 0 {
                0.0
            } else {
                sum / trials_run as f64
            }
        };
        RunReport {
            failures: self.failures,
            trials_run,
            total_trials,
            stopped_early,
            mean_scalar_error: mean(self.scalar_error_sum),
            mean_vector_error: mean(self.vector_error_sum),
            elapsed_history: self.elapsed_history,
        }
    }
}

/// Drives one device through a validation run.
pub struct TrialRunner<C> {
    transport: LineTransport<C>,
    scorer: Scorer,
    config: RunConfig,
}

impl<C: Read + Write> TrialRunner<C> {
    pub fn new(transport: LineTransport<C>, config: RunConfig) -> Self {
        Self {
            transport,
            scorer: Scorer::new(config.threshold),
            config,
        }
    }

    /// Runs every trial of `reference` without reporting individual trials.
    pub fn run(&mut self, reference: &GoldenReference) -> Result<RunReport> {
        self.run_with(reference, |_| {})
    }

    /// Runs every trial of `reference`, handing each outcome to `observer`
    /// as soon as it is scored.
    ///
    /// Any transport or decoding error aborts the run.
    pub fn run_with<F>(&mut self, reference: &GoldenReference, mut observer: F) -> Result<RunReport>
    where
        F: FnMut(&TrialOutcome<'_>),
    {
        let total_trials = reference.trial_count();
        tracing::info!(
            "Starting run: {} trials, threshold {}, failure cap {}",
            total_trials,
            self.config.threshold,
            self.config.failure_cap
        );

        self.transport.send_vector(reference.initial_conditions())?;
        tracing::debug!(
            "Sent {} initial conditions",
            reference.initial_conditions().len()
        );

        let mut state = RunState::default();
        for (index, expected) in reference.expected().iter().enumerate() {
            let result = decoder::receive_trial(&mut self.transport, self.config.strict_labels)?;
            let elapsed_ms = result.elapsed_cycles / self.config.cycles_per_ms;
            let score = self.scorer.score(&result, expected);
            state.record(elapsed_ms, &score);

            if !score.passed {
                tracing::warn!(
                    "Trial {} failed: scalar MSE {:.3}, vector MSE {:.3}",
                    index,
                    score.scalar_error,
                    score.vector_error
                );
            }

            observer(&TrialOutcome {
                index,
                result,
                expected,
                elapsed_ms,
                score,
            });

            if state.failures > self.config.failure_cap {
                tracing::warn!(
                    "Stopping after {} failures in {} of {} trials",
                    state.failures,
                    index + 1,
                    total_trials
                );
                return Ok(state.finish(total_trials, true));
            }
        }

        let report = state.finish(total_trials, false);
        tracing::info!(
            "Run finished: {} of {} trials failed",
            report.failures,
            report.trials_run
        );
        Ok(report)
    }

    /// Releases the transport, and with it the serial port.
    pub fn into_transport(self) -> LineTransport<C> {
        self.transport
    }
}
