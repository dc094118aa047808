//! The sampling-and-decision loop
//!
//! Each tick runs `Sampling -> (Normal | OverThreshold)`. Over the threshold
//! it either notifies, or reclaims, re-measures and notifies. Ticks never
//! overlap: a tick, including a reclaim blocked on a password prompt,
//! completes before the next sleep starts.
//!
//! Cadence is fixed-delay: the loop sleeps the full interval after a tick
//! finishes, so tick processing time pushes later ticks back.

use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::config::{Classification, OptimizationConfig};
use super::shutdown::ShutdownSignal;
use super::snapshot::format_gb;
use crate::platform::traits::Collaborators;

/// What a single tick ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Sampling failed; nothing else happened
    SampleFailed { error: String },
    /// Below the threshold
    Normal { percent_used: f64 },
    /// Over the threshold in notify-only mode
    Notified { percent_used: f64 },
    /// Reclaim succeeded. `None` if the follow-up sample failed.
    Reclaimed { freed_bytes: Option<i64> },
    /// Reclaim reported failure
    ReclaimFailed { detail: String },
}

impl TickOutcome {
    pub fn is_over_threshold(&self) -> bool {
        matches!(
            self,
            TickOutcome::Notified { .. }
                | TickOutcome::Reclaimed { .. }
                | TickOutcome::ReclaimFailed { .. }
        )
    }
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks: u64,
    pub breaches: u64,
    pub reclaims: u64,
    pub reclaim_failures: u64,
    pub sample_failures: u64,
}

impl LoopSummary {
    fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        if outcome.is_over_threshold() {
            self.breaches += 1;
        }
        match outcome {
            TickOutcome::SampleFailed { .. } => self.sample_failures += 1,
            TickOutcome::Reclaimed { .. } => self.reclaims += 1,
            TickOutcome::ReclaimFailed { .. } => {
                self.reclaims += 1;
                self.reclaim_failures += 1;
            }
            _ => {}
        }
    }
}

pub fn high_usage_message(percent_used: f64) -> String {
    format!(
        "Memory usage is high: {:.1}%. Consider freeing up memory.",
        percent_used
    )
}

pub fn threshold_exceeded_message(percent_used: f64, threshold_percent: f64) -> String {
    format!(
        "Memory usage ({:.1}%) exceeds threshold ({:.1}%)",
        percent_used, threshold_percent
    )
}

pub fn optimised_message(freed_bytes: i64) -> String {
    format!("Memory optimised: {} freed", format_gb(freed_bytes))
}

pub fn failed_message(detail: &str) -> String {
    format!("Failed to optimise memory: {}", detail)
}

pub fn remeasure_failed_message(error: &str) -> String {
    format!(
        "Memory optimised, but free memory could not be re-measured: {}",
        error
    )
}

/// Periodic sampler, classifier and reclaimer
pub struct OptimizationLoop {
    config: OptimizationConfig,
    collaborators: Collaborators,
}

impl OptimizationLoop {
    pub fn new(config: OptimizationConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Run one sample -> decide -> act cycle
    pub async fn tick(&self) -> TickOutcome {
        let before = match self.collaborators.sampler.sample() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Failed to sample memory: {}", e);
                return TickOutcome::SampleFailed {
                    error: e.to_string(),
                };
            }
        };

        info!("Memory Status: {}", before);

        if self.config.classify(&before) == Classification::Normal {
            return TickOutcome::Normal {
                percent_used: before.percent_used,
            };
        }

        warn!(
            "{}",
            threshold_exceeded_message(before.percent_used, self.config.threshold_percent)
        );

        if !self.config.auto_optimise {
            self.collaborators
                .notifier
                .notify(&high_usage_message(before.percent_used))
                .await;
            info!("Notification sent to user about high memory usage");
            return TickOutcome::Notified {
                percent_used: before.percent_used,
            };
        }

        let outcome = self.collaborators.reclaimer.reclaim().await;
        if !outcome.succeeded {
            error!("{}", outcome.detail);
            self.collaborators
                .notifier
                .notify(&failed_message(&outcome.detail))
                .await;
            return TickOutcome::ReclaimFailed {
                detail: outcome.detail,
            };
        }
        info!("{}", outcome.detail);

        match self.collaborators.sampler.sample() {
            Ok(after) => {
                let freed = before.free_delta(&after);
                let message = optimised_message(freed);
                info!("{}", message);
                self.collaborators.notifier.notify(&message).await;
                TickOutcome::Reclaimed {
                    freed_bytes: Some(freed),
                }
            }
            Err(e) => {
                error!("Failed to re-measure memory after reclaim: {}", e);
                self.collaborators
                    .notifier
                    .notify(&remeasure_failed_message(&e.to_string()))
                    .await;
                TickOutcome::Reclaimed { freed_bytes: None }
            }
        }
    }

    /// Tick until `shutdown` fires.
    ///
    /// Shutdown is honoured before each tick and during the sleep between
    /// ticks. A tick in progress always runs to completion.
    pub async fn run(&self, shutdown: &ShutdownSignal) -> LoopSummary {
        let mut summary = LoopSummary::default();
        let interval = self.config.interval();

        info!(
            "Optimisation loop started (interval: {}s, threshold: {:.1}%, auto: {})",
            self.config.interval_secs, self.config.threshold_percent, self.config.auto_optimise
        );

        while !shutdown.shutdown_requested() {
            let started = Instant::now();
            let outcome = self.tick().await;
            debug!("Tick finished in {:?}: {:?}", started.elapsed(), outcome);
            summary.record(&outcome);

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!(
            "Optimisation loop stopped after {} ticks ({} over threshold, {} reclaims, {} failed)",
            summary.ticks, summary.breaches, summary.reclaims, summary.reclaim_failures
        );
        summary
    }
}
