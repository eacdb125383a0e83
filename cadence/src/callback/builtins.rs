//! Built-in around callbacks for common cross-cutting concerns.
//!
//! - [`PhaseTimer`] records per-phase call counts and wall time.
//! - [`Retry`] re-runs a phase that raised a retryable error.
//! - [`Timeout`] bounds the time a phase may take.
//!
//! None of these are part of the execution core; they are ordinary around
//! callbacks layered on top of it.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::handlers::AroundCallback;
use super::next::Next;
use super::phase::CallbackPhase;
use crate::error::{Error, Result};

// ============================================================================
// Phase timing
// ============================================================================

#[derive(Debug, Default)]
struct PhaseCounter {
    calls: AtomicU64,
    errors: AtomicU64,
    total_nanos: AtomicU64,
}

/// Per-phase counters shared between executions.
#[derive(Debug, Default)]
pub struct PhaseMetrics {
    phases: [PhaseCounter; CallbackPhase::ALL.len()],
}

impl PhaseMetrics {
    /// Create empty metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed dispatch of `phase`.
    pub fn record(&self, phase: CallbackPhase, elapsed: Duration, ok: bool) {
        let counter = &self.phases[phase.index()];
        counter.calls.fetch_add(1, Ordering::SeqCst);
        if !ok {
            counter.errors.fetch_add(1, Ordering::SeqCst);
        }
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        counter.total_nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in &self.phases {
            counter.calls.store(0, Ordering::SeqCst);
            counter.errors.store(0, Ordering::SeqCst);
            counter.total_nanos.store(0, Ordering::SeqCst);
        }
    }

    /// Get a snapshot of current metrics.
    #[must_use]
    pub fn snapshot(&self) -> PhaseMetricsSnapshot {
        let phases = CallbackPhase::ALL
            .into_iter()
            .map(|phase| {
                let counter = &self.phases[phase.index()];
                PhaseStats {
                    phase,
                    calls: counter.calls.load(Ordering::SeqCst),
                    errors: counter.errors.load(Ordering::SeqCst),
                    total: Duration::from_nanos(counter.total_nanos.load(Ordering::SeqCst)),
                }
            })
            .collect();
        PhaseMetricsSnapshot { phases }
    }
}

/// Counters for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStats {
    /// Phase these counters belong to.
    pub phase: CallbackPhase,
    /// Completed dispatches.
    pub calls: u64,
    /// Dispatches that raised.
    pub errors: u64,
    /// Total wall time.
    pub total: Duration,
}

impl PhaseStats {
    /// Mean wall time per call.
    #[must_use]
    pub fn mean(&self) -> Option<Duration> {
        u32::try_from(self.calls)
            .ok()
            .filter(|&calls| calls > 0)
            .map(|calls| self.total / calls)
    }
}

/// Snapshot of [`PhaseMetrics`] at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseMetricsSnapshot {
    /// One entry per phase, in lifecycle order.
    pub phases: Vec<PhaseStats>,
}

impl PhaseMetricsSnapshot {
    /// Counters for `phase`.
    #[must_use]
    pub fn get(&self, phase: CallbackPhase) -> Option<&PhaseStats> {
        self.phases.iter().find(|stats| stats.phase == phase)
    }

    /// Completed dispatches across all phases.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        self.phases.iter().map(|stats| stats.calls).sum()
    }

    /// Raised dispatches across all phases.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.phases.iter().map(|stats| stats.errors).sum()
    }
}

impl fmt::Display for PhaseMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Phase Metrics")?;
        for stats in &self.phases {
            writeln!(
                f,
                "  {:<26} calls: {:>5}  errors: {:>3}  total: {:.3}ms",
                stats.phase.as_str(),
                stats.calls,
                stats.errors,
                stats.total.as_secs_f64() * 1000.0
            )?;
        }
        Ok(())
    }
}

/// Around callback recording every dispatch into [`PhaseMetrics`].
///
/// Register it with the highest priority so the measured time covers the
/// other around callbacks too.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimer {
    metrics: Arc<PhaseMetrics>,
}

impl PhaseTimer {
    /// Create a timer with fresh metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a timer recording into shared metrics.
    #[must_use]
    pub const fn with_metrics(metrics: Arc<PhaseMetrics>) -> Self {
        Self { metrics }
    }

    /// Metrics this timer records into.
    #[must_use]
    pub const fn metrics(&self) -> &Arc<PhaseMetrics> {
        &self.metrics
    }
}

#[async_trait]
impl<O> AroundCallback<O> for PhaseTimer
where
    O: Send + 'static,
{
    async fn around(&self, mut next: Next<'_, O>) -> Result<Option<O>> {
        let phase = next.context().transition();
        let started = Instant::now();
        let result = next.run().await;
        self.metrics.record(phase, started.elapsed(), result.is_ok());
        result
    }
}

// ============================================================================
// Retry
// ============================================================================

/// Around callback re-running a phase that raised a retryable error.
///
/// Errors for which [`Error::is_retryable`] is false are returned on the
/// first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    max_attempts: u32,
    delay: Option<Duration>,
}

impl Retry {
    /// Allow up to `max_attempts` runs in total (at least one).
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            delay: None,
        }
    }

    /// Sleep for `delay` between attempts.
    ///
    /// Sleeping requires a Tokio runtime with the time driver enabled.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Maximum number of runs.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

#[async_trait]
impl<O> AroundCallback<O> for Retry
where
    O: Send + 'static,
{
    async fn around(&self, mut next: Next<'_, O>) -> Result<Option<O>> {
        let mut attempt = 1;
        loop {
            match next.run().await {
                Err(err) if attempt < self.max_attempts && err.is_retryable() => {
                    warn!(
                        transition = %next.context().transition(),
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "Retrying phase"
                    );
                    if let Some(delay) = self.delay {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

// ============================================================================
// Timeout
// ============================================================================

/// Around callback failing a phase that runs longer than its budget.
///
/// Requires a Tokio runtime with the time driver enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    budget: Duration,
}

impl Timeout {
    /// Create a timeout with the given budget.
    #[must_use]
    pub const fn new(budget: Duration) -> Self {
        Self { budget }
    }

    /// Time budget per dispatch.
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.budget
    }
}

#[async_trait]
impl<O> AroundCallback<O> for Timeout
where
    O: Send + 'static,
{
    async fn around(&self, mut next: Next<'_, O>) -> Result<Option<O>> {
        let transition = next.context().transition();
        match tokio::time::timeout(self.budget, next.run()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                transition,
                elapsed: self.budget,
            }),
        }
    }
}
