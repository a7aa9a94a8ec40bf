//! Runtime configuration.

use prox_barrier::UpdatePolicy;
use prox_core::Timestamp;
use prox_jobs::{LookAheadJobFactory, ReuseEquivalence};

/// Tunables for a [`Runtime`](crate::Runtime).
///
/// Defaults: a reuse factory (`AddWhenDifferent`, strong equivalence), one
/// hour of history retention purged every five minutes, and one worker per
/// available core.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    job_factory: LookAheadJobFactory,
    history_retention: Timestamp,
    history_purge_period: Timestamp,
    concurrency: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            job_factory: LookAheadJobFactory::reuse(
                UpdatePolicy::AddWhenDifferent,
                ReuseEquivalence::Strong,
            ),
            history_retention: 3_600_000,
            history_purge_period: 300_000,
            concurrency: std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

impl RuntimeConfig {
    pub fn job_factory(&self) -> &LookAheadJobFactory {
        &self.job_factory
    }

    /// History retention window in ms.
    pub fn history_retention(&self) -> Timestamp {
        self.history_retention
    }

    /// How often old history is purged, in ms.
    pub fn history_purge_period(&self) -> Timestamp {
        self.history_purge_period
    }

    /// Worker pool size.  Zero means no workers: jobs are only processed
    /// through [`Runtime::process_one_waiting_job`](crate::Runtime::process_one_waiting_job).
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn with_job_factory(mut self, factory: LookAheadJobFactory) -> Self {
        self.job_factory = factory;
        self
    }

    /// # Panics
    /// Panics if the retention does not exceed the purge period.
    pub fn with_history_retention(mut self, retention: Timestamp) -> Self {
        assert!(retention > self.history_purge_period);
        self.history_retention = retention;
        self
    }

    /// # Panics
    /// Panics if the purge period is not below the retention.
    pub fn with_history_purge_period(mut self, period: Timestamp) -> Self {
        assert!(period < self.history_retention);
        self.history_purge_period = period;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}
