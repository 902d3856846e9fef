//! Shared, read-mostly metrics state.
//!
//! [`MetricsHandle`] wraps the single [`MetricsHistory`] instance. Only the
//! scheduler applies samples; every other component reads through the
//! public getters. The lock is held only for the synchronous insert and
//! recompute, never across an `.await`.

use std::sync::RwLock;

use solax_core::{Aggregate, ConfigError, MetricsHistory, Sample, ValueStrategy};
use solax_core::types::Timestamp;

pub struct MetricsHandle {
    history: RwLock<MetricsHistory>,
}

impl MetricsHandle {
    pub fn new(
        strategy: ValueStrategy,
        capacity: usize,
        created_at: Timestamp,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            history: RwLock::new(MetricsHistory::new(strategy, capacity, created_at)?),
        })
    }

    /// Current aggregate.
    pub fn filtered_values(&self) -> Aggregate {
        self.read(|h| h.filtered_values())
    }

    /// Last raw sample, or the zero sample if none has arrived.
    pub fn latest_raw_values(&self) -> Sample {
        self.read(|h| h.latest_raw_values())
    }

    /// Samples currently buffered, oldest first.
    pub fn raw_history(&self) -> Vec<Sample> {
        self.read(|h| h.buffer().iter().copied().collect())
    }

    pub fn strategy(&self) -> ValueStrategy {
        self.read(|h| h.strategy())
    }

    /// Insert a sample and swap in the recomputed aggregate.
    pub(crate) fn apply(&self, sample: Sample) {
        self.history
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .add_readings(sample);
    }

    fn read<T>(&self, f: impl FnOnce(&MetricsHistory) -> T) -> T {
        let history = self
            .history
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&history)
    }
}
