//! Buffered history plus the cached aggregate derived from it.
//!
//! [`MetricsHistory`] is the single owner of the raw sample buffer. Every
//! [`add_readings`](MetricsHistory::add_readings) call recomputes the
//! aggregate and replaces the cached value, so reads between insertions
//! always return the same snapshot.

use crate::aggregator;
use crate::buffer::HistoryBuffer;
use crate::error::ConfigError;
use crate::sample::{Aggregate, Sample};
use crate::strategy::ValueStrategy;
use crate::types::Timestamp;

/// History buffer with a recomputed-on-insert aggregate.
#[derive(Debug, Clone)]
pub struct MetricsHistory {
    buffer: HistoryBuffer,
    strategy: ValueStrategy,
    filtered: Aggregate,
    added_count: u64,
    /// Insertions between raw-history dumps at `info` level.
    log_every: u64,
}

impl MetricsHistory {
    /// Create an empty history of `capacity` samples reduced with `strategy`.
    pub fn new(
        strategy: ValueStrategy,
        capacity: usize,
        created_at: Timestamp,
    ) -> Result<Self, ConfigError> {
        let buffer = HistoryBuffer::new(capacity, created_at)?;
        let filtered = aggregator::compute(strategy, &[], created_at);
        let log_every = ((capacity as f64) / 2.0).round().max(1.0) as u64;

        Ok(Self {
            buffer,
            strategy,
            filtered,
            added_count: 0,
            log_every,
        })
    }

    /// Append a sample and recompute the aggregate.
    pub fn add_readings(&mut self, sample: Sample) {
        tracing::debug!(
            generation_watts = sample.generation_watts,
            exported_watts = sample.exported_watts,
            battery_percentage = sample.battery_percentage,
            battery_power_watts = sample.battery_power_watts,
            pv1_power_watts = sample.pv1_power_watts,
            pv2_power_watts = sample.pv2_power_watts,
            "Latest readings added",
        );

        self.buffer.add_readings(sample);
        self.added_count += 1;

        if self.added_count % self.log_every == 0 {
            self.log_raw_history();
        }

        let created_at = self.buffer.created_at();
        self.filtered = aggregator::compute(self.strategy, self.buffer.as_slice(), created_at);
    }

    /// The current aggregate.
    pub fn filtered_values(&self) -> Aggregate {
        self.filtered
    }

    /// The last raw sample, or the zero sample if nothing was added yet.
    pub fn latest_raw_values(&self) -> Sample {
        self.buffer.latest_raw()
    }

    pub fn strategy(&self) -> ValueStrategy {
        self.strategy
    }

    pub fn buffer(&self) -> &HistoryBuffer {
        &self.buffer
    }

    /// Total samples ever added, including evicted ones.
    pub fn added_count(&self) -> u64 {
        self.added_count
    }

    fn log_raw_history(&self) {
        let join = |field: fn(&Sample) -> f64| {
            self.buffer
                .iter()
                .map(|s| field(s).to_string())
                .collect::<Vec<_>>()
                .join(",")
        };

        tracing::info!("Generation Watts Raw History: [{}]", join(|s| s.generation_watts));
        tracing::info!("Exported Watts Raw History:   [{}]", join(|s| s.exported_watts));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
