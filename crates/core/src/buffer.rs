//! Bounded, chronologically ordered history of raw samples.
//!
//! [`HistoryBuffer`] keeps the most recent `capacity` samples in arrival
//! order. Once full, each insertion evicts the oldest sample in O(1).

use std::collections::VecDeque;

use crate::error::ConfigError;
use crate::sample::Sample;
use crate::types::Timestamp;

/// Fixed-capacity FIFO of [`Sample`]s.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
    /// Timestamp of the zero sample returned while the buffer is empty.
    created_at: Timestamp,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    ///
    /// A capacity of zero is a configuration error.
    pub fn new(capacity: usize, created_at: Timestamp) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidHistoryLength(0));
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            created_at,
        })
    }

    /// Append `sample`, evicting from the front while over capacity.
    pub fn add_readings(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// The most recently appended sample, or a zero sample stamped with the
    /// buffer's creation time.
    pub fn latest_raw(&self) -> Sample {
        self.samples
            .back()
            .copied()
            .unwrap_or_else(|| Sample::zero(self.created_at))
    }

    /// Samples oldest-first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        self.samples.iter()
    }

    /// Samples oldest-first as one slice. Rotates the ring in place; no
    /// allocation.
    pub fn as_slice(&mut self) -> &[Sample] {
        self.samples.make_contiguous()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn exporting(secs: i64, watts: f64) -> Sample {
        Sample {
            exported_watts: watts,
            ..Sample::zero(at(secs))
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_matches!(
            HistoryBuffer::new(0, at(0)),
            Err(ConfigError::InvalidHistoryLength(0))
        );
    }

    #[test]
    fn empty_buffer_returns_zero_sample_at_creation_time() {
        let buffer = HistoryBuffer::new(3, at(42)).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.latest_raw(), Sample::zero(at(42)));
    }

    #[test]
    fn latest_raw_is_last_appended() {
        let mut buffer = HistoryBuffer::new(3, at(0)).unwrap();
        buffer.add_readings(exporting(1, 100.0));
        buffer.add_readings(exporting(2, 200.0));
        assert_eq!(buffer.latest_raw(), exporting(2, 200.0));
    }

    #[test]
    fn overflow_keeps_last_capacity_samples_in_order() {
        let capacity = 4;
        let mut buffer = HistoryBuffer::new(capacity, at(0)).unwrap();
        for i in 0..(capacity as i64 + 3) {
            buffer.add_readings(exporting(i, i as f64));
        }

        assert_eq!(buffer.len(), capacity);
        let kept: Vec<f64> = buffer.iter().map(|s| s.exported_watts).collect();
        assert_eq!(kept, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn slice_view_is_oldest_first_after_wraparound() {
        let mut buffer = HistoryBuffer::new(3, at(0)).unwrap();
        for i in 0..5 {
            buffer.add_readings(exporting(i, i as f64 * 10.0));
        }

        let kept: Vec<f64> = buffer.as_slice().iter().map(|s| s.exported_watts).collect();
        assert_eq!(kept, vec![20.0, 30.0, 40.0]);

        // Appending after the rotation keeps the order.
        buffer.add_readings(exporting(5, 50.0));
        let kept: Vec<f64> = buffer.as_slice().iter().map(|s| s.exported_watts).collect();
        assert_eq!(kept, vec![30.0, 40.0, 50.0]);
        assert_eq!(buffer.latest_raw().exported_watts, 50.0);
    }

    #[test]
    fn capacity_of_one_holds_only_latest() {
        let mut buffer = HistoryBuffer::new(1, at(0)).unwrap();
        buffer.add_readings(exporting(1, 1.0));
        buffer.add_readings(exporting(2, 2.0));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.latest_raw().exported_watts, 2.0);
    }
}
