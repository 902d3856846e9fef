//! Signed export/import threshold alarms.
//!
//! A non-negative threshold fires while the aggregate is exporting at least
//! that many watts; a negative threshold fires while importing at least its
//! magnitude. Evaluation is level-triggered: callers re-evaluate on every
//! update and publish the result whether or not it changed.

use crate::sample::Aggregate;

/// Which direction of grid flow a threshold watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Export,
    Import,
}

/// Predicate over an aggregate's `exported_watts` for one configured
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdEvaluator {
    threshold_watts: f64,
}

impl ThresholdEvaluator {
    pub fn new(threshold_watts: f64) -> Self {
        Self { threshold_watts }
    }

    pub fn polarity(&self) -> Polarity {
        if self.threshold_watts < 0.0 {
            Polarity::Import
        } else {
            Polarity::Export
        }
    }

    /// Evaluate against a raw `exported_watts` value.
    pub fn is_triggered_by(&self, exported_watts: f64) -> bool {
        match self.polarity() {
            Polarity::Export => exported_watts >= self.threshold_watts,
            Polarity::Import => exported_watts <= self.threshold_watts,
        }
    }

    /// Evaluate against the current aggregate.
    pub fn evaluate(&self, aggregate: &Aggregate) -> bool {
        self.is_triggered_by(aggregate.exported_watts)
    }

    /// Sensor name, e.g. `"500 watts exported"` or `"300 watts imported"`.
    pub fn name(&self) -> String {
        match self.polarity() {
            Polarity::Export => format!("{} watts exported", self.threshold_watts),
            Polarity::Import => format!("{} watts imported", self.threshold_watts.abs()),
        }
    }
}
