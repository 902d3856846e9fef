//! Inverter telemetry readings.
//!
//! A [`Sample`] is one raw reading decoded from the inverter's realtime
//! feed. The smoothed state exposed to consumers has the same shape and is
//! published as an [`Aggregate`].

use serde::Serialize;

use crate::types::Timestamp;

/// One telemetry reading from the inverter.
///
/// Every numeric field is present; absent upstream values are normalised to
/// `0.0` by the decoder before a sample is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub timestamp: Timestamp,
    pub generation_watts: f64,
    /// Grid feed-in power. Negative while importing from the grid.
    pub exported_watts: f64,
    /// State of charge, 0-100.
    pub battery_percentage: f64,
    /// Positive while charging, negative while discharging.
    pub battery_power_watts: f64,
    pub pv1_power_watts: f64,
    pub pv2_power_watts: f64,
}

/// Derived, smoothed metric state. Recomputed on every insertion and
/// replaced wholesale, never mutated in place.
pub type Aggregate = Sample;

impl Sample {
    /// The all-zero reading used whenever no history exists yet.
    pub fn zero(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            generation_watts: 0.0,
            exported_watts: 0.0,
            battery_percentage: 0.0,
            battery_power_watts: 0.0,
            pv1_power_watts: 0.0,
            pv2_power_watts: 0.0,
        }
    }

    /// Combine every numeric field of `self` and `other` with `f`.
    ///
    /// The timestamp of the result is `timestamp`.
    pub fn zip_with(
        &self,
        other: &Sample,
        timestamp: Timestamp,
        f: impl Fn(f64, f64) -> f64,
    ) -> Sample {
        Sample {
            timestamp,
            generation_watts: f(self.generation_watts, other.generation_watts),
            exported_watts: f(self.exported_watts, other.exported_watts),
            battery_percentage: f(self.battery_percentage, other.battery_percentage),
            battery_power_watts: f(self.battery_power_watts, other.battery_power_watts),
            pv1_power_watts: f(self.pv1_power_watts, other.pv1_power_watts),
            pv2_power_watts: f(self.pv2_power_watts, other.pv2_power_watts),
        }
    }

    /// Apply `f` to every numeric field, keeping the timestamp.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Sample {
        self.zip_with(self, self.timestamp, |value, _| f(value))
    }
}
