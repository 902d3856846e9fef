//! Display readings derived from an aggregate.
//!
//! Sinks that show individual watt values (exported, imported, generation,
//! per-string PV) and battery state read them through these helpers rather
//! than interpreting the sign conventions themselves.

use serde::Serialize;

use crate::sample::Aggregate;

/// Smallest value a watts display accepts; shown while importing.
pub const DISPLAY_FLOOR_WATTS: f64 = 0.1;

/// Exported watts for display: the raw value while exporting, otherwise
/// [`DISPLAY_FLOOR_WATTS`].
pub fn exported_watts(aggregate: &Aggregate) -> f64 {
    if aggregate.exported_watts >= 0.0 {
        aggregate.exported_watts
    } else {
        DISPLAY_FLOOR_WATTS
    }
}

/// Imported watts as a positive number, or zero while exporting.
pub fn imported_watts(aggregate: &Aggregate) -> f64 {
    if aggregate.exported_watts < 0.0 {
        aggregate.exported_watts.abs()
    } else {
        0.0
    }
}

/// Flat set of values a display sink publishes per update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayReadings {
    pub exported_watts: f64,
    pub imported_watts: f64,
    pub generation_watts: f64,
    /// `None` when per-string readings are disabled.
    pub pv1_watts: Option<f64>,
    pub pv2_watts: Option<f64>,
}

impl DisplayReadings {
    pub fn from_aggregate(aggregate: &Aggregate, show_strings: bool) -> Self {
        Self {
            exported_watts: exported_watts(aggregate),
            imported_watts: imported_watts(aggregate),
            generation_watts: aggregate.generation_watts,
            pv1_watts: show_strings.then_some(aggregate.pv1_power_watts),
            pv2_watts: show_strings.then_some(aggregate.pv2_power_watts),
        }
    }
}

/// Battery charging direction as reported to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargingState {
    NotCharging,
    Charging,
}

/// Snapshot of battery values for one update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryStatus {
    pub level_percent: f64,
    pub power_watts: f64,
    pub charging_state: ChargingState,
}

/// Tracks battery power between updates to infer the charging state.
///
/// The battery is reported as charging on the first observation and
/// whenever power rose since the previous observation.
#[derive(Debug, Default)]
pub struct ChargingTracker {
    previous_watts: Option<f64>,
}

impl ChargingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `aggregate`'s battery values and return the resulting status.
    pub fn observe(&mut self, aggregate: &Aggregate) -> BatteryStatus {
        let current = aggregate.battery_power_watts;
        let charging = match self.previous_watts {
            None => true,
            Some(previous) => current > previous,
        };
        self.previous_watts = Some(current);

        BatteryStatus {
            level_percent: aggregate.battery_percentage,
            power_watts: current,
            charging_state: if charging {
                ChargingState::Charging
            } else {
                ChargingState::NotCharging
            },
        }
    }
}
