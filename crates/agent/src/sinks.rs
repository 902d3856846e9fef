//! Update subscribers.
//!
//! Each sink is notified on every polling tick and pulls what it needs from
//! the shared [`MetricsHandle`]. The threshold sensors re-evaluate and
//! republish unconditionally; there is no edge detection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use solax_core::readings::{BatteryStatus, ChargingTracker, DisplayReadings};
use solax_core::ThresholdEvaluator;
use solax_events::{SubscriptionId, UpdateBus};

use crate::state::MetricsHandle;

/// A component that reacts to update notifications.
pub trait UpdateSubscriber: Send + Sync + 'static {
    fn name(&self) -> String;
    fn on_update(&self);
}

/// Register `subscriber` on `bus`.
pub fn attach<S: UpdateSubscriber>(bus: &UpdateBus, subscriber: Arc<S>) -> SubscriptionId {
    let name = subscriber.name();
    bus.subscribe(name, move || subscriber.on_update())
}

// ---------------------------------------------------------------------------
// ThresholdSensor
// ---------------------------------------------------------------------------

/// Boolean alarm for one configured export/import threshold.
pub struct ThresholdSensor {
    name: String,
    evaluator: ThresholdEvaluator,
    metrics: Arc<MetricsHandle>,
    published: AtomicBool,
}

impl ThresholdSensor {
    pub fn new(evaluator: ThresholdEvaluator, metrics: Arc<MetricsHandle>) -> Self {
        Self {
            name: evaluator.name(),
            evaluator,
            metrics,
            published: AtomicBool::new(false),
        }
    }

    /// Evaluate against the current aggregate (on-demand read).
    pub fn is_triggered(&self) -> bool {
        self.evaluator.evaluate(&self.metrics.filtered_values())
    }

    /// Value published on the most recent update.
    pub fn published(&self) -> bool {
        self.published.load(Ordering::SeqCst)
    }
}

impl UpdateSubscriber for ThresholdSensor {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn on_update(&self) {
        let triggered = self.is_triggered();
        if triggered {
            tracing::debug!(sensor = %self.name, triggered, "Threshold sensor triggered");
        }
        self.published.store(triggered, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// ReadingsSink
// ---------------------------------------------------------------------------

/// Publishes the derived watt readings (export, import, generation and,
/// optionally, the PV strings).
pub struct ReadingsSink {
    metrics: Arc<MetricsHandle>,
    show_strings: bool,
    latest: Mutex<Option<DisplayReadings>>,
}

impl ReadingsSink {
    pub fn new(metrics: Arc<MetricsHandle>, show_strings: bool) -> Self {
        Self {
            metrics,
            show_strings,
            latest: Mutex::new(None),
        }
    }

    /// Readings published on the most recent update.
    pub fn latest(&self) -> Option<DisplayReadings> {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl UpdateSubscriber for ReadingsSink {
    fn name(&self) -> String {
        "readings".to_string()
    }

    fn on_update(&self) {
        let readings =
            DisplayReadings::from_aggregate(&self.metrics.filtered_values(), self.show_strings);
        tracing::debug!(
            exported_watts = readings.exported_watts,
            imported_watts = readings.imported_watts,
            generation_watts = readings.generation_watts,
            pv1_watts = ?readings.pv1_watts,
            pv2_watts = ?readings.pv2_watts,
            "Readings updated",
        );
        *self
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(readings);
    }
}

// ---------------------------------------------------------------------------
// BatteryMonitor
// ---------------------------------------------------------------------------

/// Tracks battery level and charging direction.
pub struct BatteryMonitor {
    metrics: Arc<MetricsHandle>,
    tracker: Mutex<ChargingTracker>,
    latest: Mutex<Option<BatteryStatus>>,
}

impl BatteryMonitor {
    pub fn new(metrics: Arc<MetricsHandle>) -> Self {
        Self {
            metrics,
            tracker: Mutex::new(ChargingTracker::new()),
            latest: Mutex::new(None),
        }
    }

    pub fn latest(&self) -> Option<BatteryStatus> {
        *self
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl UpdateSubscriber for BatteryMonitor {
    fn name(&self) -> String {
        "battery".to_string()
    }

    fn on_update(&self) {
        let status = self
            .tracker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .observe(&self.metrics.filtered_values());
        tracing::debug!(
            level_percent = status.level_percent,
            power_watts = status.power_watts,
            charging_state = ?status.charging_state,
            "Battery status updated",
        );
        *self
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(status);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use solax_core::readings::{ChargingState, DISPLAY_FLOOR_WATTS};
    use solax_core::{Sample, ValueStrategy};

    fn handle() -> Arc<MetricsHandle> {
        Arc::new(MetricsHandle::new(ValueStrategy::LatestReading, 3, Utc::now()).unwrap())
    }

    fn reading(exported: f64, battery_watts: f64) -> Sample {
        Sample {
            exported_watts: exported,
            battery_power_watts: battery_watts,
            battery_percentage: 40.0,
            generation_watts: 900.0,
            pv1_power_watts: 500.0,
            pv2_power_watts: 400.0,
            ..Sample::zero(Utc::now())
        }
    }

    #[test]
    fn threshold_sensor_republishes_level_on_every_update() {
        let metrics = handle();
        let bus = UpdateBus::new();
        let sensor = Arc::new(ThresholdSensor::new(
            ThresholdEvaluator::new(500.0),
            Arc::clone(&metrics),
        ));
        attach(&bus, Arc::clone(&sensor));

        assert_eq!(sensor.name(), "500 watts exported");
        assert!(!sensor.published());

        metrics.apply(reading(500.0, 0.0));
        bus.publish();
        assert!(sensor.published());

        // Unchanged state is still published as triggered.
        bus.publish();
        assert!(sensor.published());

        metrics.apply(reading(499.0, 0.0));
        bus.publish();
        assert!(!sensor.published());
    }

    #[test]
    fn import_sensor_reads_current_aggregate_on_demand() {
        let metrics = handle();
        let sensor = ThresholdSensor::new(ThresholdEvaluator::new(-300.0), Arc::clone(&metrics));
        assert_eq!(sensor.name(), "300 watts imported");

        metrics.apply(reading(-299.0, 0.0));
        assert!(!sensor.is_triggered());
        metrics.apply(reading(-300.0, 0.0));
        assert!(sensor.is_triggered());
    }

    #[test]
    fn readings_sink_publishes_derived_values() {
        let metrics = handle();
        let bus = UpdateBus::new();
        let sink = Arc::new(ReadingsSink::new(Arc::clone(&metrics), false));
        attach(&bus, Arc::clone(&sink));
        assert!(sink.latest().is_none());

        metrics.apply(reading(-120.0, 0.0));
        bus.publish();

        let readings = sink.latest().expect("readings after publish");
        assert_eq!(readings.exported_watts, DISPLAY_FLOOR_WATTS);
        assert_eq!(readings.imported_watts, 120.0);
        assert_eq!(readings.generation_watts, 900.0);
        assert_eq!(readings.pv1_watts, None);
    }

    #[test]
    fn battery_monitor_tracks_charging_direction() {
        let metrics = handle();
        let bus = UpdateBus::new();
        let monitor = Arc::new(BatteryMonitor::new(Arc::clone(&metrics)));
        attach(&bus, Arc::clone(&monitor));

        metrics.apply(reading(0.0, 200.0));
        bus.publish();
        assert_eq!(monitor.latest().unwrap().charging_state, ChargingState::Charging);

        metrics.apply(reading(0.0, -50.0));
        bus.publish();
        let status = monitor.latest().unwrap();
        assert_eq!(status.charging_state, ChargingState::NotCharging);
        assert_eq!(status.level_percent, 40.0);
    }
}
