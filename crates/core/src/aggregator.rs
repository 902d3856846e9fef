//! Reduction of a sample history to a single [`Aggregate`].
//!
//! [`compute`] is pure apart from `debug`-level diagnostics. Every strategy
//! returns the zero sample for an empty history; callers supply the
//! timestamp that zero sample should carry.

use crate::sample::{Aggregate, Sample};
use crate::strategy::ValueStrategy;
use crate::types::Timestamp;

/// Derive the aggregate for `history` (oldest first) using `strategy`.
///
/// `empty_at` stamps the zero sample returned when `history` is empty.
pub fn compute(strategy: ValueStrategy, history: &[Sample], empty_at: Timestamp) -> Aggregate {
    match strategy {
        ValueStrategy::LatestReading => latest(history, empty_at),
        ValueStrategy::SimpleMovingAverage => simple_moving_average(history, empty_at),
        ValueStrategy::ExponentialMovingAverage => exponential_moving_average(history, empty_at),
    }
}

fn latest(history: &[Sample], empty_at: Timestamp) -> Aggregate {
    history
        .last()
        .copied()
        .unwrap_or_else(|| Sample::zero(empty_at))
}

fn simple_moving_average(history: &[Sample], empty_at: Timestamp) -> Aggregate {
    let Some(result) = average(history) else {
        return Sample::zero(empty_at);
    };

    if result.generation_watts != 0.0 {
        tracing::debug!(generation_watts = result.generation_watts.round(), "Generation SMA");
    }
    if result.exported_watts != 0.0 {
        tracing::debug!(exported_watts = result.exported_watts.round(), "Exported SMA");
    }

    result
}

/// Seeds with the first sample, then folds
/// `v[i] = x[i] * k + v[i-1] * (1 - k)` per field with
/// `k = 2 / (len + 1)`.
fn exponential_moving_average(history: &[Sample], empty_at: Timestamp) -> Aggregate {
    let Some((first, rest)) = history.split_first() else {
        return Sample::zero(empty_at);
    };

    let k = 2.0 / (history.len() as f64 + 1.0);
    let result = rest.iter().fold(*first, |previous, current| {
        current.zip_with(&previous, current.timestamp, |x, v| x * k + v * (1.0 - k))
    });

    if let Some(sma) = average(history) {
        if result.generation_watts != 0.0 || sma.generation_watts != 0.0 {
            tracing::debug!(
                ema = result.generation_watts.round(),
                sma = sma.generation_watts.round(),
                "Generation EMA",
            );
        }
        if result.exported_watts != 0.0 || sma.exported_watts != 0.0 {
            tracing::debug!(
                ema = result.exported_watts.round(),
                sma = sma.exported_watts.round(),
                "Exported EMA",
            );
        }
    }

    result
}

/// Field-wise arithmetic mean, stamped with the newest timestamp.
/// `None` for an empty slice.
fn average(history: &[Sample]) -> Option<Sample> {
    let (first, rest) = history.split_first()?;

    let sum = rest.iter().fold(*first, |acc, sample| {
        acc.zip_with(sample, acc.timestamp.max(sample.timestamp), |a, b| a + b)
    });

    let n = history.len() as f64;
    Some(sum.map(|total| total / n))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const EPSILON: f64 = 1e-9;

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn exporting(secs: i64, watts: f64) -> Sample {
        Sample {
            exported_watts: watts,
            ..Sample::zero(at(secs))
        }
    }

    fn full(secs: i64, base: f64) -> Sample {
        Sample {
            timestamp: at(secs),
            generation_watts: base,
            exported_watts: base - 500.0,
            battery_percentage: base / 100.0,
            battery_power_watts: -base,
            pv1_power_watts: base * 0.6,
            pv2_power_watts: base * 0.4,
        }
    }

    const ALL: [ValueStrategy; 3] = [
        ValueStrategy::LatestReading,
        ValueStrategy::SimpleMovingAverage,
        ValueStrategy::ExponentialMovingAverage,
    ];

    #[test]
    fn empty_history_yields_zero_for_every_strategy() {
        for strategy in ALL {
            assert_eq!(compute(strategy, &[], at(7)), Sample::zero(at(7)), "{strategy}");
        }
    }

    #[test]
    fn latest_returns_last_sample_verbatim() {
        let history = [full(1, 100.0), full(2, 900.0)];
        assert_eq!(compute(ValueStrategy::LatestReading, &history, at(0)), full(2, 900.0));
    }

    #[test]
    fn sma_is_field_wise_mean() {
        let history = [full(1, 100.0), full(3, 400.0), full(2, 1000.0)];
        let result = compute(ValueStrategy::SimpleMovingAverage, &history, at(0));

        assert!((result.generation_watts - 500.0).abs() < EPSILON);
        assert!((result.exported_watts - 0.0).abs() < EPSILON);
        assert!((result.battery_percentage - 5.0).abs() < EPSILON);
        assert!((result.battery_power_watts + 500.0).abs() < EPSILON);
        assert!((result.pv1_power_watts - 300.0).abs() < EPSILON);
        assert!((result.pv2_power_watts - 200.0).abs() < EPSILON);
        assert_eq!(result.timestamp, at(3), "SMA carries the newest timestamp");
    }

    #[test]
    fn sma_of_single_sample_is_that_sample() {
        let history = [full(5, 321.0)];
        let result = compute(ValueStrategy::SimpleMovingAverage, &history, at(0));
        assert_eq!(result, full(5, 321.0));
    }

    #[test]
    fn ema_single_sample_is_unchanged() {
        let history = [full(5, 321.0)];
        assert_eq!(
            compute(ValueStrategy::ExponentialMovingAverage, &history, at(0)),
            full(5, 321.0)
        );
    }

    #[test]
    fn ema_three_samples_matches_worked_example() {
        let history = [exporting(1, 100.0), exporting(2, 200.0), exporting(3, 300.0)];
        let result = compute(ValueStrategy::ExponentialMovingAverage, &history, at(0));
        assert!((result.exported_watts - 225.0).abs() < EPSILON);
        assert_eq!(result.timestamp, at(3));
    }

    #[test]
    fn ema_weights_recent_samples_more_than_sma() {
        let history = [exporting(1, 0.0), exporting(2, 0.0), exporting(3, 0.0), exporting(4, 1000.0)];
        let ema = compute(ValueStrategy::ExponentialMovingAverage, &history, at(0));
        let sma = compute(ValueStrategy::SimpleMovingAverage, &history, at(0));
        // k = 0.4, so the final sample contributes 400.
        assert!((ema.exported_watts - 400.0).abs() < EPSILON);
        assert!((sma.exported_watts - 250.0).abs() < EPSILON);
    }

    #[test]
    fn ema_applies_recurrence_to_every_field() {
        let history = [full(1, 100.0), full(2, 200.0)];
        let result = compute(ValueStrategy::ExponentialMovingAverage, &history, at(0));
        // k = 2/3
        let expected = |a: f64, b: f64| b * (2.0 / 3.0) + a * (1.0 / 3.0);
        assert!((result.generation_watts - expected(100.0, 200.0)).abs() < EPSILON);
        assert!((result.exported_watts - expected(-400.0, -300.0)).abs() < EPSILON);
        assert!((result.battery_percentage - expected(1.0, 2.0)).abs() < EPSILON);
        assert!((result.battery_power_watts - expected(-100.0, -200.0)).abs() < EPSILON);
        assert!((result.pv1_power_watts - expected(60.0, 120.0)).abs() < EPSILON);
        assert!((result.pv2_power_watts - expected(40.0, 80.0)).abs() < EPSILON);
    }
}
