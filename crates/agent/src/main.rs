//! `solax-agent` -- Solax inverter telemetry daemon.
//!
//! Polls the inverter's local realtime endpoint, smooths the readings with
//! the configured value strategy and publishes threshold alarms, display
//! readings and battery status on every tick.
//!
//! # Environment variables
//!
//! | Variable                        | Required | Default               | Description                         |
//! |---------------------------------|----------|-----------------------|-------------------------------------|
//! | `SOLAX_ADDRESS`                 | yes      | --                    | Inverter host or IP                 |
//! | `POLLING_FREQUENCY_SECS`        | no       | `60`                  | Seconds between polls               |
//! | `MOVING_AVERAGE_HISTORY_LENGTH` | no       | `10`                  | Samples kept for averaging          |
//! | `VALUE_STRATEGY`                | no       | `SimpleMovingAverage` | `LatestReading`, `SimpleMovingAverage` or `ExponentialMovingAverage` |
//! | `EXPORT_ALERT_THRESHOLDS`       | no       | --                    | Comma-separated signed watts        |
//! | `HAS_BATTERY`                   | no       | `true`                | Track battery status                |
//! | `SHOW_STRINGS`                  | no       | `true`                | Include PV1/PV2 readings            |

use std::sync::Arc;

use solax_agent::clock::{Clock, SystemClock};
use solax_agent::config::AgentConfig;
use solax_agent::scheduler::Scheduler;
use solax_agent::sinks::{self, BatteryMonitor, ReadingsSink, ThresholdSensor, UpdateSubscriber};
use solax_agent::source::HttpDataSource;
use solax_agent::state::MetricsHandle;
use solax_core::ThresholdEvaluator;
use solax_events::UpdateBus;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solax_agent=info,solax_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        address = %config.address,
        polling_secs = config.polling_frequency.as_secs(),
        history_length = config.history_length,
        strategy = %config.value_strategy,
        thresholds = ?config.export_alert_thresholds,
        has_battery = config.has_battery,
        show_strings = config.show_strings,
        "Starting solax-agent",
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let metrics = MetricsHandle::new(config.value_strategy, config.history_length, clock.now())
        .map(Arc::new)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to create metrics history");
            std::process::exit(1);
        });

    let bus = Arc::new(UpdateBus::new());

    sinks::attach(
        &bus,
        Arc::new(ReadingsSink::new(Arc::clone(&metrics), config.show_strings)),
    );
    for &threshold in &config.export_alert_thresholds {
        let sensor = ThresholdSensor::new(ThresholdEvaluator::new(threshold), Arc::clone(&metrics));
        tracing::info!(sensor = %sensor.name(), "Threshold sensor created");
        sinks::attach(&bus, Arc::new(sensor));
    }
    if config.has_battery {
        sinks::attach(&bus, Arc::new(BatteryMonitor::new(Arc::clone(&metrics))));
    }

    let source = HttpDataSource::new(
        config.endpoint_url(),
        config.polling_frequency,
        Arc::clone(&clock),
    )
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });
    tracing::info!(url = source.url(), "Polling inverter endpoint");

    let scheduler = Arc::new(Scheduler::new(
        Arc::new(source),
        metrics,
        bus,
        clock,
        config.polling_frequency,
    ));

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    scheduler.run(cancel).await;
}
