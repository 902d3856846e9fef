//! Polling loop and stall watchdog.
//!
//! [`Scheduler::run`] waits a fixed startup delay, then polls the
//! [`DataSource`] every `polling_frequency`. After each tick, successful or
//! not, an update is published on the [`UpdateBus`]. Failed fetches leave the
//! buffered history and aggregate untouched.
//!
//! A watchdog task wakes every `2 × polling_frequency`. If the newest raw
//! sample is older than `4 × polling_frequency` it polls immediately,
//! without waiting for the loop. Watchdog polls are not serialised against
//! the loop: two fetches may be in flight at once, and whichever completes
//! last provides the latest sample.

use std::sync::Arc;
use std::time::Duration;

use solax_events::UpdateBus;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::source::DataSource;
use crate::state::MetricsHandle;

/// Delay between start-up and the first poll.
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(5);

/// The watchdog wakes every `WATCHDOG_PERIOD_FACTOR` polling intervals.
const WATCHDOG_PERIOD_FACTOR: u32 = 2;

/// Samples older than `STALL_FACTOR` polling intervals count as stalled.
const STALL_FACTOR: u32 = 4;

/// Why a poll was issued. Carried into log lines only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTrigger {
    Scheduled,
    Watchdog,
}

impl PollTrigger {
    fn as_str(&self) -> &'static str {
        match self {
            PollTrigger::Scheduled => "scheduled",
            PollTrigger::Watchdog => "watchdog",
        }
    }
}

/// Drives the data source and owns writes to the metrics state.
pub struct Scheduler {
    source: Arc<dyn DataSource>,
    metrics: Arc<MetricsHandle>,
    bus: Arc<UpdateBus>,
    clock: Arc<dyn Clock>,
    polling_frequency: Duration,
    startup_delay: Duration,
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn DataSource>,
        metrics: Arc<MetricsHandle>,
        bus: Arc<UpdateBus>,
        clock: Arc<dyn Clock>,
        polling_frequency: Duration,
    ) -> Self {
        Self {
            source,
            metrics,
            bus,
            clock,
            polling_frequency,
            startup_delay: DEFAULT_STARTUP_DELAY,
        }
    }

    /// Override the delay before the first poll.
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    /// Read access to the state this scheduler maintains.
    pub fn metrics(&self) -> Arc<MetricsHandle> {
        Arc::clone(&self.metrics)
    }

    /// Run the polling loop and the watchdog until `cancel` fires.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        tracing::info!(
            polling_secs = self.polling_frequency.as_secs_f64(),
            startup_delay_secs = self.startup_delay.as_secs_f64(),
            "Scheduler starting",
        );

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(self.startup_delay) => {}
        }

        let watchdog = tokio::spawn(Arc::clone(&self).run_watchdog(cancel.clone()));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.poll_once(PollTrigger::Scheduled) => {}
            }

            tracing::debug!(
                delay_ms = self.polling_frequency.as_millis() as u64,
                "Waiting for next poll",
            );
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.polling_frequency) => {}
            }
        }

        if let Err(e) = watchdog.await {
            tracing::error!(error = %e, "Watchdog task failed");
        }
        tracing::info!("Scheduler stopped");
    }

    async fn run_watchdog(self: Arc<Self>, cancel: CancellationToken) {
        let period = self.polling_frequency.saturating_mul(WATCHDOG_PERIOD_FACTOR);
        let Some(start) = Instant::now().checked_add(period) else {
            tracing::error!(period_secs = period.as_secs(), "Watchdog period out of range");
            return;
        };
        let mut ticker = tokio::time::interval_at(start, period);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Watchdog stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.check_stall().await;
                }
            }
        }
    }

    /// One poll: fetch, apply on success, then publish.
    ///
    /// Returns `true` if a new sample was applied. Errors are logged here
    /// and never escape the tick.
    pub async fn poll_once(&self, trigger: PollTrigger) -> bool {
        let applied = match self.source.fetch().await {
            Ok(sample) => {
                tracing::debug!(
                    trigger = trigger.as_str(),
                    generation_watts = sample.generation_watts,
                    exported_watts = sample.exported_watts,
                    battery_percentage = sample.battery_percentage,
                    battery_power_watts = sample.battery_power_watts,
                    "Fetched inverter sample",
                );
                self.metrics.apply(sample);
                true
            }
            Err(e) => {
                tracing::warn!(
                    trigger = trigger.as_str(),
                    parse_error = e.is_parse(),
                    error = %e,
                    "Failed to read from inverter",
                );
                false
            }
        };

        self.bus.publish();
        applied
    }

    /// Whether the newest raw sample is older than the stall limit.
    pub fn is_stalled(&self) -> bool {
        let latest = self.metrics.latest_raw_values().timestamp;
        let limit = self.stall_limit();

        // A sample stamped in the future is never stale.
        match (self.clock.now() - latest).to_std() {
            Ok(gap) => gap > limit,
            Err(_) => false,
        }
    }

    fn stall_limit(&self) -> Duration {
        self.polling_frequency.saturating_mul(STALL_FACTOR)
    }

    /// Poll immediately if stalled. Returns whether a poll was issued.
    pub async fn check_stall(&self) -> bool {
        if !self.is_stalled() {
            return false;
        }

        let latest = self.metrics.latest_raw_values().timestamp;
        tracing::warn!(
            latest_sample = %latest,
            limit_secs = self.stall_limit().as_secs_f64(),
            "No fresh sample within stall limit, forcing a poll",
        );
        self.poll_once(PollTrigger::Watchdog).await;
        true
    }
}
