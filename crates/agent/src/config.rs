//! Agent configuration loaded from environment variables.

use std::time::Duration;

use solax_core::{ConfigError, ValueStrategy};

/// Default seconds between polls.
pub const DEFAULT_POLLING_FREQUENCY_SECS: u64 = 60;

/// Longest accepted polling interval (one day).
pub const MAX_POLLING_FREQUENCY_SECS: u64 = 86_400;

/// Default history buffer capacity (and averaging window).
pub const DEFAULT_HISTORY_LENGTH: usize = 10;

/// Resolved agent configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Inverter host or IP address.
    pub address: String,
    pub polling_frequency: Duration,
    pub history_length: usize,
    pub value_strategy: ValueStrategy,
    /// Signed watt thresholds; one alarm per entry.
    pub export_alert_thresholds: Vec<f64>,
    pub has_battery: bool,
    pub show_strings: bool,
}

impl AgentConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                         | Default               |
    /// |---------------------------------|-----------------------|
    /// | `SOLAX_ADDRESS`                 | required              |
    /// | `POLLING_FREQUENCY_SECS`        | `60` (max `86400`)    |
    /// | `MOVING_AVERAGE_HISTORY_LENGTH` | `10`                  |
    /// | `VALUE_STRATEGY`                | `SimpleMovingAverage` |
    /// | `EXPORT_ALERT_THRESHOLDS`       | (none)                |
    /// | `HAS_BATTERY`                   | `true`                |
    /// | `SHOW_STRINGS`                  | `true`                |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset. An unrecognised strategy is
    /// logged and replaced by the default rather than rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let address = get("SOLAX_ADDRESS").ok_or(ConfigError::Missing("SOLAX_ADDRESS"))?;

        let polling_secs = match get("POLLING_FREQUENCY_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if (1..=MAX_POLLING_FREQUENCY_SECS).contains(&secs) => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "POLLING_FREQUENCY_SECS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_POLLING_FREQUENCY_SECS,
        };

        let history_length = match get("MOVING_AVERAGE_HISTORY_LENGTH") {
            Some(raw) => {
                let parsed: i64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "MOVING_AVERAGE_HISTORY_LENGTH",
                    value: raw.clone(),
                })?;
                if parsed <= 0 {
                    return Err(ConfigError::InvalidHistoryLength(parsed));
                }
                parsed as usize
            }
            None => DEFAULT_HISTORY_LENGTH,
        };

        let value_strategy = get("VALUE_STRATEGY")
            .map(|raw| ValueStrategy::parse_or_default(&raw))
            .unwrap_or_default();

        let export_alert_thresholds = match get("EXPORT_ALERT_THRESHOLDS") {
            Some(raw) => parse_thresholds(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            address,
            polling_frequency: Duration::from_secs(polling_secs),
            history_length,
            value_strategy,
            export_alert_thresholds,
            has_battery: parse_flag(get("HAS_BATTERY"), "HAS_BATTERY")?,
            show_strings: parse_flag(get("SHOW_STRINGS"), "SHOW_STRINGS")?,
        })
    }

    /// Realtime data endpoint on the inverter.
    pub fn endpoint_url(&self) -> String {
        format!("http://{}/api/realTimeData.htm", self.address)
    }
}

fn parse_thresholds(raw: &str) -> Result<Vec<f64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "EXPORT_ALERT_THRESHOLDS",
                    value: s.to_string(),
                })
        })
        .collect()
}

/// Flags default to `true` when unset.
fn parse_flag(raw: Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(true);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value: raw }),
    }
}
