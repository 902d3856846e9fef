//! Value strategy selection.
//!
//! The strategy decides how the buffered history is reduced to the
//! [`Aggregate`](crate::sample::Aggregate) that consumers read.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// How the aggregate is derived from the history buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueStrategy {
    /// Most recent sample, verbatim.
    LatestReading,
    /// Field-wise mean over the whole buffer.
    #[default]
    SimpleMovingAverage,
    /// Exponential recurrence with `k = 2 / (len + 1)`.
    ExponentialMovingAverage,
}

impl ValueStrategy {
    /// Canonical configuration key for this strategy.
    pub const fn key(&self) -> &'static str {
        match self {
            ValueStrategy::LatestReading => "LatestReading",
            ValueStrategy::SimpleMovingAverage => "SimpleMovingAverage",
            ValueStrategy::ExponentialMovingAverage => "ExponentialMovingAverage",
        }
    }

    /// Human-readable name.
    pub const fn display_name(&self) -> &'static str {
        match self {
            ValueStrategy::LatestReading => "Latest Reading",
            ValueStrategy::SimpleMovingAverage => "Simple Moving Average",
            ValueStrategy::ExponentialMovingAverage => "Exponential Moving Average",
        }
    }

    /// Parse a configured value, falling back to
    /// [`ValueStrategy::SimpleMovingAverage`] with a warning when the value
    /// is not recognised.
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.parse() {
            Ok(strategy) => strategy,
            Err(e) => {
                let fallback = ValueStrategy::default();
                tracing::warn!(
                    error = %e,
                    fallback = fallback.key(),
                    "Unknown valueStrategy, defaulting to {}",
                    fallback.display_name(),
                );
                fallback
            }
        }
    }
}

impl FromStr for ValueStrategy {
    type Err = ConfigError;

    /// Accepts the canonical key, the display name, or a short alias,
    /// ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalised.as_str() {
            "latestreading" | "latest" => Ok(ValueStrategy::LatestReading),
            "simplemovingaverage" | "sma" => Ok(ValueStrategy::SimpleMovingAverage),
            "exponentialmovingaverage" | "ema" => Ok(ValueStrategy::ExponentialMovingAverage),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for ValueStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
