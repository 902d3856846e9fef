/// Configuration problems detected while building the agent.
///
/// `UnknownStrategy` is the only variant that is recovered from (by falling
/// back to the simple moving average); the rest are startup failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown value strategy: '{0}'")]
    UnknownStrategy(String),

    #[error("History length must be a positive integer, got {0}")]
    InvalidHistoryLength(i64),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}
