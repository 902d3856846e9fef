//! Domain logic for the Solax inverter agent.
//!
//! This crate performs no I/O. It holds the sample model, the bounded
//! history buffer, the aggregation strategies and threshold evaluation used
//! by the agent's polling scheduler.

pub mod aggregator;
pub mod buffer;
pub mod error;
pub mod history;
pub mod readings;
pub mod sample;
pub mod strategy;
pub mod threshold;
pub mod types;

pub use buffer::HistoryBuffer;
pub use error::ConfigError;
pub use history::MetricsHistory;
pub use sample::{Aggregate, Sample};
pub use strategy::ValueStrategy;
pub use threshold::ThresholdEvaluator;
