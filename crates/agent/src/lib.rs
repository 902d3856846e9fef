//! `solax-agent` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod clock;
pub mod config;
pub mod error;
pub mod payload;
pub mod scheduler;
pub mod sinks;
pub mod source;
pub mod state;
