//! Update notification infrastructure for the Solax agent.
//!
//! - [`UpdateBus`]: synchronous publish/subscribe registry fired once per
//!   polling tick. Subscribers pull state; nothing is carried in the event.

pub mod bus;

pub use bus::{SubscriptionId, UpdateBus};
