//! In-process update notification bus.
//!
//! [`UpdateBus`] is a registry of subscriber callbacks. Each
//! [`publish`](UpdateBus::publish) invokes every callback synchronously, in
//! registration order. Notifications carry no payload: subscribers pull the
//! current state through whatever accessor they captured.
//!
//! Designed to be shared via `Arc<UpdateBus>`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Handle returned by [`UpdateBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn Fn() + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    name: String,
    callback: Callback,
}

/// Ordered fan-out of payload-less update notifications.
///
/// # Usage
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use solax_events::UpdateBus;
///
/// let bus = UpdateBus::new();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// bus.subscribe("counter", move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// bus.publish();
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct UpdateBus {
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl UpdateBus {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register `callback` to run on every subsequent publish.
    ///
    /// `name` is used only for diagnostics.
    pub fn subscribe<F>(&self, name: impl Into<String>, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let name = name.into();
        tracing::debug!(subscriber = %name, "Update subscriber registered");

        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Subscriber {
                id,
                name,
                callback: Box::new(callback),
            });
        id
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Notify every subscriber, in registration order.
    ///
    /// Callbacks must not subscribe or unsubscribe on this bus.
    pub fn publish(&self) {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        tracing::trace!(count = subscribers.len(), "Publishing update");

        for subscriber in subscribers.iter() {
            tracing::trace!(subscriber = %subscriber.name, "Notifying subscriber");
            (subscriber.callback)();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
