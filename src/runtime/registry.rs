//! Subscription tracking shared between caller tasks and the supervisor.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::{String, Vec};

use crate::error::RegistryError;
use crate::message::{MessageHandler, QoS};

/// Maximum length for a single topic string.
pub const MAX_TOPIC_LEN: usize = 128;

/// A tracked subscription: the caller's intent, replayed after every reconnect.
#[derive(Clone)]
pub struct Subscription {
    pub topic: String<MAX_TOPIC_LEN>,
    pub qos: QoS,
    pub handler: MessageHandler,
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic.as_str())
            .field("qos", &self.qos)
            .finish_non_exhaustive()
    }
}

/// The authoritative topic-to-handler mapping, independent of connection state.
///
/// The registry owns the topic strings (copies them on record). All access goes
/// through a single blocking mutex whose critical sections are the map
/// operations themselves, so the lock can never be held across an `.await` or
/// a transport call. Iterating for a replay works on a [`snapshot`] copy.
///
/// # Example
///
/// ```ignore
/// let registry = SubscriptionRegistry::<CriticalSectionRawMutex, 8>::new();
/// registry.record("device/cmd", QoS::AtLeastOnce, on_command)?;
///
/// for sub in registry.snapshot() {
///     transport.subscribe(&sub.topic, sub.qos, sub.handler).await?;
/// }
/// ```
///
/// [`snapshot`]: SubscriptionRegistry::snapshot
pub struct SubscriptionRegistry<M: RawMutex, const MAX_SUBS: usize> {
    entries: Mutex<M, RefCell<Vec<Subscription, MAX_SUBS>>>,
}

impl<M: RawMutex, const MAX_SUBS: usize> SubscriptionRegistry<M, MAX_SUBS> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Insert the subscription for `topic`, replacing any earlier handler and
    /// QoS for the same topic.
    pub fn record(
        &self,
        topic: &str,
        qos: QoS,
        handler: MessageHandler,
    ) -> Result<(), RegistryError> {
        let mut owned = String::new();
        owned
            .push_str(topic)
            .map_err(|_| RegistryError::TopicTooLong)?;

        self.entries.lock(|cell| {
            let mut entries = cell.borrow_mut();
            if let Some(existing) = entries.iter_mut().find(|s| s.topic == owned) {
                existing.qos = qos;
                existing.handler = handler;
                return Ok(());
            }
            entries
                .push(Subscription {
                    topic: owned,
                    qos,
                    handler,
                })
                .map_err(|_| RegistryError::RegistryFull)
        })
    }

    /// Copy out every tracked subscription.
    ///
    /// The copy is taken in one critical section, so it never contains a
    /// half-written entry and is safe to iterate after the lock is released.
    pub fn snapshot(&self) -> Vec<Subscription, MAX_SUBS> {
        self.entries.lock(|cell| cell.borrow().clone())
    }

    /// Whether `topic` is tracked.
    pub fn contains(&self, topic: &str) -> bool {
        self.entries
            .lock(|cell| cell.borrow().iter().any(|s| s.topic.as_str() == topic))
    }

    /// Get the number of tracked topics.
    pub fn len(&self) -> usize {
        self.entries.lock(|cell| cell.borrow().len())
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: RawMutex, const MAX_SUBS: usize> Default for SubscriptionRegistry<M, MAX_SUBS> {
    fn default() -> Self {
        Self::new()
    }
}
