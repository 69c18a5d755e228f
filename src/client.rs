//! # Resilient Client
//!
//! `ResilientClient` is the object applications hold. It records every
//! subscription before attempting it, so that the supervisor (see
//! [`runtime`](crate::runtime)) can re-arm the full set after each reconnect.
//!
//! All methods take `&self`: put the client in a `StaticCell`, spawn a task
//! running [`ResilientClient::run`], and share the reference with the tasks
//! that subscribe and publish.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use crate::error::ClientError;
use crate::message::{MessageHandler, QoS};
use crate::runtime::{
    ConnectionState, EVENT_QUEUE_DEPTH, Session, Subscription, SubscriptionRegistry,
    SupervisorEvent,
};
use crate::transport::BrokerTransport;

/// Delay before the second connection attempt.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
/// Upper bound for the delay between connection attempts.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
/// Time the transport gets to flush in-flight sends on disconnect.
pub const DEFAULT_DISCONNECT_GRACE: Duration = Duration::from_millis(250);

/// Connection settings for a [`ResilientClient`].
#[derive(Debug, Clone, Copy)]
pub struct BrokerOptions<'a> {
    /// Broker address, passed to the transport as-is.
    pub host: &'a str,
    pub client_id: &'a str,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub disconnect_grace: Duration,
    /// Request the transport's own reconnect logic.
    pub auto_reconnect: bool,
    /// Request ordered delivery per topic from the transport.
    pub order_matters: bool,
}

impl<'a> BrokerOptions<'a> {
    pub fn new(host: &'a str, client_id: &'a str) -> Self {
        Self {
            host,
            client_id,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            disconnect_grace: DEFAULT_DISCONNECT_GRACE,
            auto_reconnect: true,
            order_matters: true,
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_disconnect_grace(mut self, grace: Duration) -> Self {
        self.disconnect_grace = grace;
        self
    }

    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    pub fn with_order_matters(mut self, enabled: bool) -> Self {
        self.order_matters = enabled;
        self
    }
}

/// MQTT client that keeps its subscriptions alive across reconnects.
///
/// # Type Parameters
///
/// - `M`: raw mutex kind guarding shared state (`CriticalSectionRawMutex` when
///   the client is shared across executors or interrupts)
/// - `T`: the underlying [`BrokerTransport`]
/// - `D`: delay provider for connection backoff, e.g. `embassy_time::Delay`
/// - `MAX_SUBS`: maximum number of distinct tracked topics
pub struct ResilientClient<'a, M, T, D, const MAX_SUBS: usize>
where
    M: RawMutex,
    T: BrokerTransport,
    D: DelayNs,
{
    pub(crate) transport: Mutex<M, T>,
    pub(crate) registry: SubscriptionRegistry<M, MAX_SUBS>,
    /// Lock order: `state` before `registry`.
    pub(crate) state: BlockingMutex<M, Cell<Session>>,
    pub(crate) events: Channel<M, SupervisorEvent<T::Error>, EVENT_QUEUE_DEPTH>,
    pub(crate) shutdown: Signal<M, ()>,
    pub(crate) delay: Mutex<M, D>,
    /// Set when the supervisor, not the transport, has to reconnect.
    pub(crate) supervise_reconnect: bool,
    pub(crate) options: BrokerOptions<'a>,
}

impl<'a, M, T, D, const MAX_SUBS: usize> ResilientClient<'a, M, T, D, MAX_SUBS>
where
    M: RawMutex,
    T: BrokerTransport,
    D: DelayNs,
{
    /// Creates a client in the `Disconnected` state without touching the network.
    ///
    /// Call [`establish`](Self::establish) to connect. Subscriptions tracked
    /// before that are replayed once the connection is up.
    pub fn new(mut transport: T, options: BrokerOptions<'a>, delay: D) -> Self {
        transport.set_auto_reconnect(options.auto_reconnect);
        transport.set_order_matters(options.order_matters);
        let supervise_reconnect = !(options.auto_reconnect && transport.supports_auto_reconnect());

        Self {
            transport: Mutex::new(transport),
            registry: SubscriptionRegistry::new(),
            state: BlockingMutex::new(Cell::new(Session::new())),
            events: Channel::new(),
            shutdown: Signal::new(),
            delay: Mutex::new(delay),
            supervise_reconnect,
            options,
        }
    }

    /// Creates a client and waits until the broker accepts the connection.
    ///
    /// Failed attempts are retried forever with exponential backoff; this
    /// future only completes once connected.
    pub async fn connect(transport: T, options: BrokerOptions<'a>, delay: D) -> Self {
        let client = Self::new(transport, options, delay);
        client.establish().await;
        client
    }

    /// Tracks a subscription and tries to subscribe right away.
    ///
    /// The subscription is recorded first, so a failed immediate attempt is
    /// only logged: the next successful connection replays it. An error is
    /// returned only if the subscription could not be tracked at all.
    pub async fn subscribe_with_tracking(
        &self,
        topic: &str,
        qos: QoS,
        handler: MessageHandler,
    ) -> Result<(), ClientError<T::Error>> {
        // Checked and recorded under the state lock, so `disconnect` either
        // sees the topic tracked or the topic is never tracked.
        self.state.lock(|session| -> Result<(), ClientError<T::Error>> {
            if session.get().state == ConnectionState::ShutDown {
                return Err(ClientError::ShutDown);
            }
            self.registry
                .record(topic, qos, handler)
                .map_err(ClientError::from)
        })?;

        let mut transport = self.transport.lock().await;
        // `disconnect` marks the shutdown before it takes the transport.
        if self.is_shut_down() {
            debug!("client shut down, skipping subscribe to {}", topic);
            return Ok(());
        }
        let result = transport.subscribe(topic, qos, handler).await;
        drop(transport);
        match result {
            Ok(()) => info!("Subscribed to {}", topic),
            Err(err) => warn!("Subscription to {} failed: {:?}", topic, err),
        }
        Ok(())
    }

    /// Publishes through the transport unchanged.
    pub async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), ClientError<T::Error>> {
        if self.is_shut_down() {
            return Err(ClientError::ShutDown);
        }
        self.transport
            .lock()
            .await
            .publish(topic, payload, qos, retain)
            .await
            .map_err(ClientError::Transport)
    }

    /// Shuts the client down for good.
    ///
    /// The transport always receives a disconnect with the configured grace
    /// period, even if no connection was ever established. Reconnect attempts
    /// and replays stop; further calls are no-ops.
    pub async fn disconnect(&self) {
        let first = self.state.lock(|cell| {
            let mut session = cell.get();
            if session.state == ConnectionState::ShutDown {
                false
            } else {
                session.state = ConnectionState::ShutDown;
                cell.set(session);
                true
            }
        });
        if !first {
            debug!("disconnect requested on a client that is already shut down");
            return;
        }

        self.shutdown.signal(());
        // A full queue still wakes `run`, which then observes the state.
        let _ = self.events.try_send(SupervisorEvent::Shutdown);

        self.transport
            .lock()
            .await
            .disconnect(self.options.disconnect_grace)
            .await;
        info!("MQTT client disconnected gracefully");
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state.lock(|session| session.get().state)
    }

    /// Copy of every tracked subscription.
    pub fn subscriptions(&self) -> Vec<Subscription, MAX_SUBS> {
        self.registry.snapshot()
    }

    pub fn options(&self) -> &BrokerOptions<'a> {
        &self.options
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.state() == ConnectionState::ShutDown
    }
}
