//! Connection supervision: the backoff connect loop, connection state
//! tracking, and replay of tracked subscriptions after every (re)connect.

use core::pin::pin;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use futures::future::{Either, select};

use super::backoff::Backoff;
use crate::client::ResilientClient;
use crate::transport::{BrokerTransport, ConnectionEvent};

/// Number of lifecycle events that can wait for the supervisor.
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// Connection state as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Terminal. Entered through [`ResilientClient::disconnect`] only.
    ShutDown,
}

/// Outcome of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReplayReport {
    /// Subscribe calls issued, one per tracked topic.
    pub attempted: usize,
    pub failed: usize,
}

impl ReplayReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed
    }
}

/// Connection state plus whether the current session has been replayed.
///
/// Kept behind one lock so that the first path to see a session, either the
/// client's own connect or a reported `Connected` event, replays it and the
/// other does not.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Session {
    pub(crate) state: ConnectionState,
    pub(crate) replayed: bool,
}

impl Session {
    pub(crate) const fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            replayed: false,
        }
    }
}

pub(crate) enum SupervisorEvent<E> {
    Transport(ConnectionEvent<E>),
    Shutdown,
}

impl<'a, M, T, D, const MAX_SUBS: usize> ResilientClient<'a, M, T, D, MAX_SUBS>
where
    M: RawMutex,
    T: BrokerTransport,
    D: DelayNs,
{
    /// Connects with exponential backoff, then replays tracked subscriptions.
    ///
    /// Retries forever. Returns `false` only if the client was shut down
    /// before a connection could be made.
    pub async fn establish(&self) -> bool {
        if !self.connect_with_backoff().await {
            return false;
        }
        if self.claim_replay() {
            self.replay().await;
        }
        true
    }

    /// Drives the supervisor until the client is shut down.
    ///
    /// Spawn this on its own task: lifecycle callbacks only enqueue events and
    /// the replay work happens here.
    pub async fn run(&self) {
        while !self.is_shut_down() {
            match self.events.receive().await {
                SupervisorEvent::Shutdown => break,
                SupervisorEvent::Transport(event) => {
                    self.handle_event(event).await;
                }
            }
        }
        debug!("connection supervisor stopped");
    }

    /// Transport callback: a session was (re)established.
    ///
    /// Does not block. The transport may report every connect here, including
    /// the ones the client opened itself: each session is replayed once, by
    /// whichever path sees it first.
    pub fn on_connect(&self) {
        self.enqueue(ConnectionEvent::Connected);
    }

    /// Transport callback: the session dropped.
    pub fn on_connection_lost(&self, error: T::Error) {
        self.enqueue(ConnectionEvent::ConnectionLost(error));
    }

    /// Awaiting variant of the callbacks, for callers that prefer waiting over
    /// dropping an event when the queue is full.
    pub async fn notify(&self, event: ConnectionEvent<T::Error>) {
        if self.is_shut_down() {
            return;
        }
        self.events.send(SupervisorEvent::Transport(event)).await;
    }

    /// Issues one subscribe per tracked topic.
    ///
    /// Works on a snapshot, so the registry lock is never held while the
    /// transport is busy. A failing topic is logged and skipped.
    pub async fn replay(&self) -> ReplayReport {
        let snapshot = self.registry.snapshot();
        let mut report = ReplayReport::default();

        for sub in snapshot.iter() {
            if self.is_shut_down() {
                break;
            }
            report.attempted += 1;
            let result = self
                .transport
                .lock()
                .await
                .subscribe(&sub.topic, sub.qos, sub.handler)
                .await;
            match result {
                Ok(()) => info!("Subscribed to {}", sub.topic.as_str()),
                Err(err) => {
                    report.failed += 1;
                    warn!("Subscription to {} failed: {:?}", sub.topic.as_str(), err);
                }
            }
        }
        report
    }

    pub(crate) async fn handle_event(
        &self,
        event: ConnectionEvent<T::Error>,
    ) -> Option<ReplayReport> {
        match event {
            ConnectionEvent::Connected => {
                if !self.transition(ConnectionState::Connected) {
                    return None;
                }
                if !self.claim_replay() {
                    debug!("session already replayed, ignoring connected event");
                    return None;
                }
                info!("MQTT connection established");
                Some(self.replay().await)
            }
            ConnectionEvent::ConnectionLost(err) => {
                if !self.transition(ConnectionState::Disconnected) {
                    return None;
                }
                warn!("MQTT connection lost: {:?}", err);
                if self.supervise_reconnect
                    && self.connect_with_backoff().await
                    && self.claim_replay()
                {
                    return Some(self.replay().await);
                }
                None
            }
        }
    }

    async fn connect_with_backoff(&self) -> bool {
        let mut backoff = Backoff::new(self.options.initial_backoff, self.options.max_backoff);

        loop {
            if !self.transition(ConnectionState::Connecting) {
                return false;
            }
            let result = self
                .transport
                .lock()
                .await
                .connect(self.options.host, self.options.client_id)
                .await;

            match result {
                Ok(()) => {
                    if !self.transition(ConnectionState::Connected) {
                        return false;
                    }
                    info!("Connected to broker {}", self.options.host);
                    return true;
                }
                Err(err) => {
                    let wait = backoff.next_delay();
                    warn!(
                        "Failed to connect to broker: {:?}. Retrying in {} ms...",
                        err,
                        wait.as_millis()
                    );
                    if !self.transition(ConnectionState::Disconnected) {
                        return false;
                    }
                    let ms = u32::try_from(wait.as_millis()).unwrap_or(u32::MAX);
                    let mut delay = self.delay.lock().await;
                    if let Either::Right(_) =
                        select(pin!(delay.delay_ms(ms)), pin!(self.shutdown.wait())).await
                    {
                        debug!("backoff interrupted by shutdown");
                    }
                }
            }
        }
    }

    /// Moves to `next` unless the client has been shut down.
    ///
    /// Anything but staying `Connected` starts a new session that still needs
    /// its replay.
    fn transition(&self, next: ConnectionState) -> bool {
        self.state.lock(|cell| {
            let mut session = cell.get();
            if session.state == ConnectionState::ShutDown {
                return false;
            }
            if session.state != ConnectionState::Connected
                || next != ConnectionState::Connected
            {
                session.replayed = false;
            }
            session.state = next;
            cell.set(session);
            true
        })
    }

    /// Marks the current session as replayed. Returns `false` if it already
    /// was, or if there is no live session.
    fn claim_replay(&self) -> bool {
        self.state.lock(|cell| {
            let mut session = cell.get();
            if session.state != ConnectionState::Connected || session.replayed {
                return false;
            }
            session.replayed = true;
            cell.set(session);
            true
        })
    }

    fn enqueue(&self, event: ConnectionEvent<T::Error>) {
        if self.is_shut_down() {
            return;
        }
        if self
            .events
            .try_send(SupervisorEvent::Transport(event))
            .is_err()
        {
            warn!("connection event queue full, dropping event");
        }
    }
}
