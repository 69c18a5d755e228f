//! # Broker Transport Abstraction
//!
//! This module defines the `BrokerTransport` trait, the capability the resilient
//! client is written against. A transport owns the wire protocol (framing, packet
//! encoding, QoS handshakes) and the socket; the client only sequences calls on
//! it and keeps the subscription set alive across reconnects.
//!
//! With the Rust 2024 Edition, this trait uses native `async fn`, removing the
//! need for the `#[async_trait]` macro.
//!
//! Connection lifecycle callbacks flow the other way: the transport's glue code
//! reports them through [`ResilientClient::on_connect`] and
//! [`ResilientClient::on_connection_lost`], which only enqueue a
//! [`ConnectionEvent`] and return immediately.
//!
//! [`ResilientClient::on_connect`]: crate::ResilientClient::on_connect
//! [`ResilientClient::on_connection_lost`]: crate::ResilientClient::on_connection_lost

use embassy_time::Duration;

use crate::message::{MessageHandler, QoS};

/// A trait representing a connection to an MQTT broker.
#[allow(async_fn_in_trait)]
pub trait BrokerTransport {
    /// The error type returned by the transport.
    type Error: core::fmt::Debug;

    /// Opens a session with the broker at `host` identified by `client_id`.
    async fn connect(&mut self, host: &str, client_id: &str) -> Result<(), Self::Error>;

    /// Closes the session, allowing in-flight sends up to `grace` to flush.
    async fn disconnect(&mut self, grace: Duration);

    /// Subscribes to `topic`; `handler` receives every message delivered on it.
    async fn subscribe(
        &mut self,
        topic: &str,
        qos: QoS,
        handler: MessageHandler,
    ) -> Result<(), Self::Error>;

    /// Publishes a message.
    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), Self::Error>;

    /// Asks the transport to reconnect on its own after a connection loss.
    fn set_auto_reconnect(&mut self, enabled: bool);

    /// Asks the transport to deliver messages of a topic in order.
    fn set_order_matters(&mut self, enabled: bool);

    /// Whether the transport actually reconnects by itself once
    /// auto-reconnect has been requested.
    ///
    /// When this returns `false` the client's supervisor drives reconnection
    /// with its own backoff loop.
    fn supports_auto_reconnect(&self) -> bool {
        true
    }
}

/// A lifecycle notification reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionEvent<E> {
    /// A session was (re)established.
    Connected,
    /// The session dropped with the given error.
    ConnectionLost(E),
}
