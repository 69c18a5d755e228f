//! # Resilient MQTT Client for Embedded Systems
//!
//! `myrtio-resilient-mqtt` wraps an MQTT transport and keeps a durable set of
//! subscriptions alive across connection loss. It is `no_std` and `no_alloc`,
//! built on the [Embassy](https://embassy.dev/) async ecosystem.
//!
//! ## Core Features
//!
//! - **Tracked Subscriptions:** every topic subscribed through the client is
//!   recorded first and re-subscribed automatically after each reconnect.
//! - **Never Gives Up:** connecting retries forever with exponential backoff
//!   (1s doubling up to 30s by default).
//! - **Transport Agnostic:** the wire protocol lives behind the
//!   `BrokerTransport` trait; this crate only sequences calls on it.
//! - **Shareable:** all client methods take `&self`, so one client can serve
//!   several Embassy tasks.
//! - **Rust 2024 Edition:** Uses native `async fn` in traits, removing the need
//!   for `async-trait`.
//!
//! ## Usage
//!
//! ```ignore
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embassy_time::Delay;
//! use myrtio_resilient_mqtt::{BrokerOptions, Message, QoS, ResilientClient};
//!
//! type Client = ResilientClient<'static, CriticalSectionRawMutex, MyTransport, Delay, 8>;
//! static CLIENT: StaticCell<Client> = StaticCell::new();
//!
//! fn on_command(msg: &Message<'_>) {
//!     // Forward to application state (atomics, channels, ...)
//! }
//!
//! let options = BrokerOptions::new("tcp://broker.local:1883", "light-01");
//! // Does not return until the broker accepts the connection.
//! let client = CLIENT.init(Client::connect(transport, options, Delay).await);
//!
//! spawner.spawn(supervisor_task(client))?; // runs `client.run().await`
//!
//! client.subscribe_with_tracking("light/cmd", QoS::AtLeastOnce, on_command).await?;
//! client.publish("light/state", b"ON", QoS::AtMostOnce, true).await?;
//!
//! // Transport glue reports lifecycle changes:
//! //   client.on_connection_lost(err);
//! //   client.on_connect();   // replays "light/cmd"
//!
//! client.disconnect().await;
//! ```

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod client;
pub mod error;
pub mod message;
pub mod runtime;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export key types for easier access at the crate root.
pub use client::{BrokerOptions, ResilientClient};
pub use error::{ClientError, RegistryError};
pub use message::{Message, MessageHandler, QoS};
pub use runtime::{ConnectionState, ReplayReport};
pub use transport::{BrokerTransport, ConnectionEvent};
