//! Connection Runtime
//!
//! The machinery that keeps a [`ResilientClient`](crate::ResilientClient)
//! subscribed while the underlying connection comes and goes.
//!
//! # Overview
//!
//! - [`SubscriptionRegistry`]: the tracked topic set, guarded by a blocking
//!   mutex that is never held across a transport call
//! - [`Backoff`]: the doubling, capped delay between connection attempts
//! - the supervisor: the connect loop, the connection state machine and
//!   replay of the registry after every (re)connect
//!
//! # State Machine
//!
//! ```text
//! Disconnected --connect loop--> Connected --connection lost--> Disconnected
//!                                    ^                               |
//!                                    +--- connected + replay --------+
//!
//! any state --disconnect()--> ShutDown (terminal)
//! ```
//!
//! # Execution Model
//!
//! Transport callbacks (`on_connect`, `on_connection_lost`) only push a
//! [`ConnectionEvent`](crate::transport::ConnectionEvent) into a bounded
//! channel. [`ResilientClient::run`](crate::ResilientClient::run) drains it on
//! its own task, so re-subscribing never happens on the transport's dispatch
//! path.

pub(crate) mod backoff;
pub(crate) mod registry;
pub(crate) mod supervisor;

pub use backoff::Backoff;
pub use registry::{MAX_TOPIC_LEN, Subscription, SubscriptionRegistry};
pub use supervisor::{ConnectionState, EVENT_QUEUE_DEPTH, ReplayReport};

pub(crate) use supervisor::{Session, SupervisorEvent};
