//! # Error Types
//!
//! Most failures in this crate are absorbed and only logged: connect errors are
//! retried forever and subscribe errors wait for the next replay. The types here
//! cover what is left, which is the caller's intent not being recordable and
//! pass-through operations on a client that has been shut down.

use core::fmt;

/// Why a subscription could not be recorded in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// The topic is longer than [`MAX_TOPIC_LEN`](crate::runtime::MAX_TOPIC_LEN).
    TopicTooLong,
    /// The registry already holds its maximum number of distinct topics.
    RegistryFull,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::TopicTooLong => f.write_str("topic exceeds maximum length"),
            RegistryError::RegistryFull => f.write_str("subscription registry is full"),
        }
    }
}

/// The primary error enum for the client facade.
///
/// It is generic over the transport error type `E`, so pass-through
/// operations can hand back whatever the underlying transport reported.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientError<E> {
    /// The subscription could not be recorded and would never be replayed.
    Registry(RegistryError),
    /// A pass-through transport operation failed.
    Transport(E),
    /// The client was disconnected and accepts no further requests.
    ShutDown,
}

impl<E> From<RegistryError> for ClientError<E> {
    fn from(err: RegistryError) -> Self {
        ClientError::Registry(err)
    }
}

impl<E: fmt::Debug> fmt::Display for ClientError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Registry(err) => write!(f, "cannot track subscription: {}", err),
            ClientError::Transport(err) => write!(f, "transport error: {:?}", err),
            ClientError::ShutDown => f.write_str("client has been shut down"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for ClientError<E> {}

impl core::error::Error for RegistryError {}
