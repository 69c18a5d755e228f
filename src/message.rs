//! # Message Types
//!
//! Delivery-level types shared between the client and the transport. Packet
//! encoding is the transport's business; the client only needs to name QoS
//! levels and hand message handlers around.

/// Represents the Quality of Service (QoS) levels for MQTT messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = u8;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            other => Err(other),
        }
    }
}

/// An inbound message, borrowed from the transport's receive buffer.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
    pub qos: QoS,
    pub retain: bool,
}

/// Callback invoked by the transport for every message delivered on a
/// subscribed topic.
///
/// Handlers are plain function pointers so they can be stored in the
/// subscription registry without allocation and replayed any number of
/// times. Keep handler state in statics (atomics, `embassy_sync` channels).
pub type MessageHandler = fn(&Message<'_>);
