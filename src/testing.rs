//! Test doubles: a scripted transport and a delay that only records.

use std::sync::{Arc, Mutex};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

use crate::client::ResilientClient;
use crate::message::{Message, MessageHandler, QoS};
use crate::transport::BrokerTransport;

pub(crate) type TestClient =
    ResilientClient<'static, CriticalSectionRawMutex, MockTransport, RecordingDelay, 8>;

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub(crate) struct MockError(pub &'static str);

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    AutoReconnect(bool),
    OrderMatters(bool),
    Connect {
        host: String,
        client_id: String,
    },
    Subscribe {
        topic: String,
        qos: QoS,
    },
    Publish {
        topic: String,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    },
    Disconnect(Duration),
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    connect_failures: usize,
    failing_subscribes: Vec<String>,
    failing_publishes: Vec<String>,
    no_auto_reconnect: bool,
    handlers: Vec<(String, MessageHandler)>,
}

/// Transport double. Clones share one script, so a test keeps a clone to
/// inspect what the client did with the one it handed over.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` connect calls.
    pub(crate) fn fail_connects(self, n: usize) -> Self {
        self.script.lock().unwrap().connect_failures = n;
        self
    }

    pub(crate) fn fail_subscribe(self, topic: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .failing_subscribes
            .push(topic.into());
        self
    }

    pub(crate) fn fail_publish(self, topic: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .failing_publishes
            .push(topic.into());
        self
    }

    pub(crate) fn without_auto_reconnect(self) -> Self {
        self.script.lock().unwrap().no_auto_reconnect = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub(crate) fn connect_attempts(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Connect { .. }))
            .count()
    }

    pub(crate) fn subscribes(&self) -> Vec<(String, QoS)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Subscribe { topic, qos } => Some((topic, qos)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn subscribe_attempts(&self, topic: &str) -> usize {
        self.subscribes().iter().filter(|(t, _)| t == topic).count()
    }

    pub(crate) fn disconnects(&self) -> Vec<Duration> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Disconnect(grace) => Some(grace),
                _ => None,
            })
            .collect()
    }

    /// Hands a message to the handler of the latest successful subscribe on
    /// `topic`. Returns `false` if nothing is subscribed.
    pub(crate) fn deliver(&self, topic: &str, payload: &[u8]) -> bool {
        let handler = self
            .script
            .lock()
            .unwrap()
            .handlers
            .iter()
            .rev()
            .find(|(t, _)| t == topic)
            .map(|(_, h)| *h);
        match handler {
            Some(handler) => {
                handler(&Message {
                    topic,
                    payload,
                    qos: QoS::AtMostOnce,
                    retain: false,
                });
                true
            }
            None => false,
        }
    }
}

impl BrokerTransport for MockTransport {
    type Error = MockError;

    async fn connect(&mut self, host: &str, client_id: &str) -> Result<(), Self::Error> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::Connect {
            host: host.into(),
            client_id: client_id.into(),
        });
        if script.connect_failures > 0 {
            script.connect_failures -= 1;
            return Err(MockError("connection refused"));
        }
        Ok(())
    }

    async fn disconnect(&mut self, grace: Duration) {
        self.script.lock().unwrap().calls.push(Call::Disconnect(grace));
    }

    async fn subscribe(
        &mut self,
        topic: &str,
        qos: QoS,
        handler: MessageHandler,
    ) -> Result<(), Self::Error> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::Subscribe {
            topic: topic.into(),
            qos,
        });
        if script.failing_subscribes.iter().any(|t| t == topic) {
            return Err(MockError("subscribe rejected"));
        }
        script.handlers.push((topic.into(), handler));
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), Self::Error> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::Publish {
            topic: topic.into(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        if script.failing_publishes.iter().any(|t| t == topic) {
            return Err(MockError("publish rejected"));
        }
        Ok(())
    }

    fn set_auto_reconnect(&mut self, enabled: bool) {
        self.script
            .lock()
            .unwrap()
            .calls
            .push(Call::AutoReconnect(enabled));
    }

    fn set_order_matters(&mut self, enabled: bool) {
        self.script
            .lock()
            .unwrap()
            .calls
            .push(Call::OrderMatters(enabled));
    }

    fn supports_auto_reconnect(&self) -> bool {
        !self.script.lock().unwrap().no_auto_reconnect
    }
}

/// Delay that returns immediately and remembers what it was asked for.
#[derive(Clone, Default)]
pub(crate) struct RecordingDelay {
    waits_ms: Arc<Mutex<Vec<u32>>>,
}

impl RecordingDelay {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn waits_ms(&self) -> Vec<u32> {
        self.waits_ms.lock().unwrap().clone()
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits_ms.lock().unwrap().push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.lock().unwrap().push(ms);
    }
}
