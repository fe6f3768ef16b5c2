//! Scripted broker client double.
//!
//! Records every call made through the [`MqttClient`] seam and replays
//! queued outcomes, so tests can pin down exactly which broker operations
//! the handler performed and in what order. Unscripted calls succeed.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::client::{BrokerError, DeliveryToken, MqttClient};

/// One observed call through the client seam.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientCall {
    SetCredentials { username: String, password: String },
    Connect { host: String, port: u16 },
    Reconnect,
    Publish { topic: String, payload: String },
    Disconnect,
}

#[derive(Default)]
struct ScriptedState {
    connect_results: VecDeque<Result<(), BrokerError>>,
    reconnect_results: VecDeque<bool>,
    publish_acks: VecDeque<bool>,
    connected: bool,
    session: bool,
    calls: Vec<ClientCall>,
}

/// Clonable handle onto shared scripted state; the clone kept by the test
/// observes calls made through the clone owned by the handler.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedClient {
    /// A disconnected client with no session; every unscripted operation
    /// succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that already holds a connected session.
    pub fn connected() -> Self {
        let client = Self::new();
        {
            let mut state = client.state.lock();
            state.session = true;
            state.connected = true;
        }
        client
    }

    /// Queue the outcome of the next `connect` call.
    pub fn queue_connect_result(&self, result: Result<(), BrokerError>) {
        self.state.lock().connect_results.push_back(result);
    }

    /// Queue the outcome of the next broker-level `reconnect` call.
    pub fn queue_reconnect_result(&self, success: bool) {
        self.state.lock().reconnect_results.push_back(success);
    }

    /// Queue whether the next publish gets acknowledged in time.
    pub fn queue_publish_ack(&self, acked: bool) {
        self.state.lock().publish_acks.push_back(acked);
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.lock().connected = connected;
    }

    pub fn set_session(&self, session: bool) {
        self.state.lock().session = session;
    }

    /// Every call observed so far, in order.
    pub fn calls(&self) -> Vec<ClientCall> {
        self.state.lock().calls.clone()
    }

    /// Only the observed publishes, as `(topic, payload)` pairs.
    pub fn publishes(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ClientCall::Publish { topic, payload } => Some((topic.clone(), payload.clone())),
                _ => None,
            })
            .collect()
    }

    /// Number of broker-level reconnect calls observed.
    pub fn reconnect_calls(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, ClientCall::Reconnect))
            .count()
    }
}

impl MqttClient for ScriptedClient {
    type Token = ScriptedToken;

    fn set_credentials(&mut self, username: &str, password: &str) {
        self.state.lock().calls.push(ClientCall::SetCredentials {
            username: username.to_owned(),
            password: password.to_owned(),
        });
    }

    fn connect(&mut self, host: &str, port: u16, _timeout: Duration) -> Result<(), BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(ClientCall::Connect {
            host: host.to_owned(),
            port,
        });
        // Mirrors the production client: a failed attempt still leaves a
        // session behind for later lightweight reconnects.
        state.session = true;
        let result = state.connect_results.pop_front().unwrap_or(Ok(()));
        state.connected = result.is_ok();
        result
    }

    fn has_session(&self) -> bool {
        self.state.lock().session
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn reconnect(&mut self) -> bool {
        let mut state = self.state.lock();
        state.calls.push(ClientCall::Reconnect);
        let success = state.reconnect_results.pop_front().unwrap_or(true);
        if success {
            state.connected = true;
        }
        success
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<Self::Token, BrokerError> {
        let mut state = self.state.lock();
        state.calls.push(ClientCall::Publish {
            topic: topic.to_owned(),
            payload: String::from_utf8_lossy(payload).into_owned(),
        });
        let acked = state.publish_acks.pop_front().unwrap_or(true);
        Ok(ScriptedToken { acked })
    }

    fn disconnect(&mut self) {
        let mut state = self.state.lock();
        state.calls.push(ClientCall::Disconnect);
        state.connected = false;
        state.session = false;
    }
}

/// Token replaying a scripted acknowledgment outcome without waiting.
pub struct ScriptedToken {
    acked: bool,
}

impl DeliveryToken for ScriptedToken {
    fn wait_for_ack(&mut self, _timeout: Duration) -> bool {
        self.acked
    }

    fn is_acknowledged(&self) -> bool {
        self.acked
    }
}
