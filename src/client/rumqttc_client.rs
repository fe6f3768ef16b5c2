//! Broker client backed by `rumqttc`'s synchronous API.
//!
//! `rumqttc` separates the request handle from the network event loop, so a
//! session spawns a background thread that drives [`rumqttc::Connection`],
//! tracks connectivity from `ConnAck`/link events, and forwards `PubAck`
//! notifications back over a channel. Messages are published at QoS 1 so
//! the broker's `PubAck` carries the acknowledgment the handler waits on.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender, bounded};
use rumqttc::{Client, Connection, ConnectReturnCode, ConnectionError, Event, MqttOptions, Packet, QoS};

use super::{BrokerError, DeliveryToken, MqttClient};

/// Pause between event-loop reconnection attempts while the broker is
/// unreachable.
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);
/// Fallback wait applied to `reconnect` before any `connect` has recorded a
/// caller-chosen timeout.
const DEFAULT_RECONNECT_WAIT: Duration = Duration::from_secs(5);
/// Request queue depth handed to `rumqttc`.
const REQUEST_CAPACITY: usize = 16;

struct SessionState {
    connected: AtomicBool,
    shutdown: AtomicBool,
}

struct Session {
    client: Client,
    state: Arc<SessionState>,
    status_rx: Receiver<Result<(), BrokerError>>,
    acks: Receiver<u16>,
}

/// [`MqttClient`] implementation used outside of tests.
pub struct RumqttcClient {
    client_id: String,
    credentials: Option<(String, String)>,
    reconnect_wait: Duration,
    session: Option<Session>,
}

impl RumqttcClient {
    /// Create an unconnected client identifying itself as `client_id`.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            credentials: None,
            reconnect_wait: DEFAULT_RECONNECT_WAIT,
            session: None,
        }
    }

    fn teardown_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.state.shutdown.store(true, Ordering::SeqCst);
            let _ = session.client.disconnect();
        }
    }

    /// Wait for the event loop to report the outcome of its next connection
    /// attempt, up to `wait`.
    fn await_connection(session: &Session, wait: Duration) -> Result<(), BrokerError> {
        let deadline = Instant::now() + wait;
        loop {
            if session.state.connected.load(Ordering::SeqCst) {
                return Ok(());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(BrokerError::Timeout);
            }
            match session.status_rx.recv_timeout(remaining) {
                Ok(result) => return result,
                Err(_) => return Err(BrokerError::Timeout),
            }
        }
    }
}

impl MqttClient for RumqttcClient {
    type Token = RumqttcToken;

    fn set_credentials(&mut self, username: &str, password: &str) {
        self.credentials = Some((username.to_owned(), password.to_owned()));
    }

    fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<(), BrokerError> {
        // At most one live session per client.
        self.teardown_session();
        self.reconnect_wait = timeout;

        let mut options = MqttOptions::new(self.client_id.clone(), host, port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(true);
        if let Some((username, password)) = &self.credentials {
            options.set_credentials(username.clone(), password.clone());
        }

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        let state = Arc::new(SessionState {
            connected: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        });
        let (status_tx, status_rx) = bounded(8);
        let (ack_tx, ack_rx) = bounded(64);
        let loop_state = Arc::clone(&state);
        thread::spawn(move || event_loop(connection, loop_state, status_tx, ack_tx));

        let session = Session {
            client,
            state,
            status_rx,
            acks: ack_rx,
        };
        let result = Self::await_connection(&session, timeout);
        // Keep the session around even when the first attempt failed: the
        // event loop keeps retrying, and `reconnect` picks up the result of
        // a later attempt.
        self.session = Some(session);
        result
    }

    fn has_session(&self) -> bool {
        self.session.is_some()
    }

    fn is_connected(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.state.connected.load(Ordering::SeqCst))
    }

    fn reconnect(&mut self) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        if session.state.connected.load(Ordering::SeqCst) {
            return true;
        }
        // Discard outcomes of attempts made while nobody was listening.
        while session.status_rx.try_recv().is_ok() {}
        Self::await_connection(session, self.reconnect_wait).is_ok()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<Self::Token, BrokerError> {
        let Some(session) = self.session.as_mut() else {
            return Err(BrokerError::NotConnected);
        };
        // Stale acks belong to publishes whose token was dropped early.
        while session.acks.try_recv().is_ok() {}
        session
            .client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .map_err(|e| BrokerError::Link(e.to_string()))?;
        Ok(RumqttcToken {
            acks: session.acks.clone(),
            acked: false,
        })
    }

    fn disconnect(&mut self) {
        self.teardown_session();
    }
}

/// Pending QoS 1 publish awaiting its `PubAck`.
pub struct RumqttcToken {
    acks: Receiver<u16>,
    acked: bool,
}

impl DeliveryToken for RumqttcToken {
    fn wait_for_ack(&mut self, timeout: Duration) -> bool {
        if !self.acked && self.acks.recv_timeout(timeout).is_ok() {
            self.acked = true;
        }
        self.acked
    }

    fn is_acknowledged(&self) -> bool {
        self.acked
    }
}

fn event_loop(
    mut connection: Connection,
    state: Arc<SessionState>,
    status_tx: Sender<Result<(), BrokerError>>,
    ack_tx: Sender<u16>,
) {
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                let accepted = ack.code == ConnectReturnCode::Success;
                state.connected.store(accepted, Ordering::SeqCst);
                let result = if accepted {
                    Ok(())
                } else {
                    Err(BrokerError::Refused(format!("{:?}", ack.code)))
                };
                let _ = status_tx.try_send(result);
            }
            Ok(Event::Incoming(Packet::PubAck(ack))) => {
                let _ = ack_tx.try_send(ack.pkid);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                state.connected.store(false, Ordering::SeqCst);
            }
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => break,
            Err(err) => {
                state.connected.store(false, Ordering::SeqCst);
                let _ = status_tx.try_send(Err(BrokerError::Link(err.to_string())));
                if state.shutdown.load(Ordering::SeqCst) {
                    break;
                }
                thread::sleep(RECONNECT_PAUSE);
            }
        }
    }
    state.connected.store(false, Ordering::SeqCst);
}
