//! Broker client seam.
//!
//! The handler drives brokers exclusively through [`MqttClient`] and
//! [`DeliveryToken`], so the connection-lifecycle and retry logic can be
//! exercised against a scripted double while production code uses
//! [`RumqttcClient`] backed by `rumqttc`.

use std::time::Duration;

use thiserror::Error;

mod rumqttc_client;

pub use rumqttc_client::{RumqttcClient, RumqttcToken};

/// Errors reported by a broker client.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The broker rejected the connection (bad credentials, unavailable).
    #[error("broker refused connection: {0}")]
    Refused(String),
    /// No broker response within the allotted time.
    #[error("timed out waiting for broker")]
    Timeout,
    /// No live session to operate on.
    #[error("not connected to a broker")]
    NotConnected,
    /// Transport-level failure (DNS, TCP, TLS, protocol).
    #[error("broker link error: {0}")]
    Link(String),
}

/// Handle to one in-flight publish, used to await broker acknowledgment.
pub trait DeliveryToken {
    /// Block up to `timeout` for the broker to acknowledge the message.
    /// Returns whether acknowledgment arrived in time.
    fn wait_for_ack(&mut self, timeout: Duration) -> bool;

    /// Whether acknowledgment has already been observed.
    fn is_acknowledged(&self) -> bool;
}

/// One broker session: connect, lazily reconnect, publish, tear down.
///
/// Implementations are driven by a single owner behind a lock; they are not
/// required to tolerate concurrent calls.
pub trait MqttClient: Send {
    type Token: DeliveryToken;

    /// Record credentials to apply on the next `connect`.
    fn set_credentials(&mut self, username: &str, password: &str);

    /// Open a session against `host:port`, waiting up to `timeout` for the
    /// broker's connection acknowledgment.
    fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<(), BrokerError>;

    /// Whether `connect` has ever established a session, connected or not.
    fn has_session(&self) -> bool;

    /// Whether the session is currently believed connected.
    fn is_connected(&self) -> bool;

    /// Re-establish a dropped session without redoing the full connect
    /// handshake configuration. Returns whether the broker reports success.
    fn reconnect(&mut self) -> bool;

    /// Hand `payload` to the broker for `topic`. The returned token awaits
    /// the broker's acknowledgment.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<Self::Token, BrokerError>;

    /// Tear the session down. Best effort; errors are swallowed.
    fn disconnect(&mut self);
}
