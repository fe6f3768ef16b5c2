//! Public handler type exported by the crate.

use std::time::Duration;

use parking_lot::Mutex;

use crate::{
    client::{MqttClient, RumqttcClient},
    handler::Handler,
    log_record::MqttLogRecord,
};

use super::{MqttHandlerBuilder, config::MqttHandlerConfig, sink::MqttSink};

/// Handler forwarding log records to an MQTT topic hierarchy.
///
/// The sink state sits behind a mutex so concurrent emitters serialize
/// around the connection's check-then-act reconnect sequence. Calls block
/// for at most the sum of the configured retry schedule; callers needing
/// non-blocking logging should emit from their own background task.
///
/// Shutdown is explicit via [`disconnect_mqtt`](Self::disconnect_mqtt);
/// dropping the handler does not publish a lifecycle status.
pub struct MqttHandler<C: MqttClient = RumqttcClient> {
    sink: Mutex<MqttSink<C>>,
}

impl MqttHandler {
    /// Start configuring a handler backed by the default `rumqttc` client.
    pub fn builder() -> MqttHandlerBuilder {
        MqttHandlerBuilder::new()
    }
}

impl<C: MqttClient> MqttHandler<C> {
    pub(super) fn from_parts(client: C, config: MqttHandlerConfig) -> Self {
        Self {
            sink: Mutex::new(MqttSink::new(client, config)),
        }
    }

    /// Open the broker session and publish `STARTED` to the status topic.
    pub fn connect(&self) -> bool {
        self.sink.lock().connect()
    }

    /// Ensure the session is connected; idempotent and cheap when it
    /// already is.
    pub fn reconnect(&self) -> bool {
        self.sink.lock().reconnect()
    }

    /// Whether the session is currently believed connected.
    pub fn is_connected(&self) -> bool {
        self.sink.lock().client.is_connected()
    }

    /// Publish `msg` under `{prefix}/{subtopic}`, waiting up to `wait` for
    /// broker acknowledgment.
    pub fn publish(&self, subtopic: &str, msg: &str, wait: Duration) -> bool {
        self.sink.lock().publish(subtopic, msg, wait)
    }

    /// Publish `FINISHED` (ok) or `ABORTED` (not ok) to the status topic,
    /// then close the session. Best effort; never fails.
    pub fn disconnect_mqtt(&self, ok: bool) {
        self.sink.lock().disconnect(ok);
    }
}

impl<C: MqttClient> Handler for MqttHandler<C> {
    fn emit(&self, record: MqttLogRecord) {
        self.sink.lock().emit(&record);
    }
}

impl<C: MqttClient> std::fmt::Debug for MqttHandler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttHandler")
            .field("config", &self.sink.lock().config)
            .finish_non_exhaustive()
    }
}
