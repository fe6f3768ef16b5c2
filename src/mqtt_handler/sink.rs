//! Connection-lifecycle and publish-retry state machine.
//!
//! One `MqttSink` owns one broker client, so the reconnect-before-publish
//! discipline lives in a single place: every delivery path calls
//! [`MqttSink::reconnect`], which is idempotent and cheap when the session
//! is already up.

use std::time::Duration;

use crate::{
    client::{DeliveryToken, MqttClient},
    log_record::MqttLogRecord,
    payload::LogPayload,
};

use super::config::{
    MqttHandlerConfig, STATUS_ABORTED, STATUS_FINISHED, STATUS_STARTED, STATUS_SUBTOPIC,
};

pub(super) struct MqttSink<C: MqttClient> {
    pub(super) client: C,
    pub(super) config: MqttHandlerConfig,
}

impl<C: MqttClient> MqttSink<C> {
    pub(super) fn new(client: C, config: MqttHandlerConfig) -> Self {
        Self { client, config }
    }

    /// Open the broker session and announce `STARTED` on the status topic.
    ///
    /// Failure is reported on the diagnostic channel and returned as
    /// `false`; the caller decides how to proceed.
    pub(super) fn connect(&mut self) -> bool {
        if !self.config.username.is_empty() {
            self.client
                .set_credentials(&self.config.username, &self.config.password);
        }
        match self.client.connect(
            &self.config.host,
            self.config.port,
            self.config.connect_timeout,
        ) {
            Ok(()) => {
                // Fire-and-forget lifecycle notice; no ack wait.
                let _ = self
                    .client
                    .publish(&self.config.topic(STATUS_SUBTOPIC), STATUS_STARTED.as_bytes());
                true
            }
            Err(err) => {
                self.config.diagnostics.line(&format!(
                    "Cannot connect to mqttserver {} error is {err}",
                    self.config.host
                ));
                false
            }
        }
    }

    /// Idempotent ensure-connected.
    ///
    /// No host configured is a no-op failure. A client without a session
    /// yet delegates to [`connect`](Self::connect). An already-connected
    /// session short-circuits without touching the broker. Otherwise the
    /// client performs a lightweight reconnect.
    pub(super) fn reconnect(&mut self) -> bool {
        if self.config.host.is_empty() {
            return false;
        }
        if !self.client.has_session() {
            return self.connect();
        }
        if self.client.is_connected() {
            return true;
        }
        self.client.reconnect()
    }

    /// Publish `msg` under `{prefix}/{subtopic}` and wait up to `wait` for
    /// broker acknowledgment. Failure is silent here; reporting belongs to
    /// the emitter.
    pub(super) fn publish(&mut self, subtopic: &str, msg: &str, wait: Duration) -> bool {
        if !self.reconnect() {
            return false;
        }
        match self
            .client
            .publish(&self.config.topic(subtopic), msg.as_bytes())
        {
            Ok(mut token) => token.wait_for_ack(wait),
            Err(_) => false,
        }
    }

    /// Announce shutdown on the status topic, then tear the session down
    /// unconditionally.
    pub(super) fn disconnect(&mut self, ok: bool) {
        let status = if ok { STATUS_FINISHED } else { STATUS_ABORTED };
        let _ = self.publish(STATUS_SUBTOPIC, status, self.config.status_timeout);
        self.client.disconnect();
    }

    /// Deliver one record: format, serialize, walk the retry schedule, and
    /// fall back to the diagnostic channel when every attempt fails. Never
    /// panics and never propagates an error to the logging call site.
    pub(super) fn emit(&mut self, record: &MqttLogRecord) {
        let message = self.config.formatter.format(record);
        let payload = LogPayload::new(message, record.args.clone(), self.config.node.clone());
        let json = payload.to_json();

        if self.client.is_connected() || self.reconnect() {
            let schedule = self.config.retry_schedule.clone();
            for wait in schedule.iter() {
                if self.publish(&record.level, &json, wait) {
                    return;
                }
            }
        }

        self.config
            .diagnostics
            .line(&format!("Could not log message {json} to mqtt!"));
    }
}
