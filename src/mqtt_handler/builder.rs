//! Builder for [`MqttHandler`](super::MqttHandler).
//!
//! Exposes the broker address, credentials, topic prefix, node identifier,
//! retry schedule, timeouts, formatter, and diagnostic channel. Validation
//! happens once at `build` time so a constructed handler always holds a
//! usable configuration.

use std::{sync::Arc, time::Duration};

use thiserror::Error;

use crate::{
    client::{MqttClient, RumqttcClient},
    formatter::Formatter,
};

use super::{
    MqttHandler,
    config::{DEFAULT_PORT, DiagnosticSink, MqttHandlerConfig, RetrySchedule},
};

/// Errors that may occur while building a handler.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    /// Invalid user supplied configuration.
    #[error("invalid handler configuration: {0}")]
    InvalidConfig(String),
}

/// Fluent builder collecting an [`MqttHandlerConfig`].
#[derive(Clone, Debug, Default)]
pub struct MqttHandlerBuilder {
    config: MqttHandlerConfig,
}

impl MqttHandlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the broker hostname. Leaving it unset is allowed; delivery then
    /// fails fast at runtime instead of at build time.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the broker port. Zero selects the default port 1883.
    pub fn with_port(mut self, port: u16) -> Self {
        self.config.port = if port == 0 { DEFAULT_PORT } else { port };
        self
    }

    /// Supply credentials applied when the username is non-empty.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config.username = username.into();
        self.config.password = password.into();
        self
    }

    /// Set the required topic prefix all topics derive from.
    pub fn with_topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.topic_prefix = prefix.into();
        self
    }

    /// Include a static node identifier in every payload.
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.config.node = Some(node.into());
        self
    }

    /// Override the client identifier presented to the broker.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = client_id.into();
        self
    }

    /// Override the wait for the broker's connection acknowledgment.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Override the wait for the lifecycle status publish at shutdown.
    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.config.status_timeout = timeout;
        self
    }

    /// Replace the escalating per-record retry schedule.
    pub fn with_retry_schedule(mut self, schedule: RetrySchedule) -> Self {
        self.config.retry_schedule = schedule;
        self
    }

    /// Replace the message formatter.
    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.config.formatter = formatter;
        self
    }

    /// Redirect the local diagnostic fallback channel.
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticSink) -> Self {
        self.config.diagnostics = diagnostics;
        self
    }

    /// Build a handler driving the default `rumqttc`-backed client.
    pub fn build(self) -> Result<MqttHandler, HandlerBuildError> {
        let client_id = self.config.client_id.clone();
        self.build_with_client(RumqttcClient::new(client_id))
    }

    /// Build a handler driving a caller-supplied broker client.
    pub fn build_with_client<C: MqttClient>(
        self,
        client: C,
    ) -> Result<MqttHandler<C>, HandlerBuildError> {
        let config = self.validate()?;
        Ok(MqttHandler::from_parts(client, config))
    }

    fn validate(self) -> Result<MqttHandlerConfig, HandlerBuildError> {
        if self.config.topic_prefix.is_empty() {
            return Err(HandlerBuildError::InvalidConfig(
                "topic prefix must not be empty".into(),
            ));
        }
        if self.config.retry_schedule.is_empty() {
            return Err(HandlerBuildError::InvalidConfig(
                "retry schedule must contain at least one timeout".into(),
            ));
        }
        Ok(self.config)
    }
}
