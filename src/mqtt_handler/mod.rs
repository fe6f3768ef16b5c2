//! MQTT-based logging handler implementation.
//!
//! This module defines [`MqttHandler`], a handler that serializes
//! [`MqttLogRecord`](crate::log_record::MqttLogRecord) values into indented
//! JSON payloads and publishes them under a per-severity topic
//! (`{prefix}/{SEVERITY}`). The handler owns one lazily reconnected broker
//! session, announces lifecycle transitions on `{prefix}/state`, retries
//! each record through an escalating timeout schedule, and falls back to a
//! local diagnostic channel when delivery is impossible.

mod builder;
mod config;
mod handler;
mod sink;

#[cfg(test)]
mod tests;

pub use builder::{HandlerBuildError, MqttHandlerBuilder};
pub use config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT, DEFAULT_STATUS_TIMEOUT, DiagnosticSink,
    MqttHandlerConfig, RetrySchedule, STATUS_ABORTED, STATUS_FINISHED, STATUS_STARTED,
    STATUS_SUBTOPIC,
};
pub use handler::MqttHandler;
