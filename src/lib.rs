//! Forward application log records to an MQTT topic hierarchy.
//!
//! A [`MqttHandler`] owns one lazily reconnected broker session and
//! publishes each record as an indented JSON payload under
//! `{prefix}/{SEVERITY}`, with lifecycle transitions announced on
//! `{prefix}/state` (`STARTED`, `FINISHED`, `ABORTED`). Delivery is
//! retried through an escalating timeout schedule; when every attempt
//! fails the payload is written to a local diagnostic channel instead.
//! Delivery failure never propagates to the emitting application.
//!
//! ```no_run
//! use mqtt_logger::{Handler, MqttHandler, MqttLogRecord, Severity};
//!
//! let handler = MqttHandler::builder()
//!     .with_host("broker.local")
//!     .with_topic_prefix("sensors/logs")
//!     .with_node("pump-station-3")
//!     .build()
//!     .expect("valid handler configuration");
//!
//! handler.connect();
//! handler.emit(MqttLogRecord::new("app", Severity::Info, "pump started"));
//! handler.disconnect_mqtt(true);
//! ```
//!
//! To use the handler as the backend of the `log` facade, register it
//! explicitly via [`log_compat::install`].

pub mod client;
mod formatter;
mod handler;
mod level;
pub mod log_compat;
mod log_record;
mod mqtt_handler;
mod payload;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

pub use formatter::{DefaultFormatter, Formatter};
pub use handler::Handler;
pub use level::Severity;
pub use log_record::MqttLogRecord;
pub use mqtt_handler::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT, DEFAULT_STATUS_TIMEOUT, DiagnosticSink,
    HandlerBuildError, MqttHandler, MqttHandlerBuilder, MqttHandlerConfig, RetrySchedule,
    STATUS_ABORTED, STATUS_FINISHED, STATUS_STARTED, STATUS_SUBTOPIC,
};
pub use payload::LogPayload;
