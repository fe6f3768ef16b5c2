//! Log record representation consumed by the MQTT handler.
//!
//! A record carries the originating logger name, the severity name used for
//! topic fan-out, the message text, and any auxiliary structured data the
//! caller attached. Auxiliary data is held as a [`serde_json::Value`] so it
//! passes through to the published payload losslessly, including the
//! no-data case (`Value::Null`).

use std::fmt;

use serde_json::Value;

use crate::level::Severity;

#[derive(Clone, Debug)]
pub struct MqttLogRecord {
    /// Name of the logger that created this record.
    pub logger: String,
    /// The severity name as a string (e.g. "INFO" or "ERROR"), used
    /// verbatim as the topic suffix.
    pub level: String,
    /// Cached parsed representation of the severity.
    pub parsed_level: Option<Severity>,
    /// The log message content.
    pub message: String,
    /// Auxiliary structured data attached to the record; `Null` when the
    /// caller supplied none.
    pub args: Value,
}

impl MqttLogRecord {
    /// Construct a record from logger `name`, `severity`, and `message`.
    pub fn new(logger: &str, severity: Severity, message: &str) -> Self {
        Self {
            logger: logger.to_owned(),
            level: severity.to_string(),
            parsed_level: Some(severity),
            message: message.to_owned(),
            args: Value::Null,
        }
    }

    /// Construct a record carrying a severity name this crate does not
    /// define. The name still becomes the topic suffix unchanged.
    pub fn with_level_name(logger: &str, level: &str, message: &str) -> Self {
        Self {
            logger: logger.to_owned(),
            level: level.to_owned(),
            parsed_level: level.parse().ok(),
            message: message.to_owned(),
            args: Value::Null,
        }
    }

    /// Attach auxiliary structured data to the record.
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }
}

impl fmt::Display for MqttLogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
