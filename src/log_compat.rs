//! Compatibility bridge for the Rust `log` crate.
//!
//! This module provides [`MqttLogAdapter`], an implementation of
//! [`log::Log`] that converts `log::Record` values into
//! [`MqttLogRecord`](crate::log_record::MqttLogRecord)s and forwards them
//! to a shared handler. Registration is an explicit call to [`install`]
//! made by the embedding application; nothing is wired up implicitly at
//! module load.

use std::sync::Arc;

use log::{LevelFilter, Metadata, Record, SetLoggerError};
use serde_json::{Map, Value};

use crate::{handler::Handler, level::Severity, log_record::MqttLogRecord};

/// Adapter implementing the Rust `log::Log` trait.
///
/// Level filtering is left to `log::set_max_level`; every record that
/// reaches the adapter is forwarded.
pub struct MqttLogAdapter {
    handler: Arc<dyn Handler>,
}

impl MqttLogAdapter {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }
}

fn map_log_level(level: log::Level) -> Severity {
    match level {
        log::Level::Trace => Severity::Trace,
        log::Level::Debug => Severity::Debug,
        log::Level::Info => Severity::Info,
        log::Level::Warn => Severity::Warning,
        log::Level::Error => Severity::Error,
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        map_log_level(level)
    }
}

struct KvCollector(Map<String, Value>);

impl<'kvs> log::kv::VisitSource<'kvs> for KvCollector {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        let converted =
            serde_json::to_value(&value).unwrap_or_else(|_| Value::String(value.to_string()));
        self.0.insert(key.to_string(), converted);
        Ok(())
    }
}

fn collect_key_values(record: &Record) -> Value {
    let mut collector = KvCollector(Map::new());
    let _ = record.key_values().visit(&mut collector);
    if collector.0.is_empty() {
        // Absent auxiliary data stays null through serialization.
        Value::Null
    } else {
        Value::Object(collector.0)
    }
}

/// Convert a `log::Record` into the handler's record type.
pub fn to_record(record: &Record) -> MqttLogRecord {
    let severity = map_log_level(record.level());
    MqttLogRecord::new(record.target(), severity, &record.args().to_string())
        .with_args(collect_key_values(record))
}

impl log::Log for MqttLogAdapter {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.handler.emit(to_record(record));
    }

    fn flush(&self) {}
}

/// Install `handler` as the process-wide `log` backend.
///
/// This is a process-global side effect and can only succeed once; the
/// embedding application decides when (and whether) to make it.
pub fn install(handler: Arc<dyn Handler>, max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(MqttLogAdapter::new(handler)))?;
    log::set_max_level(max_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_message_target_and_level() {
        // `format_args!` temporaries must not outlive the statement, so the
        // record is converted in the same expression that builds it.
        let converted = to_record(
            &Record::builder()
                .args(format_args!("disk almost full"))
                .level(log::Level::Warn)
                .target("app.storage")
                .build(),
        );
        assert_eq!(converted.logger, "app.storage");
        assert_eq!(converted.level, "WARNING");
        assert_eq!(converted.message, "disk almost full");
        assert_eq!(converted.args, Value::Null);
    }

    #[test]
    fn captures_key_values_as_structured_args() {
        let kvs: &[(&str, log::kv::Value)] = &[
            ("x", log::kv::Value::from(1)),
            ("y", log::kv::Value::from("test")),
        ];
        let converted = to_record(
            &Record::builder()
                .args(format_args!("measured"))
                .level(log::Level::Info)
                .target("app")
                .key_values(&kvs)
                .build(),
        );
        assert_eq!(converted.args, json!({"x": 1, "y": "test"}));
    }
}
