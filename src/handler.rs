use crate::log_record::MqttLogRecord;

/// Trait implemented by all log handlers.
///
/// A `Handler` is `Send + Sync` so it can be invoked from multiple threads.
/// Delivery failure must never propagate out of `emit`; implementations
/// resolve failures internally (retry, then diagnostic fallback).
pub trait Handler: Send + Sync {
    /// Dispatch a log record for delivery.
    fn emit(&self, record: MqttLogRecord);
}
