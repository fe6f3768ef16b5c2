use crate::log_record::MqttLogRecord;

/// Trait for formatting log records into the published message string.
///
/// Implementors must be thread-safe (`Send + Sync`) so a formatter can be
/// shared by every thread emitting through the same handler.
pub trait Formatter: Send + Sync {
    /// Format a log record into its final message string.
    fn format(&self, record: &MqttLogRecord) -> String;
}

#[derive(Copy, Clone, Debug)]
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn format(&self, record: &MqttLogRecord) -> String {
        format!("{}: {}", record.level, record.message)
    }
}
