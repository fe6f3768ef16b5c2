//! JSON payload published for each log record.

use serde::Serialize;
use serde_json::Value;

/// The structured body published to the per-severity topic.
///
/// Field order is the serialized key order: `message`, `additional_data`,
/// then `node` when configured. `additional_data` is `null` when the record
/// carried no auxiliary data; subscribers rely on the key always being
/// present.
#[derive(Clone, Debug, Serialize)]
pub struct LogPayload {
    pub message: String,
    pub additional_data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl LogPayload {
    pub fn new(message: String, additional_data: Value, node: Option<String>) -> Self {
        Self {
            message,
            additional_data,
            node,
        }
    }

    /// Serialize to indented JSON. Serialization of this shape cannot fail;
    /// the fallback keeps the error path total without panicking.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| String::from("{\"message\": \"<unserialisable log payload>\"}"))
    }
}
