//! Configuration consumed by the MQTT handler lifecycle.
//!
//! `MqttHandlerBuilder` constructs these values before passing them to
//! [`MqttHandler`](super::MqttHandler) for runtime use.

use std::{
    fmt,
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;

use crate::formatter::{DefaultFormatter, Formatter};

/// Default broker port applied when the configured port is zero.
pub const DEFAULT_PORT: u16 = 1883;
/// Default wait for the broker's connection acknowledgment.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default wait for the lifecycle status publish during shutdown.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Topic suffix carrying lifecycle status messages.
pub const STATUS_SUBTOPIC: &str = "state";
/// Status published once a connection is established.
pub const STATUS_STARTED: &str = "STARTED";
/// Status published on clean shutdown.
pub const STATUS_FINISHED: &str = "FINISHED";
/// Status published on unclean shutdown.
pub const STATUS_ABORTED: &str = "ABORTED";

/// Ordered wait timeouts applied across successive publish attempts for one
/// record. Shared by all emissions; the default escalates
/// 0.5 s → 1 s → 2 s → 5 s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrySchedule(Vec<Duration>);

impl Default for RetrySchedule {
    fn default() -> Self {
        Self(vec![
            Duration::from_millis(500),
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(5),
        ])
    }
}

impl RetrySchedule {
    pub fn new(timeouts: impl IntoIterator<Item = Duration>) -> Self {
        Self(timeouts.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Duration> + '_ {
        self.0.iter().copied()
    }
}

/// Local fallback channel used when broker delivery is impossible.
///
/// Writes are line-oriented, synchronous, and best effort; a failing writer
/// is ignored rather than surfaced to the emitting application.
#[derive(Clone)]
pub struct DiagnosticSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl DiagnosticSink {
    /// Wrap an arbitrary writer, e.g. a capture buffer in tests.
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// The conventional fallback channel: process standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    pub(crate) fn line(&self, message: &str) {
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "{message}");
        let _ = writer.flush();
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::stderr()
    }
}

impl fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSink").finish_non_exhaustive()
    }
}

/// Configuration object describing how to construct a
/// [`MqttHandler`](super::MqttHandler).
#[derive(Clone)]
pub struct MqttHandlerConfig {
    /// Broker hostname; empty means unconfigured, making every delivery
    /// attempt fail fast.
    pub host: String,
    pub port: u16,
    /// Credentials applied at connect time when `username` is non-empty.
    pub username: String,
    pub password: String,
    /// Prefix all topics are derived from.
    pub topic_prefix: String,
    /// Static node identifier included in every payload when set.
    pub node: Option<String>,
    /// Client identifier presented to the broker.
    pub client_id: String,
    pub connect_timeout: Duration,
    pub status_timeout: Duration,
    pub retry_schedule: RetrySchedule,
    pub formatter: Arc<dyn Formatter>,
    pub diagnostics: DiagnosticSink,
}

impl Default for MqttHandlerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            topic_prefix: String::new(),
            node: None,
            client_id: format!("mqtt-logger-{}", std::process::id()),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
            retry_schedule: RetrySchedule::default(),
            formatter: Arc::new(DefaultFormatter),
            diagnostics: DiagnosticSink::stderr(),
        }
    }
}

impl MqttHandlerConfig {
    /// Derive the full topic for a suffix: `{prefix}/{subtopic}`.
    pub fn topic(&self, subtopic: &str) -> String {
        format!("{}/{}", self.topic_prefix, subtopic)
    }
}

impl fmt::Debug for MqttHandlerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttHandlerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("topic_prefix", &self.topic_prefix)
            .field("node", &self.node)
            .field("client_id", &self.client_id)
            .field("connect_timeout", &self.connect_timeout)
            .field("status_timeout", &self.status_timeout)
            .field("retry_schedule", &self.retry_schedule)
            .finish_non_exhaustive()
    }
}
