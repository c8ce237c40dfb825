//! Tracing layer that captures this plugin's log events for the host.
//!
//! The cleaner logs through `tracing` only. Hosts that keep their own log
//! view install [`PluginLogLayer`] and drain the paired [`LogBuffer`] at
//! their own pace. The buffer has its own mutex and is capped, so a host
//! that never drains it does not grow without bound.

use std::sync::{Arc, Mutex};

use chrono::Local;
use tracing::Subscriber;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Maximum log lines held before the oldest are trimmed.
pub const MAX_LOG_LINES: usize = 500;

/// Lines kept after a trim.
pub const LOG_TRIM_TO: usize = 400;

/// Severity of a captured log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

/// One captured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Local wall-clock time, `HH:MM:SS`.
    pub time: String,
    pub level: LogLevel,
    /// Module path that emitted the event.
    pub target: String,
    pub message: String,
}

/// A shared buffer of pending log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<LogLine>>>);

impl LogBuffer {
    /// Drain all pending log lines from the buffer, returning them.
    pub fn drain(&self) -> Vec<LogLine> {
        let mut buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *buf)
    }

    /// Number of pending lines.
    pub fn len(&self) -> usize {
        self.0.lock().map_or(0, |buf| buf.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, line: LogLine) {
        if let Ok(mut buf) = self.0.lock() {
            buf.push(line);
            if buf.len() > MAX_LOG_LINES {
                let trim_to = buf.len() - LOG_TRIM_TO;
                buf.drain(..trim_to);
            }
        }
    }
}

/// A [`tracing_subscriber::Layer`] that captures log events into a
/// [`LogBuffer`].
pub struct PluginLogLayer {
    buffer: LogBuffer,
    min_level: LogLevel,
}

impl PluginLogLayer {
    /// Create a layer capturing `INFO` and above, and its buffer.
    pub fn new() -> (Self, LogBuffer) {
        Self::with_min_level(LogLevel::Info)
    }

    /// Create a layer capturing events at `min_level` and above.
    pub fn with_min_level(min_level: LogLevel) -> (Self, LogBuffer) {
        let buffer = LogBuffer::default();
        (
            Self {
                buffer: buffer.clone(),
                min_level,
            },
            buffer,
        )
    }
}

impl<S: Subscriber + for<'a> LookupSpan<'a>> Layer<S> for PluginLogLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = LogLevel::from(*event.metadata().level());
        if level < self.min_level {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.buffer.push(LogLine {
            time: Local::now().format("%H:%M:%S").to_string(),
            level,
            target: event.metadata().target().to_string(),
            message: visitor.0,
        });
    }
}

/// Install a [`PluginLogLayer`] as the global subscriber and return its
/// buffer. Fails if a global subscriber is already set.
pub fn install(min_level: LogLevel) -> Result<LogBuffer, String> {
    let (layer, buffer) = PluginLogLayer::with_min_level(min_level);
    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| format!("failed to install plugin log layer: {e}"))?;
    Ok(buffer)
}

/// Visitor that keeps only the formatted `message` of an event. This crate
/// logs plain format strings, so other fields are ignored.
#[derive(Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, info, warn};

    fn capture(min_level: LogLevel, f: impl FnOnce()) -> Vec<LogLine> {
        let (layer, buffer) = PluginLogLayer::with_min_level(min_level);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        buffer.drain()
    }

    #[test]
    fn captures_message_and_level() {
        let lines = capture(LogLevel::Info, || info!("removed {} entries", 3));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].level, LogLevel::Info);
        assert_eq!(lines[0].message, "removed 3 entries");
        assert_eq!(lines[0].time.len(), 8);
    }

    #[test]
    fn filters_below_min_level() {
        let lines = capture(LogLevel::Info, || {
            debug!("hidden");
            warn!("shown");
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].message, "shown");
    }

    #[test]
    fn ignores_structured_fields() {
        let lines = capture(LogLevel::Debug, || debug!(cutoff = 3, "window"));
        assert_eq!(lines[0].message, "window");
        assert_eq!(lines[0].target, module_path!());
    }

    #[test]
    fn buffer_is_capped() {
        let lines = capture(LogLevel::Info, || {
            for i in 0..(MAX_LOG_LINES + 1) {
                info!("line {i}");
            }
        });
        assert_eq!(lines.len(), LOG_TRIM_TO);
        assert_eq!(lines.last().unwrap().message, format!("line {MAX_LOG_LINES}"));
    }

    #[test]
    fn drain_empties_buffer() {
        let (layer, buffer) = PluginLogLayer::new();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || info!("once"));
        assert_eq!(buffer.len(), 1);
        buffer.drain();
        assert!(buffer.is_empty());
    }
}
