//! `tracing` plumbing for the window: technical detail goes to an in-window
//! log panel and to stderr, never into the user-facing status line.
use std::fmt;
use std::sync::{Arc, Mutex};

use once_cell::sync::{Lazy, OnceCell};
use tracing::{Event, Subscriber, field::Visit};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

/// Entries kept in the shared buffer and in the panel.
pub const LOG_CAPACITY: usize = 1000;

#[derive(Clone, Debug)]
pub struct LogEntry {
    pub level: tracing::Level,
    pub timestamp: String,
    pub message: String,
    pub target: String,
}

impl LogEntry {
    pub fn new(level: tracing::Level, message: String, target: String) -> Self {
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        Self {
            level,
            timestamp,
            message,
            target,
        }
    }
}

static LOG_BUFFER: Lazy<Arc<Mutex<Vec<LogEntry>>>> =
    Lazy::new(|| Arc::new(Mutex::new(Vec::new())));

static LOGGING_INIT: OnceCell<()> = OnceCell::new();

/// Move everything logged since the last call out of the shared buffer.
pub fn drain_new_entries() -> Vec<LogEntry> {
    match LOG_BUFFER.lock() {
        Ok(mut buf) => buf.drain(..).collect(),
        Err(_) => Vec::new(),
    }
}

/// Append `entries` to `logs`, keeping the newest [`LOG_CAPACITY`].
pub fn append_bounded(logs: &mut Vec<LogEntry>, entries: Vec<LogEntry>) {
    logs.extend(entries);
    let len = logs.len();
    if len > LOG_CAPACITY {
        logs.drain(0..(len - LOG_CAPACITY));
    }
}

/// Install the window's subscriber once per process: the panel layer plus a
/// plain `fmt` layer on stderr. The filter is fixed; no environment is read.
pub fn init_logging() {
    LOGGING_INIT.get_or_init(|| {
        let filter = EnvFilter::new("info,cowwy=debug,eframe=warn,egui_glow=warn,winit=warn");
        let subscriber = Registry::default()
            .with(GuiLogLayer::new())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(filter);
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

pub struct GuiLogLayer;

impl GuiLogLayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GuiLogLayer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    /// The message followed by structured fields as `key=value`.
    fn finish(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        let fields = self.fields.join(" ");
        if self.message.is_empty() {
            fields
        } else {
            format!("{} {}", self.message, fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

impl<S> Layer<S> for GuiLogLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut message = visitor.finish();
        if message.is_empty() {
            message = metadata.target().to_string();
        }

        let entry = LogEntry::new(*metadata.level(), message, metadata.target().to_string());

        if let Ok(mut buf) = LOG_BUFFER.lock() {
            buf.push(entry);
            if buf.len() > LOG_CAPACITY {
                buf.remove(0);
            }
        }
    }
}
