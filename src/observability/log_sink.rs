//! Bounded in-memory log sink for the debug endpoints.
//!
//! Holds the most recent entries (newest first) and fans each new entry out
//! to subscribers. Fed from `tracing` through [`SinkLayer`] when debug mode is
//! on; the relays never touch it directly.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use uuid::Uuid;

use crate::config::DebugLevel;

/// Severity of a captured entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    fn from_tracing(level: &Level) -> Self {
        match *level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warning,
            Level::INFO => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

/// One captured log entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: Uuid,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u128,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

/// Handle returned by [`LogSink::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct SinkInner {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    subscribers: Vec<(SubscriptionId, mpsc::Sender<LogEntry>)>,
    next_subscription: u64,
}

/// Shared, bounded log buffer. Clones share the same buffer.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<Mutex<SinkInner>>,
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("LogSink")
            .field("entries", &inner.entries.len())
            .field("capacity", &inner.capacity)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl LogSink {
    /// Create a sink keeping at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(SinkInner {
                entries: VecDeque::with_capacity(capacity),
                capacity,
                subscribers: Vec::new(),
                next_subscription: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SinkInner> {
        // a panic while holding the lock cannot leave the buffer inconsistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an entry, dropping the oldest past capacity, and notify
    /// subscribers. A subscriber whose queue is full misses the entry; one
    /// whose receiver is gone is removed.
    pub fn push(
        &self,
        level: LogLevel,
        target: impl Into<String>,
        message: impl Into<String>,
        fields: BTreeMap<String, String>,
    ) {
        let entry = LogEntry {
            id: Uuid::new_v4(),
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            level,
            target: target.into(),
            message: message.into(),
            fields,
        };

        let mut inner = self.lock();
        inner.entries.push_front(entry.clone());
        let capacity = inner.capacity;
        inner.entries.truncate(capacity);
        inner.subscribers.retain(|(_, tx)| {
            !matches!(
                tx.try_send(entry.clone()),
                Err(mpsc::error::TrySendError::Closed(_))
            )
        });
    }

    /// Current entries, newest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Receive entries pushed from now on. At most `capacity` undelivered
    /// entries are queued per subscriber.
    pub fn subscribe(&self) -> (SubscriptionId, mpsc::Receiver<LogEntry>) {
        let mut inner = self.lock();
        let (tx, rx) = mpsc::channel(inner.capacity);
        let id = SubscriptionId(inner.next_subscription);
        inner.next_subscription += 1;
        inner.subscribers.push((id, tx));
        (id, rx)
    }

    /// Stop delivering to `id`. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub, _)| *sub != id);
        inner.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

/// `tracing` layer copying this crate's events into a [`LogSink`].
pub struct SinkLayer {
    sink: LogSink,
    max_level: Level,
    target_prefix: &'static str,
}

impl SinkLayer {
    pub fn new(sink: LogSink, level: DebugLevel) -> Self {
        let max_level = match level {
            DebugLevel::Normal => Level::INFO,
            DebugLevel::Verbose => Level::DEBUG,
        };
        Self {
            sink,
            max_level,
            target_prefix: "form_relay",
        }
    }
}

impl<S: Subscriber> Layer<S> for SinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // Level orders more verbose as greater
        if *metadata.level() > self.max_level || !metadata.target().starts_with(self.target_prefix) {
            return;
        }

        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);

        self.sink.push(
            LogLevel::from_tracing(metadata.level()),
            metadata.target(),
            visitor.message,
            visitor.fields,
        );
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.insert(field.name().to_string(), format!("{:?}", value));
        }
    }
}
