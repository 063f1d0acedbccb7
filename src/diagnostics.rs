//! Diagnostics sink for load summaries, rule failures and match traces.

use parking_lot::Mutex;

/// Priorities attached to diagnostic messages.
pub mod priority {
    /// Per-record match traces, emitted only when `debug` is set.
    pub const TRACE: u32 = 0;
    /// Load summaries.
    pub const SUMMARY: u32 = 1;
    /// Compile and evaluation failures.
    pub const FAILURE: u32 = 2;
}

/// Receiver of diagnostic messages emitted while loading and evaluating rules.
///
/// Both operations are called from the evaluation hot path on failure and
/// must not block the caller for long.
pub trait Diagnostics: Send + Sync {
    fn log_info(&self, message: &str, priority: u32);
    fn log_error(&self, message: &str, priority: u32);
}

/// Forwards diagnostics to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn log_info(&self, message: &str, priority: u32) {
        tracing::info!(priority, "{message}");
    }

    fn log_error(&self, message: &str, priority: u32) {
        tracing::error!(priority, "{message}");
    }
}

/// Severity of a recorded [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// One message captured by [`MemoryDiagnostics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub level: Level,
    pub message: String,
    pub priority: u32,
}

/// Keeps every message in memory, for callers that render diagnostics
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    events: Mutex<Vec<Event>>,
}

impl MemoryDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<Event> {
        self.filtered(Level::Error)
    }

    #[must_use]
    pub fn infos(&self) -> Vec<Event> {
        self.filtered(Level::Info)
    }

    fn filtered(&self, level: Level) -> Vec<Event> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, level: Level, message: &str, priority: u32) {
        self.events.lock().push(Event {
            level,
            message: message.to_owned(),
            priority,
        });
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn log_info(&self, message: &str, priority: u32) {
        self.push(Level::Info, message, priority);
    }

    fn log_error(&self, message: &str, priority: u32) {
        self.push(Level::Error, message, priority);
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for std::sync::Arc<D> {
    fn log_info(&self, message: &str, priority: u32) {
        (**self).log_info(message, priority);
    }

    fn log_error(&self, message: &str, priority: u32) {
        (**self).log_error(message, priority);
    }
}
