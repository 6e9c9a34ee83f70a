//! Service counters.
//!
//! Lock-free `AtomicU64` counters bumped on the connection path and read
//! when a session ends or the service shuts down. Nothing is exported; the
//! snapshot is logged as structured `tracing` fields.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// Atomic counters for service events.
#[derive(Debug)]
pub struct ServiceCounters {
    /// Connections accepted since startup.
    pub connections_accepted: AtomicU64,
    /// Messages answered with a response.
    pub messages_dispatched: AtomicU64,
    /// Frames that were not JSON objects, not UTF-8, or too large.
    pub malformed_messages: AtomicU64,
    /// Well-formed messages with an unrecognized `type`.
    pub unknown_messages: AtomicU64,
    /// Analyses that produced a classification.
    pub analyses_completed: AtomicU64,
    /// Analyses answered with the sentinel result.
    pub analyses_failed: AtomicU64,
}

impl ServiceCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connections_accepted: AtomicU64::new(0),
            messages_dispatched: AtomicU64::new(0),
            malformed_messages: AtomicU64::new(0),
            unknown_messages: AtomicU64::new(0),
            analyses_completed: AtomicU64::new(0),
            analyses_failed: AtomicU64::new(0),
        }
    }

    /// Add one to `counter`.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            messages_dispatched: self.messages_dispatched.load(Ordering::Relaxed),
            malformed_messages: self.malformed_messages.load(Ordering::Relaxed),
            unknown_messages: self.unknown_messages.load(Ordering::Relaxed),
            analyses_completed: self.analyses_completed.load(Ordering::Relaxed),
            analyses_failed: self.analyses_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for ServiceCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// Connections accepted.
    pub connections_accepted: u64,
    /// Messages answered.
    pub messages_dispatched: u64,
    /// Malformed frames.
    pub malformed_messages: u64,
    /// Unknown message kinds.
    pub unknown_messages: u64,
    /// Successful analyses.
    pub analyses_completed: u64,
    /// Degraded analyses.
    pub analyses_failed: u64,
}

impl CounterSnapshot {
    /// Emit the snapshot as one `info` event.
    pub fn log(&self, context: &str) {
        info!(
            connections = self.connections_accepted,
            dispatched = self.messages_dispatched,
            malformed = self.malformed_messages,
            unknown = self.unknown_messages,
            analyses = self.analyses_completed,
            analysis_failures = self.analyses_failed,
            "{context}"
        );
    }
}
