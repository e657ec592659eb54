//! Observers for diagnostic events.

use std::sync::Mutex;

use crossbeam_channel::{Receiver, Sender};

use super::event::{Event, EventKind, MessageKind};

/// Receives every event the engine produces.
///
/// Implementations must be callable from several composing workers at
/// once and must return promptly.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: &Event);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _event: &Event) {}
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Count events of a kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.lock().iter().filter(|e| e.kind == kind).count()
    }

    /// Events carrying the given classification.
    pub fn of_class(&self, class: MessageKind) -> Vec<Event> {
        self.lock()
            .iter()
            .filter(|e| e.class == Some(class))
            .cloned()
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.lock()
            .iter()
            .any(|e| matches!(e.kind, EventKind::Error | EventKind::Critical))
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        // A panicking observer must not hide the events gathered so far.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DiagnosticSink for EventLog {
    fn emit(&self, event: &Event) {
        self.lock().push(event.clone());
    }
}

/// Forwards events over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Event>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel.
    pub fn new() -> (Self, Receiver<Event>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl DiagnosticSink for ChannelSink {
    fn emit(&self, event: &Event) {
        // Nobody listening any more is not the producer's problem.
        let _ = self.tx.send(event.clone());
    }
}
