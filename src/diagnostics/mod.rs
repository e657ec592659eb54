//! Diagnostics channel for the composing engine.
//!
//! The engine never writes user-facing text itself. Every notification
//! becomes an [`Event`] handed to a [`DiagnosticSink`] chosen by the
//! caller, and is mirrored to `tracing` at the matching level.
//!
//! The [`Reporter`] is the producer side shared by all phases. It also
//! implements the stop-on-first-issue mode: the first warning or error
//! trips the cancellation token.

mod event;
mod sink;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub use event::{Arg, Event, EventKind, MessageKind};
pub use sink::{ChannelSink, DiagnosticSink, EventLog, NullSink};

use crate::cancel::CancelToken;

/// Shared producer handle for diagnostic events.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn DiagnosticSink>,
    cancel: CancelToken,
    fail_fast: bool,
    tripped: Arc<AtomicBool>,
    abort_noted: Arc<AtomicBool>,
    issues: Arc<AtomicUsize>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn DiagnosticSink>, cancel: CancelToken) -> Self {
        Self {
            sink,
            cancel,
            fail_fast: false,
            tripped: Arc::new(AtomicBool::new(false)),
            abort_noted: Arc::new(AtomicBool::new(false)),
            issues: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reporter that drops everything; handy in tests.
    pub fn silent() -> Self {
        Self::new(Arc::new(NullSink), CancelToken::new())
    }

    /// Abort on the first warning, error or critical event.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Number of warning/error/critical events emitted so far.
    pub fn issue_count(&self) -> usize {
        self.issues.load(Ordering::Relaxed)
    }

    /// Log and forward an event.
    pub fn emit(&self, event: Event) {
        mirror(&event);
        self.sink.emit(&event);

        if event.kind.is_issue() {
            self.issues.fetch_add(1, Ordering::Relaxed);
            if self.fail_fast && !self.tripped.swap(true, Ordering::SeqCst) {
                self.emit(
                    Event::new(EventKind::Critical, "Fail Fast: {}...")
                        .arg("Auto-Aborting")
                        .classified(MessageKind::CritGeneric),
                );
                self.request_abort();
            }
        }
    }

    /// Trip the cancellation flag, noting it once.
    pub fn request_abort(&self) {
        if !self.abort_noted.swap(true, Ordering::SeqCst) {
            self.status(Event::new(EventKind::Status, "Abort requested."));
        }
        self.cancel.cancel();
    }

    pub fn status(&self, event: Event) {
        debug_assert_eq!(event.kind, EventKind::Status);
        self.emit(event);
    }

    pub fn warning(&self, class: MessageKind, template: &'static str, args: Vec<Arg>) {
        self.issue(EventKind::Warning, class, template, args);
    }

    pub fn error(&self, class: MessageKind, template: &'static str, args: Vec<Arg>) {
        self.issue(EventKind::Error, class, template, args);
    }

    pub fn critical(&self, class: MessageKind, template: &'static str, args: Vec<Arg>) {
        self.issue(EventKind::Critical, class, template, args);
    }

    fn issue(&self, kind: EventKind, class: MessageKind, template: &'static str, args: Vec<Arg>) {
        let mut event = Event::new(kind, template).classified(class);
        event.args = args;
        self.emit(event);
    }

    pub fn progress_percent(&self, sheet: &str, percent: u8) {
        self.emit(
            Event::new(EventKind::ProgressPercent, "{}: {}%")
                .arg(Arg::Sheet(sheet.to_string()))
                .arg(percent as i64),
        );
    }

    pub fn progress_image(&self, sheet: &str) {
        self.emit(Event::new(EventKind::ProgressImage, "{}").arg(Arg::Sheet(sheet.to_string())));
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("fail_fast", &self.fail_fast)
            .field("issues", &self.issue_count())
            .finish()
    }
}

fn mirror(event: &Event) {
    let code = event.class.map(|c| c.code()).unwrap_or("tilecomp");
    match event.kind {
        EventKind::Critical | EventKind::Error => {
            tracing::error!(code, "{}", event.render())
        }
        EventKind::Warning => tracing::warn!(code, "{}", event.render()),
        EventKind::Status | EventKind::Finished | EventKind::Loading | EventKind::Composing => {
            tracing::info!("{}", event.render())
        }
        EventKind::ProgressPercent | EventKind::ProgressCount | EventKind::ProgressImage => {
            tracing::trace!("{}", event.render())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter_with_log(fail_fast: bool) -> (Reporter, Arc<EventLog>) {
        let log = Arc::new(EventLog::new());
        let reporter = Reporter::new(log.clone(), CancelToken::new()).with_fail_fast(fail_fast);
        (reporter, log)
    }

    #[test]
    fn test_warning_is_forwarded() {
        let (reporter, log) = reporter_with_log(false);
        reporter.warning(
            MessageKind::EmptyEntry,
            "Skipping empty entry in {}.",
            vec![Arg::Path("a.json".into())],
        );

        let events = log.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].render(), "Skipping empty entry in a.json.");
        assert_eq!(reporter.issue_count(), 1);
        assert!(!reporter.cancel_token().is_cancelled());
    }

    #[test]
    fn test_fail_fast_trips_once() {
        let (reporter, log) = reporter_with_log(true);
        reporter.error(MessageKind::DuplicateId, "ID {} twice", vec![Arg::Id("a".into())]);
        reporter.error(MessageKind::DuplicateId, "ID {} twice", vec![Arg::Id("b".into())]);

        assert!(reporter.cancel_token().is_cancelled());
        assert_eq!(
            log.events()
                .iter()
                .filter(|e| e.render() == "Fail Fast: Auto-Aborting...")
                .count(),
            1
        );
        assert_eq!(log.count(EventKind::Status), 1);
    }

    #[test]
    fn test_status_does_not_trip_fail_fast() {
        let (reporter, _log) = reporter_with_log(true);
        reporter.status(Event::new(EventKind::Status, "Parsing"));
        assert!(!reporter.cancel_token().is_cancelled());
    }

    #[test]
    fn test_request_abort_noted_once() {
        let (reporter, log) = reporter_with_log(false);
        reporter.request_abort();
        reporter.request_abort();
        assert_eq!(log.count(EventKind::Status), 1);
        assert!(reporter.cancel_token().is_cancelled());
    }
}
