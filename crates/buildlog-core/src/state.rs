use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Local, TimeDelta};

use crate::diagnostic::{Diagnostic, Severity};

/// Aggregated state of a single build run.
///
/// Every mutator takes `&self` and is safe to call from any number of
/// threads at once: counters are atomic and the diagnostic collections are
/// append-only behind a mutex.
#[derive(Debug, Default)]
pub struct RunState {
    start_time: Mutex<Option<DateTime<Local>>>,
    finish_time: Mutex<Option<DateTime<Local>>>,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    errors: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

/// Point-in-time copy of a [`RunState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSnapshot {
    pub start_time: Option<DateTime<Local>>,
    pub finish_time: Option<DateTime<Local>>,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl RunSnapshot {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Time between start and finish; zero if either is missing.
    pub fn elapsed(&self) -> TimeDelta {
        match (self.start_time, self.finish_time) {
            (Some(start), Some(finish)) => finish - start,
            _ => TimeDelta::zero(),
        }
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
/// Append-only collections and plain timestamps stay valid after a poison.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_started(&self, at: DateTime<Local>) {
        *lock(&self.start_time) = Some(at);
    }

    pub fn mark_finished(&self, at: DateTime<Local>) {
        *lock(&self.finish_time) = Some(at);
    }

    /// Count one finished project. Returns the new total of finished projects.
    pub fn record_project(&self, succeeded: bool) -> usize {
        let counter = if succeeded {
            &self.succeeded
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::SeqCst);
        self.succeeded.load(Ordering::SeqCst) + self.failed.load(Ordering::SeqCst)
    }

    /// Format and append a diagnostic to the matching collection.
    pub fn record_diagnostic(&self, severity: Severity, diagnostic: &Diagnostic) {
        let rendered = diagnostic.render(severity);
        match severity {
            Severity::Error => lock(&self.errors).push(rendered),
            Severity::Warning => lock(&self.warnings).push(rendered),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> usize {
        lock(&self.errors).len()
    }

    pub fn warning_count(&self) -> usize {
        lock(&self.warnings).len()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            start_time: *lock(&self.start_time),
            finish_time: *lock(&self.finish_time),
            succeeded: self.succeeded(),
            failed: self.failed(),
            errors: lock(&self.errors).clone(),
            warnings: lock(&self.warnings).clone(),
        }
    }
}
