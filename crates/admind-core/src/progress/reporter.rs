//! The reporter handle a running command drives its progress through.
//!
//! ## Percentage math
//!
//! When a command declares a total step count of N, each advance emits
//! `round(100 * completed / N)` as a percentage; the full sequence for N
//! equal steps is `0, 100/N, 200/N, …, 100` — N+1 events, the first being
//! the leading 0% emitted when the total is declared.
//!
//! When the total is unknown, intermediate advances emit raw step counters;
//! only the conventional start (0) and end (100) sentinels are flagged as
//! percentages.
//!
//! ## Scopes
//!
//! [`ProgressReporter::child`] opens a supplemental sub-command scope one
//! level below this one. Sibling scopes are independent counters; closing a
//! scope is implicit when no further events use it.

use admind_commons::{ProgressMessage, ProgressScope};
use std::sync::{Arc, Mutex, PoisonError};

/// Receiver of progress events. Implementations must not block the reporting
/// thread for long; slow consumers are the attach layer's problem, not the
/// command's.
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: ProgressMessage);
}

/// Sink that drops everything. Used for terse output suppression: the
/// command still runs to completion, the caller just never sees progress.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _message: ProgressMessage) {}
}

/// Sink that accumulates events in memory. Used by tests and by synchronous
/// callers that want the history after the fact.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressMessage>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressMessage> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for CollectingSink {
    fn report(&self, message: ProgressMessage) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

struct ScopeState {
    total_steps: Option<u32>,
    completed: u32,
    started: bool,
    reached_end: bool,
    finished: bool,
}

/// Handle handed to a running command for reporting progress against one
/// scope. Cheap to share within the command; `child` derives handles for
/// supplemental sub-commands.
pub struct ProgressReporter {
    scope: ProgressScope,
    sink: Arc<dyn ProgressSink>,
    state: Mutex<ScopeState>,
}

impl ProgressReporter {
    /// Reporter for the root scope of a command execution.
    pub fn root(sink: Arc<dyn ProgressSink>) -> Self {
        Self::for_scope(ProgressScope::root(), sink)
    }

    fn for_scope(scope: ProgressScope, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            scope,
            sink,
            state: Mutex::new(ScopeState {
                total_steps: None,
                completed: 0,
                started: false,
                reached_end: false,
                finished: false,
            }),
        }
    }

    pub fn scope(&self) -> &ProgressScope {
        &self.scope
    }

    /// Declare the total step count and emit the leading 0% event.
    pub fn set_total_steps(&self, total: u32) {
        let mut state = self.lock();
        state.total_steps = Some(total.max(1));
        if !state.started {
            state.started = true;
            drop(state);
            self.emit_percentage(0, None);
        }
    }

    /// Advance by `steps` and emit the resulting event.
    pub fn advance(&self, steps: u32, message: Option<&str>) {
        let mut state = self.lock();
        if !state.started {
            // Conventional start sentinel for commands that never declared
            // a total.
            state.started = true;
            drop(state);
            self.emit_percentage(0, None);
            state = self.lock();
        }
        state.completed = state.completed.saturating_add(steps);
        self.emit_current(state, message);
    }

    /// Deliberately step back by `steps` and emit the (lower) resulting
    /// event. Regression is part of a command's contract, never something
    /// the reporter does on its own.
    pub fn regress(&self, steps: u32, message: Option<&str>) {
        let mut state = self.lock();
        state.completed = state.completed.saturating_sub(steps);
        self.emit_current(state, message);
    }

    /// Reporter for a supplemental sub-command scope one level below.
    pub fn child(&self, name: &str) -> ProgressReporter {
        ProgressReporter::for_scope(self.scope.child(name), Arc::clone(&self.sink))
    }

    /// Emit the conventional end sentinel unless an advance already reached
    /// 100%. Idempotent.
    pub fn finish(&self) {
        let mut state = self.lock();
        if state.finished {
            return;
        }
        state.finished = true;
        let skip = state.reached_end;
        drop(state);
        if !skip {
            self.emit_percentage(100, None);
        }
    }

    fn emit_current(&self, mut state: std::sync::MutexGuard<'_, ScopeState>, message: Option<&str>) {
        let owned = message.map(str::to_string);
        match state.total_steps {
            Some(total) => {
                let completed = state.completed.min(total);
                let value = percentage_of(completed, total);
                state.reached_end = value == 100;
                drop(state);
                self.sink.report(ProgressMessage::percentage(
                    self.scope.clone(),
                    value,
                    owned,
                ));
            }
            None => {
                let value = state.completed;
                drop(state);
                self.sink
                    .report(ProgressMessage::counter(self.scope.clone(), value, owned));
            }
        }
    }

    fn emit_percentage(&self, value: u32, message: Option<String>) {
        self.sink
            .report(ProgressMessage::percentage(self.scope.clone(), value, message));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScopeState> {
        // A poisoned scope state only means a panicking command; the counters
        // are still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn percentage_of(completed: u32, total: u32) -> u32 {
    ((completed as f64 / total as f64) * 100.0).round() as u32
}
