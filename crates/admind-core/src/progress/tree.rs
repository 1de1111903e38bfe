//! Accumulated progress history for one command execution.

use admind_commons::{ProgressMessage, ProgressScope};
use std::collections::HashMap;

/// Ordered record of every progress event a command (and its supplemental
/// sub-commands) emitted, plus the last value seen per scope.
///
/// This is the buffered history replayed to late attachers, and the thing
/// consumers assert ordering invariants against: for well-behaved commands
/// [`ProgressTree::monotonic`] holds per scope; commands whose contract
/// deliberately steps back will fail it, by design of the command.
#[derive(Debug, Default, Clone)]
pub struct ProgressTree {
    events: Vec<ProgressMessage>,
    last: HashMap<String, u32>,
}

impl ProgressTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event. Append-only; the tree never reorders.
    pub fn record(&mut self, message: ProgressMessage) {
        self.last
            .insert(message.scope.as_str().to_string(), message.value);
        self.events.push(message);
    }

    pub fn events(&self) -> &[ProgressMessage] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ProgressMessage> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Last value reported for a scope, if any.
    pub fn last_value(&self, scope: &ProgressScope) -> Option<u32> {
        self.last.get(scope.as_str()).copied()
    }

    /// Whether the values of one scope are non-decreasing over the whole
    /// history.
    pub fn monotonic(&self, scope: &ProgressScope) -> bool {
        let mut previous: Option<u32> = None;
        for event in self.events.iter().filter(|e| &e.scope == scope) {
            if let Some(prev) = previous {
                if event.value < prev {
                    return false;
                }
            }
            previous = Some(event.value);
        }
        true
    }
}
