//! Registry of runnable commands.

use crate::commands::runnable::RunnableCommand;
use crate::error::JobError;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps command names to their implementations.
///
/// Populated once at startup and then only read; dispatch never instantiates
/// anything per invocation.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Arc<dyn RunnableCommand>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its own name. Re-registering a name replaces
    /// the previous implementation.
    pub fn register(&mut self, command: Arc<dyn RunnableCommand>) {
        let name = command.name();
        if self.commands.insert(name, command).is_some() {
            log::warn!("Command {} registered twice; keeping the newer one", name);
        }
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn RunnableCommand>, JobError> {
        self.commands
            .get(name)
            .cloned()
            .ok_or_else(|| JobError::UnknownCommand(name.to_string()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
