//! The command execution trait and its context.

use crate::error::JobError;
use crate::progress::ProgressReporter;
use admind_commons::JobOutcome;
use async_trait::async_trait;
use std::str::FromStr;

/// Execution context handed to a running command: its arguments and the
/// progress reporter for the command's root scope.
///
/// The reporter is borrowed from the context, so a command cannot keep
/// reporting after `execute` returns.
pub struct CommandContext {
    args: Vec<String>,
    progress: ProgressReporter,
}

impl CommandContext {
    pub fn new(args: Vec<String>, progress: ProgressReporter) -> Self {
        Self { args, progress }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn progress(&self) -> &ProgressReporter {
        &self.progress
    }

    /// Value of a `key=value` argument, if present.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| {
            let (k, v) = arg.split_once('=')?;
            (k == key).then_some(v)
        })
    }

    /// Parsed value of a `key=value` argument.
    pub fn arg_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, JobError> {
        match self.arg(key) {
            None => Ok(None),
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                JobError::InvalidArgument(format!("{}={} is not a valid value", key, raw))
            }),
        }
    }
}

/// A long-running administrative operation the job manager can execute.
///
/// `execute` reports progress zero or more times through the context and
/// returns a tagged [`JobOutcome`]; a failure outcome is a normal result
/// (the operation ran and reported failure), while `Err` means the command
/// itself broke. Both end up as the job's terminal `FAILED` state when the
/// command runs detached — neither crosses the worker boundary as a panic.
#[async_trait]
pub trait RunnableCommand: Send + Sync {
    /// Registry name of this command.
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &CommandContext) -> Result<JobOutcome, JobError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{NullSink, ProgressReporter};
    use std::sync::Arc;

    fn ctx(args: &[&str]) -> CommandContext {
        CommandContext::new(
            args.iter().map(|s| s.to_string()).collect(),
            ProgressReporter::root(Arc::new(NullSink)),
        )
    }

    #[test]
    fn test_arg_lookup() {
        let ctx = ctx(&["steps=10", "label=full backup"]);
        assert_eq!(ctx.arg("steps"), Some("10"));
        assert_eq!(ctx.arg("label"), Some("full backup"));
        assert_eq!(ctx.arg("missing"), None);
    }

    #[test]
    fn test_arg_parsed() {
        let ctx = ctx(&["steps=10", "delay=abc"]);
        assert_eq!(ctx.arg_parsed::<u32>("steps").unwrap(), Some(10));
        assert_eq!(ctx.arg_parsed::<u32>("missing").unwrap(), None);
        assert!(matches!(
            ctx.arg_parsed::<u32>("delay"),
            Err(JobError::InvalidArgument(_))
        ));
    }
}
