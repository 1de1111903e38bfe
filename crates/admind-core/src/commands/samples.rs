//! Sample diagnostic commands.
//!
//! These exercise the whole progress pipeline without touching any real
//! server state: fixed-step, unknown-total, deliberate step-back, nested
//! supplemental scopes, and a guaranteed failure. They double as smoke-test
//! commands on a live server and as the workload of the integration suite.
//!
//! All of them accept `key=value` args:
//! - `steps=<n>` — number of steps (where meaningful)
//! - `step_delay_ms=<ms>` — sleep per step, to keep a job observably running

use crate::commands::registry::CommandRegistry;
use crate::commands::runnable::{CommandContext, RunnableCommand};
use crate::error::JobError;
use admind_commons::JobOutcome;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Register every sample command.
pub fn register_samples(registry: &mut CommandRegistry) {
    registry.register(Arc::new(StepsCommand));
    registry.register(Arc::new(NoTotalCommand));
    registry.register(Arc::new(StepBackCommand));
    registry.register(Arc::new(CompoundCommand));
    registry.register(Arc::new(FailCommand));
}

async fn step_delay(ctx: &CommandContext) -> Result<Duration, JobError> {
    Ok(Duration::from_millis(
        ctx.arg_parsed::<u64>("step_delay_ms")?.unwrap_or(0),
    ))
}

/// Declares its total step count up front and advances through equal steps,
/// producing the canonical `0, 100/N, …, 100` percentage sequence.
pub struct StepsCommand;

#[async_trait]
impl RunnableCommand for StepsCommand {
    fn name(&self) -> &'static str {
        "sample-steps"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<JobOutcome, JobError> {
        let steps = ctx.arg_parsed::<u32>("steps")?.unwrap_or(10);
        let delay = step_delay(ctx).await?;

        let progress = ctx.progress();
        progress.set_total_steps(steps);
        for i in 1..=steps {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            progress.advance(1, Some(&format!("step {} of {}", i, steps)));
        }
        progress.finish();

        Ok(JobOutcome::success(format!("completed {} steps", steps)))
    }
}

/// Never declares a total: intermediate events are raw counters, only the
/// start and end sentinels are percentages.
pub struct NoTotalCommand;

#[async_trait]
impl RunnableCommand for NoTotalCommand {
    fn name(&self) -> &'static str {
        "sample-nototal"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<JobOutcome, JobError> {
        let steps = ctx.arg_parsed::<u32>("steps")?.unwrap_or(5);
        let delay = step_delay(ctx).await?;

        let progress = ctx.progress();
        for i in 1..=steps {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            progress.advance(1, Some(&format!("processed item {}", i)));
        }
        progress.finish();

        Ok(JobOutcome::success(format!("processed {} items", steps)))
    }
}

/// Contractually regresses partway through: the one command whose progress
/// sequence is allowed to be non-monotonic. Still reaches 100.
pub struct StepBackCommand;

#[async_trait]
impl RunnableCommand for StepBackCommand {
    fn name(&self) -> &'static str {
        "sample-stepback"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<JobOutcome, JobError> {
        let delay = step_delay(ctx).await?;
        let progress = ctx.progress();

        progress.set_total_steps(10);
        for _ in 0..5 {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            progress.advance(1, None);
        }
        progress.regress(3, Some("rolling back"));
        for _ in 0..8 {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            progress.advance(1, None);
        }
        progress.finish();

        Ok(JobOutcome::success("finished after stepping back"))
    }
}

/// Runs two supplemental sub-commands under child scopes, interleaved with
/// its own root-scope steps.
pub struct CompoundCommand;

#[async_trait]
impl RunnableCommand for CompoundCommand {
    fn name(&self) -> &'static str {
        "sample-compound"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<JobOutcome, JobError> {
        let delay = step_delay(ctx).await?;
        let progress = ctx.progress();

        progress.set_total_steps(4);
        progress.advance(1, Some("preparing"));

        for name in ["first", "second"] {
            let child = progress.child(name);
            child.set_total_steps(4);
            for _ in 0..4 {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                child.advance(1, None);
            }
            child.finish();
            progress.advance(1, Some(&format!("{} phase done", name)));
        }

        progress.advance(1, Some("finalizing"));
        progress.finish();

        Ok(JobOutcome::success("compound run complete"))
    }
}

/// Always fails, optionally after some steps; exercises the `FAILED`
/// terminal path.
pub struct FailCommand;

#[async_trait]
impl RunnableCommand for FailCommand {
    fn name(&self) -> &'static str {
        "sample-fail"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<JobOutcome, JobError> {
        let steps = ctx.arg_parsed::<u32>("steps")?.unwrap_or(2);
        let delay = step_delay(ctx).await?;
        let message = ctx.arg("message").unwrap_or("sample failure").to_string();

        let progress = ctx.progress();
        progress.set_total_steps(10);
        for _ in 0..steps {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            progress.advance(1, None);
        }

        Ok(JobOutcome::failure(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CollectingSink, ProgressReporter, ProgressSink, ProgressTree};
    use admind_commons::ProgressScope;

    async fn run(
        command: &dyn RunnableCommand,
        args: &[&str],
    ) -> (JobOutcome, Vec<admind_commons::ProgressMessage>) {
        let sink = Arc::new(CollectingSink::new());
        let ctx = CommandContext::new(
            args.iter().map(|s| s.to_string()).collect(),
            ProgressReporter::root(Arc::clone(&sink) as Arc<dyn ProgressSink>),
        );
        let outcome = command.execute(&ctx).await.unwrap();
        (outcome, sink.events())
    }

    #[tokio::test]
    async fn test_steps_command_sequence() {
        let (outcome, events) = run(&StepsCommand, &["steps=10"]).await;
        assert!(outcome.is_success());

        let values: Vec<u32> = events.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    }

    #[tokio::test]
    async fn test_stepback_is_not_monotonic_but_finishes() {
        let (outcome, events) = run(&StepBackCommand, &[]).await;
        assert!(outcome.is_success());

        let mut tree = ProgressTree::new();
        for event in events {
            tree.record(event);
        }
        let root = ProgressScope::root();
        assert!(!tree.monotonic(&root));
        assert_eq!(tree.last_value(&root), Some(100));
    }

    #[tokio::test]
    async fn test_nototal_sentinels() {
        let (_, events) = run(&NoTotalCommand, &["steps=3"]).await;
        let percentages: Vec<&admind_commons::ProgressMessage> =
            events.iter().filter(|e| e.percentage).collect();
        assert_eq!(percentages.len(), 2);
        assert_eq!(percentages[0].value, 0);
        assert_eq!(percentages[1].value, 100);
    }

    #[tokio::test]
    async fn test_compound_uses_child_scopes() {
        let (outcome, events) = run(&CompoundCommand, &[]).await;
        assert!(outcome.is_success());

        let scopes: std::collections::HashSet<&str> =
            events.iter().map(|e| e.scope.as_str()).collect();
        assert!(scopes.contains(""));
        assert!(scopes.contains("first"));
        assert!(scopes.contains("second"));

        // Every scope individually well-behaved
        let mut tree = ProgressTree::new();
        for event in events {
            tree.record(event);
        }
        for scope in ["", "first", "second"] {
            let scope = ProgressScope::new(scope);
            assert!(tree.monotonic(&scope));
            assert_eq!(tree.last_value(&scope), Some(100));
        }
    }

    #[tokio::test]
    async fn test_fail_command_outcome() {
        let (outcome, _) = run(&FailCommand, &["message=disk on fire"]).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.message, "disk on fire");
    }
}
