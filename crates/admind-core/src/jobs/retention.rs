//! Background retention scheduler.

use crate::jobs::manager::JobManagerService;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Periodically purges terminal job records whose age exceeds the configured
/// retention period.
///
/// Runs on its own schedule: waits `cleanup_initial_delay` once, then purges
/// and sleeps `cleanup_poll_interval` in a loop. Both durations are re-read
/// from the manager's policy cell on every iteration, so a
/// `configure_retention` call mid-sleep applies to the next tick without a
/// restart.
pub struct RetentionScheduler;

impl RetentionScheduler {
    /// Spawn the scheduler task. Abort the handle to stop it.
    pub fn spawn(manager: Arc<JobManagerService>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let initial = manager.retention_policy().cleanup_initial_delay;
            log::debug!("Retention scheduler started; first sweep in {:?}", initial);
            tokio::time::sleep(initial).await;

            loop {
                match manager.purge_expired() {
                    Ok(0) => {}
                    Ok(purged) => log::info!("Retention sweep purged {} expired jobs", purged),
                    Err(e) => log::error!("Retention sweep failed: {}", e),
                }

                let interval = manager.retention_policy().cleanup_poll_interval;
                tokio::time::sleep(interval).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{register_samples, CommandRegistry};
    use admind_commons::RetentionPolicy;
    use admind_store::InMemoryBackend;
    use std::time::Duration;

    fn make_manager() -> Arc<JobManagerService> {
        let mut registry = CommandRegistry::new();
        register_samples(&mut registry);
        Arc::new(JobManagerService::new(
            Arc::new(InMemoryBackend::new()),
            Arc::new(registry),
        ))
    }

    #[tokio::test]
    async fn test_scheduler_can_be_aborted() {
        let manager = make_manager();
        manager.configure_retention(RetentionPolicy {
            job_retention_period: Duration::from_secs(1),
            cleanup_initial_delay: Duration::from_millis(10),
            cleanup_poll_interval: Duration::from_millis(10),
        });

        let handle = RetentionScheduler::spawn(Arc::clone(&manager));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
