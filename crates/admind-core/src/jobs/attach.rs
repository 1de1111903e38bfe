//! In-memory broadcast of live progress to concurrent attachers.
//!
//! One channel exists per *running* job. The worker publishes into it; any
//! number of attachers subscribe and all observe the same event sequence
//! (broadcast, not competing consumption). The channel also owns the
//! buffered history a late attacher replays before going live.
//!
//! ## The handoff
//!
//! Snapshotting the buffer and subscribing happen under the same lock the
//! publisher appends under, so the history/live handoff can neither lose nor
//! duplicate an event. If the job finishes between the caller's record
//! lookup and its subscribe, `subscribe` hands back the terminal payload
//! instead of a live receiver — the race resolves to "replay terminal
//! state", never to a lost wakeup.
//!
//! ## Slow attachers
//!
//! The broadcast channel is bounded; a receiver that lags far enough loses
//! the oldest progress events (and is told so), but the terminal event is
//! the final one in the stream and is always still readable. A slow attacher
//! never blocks the worker.

use crate::progress::{ProgressSink, ProgressTree};
use admind_commons::{JobId, JobOutcome, ProgressMessage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Capacity of each per-job broadcast channel.
const CHANNEL_CAPACITY: usize = 1024;

/// One event on a job's live stream.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Progress(ProgressMessage),
    /// Always the last event of a stream.
    Finished(JobOutcome),
}

/// What a subscriber gets back, depending on which side of the terminal
/// transition it arrived.
pub enum Subscription {
    /// Job still running: buffered history plus a live receiver.
    Live {
        history: Vec<ProgressMessage>,
        events: broadcast::Receiver<JobEvent>,
    },
    /// Job finished while we were attaching: full history plus the outcome.
    Finished {
        history: Vec<ProgressMessage>,
        outcome: JobOutcome,
    },
}

struct ChannelState {
    buffer: ProgressTree,
    outcome: Option<JobOutcome>,
}

struct JobChannel {
    state: Mutex<ChannelState>,
    tx: broadcast::Sender<JobEvent>,
}

impl JobChannel {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(ChannelState {
                buffer: ProgressTree::new(),
                outcome: None,
            }),
            tx,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of live channels, keyed by job id. Entries exist only while the
/// job is running; `finish` retires them.
#[derive(Default)]
pub struct AttachRegistry {
    channels: RwLock<HashMap<JobId, Arc<JobChannel>>>,
}

impl AttachRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the channel for a freshly started job.
    pub fn open(&self, id: &JobId) {
        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        channels.insert(id.clone(), Arc::new(JobChannel::new()));
    }

    /// Whether a live channel exists (i.e. the job is still running here).
    pub fn is_open(&self, id: &JobId) -> bool {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    fn channel(&self, id: &JobId) -> Option<Arc<JobChannel>> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Append a progress event to the buffer and broadcast it. No-op once
    /// the channel is retired.
    pub fn publish(&self, id: &JobId, message: ProgressMessage) {
        if let Some(channel) = self.channel(id) {
            let mut state = channel.lock();
            state.buffer.record(message.clone());
            // Receivers may not exist; that is fine.
            let _ = channel.tx.send(JobEvent::Progress(message));
        }
    }

    /// Snapshot of the buffered history so far.
    pub fn history(&self, id: &JobId) -> Vec<ProgressMessage> {
        match self.channel(id) {
            Some(channel) => channel.lock().buffer.events().to_vec(),
            None => Vec::new(),
        }
    }

    /// Broadcast the terminal payload and retire the channel. Subscribers
    /// already live receive `Finished` as their last event; later lookups
    /// fall through to the persisted record.
    pub fn finish(&self, id: &JobId, outcome: JobOutcome) {
        let channel = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if let Some(channel) = channel {
            let mut state = channel.lock();
            state.outcome = Some(outcome.clone());
            let _ = channel.tx.send(JobEvent::Finished(outcome));
        }
    }

    /// Subscribe to a job's stream. `None` means no live channel exists —
    /// the job already finished (or never ran here) and the caller should
    /// consult the store.
    pub fn subscribe(&self, id: &JobId) -> Option<Subscription> {
        let channel = self.channel(id)?;
        let state = channel.lock();
        let history = state.buffer.events().to_vec();
        match &state.outcome {
            Some(outcome) => Some(Subscription::Finished {
                history,
                outcome: outcome.clone(),
            }),
            None => Some(Subscription::Live {
                history,
                events: channel.tx.subscribe(),
            }),
        }
    }
}

/// Sink adapter routing a worker's progress into the registry.
pub struct ChannelSink {
    registry: Arc<AttachRegistry>,
    id: JobId,
}

impl ChannelSink {
    pub fn new(registry: Arc<AttachRegistry>, id: JobId) -> Self {
        Self { registry, id }
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, message: ProgressMessage) {
        self.registry.publish(&self.id, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admind_commons::ProgressScope;

    fn pct(value: u32) -> ProgressMessage {
        ProgressMessage::percentage(ProgressScope::root(), value, None)
    }

    #[test]
    fn test_publish_buffers_history() {
        let registry = AttachRegistry::new();
        let id = JobId::new("1");
        registry.open(&id);

        registry.publish(&id, pct(0));
        registry.publish(&id, pct(50));

        let history = registry.history(&id);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].value, 50);
    }

    #[tokio::test]
    async fn test_subscribe_replays_then_streams() {
        let registry = AttachRegistry::new();
        let id = JobId::new("1");
        registry.open(&id);
        registry.publish(&id, pct(0));

        let Some(Subscription::Live { history, mut events }) = registry.subscribe(&id) else {
            panic!("expected live subscription");
        };
        assert_eq!(history.len(), 1);

        registry.publish(&id, pct(40));
        match events.recv().await.unwrap() {
            JobEvent::Progress(m) => assert_eq!(m.value, 40),
            other => panic!("unexpected event: {:?}", other),
        }

        registry.finish(&id, JobOutcome::success("done"));
        match events.recv().await.unwrap() {
            JobEvent::Finished(outcome) => assert!(outcome.is_success()),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_subscribe_after_finish_sees_terminal() {
        let registry = AttachRegistry::new();
        let id = JobId::new("1");
        registry.open(&id);
        registry.publish(&id, pct(100));
        registry.finish(&id, JobOutcome::success("done"));

        // Channel retired: the store is now authoritative.
        assert!(registry.subscribe(&id).is_none());
        assert!(!registry.is_open(&id));
    }

    #[test]
    fn test_publish_after_finish_is_noop() {
        let registry = AttachRegistry::new();
        let id = JobId::new("1");
        registry.open(&id);
        registry.finish(&id, JobOutcome::failure("gone"));
        registry.publish(&id, pct(10));
        assert!(registry.history(&id).is_empty());
    }
}
