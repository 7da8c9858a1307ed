//! Per-job publish/subscribe channels.
//!
//! [`NotificationHub`] keeps one channel per [`TaskId`] that has at least one
//! observer. Each observer holds a [`Subscription`]; dropping it detaches the
//! observer, and the channel disappears with its last observer. Publishing to
//! an id nobody listens to is a no-op. A `done` event tears the channel down
//! after delivery, so every receiver sees end-of-stream right after it.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::ids::TaskId;
use crate::job::Job;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Event type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Carries the current job record.
    Progress,
    /// Carries the job record at its terminal state. Always the last event.
    Done,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Progress => "progress",
            EventKind::Done => "done",
        }
    }
}

/// A tagged job snapshot delivered to observers.
#[derive(Debug, Clone)]
pub struct HubEvent {
    pub kind: EventKind,
    pub job: Job,
}

impl HubEvent {
    pub fn progress(job: Job) -> Self {
        Self {
            kind: EventKind::Progress,
            job,
        }
    }

    pub fn done(job: Job) -> Self {
        Self {
            kind: EventKind::Done,
            job,
        }
    }

    pub fn is_done(&self) -> bool {
        self.kind == EventKind::Done
    }
}

// ---------------------------------------------------------------------------
// NotificationHub
// ---------------------------------------------------------------------------

/// Opaque handle identifying one observer on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberHandle(u64);

struct Subscriber {
    handle: SubscriberHandle,
    tx: mpsc::UnboundedSender<HubEvent>,
}

#[derive(Default)]
struct HubInner {
    channels: Mutex<HashMap<TaskId, Vec<Subscriber>>>,
    next_handle: AtomicU64,
}

impl HubInner {
    fn detach(&self, id: TaskId, handle: SubscriberHandle) -> bool {
        let mut channels = self.channels.lock();
        let Some(subscribers) = channels.get_mut(&id) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.handle != handle);
        let removed = subscribers.len() < before;
        if subscribers.is_empty() {
            channels.remove(&id);
        }
        removed
    }
}

/// Fan-out of job events to any number of observers per job.
///
/// Cheap to clone; clones share the same channel table.
#[derive(Clone, Default)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new observer to `id`, creating the channel if needed.
    pub fn subscribe(&self, id: TaskId) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SubscriberHandle(self.inner.next_handle.fetch_add(1, Ordering::Relaxed));

        self.inner
            .channels
            .lock()
            .entry(id)
            .or_default()
            .push(Subscriber { handle, tx });

        tracing::trace!(task_id = %id, handle = handle.0, "Subscriber attached");

        Subscription {
            id,
            handle,
            rx,
            hub: Arc::clone(&self.inner),
        }
    }

    /// Deliver `event` to every observer of `id` and return how many got it.
    ///
    /// With no channel this does nothing. A `done` event closes the channel.
    pub fn publish(&self, id: TaskId, event: HubEvent) -> usize {
        let mut channels = self.inner.channels.lock();
        let Some(subscribers) = channels.get_mut(&id) else {
            return 0;
        };

        let done = event.is_done();
        // Delivery happens under the lock so concurrent publishers cannot
        // interleave events for one job.
        subscribers.retain(|s| s.tx.send(event.clone()).is_ok());
        let delivered = subscribers.len();

        if done || subscribers.is_empty() {
            channels.remove(&id);
        }

        delivered
    }

    /// Detach one observer. Returns `false` if it was not attached.
    pub fn unsubscribe(&self, id: TaskId, handle: SubscriberHandle) -> bool {
        self.inner.detach(id, handle)
    }

    /// Observers currently attached to `id`.
    pub fn subscriber_count(&self, id: TaskId) -> usize {
        self.inner
            .channels
            .lock()
            .get(&id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Number of live channels.
    pub fn channel_count(&self) -> usize {
        self.inner.channels.lock().len()
    }
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("channels", &self.channel_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// One observer's end of a job channel. Detaches on drop.
pub struct Subscription {
    id: TaskId,
    handle: SubscriberHandle,
    rx: mpsc::UnboundedReceiver<HubEvent>,
    hub: Arc<HubInner>,
}

impl Subscription {
    pub fn task_id(&self) -> TaskId {
        self.id
    }

    pub fn handle(&self) -> SubscriberHandle {
        self.handle
    }

    /// Next event, or `None` once the channel has been closed.
    pub async fn recv(&mut self) -> Option<HubEvent> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Option<HubEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.hub.detach(self.id, self.handle) {
            tracing::trace!(task_id = %self.id, handle = self.handle.0, "Subscriber detached");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("task_id", &self.id)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
