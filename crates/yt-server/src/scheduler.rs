//! Single-worker FIFO conversion queue.
//!
//! [`Scheduler::submit`] records a job and appends its id to the pending
//! queue. If no worker is running one is spawned; it drains the queue one
//! job at a time and exits when the queue is empty. The queue and the
//! running flag live under one mutex, so a submission can never land between
//! the worker seeing an empty queue and clearing the flag.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use yt_core::{FailureKind, HubEvent, Job, JobPatch, JobStatus, JobStore, NotificationHub, TaskId};
use yt_extract::{run_conversion, ConvertRequest, Extractor, ProgressSender};

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<TaskId>,
    running: bool,
}

struct SchedulerInner {
    store: Arc<JobStore>,
    hub: NotificationHub,
    extractor: Arc<dyn Extractor>,
    state: Mutex<QueueState>,
}

/// Handle to the conversion queue. Cheap to clone.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    pub fn new(store: Arc<JobStore>, hub: NotificationHub, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                hub,
                extractor,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    /// Record a new job and queue it. Returns immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, url: impl Into<String>, bitrate: u32) -> TaskId {
        let id = self.inner.store.create(url, bitrate);
        tracing::info!(task_id = %id, bitrate, "Job queued");
        self.enqueue(id);
        id
    }

    fn enqueue(&self, id: TaskId) {
        let mut state = self.inner.state.lock();
        state.pending.push_back(id);
        if !state.running {
            state.running = true;
            tokio::spawn(run_worker(Arc::clone(&self.inner)));
        }
    }

    /// Jobs waiting behind the one currently converting.
    pub fn pending(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Whether the worker is alive.
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// Wait until `id` reaches a terminal state and return the final record.
    ///
    /// Returns `None` for unknown ids, or if the record is evicted while
    /// waiting.
    pub async fn wait_for_terminal(&self, id: TaskId) -> Option<Job> {
        // Subscribe before looking at the store so a `done` published in
        // between is not missed.
        let mut sub = self.inner.hub.subscribe(id);
        let job = self.inner.store.get(id)?;
        if job.is_terminal() {
            return Some(job);
        }
        while let Some(event) = sub.recv().await {
            if event.is_done() {
                return Some(event.job);
            }
        }
        self.inner.store.get(id).filter(Job::is_terminal)
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Scheduler")
            .field("pending", &state.pending.len())
            .field("running", &state.running)
            .finish()
    }
}

async fn run_worker(inner: Arc<SchedulerInner>) {
    tracing::debug!("Conversion worker started");

    loop {
        let id = {
            let mut state = inner.state.lock();
            match state.pending.pop_front() {
                Some(id) => id,
                None => {
                    state.running = false;
                    break;
                }
            }
        };

        // Run each job in its own task so a panic is contained to that job.
        let job = tokio::spawn(process_job(Arc::clone(&inner), id));
        if let Err(e) = job.await {
            tracing::error!(task_id = %id, "Conversion task aborted: {e}");
            finish(
                &inner,
                id,
                JobPatch::new()
                    .status(JobStatus::Error)
                    .message(format!("Internal error: {e}"))
                    .failure(FailureKind::Internal),
            );
        }
    }

    tracing::debug!("Conversion worker idle");
}

/// Apply `patch` and publish the result as a `progress` event.
fn update(inner: &SchedulerInner, id: TaskId, patch: JobPatch) -> Option<Job> {
    let job = inner.store.update(id, patch)?;
    inner.hub.publish(id, HubEvent::progress(job.clone()));
    Some(job)
}

/// Apply a terminal `patch`, then publish `progress` followed by `done`.
fn finish(inner: &SchedulerInner, id: TaskId, patch: JobPatch) {
    let Some(job) = update(inner, id, patch) else {
        return;
    };
    if job.is_terminal() {
        inner.hub.publish(id, HubEvent::done(job));
    }
}

async fn process_job(inner: Arc<SchedulerInner>, id: TaskId) {
    let Some(job) = inner.store.get(id) else {
        tracing::debug!(task_id = %id, "Job vanished before processing; skipping");
        return;
    };

    tracing::info!(task_id = %id, url = %job.url, "Processing job");
    update(
        &inner,
        id,
        JobPatch::new()
            .status(JobStatus::Downloading)
            .message("Starting download..."),
    );

    let request = ConvertRequest {
        url: job.url.clone(),
        output: job.file_path.clone(),
        bitrate: job.bitrate,
    };

    let progress = {
        let inner = Arc::clone(&inner);
        ProgressSender::new(move |pct, _line| {
            update(
                &inner,
                id,
                JobPatch::new()
                    .progress(pct)
                    .message(format!("Downloading... {pct:.1}%")),
            );
        })
    };

    match run_conversion(inner.extractor.as_ref(), &request, &progress).await {
        Ok(()) => {
            tracing::info!(task_id = %id, file = %request.output.display(), "Job completed");
            finish(
                &inner,
                id,
                JobPatch::new()
                    .status(JobStatus::Completed)
                    .progress(100.0)
                    .message("Completed"),
            );
        }
        Err(e) => {
            tracing::warn!(task_id = %id, error = %e, "Job failed");
            finish(
                &inner,
                id,
                JobPatch::new()
                    .status(JobStatus::Error)
                    .message(e.to_string())
                    .failure(e.failure_kind()),
            );
        }
    }
}
