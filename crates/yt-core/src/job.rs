//! Job records and the in-memory [`JobStore`].
//!
//! A [`Job`] is created once at submission and afterwards only mutated
//! through [`JobStore::update`], which merges a [`JobPatch`] and refreshes
//! `updatedAt`. Status changes that would break the
//! `queued -> downloading -> completed | error` machine are dropped.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::ids::TaskId;

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Downloading,
    Completed,
    Error,
}

impl JobStatus {
    /// `completed` and `error` are final.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Downloading)
                | (JobStatus::Downloading, JobStatus::Completed)
                | (JobStatus::Downloading, JobStatus::Error)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a job ended in [`JobStatus::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The tool exited non-zero or the sidecar reported an error.
    Tool,
    /// The tool reported success but no output file exists.
    MissingOutput,
    /// Anything else (I/O while checking the output, internal bugs).
    Internal,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One requested URL-to-MP3 conversion and its tracked state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: TaskId,
    pub url: String,
    pub bitrate: u32,
    pub status: JobStatus,
    pub progress: f32,
    pub message: String,
    pub file_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Build a fresh `queued` job writing to `<output_dir>/<id>.mp3`.
    pub fn new(id: TaskId, url: String, bitrate: u32, output_dir: &Path) -> Self {
        let now = Utc::now();
        Self {
            id,
            url,
            bitrate,
            status: JobStatus::Queued,
            progress: 0.0,
            message: "Queued".to_string(),
            file_path: output_dir.join(format!("{id}.mp3")),
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merge `patch` into this record and stamp `updated_at`.
    pub fn apply(&mut self, patch: JobPatch) {
        if let Some(next) = patch.status {
            if next != self.status {
                if self.status.can_transition_to(next) {
                    self.status = next;
                } else {
                    tracing::warn!(
                        task_id = %self.id,
                        from = %self.status,
                        to = %next,
                        "Ignoring illegal job status transition"
                    );
                }
            }
        }
        if let Some(progress) = patch.progress {
            self.progress = progress.clamp(0.0, 100.0);
        }
        if let Some(message) = patch.message {
            self.message = message;
        }
        if let Some(failure) = patch.failure {
            self.failure = Some(failure);
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update merged into a [`Job`] by [`JobStore::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub progress: Option<f32>,
    pub message: Option<String>,
    pub failure: Option<FailureKind>,
}

impl JobPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn progress(mut self, progress: f32) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn failure(mut self, failure: FailureKind) -> Self {
        self.failure = Some(failure);
        self
    }
}

// ---------------------------------------------------------------------------
// JobStore
// ---------------------------------------------------------------------------

/// Exclusive owner of all job records, keyed by [`TaskId`].
#[derive(Debug)]
pub struct JobStore {
    jobs: RwLock<HashMap<TaskId, Job>>,
    output_dir: PathBuf,
}

impl JobStore {
    /// Create an empty store whose jobs write into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            output_dir: output_dir.into(),
        }
    }

    /// Directory every job's destination path lives in.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Register a new `queued` job and return its id.
    pub fn create(&self, url: impl Into<String>, bitrate: u32) -> TaskId {
        let id = TaskId::new();
        let job = Job::new(id, url.into(), bitrate, &self.output_dir);
        self.jobs.write().insert(id, job);
        id
    }

    /// Snapshot of the job, if it exists.
    pub fn get(&self, id: TaskId) -> Option<Job> {
        self.jobs.read().get(&id).cloned()
    }

    /// Merge `patch` into an existing job and return the updated snapshot.
    ///
    /// Unknown ids are ignored: a late update after cleanup must not fail
    /// and must not resurrect the record.
    pub fn update(&self, id: TaskId, patch: JobPatch) -> Option<Job> {
        let mut jobs = self.jobs.write();
        let job = jobs.get_mut(&id)?;
        job.apply(patch);
        Some(job.clone())
    }

    /// Drop a record. Returns the removed job.
    pub fn remove(&self, id: TaskId) -> Option<Job> {
        self.jobs.write().remove(&id)
    }

    /// Ids of terminal jobs last touched before `cutoff`.
    pub fn expired(&self, cutoff: DateTime<Utc>) -> Vec<TaskId> {
        self.jobs
            .read()
            .values()
            .filter(|j| j.is_terminal() && j.updated_at < cutoff)
            .map(|j| j.id)
            .collect()
    }

    /// Number of jobs in a given status.
    pub fn count_by_status(&self, status: JobStatus) -> usize {
        self.jobs
            .read()
            .values()
            .filter(|j| j.status == status)
            .count()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}
