//! Periodic removal of old output files and job records.
//!
//! Only files whose stem is a job id are touched, so a shared directory such
//! as `/tmp` is safe to use as the output directory.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use yt_core::{JobStore, TaskId};

use crate::context::AppContext;

/// What a single sweep removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub files_removed: usize,
    pub jobs_evicted: usize,
}

/// Run sweeps every `storage.cleanup_interval_secs` until cancelled.
pub async fn run_cleanup(ctx: AppContext, cancel: CancellationToken) {
    let every = ctx.config.storage.cleanup_interval_secs;
    if every == 0 {
        tracing::info!("File cleanup disabled");
        return;
    }
    let retention = Duration::from_secs(ctx.config.storage.retention_secs);
    tracing::info!(interval_secs = every, retention_secs = retention.as_secs(), "File cleanup started");

    let mut ticker = tokio::time::interval(Duration::from_secs(every));
    // The first tick fires immediately; skip it so startup stays quiet.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = sweep(&ctx.store, retention).await;
                if report != CleanupReport::default() {
                    tracing::info!(
                        files = report.files_removed,
                        jobs = report.jobs_evicted,
                        "Cleanup sweep finished"
                    );
                }
            }
            _ = cancel.cancelled() => break,
        }
    }

    tracing::info!("File cleanup stopped");
}

/// Job id a file belongs to, from a name like `<uuid>.mp3` or
/// `<uuid>.webm.part`.
fn owner(path: &Path) -> Option<TaskId> {
    let name = path.file_name()?.to_str()?;
    let stem = name.split('.').next()?;
    Uuid::parse_str(stem).ok().map(TaskId::from)
}

/// Delete files older than `retention` and evict terminal jobs last touched
/// before the same cutoff.
pub async fn sweep(store: &JobStore, retention: Duration) -> CleanupReport {
    let mut report = CleanupReport::default();
    let now = SystemTime::now();

    match tokio::fs::read_dir(store.output_dir()).await {
        Ok(mut entries) => loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("Cleanup: read_dir error: {e}");
                    break;
                }
            };
            let path = entry.path();
            let Some(id) = owner(&path) else {
                continue;
            };
            // A file still being written belongs to a live job.
            if store.get(id).is_some_and(|j| !j.is_terminal()) {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let age = meta
                .modified()
                .ok()
                .and_then(|m| now.duration_since(m).ok())
                .unwrap_or_default();
            if age < retention {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(file = %path.display(), "Removed expired output");
                    report.files_removed += 1;
                }
                Err(e) => tracing::warn!("Failed to remove {}: {e}", path.display()),
            }
        },
        Err(e) => {
            tracing::debug!(
                "Cleanup: cannot read {}: {e}",
                store.output_dir().display()
            );
        }
    }

    let cutoff = chrono::Utc::now()
        - chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::zero());
    for id in store.expired(cutoff) {
        if store.remove(id).is_some() {
            report.jobs_evicted += 1;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use yt_core::{JobPatch, JobStatus};

    fn finish(store: &JobStore, id: TaskId) {
        store.update(id, JobPatch::new().status(JobStatus::Downloading));
        store.update(id, JobPatch::new().status(JobStatus::Completed));
    }

    #[test]
    fn owner_parses_job_files() {
        let id = TaskId::new();
        assert_eq!(owner(Path::new(&format!("/tmp/{id}.mp3"))), Some(id));
        assert_eq!(owner(Path::new(&format!("/tmp/{id}.webm.part"))), Some(id));
        assert_eq!(owner(Path::new("/tmp/notes.mp3")), None);
    }

    #[tokio::test]
    async fn zero_retention_removes_everything_finished() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());
        let done = store.create("u", 128);
        finish(&store, done);
        let done_file = store.get(done).unwrap().file_path;
        std::fs::write(&done_file, b"ID3").unwrap();

        let unrelated = dir.path().join("keep-me.mp3");
        std::fs::write(&unrelated, b"x").unwrap();

        // Make sure the cutoff lands after `updated_at`.
        tokio::time::sleep(Duration::from_millis(5)).await;
        let report = sweep(&store, Duration::ZERO).await;

        assert_eq!(report.files_removed, 1);
        assert_eq!(report.jobs_evicted, 1);
        assert!(!done_file.exists());
        assert!(unrelated.exists());
        assert!(store.get(done).is_none());
    }

    #[tokio::test]
    async fn fresh_files_and_jobs_survive() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());
        let id = store.create("u", 128);
        finish(&store, id);
        let file = store.get(id).unwrap().file_path;
        std::fs::write(&file, b"ID3").unwrap();

        let report = sweep(&store, Duration::from_secs(3600)).await;
        assert_eq!(report, CleanupReport::default());
        assert!(file.exists());
        assert!(store.get(id).is_some());
    }

    #[tokio::test]
    async fn active_jobs_keep_their_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());
        let id = store.create("u", 128);
        store.update(id, JobPatch::new().status(JobStatus::Downloading));
        let partial = dir.path().join(format!("{id}.webm.part"));
        std::fs::write(&partial, b"..").unwrap();

        let report = sweep(&store, Duration::ZERO).await;
        assert_eq!(report.files_removed, 0);
        assert!(partial.exists());
        assert!(store.get(id).is_some());
    }

    #[tokio::test]
    async fn missing_directory_is_harmless() {
        let store = JobStore::new("/nonexistent/yttmp3-output");
        assert_eq!(
            sweep(&store, Duration::ZERO).await,
            CleanupReport::default()
        );
    }
}
