//! Route handlers for the HTTP API.

pub mod convert;
pub mod download;
pub mod health;
pub mod progress;
pub mod queue;
pub mod stream;
pub mod video_info;

use yt_core::{Error, TaskId};

/// Parse a path segment as a task id. Anything unparsable is simply an
/// unknown task.
pub(crate) fn parse_task_id(raw: &str) -> Result<TaskId, Error> {
    raw.parse().map_err(|_| Error::not_found("Task", raw))
}
