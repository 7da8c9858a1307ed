//! Server-Sent Events for a single job.
//!
//! The handler subscribes to the hub before reading the job, replays the
//! current record as a `progress` event, then forwards hub events until the
//! terminal `done`. A job that is already terminal gets `done` right after the
//! replay. Dropping the response stream drops the subscription.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures_core::Stream;
use tokio_util::sync::CancellationToken;
use yt_core::{Error, EventKind, HubEvent, Job, Subscription};

use super::parse_task_id;
use crate::context::AppContext;
use crate::error::AppError;

fn sse_event(kind: EventKind, job: &Job) -> Event {
    let event = Event::default().event(kind.as_str());
    match serde_json::to_string(job) {
        Ok(data) => event.data(data),
        Err(e) => {
            tracing::warn!(task_id = %job.id, "Failed to serialize job for SSE: {e}");
            event
        }
    }
}

/// Snapshot first, then live hub events until `done` or shutdown.
///
/// Progress events buffered in `sub` before `current` was read are no newer
/// than the snapshot and are dropped.
pub(crate) fn job_events(
    current: Job,
    mut sub: Subscription,
    shutdown: CancellationToken,
) -> impl Stream<Item = HubEvent> {
    async_stream::stream! {
        let snapshot_at = current.updated_at;
        let terminal = current.is_terminal();
        yield HubEvent::progress(current.clone());

        if terminal {
            yield HubEvent::done(current);
        } else {
            loop {
                tokio::select! {
                    next = sub.recv() => {
                        let Some(event) = next else { break };
                        if !event.is_done() && event.job.updated_at <= snapshot_at {
                            continue;
                        }
                        let done = event.is_done();
                        yield event;
                        if done {
                            break;
                        }
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
        }
    }
}

/// GET /api/progress/{task_id}/stream
pub async fn progress_stream(
    State(ctx): State<AppContext>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_task_id(&raw_id)?;

    let sub = ctx.hub.subscribe(id);
    // On the error path `sub` is dropped here, so no channel is left behind.
    let current = ctx
        .store
        .get(id)
        .ok_or_else(|| Error::not_found("Task", id))?;

    tracing::debug!(task_id = %id, status = %current.status, "SSE client attached");

    let events = job_events(current, sub, ctx.shutdown.clone());
    let stream = async_stream::stream! {
        for await event in events {
            yield Ok::<_, Infallible>(sse_event(event.kind, &event.job));
        }
        tracing::debug!(task_id = %id, "SSE stream closed");
    };

    let keepalive = Duration::from_secs(ctx.config.stream.keepalive_secs.max(1));
    let sse = Sse::new(stream).keep_alive(KeepAlive::new().interval(keepalive).text("ping"));

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache, no-transform"),
            (header::HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        sse,
    ))
}
