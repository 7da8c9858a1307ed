//! yt-core: shared types, ids, errors, configuration, the job store and the
//! per-job notification hub.
//!
//! Every other yt-* crate depends on this one. Nothing in here spawns tasks
//! or touches the network; it is plain state plus the locks around it.

pub mod bitrate;
pub mod config;
pub mod error;
pub mod hub;
pub mod ids;
pub mod job;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use hub::{EventKind, HubEvent, NotificationHub, SubscriberHandle, Subscription};
pub use ids::TaskId;
pub use job::{FailureKind, Job, JobPatch, JobStatus, JobStore};
