//! # yt-extract
//!
//! Everything that talks to `yt-dlp` for yttmp3.
//!
//! This crate provides:
//!
//! - **Argument building** ([`args`]) -- the fixed flag lists for metadata
//!   lookups and MP3 conversions.
//! - **Progress parsing** ([`parse_progress`]) -- turns a stdout line into a
//!   percentage.
//! - **Command execution** ([`ToolCommand`]) -- async builder that can stream
//!   stdout line by line while capturing stderr.
//! - **Tool discovery** ([`tools`]) -- locate `yt-dlp` and `ffmpeg`.
//! - **Strategies** ([`LocalExtractor`], [`SidecarExtractor`]) -- two
//!   implementations of [`Extractor`], picked by [`build_extractor`].
//! - **Metadata mapping** ([`VideoInfo`]) -- the shape returned by the
//!   video-info endpoint.

pub mod args;
pub mod command;
pub mod extractor;
pub mod info;
pub mod local;
pub mod progress;
pub mod sidecar;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use extractor::{build_extractor, run_conversion, ConvertRequest, Extractor, ProgressSender};
pub use info::VideoInfo;
pub use local::LocalExtractor;
pub use progress::parse_progress;
pub use sidecar::SidecarExtractor;
pub use tools::{ToolInfo, YTDLP};
