//! Fixed `yt-dlp` argument lists.
//!
//! Both the local strategy and the sidecar service build their command
//! lines here so the two can never drift apart.

use std::path::Path;

const USER_AGENT: &str = "User-Agent:Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0 Safari/537.36";
const ACCEPT_LANGUAGE: &str = "Accept-Language:en-US,en;q=0.5";
const PLAYER_CLIENTS: &str = "youtube:player_client=android,tv";

fn header_args() -> Vec<String> {
    vec![
        "--add-header".into(),
        USER_AGENT.into(),
        "--add-header".into(),
        ACCEPT_LANGUAGE.into(),
    ]
}

fn common_tail(url: &str) -> Vec<String> {
    vec![
        "--retries".into(),
        "3".into(),
        "--fragment-retries".into(),
        "3".into(),
        "--".into(),
        url.into(),
    ]
}

/// Output template for a destination path: `/a/b.mp3` becomes
/// `/a/b.%(ext)s`, so the extracted audio lands on the `.mp3` path.
pub fn output_template(output: &Path) -> String {
    let s = output.to_string_lossy();
    match s.strip_suffix(".mp3") {
        Some(stem) => format!("{stem}.%(ext)s"),
        None => s.into_owned(),
    }
}

/// Arguments that dump the video's metadata as one JSON document.
pub fn info_args(url: &str) -> Vec<String> {
    let mut args = header_args();
    args.extend(
        [
            "-J",
            "--no-warnings",
            "--no-playlist",
            "--extractor-args",
            PLAYER_CLIENTS,
        ]
        .map(String::from),
    );
    args.extend(common_tail(url));
    args
}

/// Arguments that download the best audio stream and transcode it to MP3.
///
/// `--newline` makes every progress update its own stdout line.
pub fn convert_args(url: &str, output: &Path, bitrate: u32) -> Vec<String> {
    let mut args = header_args();
    args.extend(
        [
            "--newline",
            "-f",
            "bestaudio/best",
            "-x",
            "--audio-format",
            "mp3",
            "--audio-quality",
        ]
        .map(String::from),
    );
    args.push(format!("{bitrate}K"));
    args.extend(
        [
            "--no-warnings",
            "--no-playlist",
            "--prefer-ffmpeg",
            "--extractor-args",
            PLAYER_CLIENTS,
            "-o",
        ]
        .map(String::from),
    );
    args.push(output_template(output));
    args.extend(common_tail(url));
    args
}
