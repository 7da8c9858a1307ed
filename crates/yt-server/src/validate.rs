//! Request field validation shared by the submission routes.

use regex::Regex;
use std::sync::LazyLock;

pub use yt_core::bitrate::{parse_bitrate, DEFAULT_BITRATE, MAX_BITRATE, MIN_BITRATE};

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|shorts/|.+\?v=)?([^&=%?]{11})",
    )
    .expect("valid YouTube URL regex")
});

/// Whether `url` looks like a single YouTube video link.
pub fn is_youtube_url(url: &str) -> bool {
    YOUTUBE_URL.is_match(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_youtube_forms() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=dQw4w9WgXcQ&t=42",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/attribution_link?a=x&u=%2Fwatch%3Fv%3D&feature=share&foo?v=dQw4w9WgXcQ",
            "HTTPS://WWW.YOUTUBE.COM/WATCH?V=dQw4w9WgXcQ",
        ] {
            assert!(is_youtube_url(url), "{url}");
        }
    }

    #[test]
    fn rejects_other_hosts() {
        for url in [
            "",
            "not a url",
            "https://vimeo.com/123456789",
            "https://example.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/short",
        ] {
            assert!(!is_youtube_url(url), "{url}");
        }
    }
}
