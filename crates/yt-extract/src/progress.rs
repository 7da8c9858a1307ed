//! Progress extraction from `yt-dlp --newline` output.

use regex::Regex;
use std::sync::LazyLock;

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}(?:\.\d+)?)%").expect("valid progress regex"));

/// Return the first percentage in `line`, clamped to `[0, 100]`.
///
/// ```
/// use yt_extract::parse_progress;
///
/// assert_eq!(parse_progress("[download]  42.5% of 3.1MiB"), Some(42.5));
/// assert_eq!(parse_progress("[ExtractAudio] Destination: a.mp3"), None);
/// ```
pub fn parse_progress(line: &str) -> Option<f32> {
    let caps = PERCENT.captures(line)?;
    let pct: f32 = caps.get(1)?.as_str().parse().ok()?;
    Some(pct.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_lines() {
        assert_eq!(
            parse_progress("[download]   0.0% of    3.52MiB at  Unknown B/s ETA Unknown"),
            Some(0.0)
        );
        assert_eq!(
            parse_progress("[download]  57.3% of 3.52MiB at 1.2MiB/s ETA 00:01"),
            Some(57.3)
        );
        assert_eq!(
            parse_progress("[download] 100% of 3.52MiB in 00:02"),
            Some(100.0)
        );
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(parse_progress("12% then 80%"), Some(12.0));
    }

    #[test]
    fn clamps_to_hundred() {
        assert_eq!(parse_progress("weird 250%"), Some(100.0));
    }

    #[test]
    fn no_percent_is_none() {
        assert_eq!(parse_progress(""), None);
        assert_eq!(parse_progress("[youtube] dQw4w9WgXcQ: Downloading webpage"), None);
        assert_eq!(parse_progress("100 percent"), None);
    }
}
