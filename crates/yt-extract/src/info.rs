//! Video metadata as returned by the video-info endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Videos longer than this get a [`VideoInfo::duration_warning`].
pub const MAX_DURATION_SECS: f64 = 1800.0;

const DESCRIPTION_LIMIT: usize = 500;

/// Subset of `yt-dlp -J` output shown to the user before converting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub uploader: String,
    pub duration: f64,
    pub duration_string: String,
    pub view_count: u64,
    pub upload_date: String,
    pub description: String,
    pub thumbnail: String,
    pub webpage_url: String,
    pub formats_available: usize,
    pub is_live: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_warning: Option<String>,
}

fn str_or(raw: &Value, key: &str, fallback: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

impl VideoInfo {
    /// Map a raw metadata document, filling gaps with placeholders.
    ///
    /// `url` is used when the document has no `webpage_url`.
    pub fn from_raw(raw: &Value, url: &str) -> Self {
        let duration = raw.get("duration").and_then(Value::as_f64).unwrap_or(0.0);
        let description: String = raw
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .chars()
            .take(DESCRIPTION_LIMIT)
            .collect();

        Self {
            id: str_or(raw, "id", ""),
            title: str_or(raw, "title", "Unknown Title"),
            uploader: str_or(raw, "uploader", "Unknown"),
            duration,
            duration_string: str_or(raw, "duration_string", "Unknown"),
            view_count: raw.get("view_count").and_then(Value::as_u64).unwrap_or(0),
            upload_date: str_or(raw, "upload_date", "Unknown"),
            description,
            thumbnail: str_or(raw, "thumbnail", ""),
            webpage_url: str_or(raw, "webpage_url", url),
            formats_available: raw
                .get("formats")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0),
            is_live: raw.get("is_live").and_then(Value::as_bool).unwrap_or(false),
            duration_warning: (duration > MAX_DURATION_SECS)
                .then(|| "Video exceeds 30-minute limit".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_full_document() {
        let raw = json!({
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "uploader": "Rick Astley",
            "duration": 212,
            "duration_string": "3:32",
            "view_count": 1_500_000_000u64,
            "upload_date": "20091025",
            "description": "The official video",
            "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg",
            "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "formats": [{}, {}, {}],
            "is_live": false
        });
        let info = VideoInfo::from_raw(&raw, "ignored");
        assert_eq!(info.title, "Never Gonna Give You Up");
        assert_eq!(info.duration, 212.0);
        assert_eq!(info.formats_available, 3);
        assert_eq!(info.webpage_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert!(info.duration_warning.is_none());
    }

    #[test]
    fn empty_document_gets_placeholders() {
        let info = VideoInfo::from_raw(&json!({}), "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(info.title, "Unknown Title");
        assert_eq!(info.uploader, "Unknown");
        assert_eq!(info.duration_string, "Unknown");
        assert_eq!(info.upload_date, "Unknown");
        assert_eq!(info.view_count, 0);
        assert_eq!(info.webpage_url, "https://youtu.be/dQw4w9WgXcQ");
        assert!(!info.is_live);
    }

    #[test]
    fn long_video_warns() {
        let info = VideoInfo::from_raw(&json!({"duration": 1801}), "u");
        assert_eq!(
            info.duration_warning.as_deref(),
            Some("Video exceeds 30-minute limit")
        );
        let exactly = VideoInfo::from_raw(&json!({"duration": 1800}), "u");
        assert!(exactly.duration_warning.is_none());
    }

    #[test]
    fn description_is_truncated() {
        let long = "é".repeat(800);
        let info = VideoInfo::from_raw(&json!({"description": long}), "u");
        assert_eq!(info.description.chars().count(), 500);

        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("duration_warning").is_none());
    }
}
