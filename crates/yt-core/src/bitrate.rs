//! Lenient bitrate parsing shared by the API and the sidecar.

use serde_json::Value;

pub const DEFAULT_BITRATE: u32 = 128;
pub const MIN_BITRATE: u32 = 64;
pub const MAX_BITRATE: u32 = 320;

/// Leading integer of a string, the way a lenient form parser reads
/// `"192kbps"` as 192. A digit run too long for `i64` saturates.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let run = &digits[..end];
    if run.is_empty() {
        return None;
    }
    // Only overflow can fail here.
    let value = run.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// Read a requested bitrate.
///
/// Numbers and numeric strings are accepted. Missing, zero or unparsable
/// values mean [`DEFAULT_BITRATE`]; the result is clamped to
/// [`MIN_BITRATE`]..=[`MAX_BITRATE`].
pub fn parse_bitrate(raw: Option<&Value>) -> u32 {
    let requested = match raw {
        Some(Value::Number(n)) => n.as_f64().map(|f| f.trunc() as i64),
        Some(Value::String(s)) => leading_int(s),
        _ => None,
    };
    let requested = match requested {
        Some(n) if n != 0 => n,
        _ => i64::from(DEFAULT_BITRATE),
    };
    requested.clamp(i64::from(MIN_BITRATE), i64::from(MAX_BITRATE)) as u32
}
