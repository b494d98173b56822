//! Timestamp Utilities
//!
//! Conversions between human-readable time strings and seconds.
//!
//! - `"m:ss.mmm"` strings produced by the captioning collaborator
//! - SRT timestamps (`HH:MM:SS,mmm`)
//! - Compact display strings for the editor (`M:SS`, `M:SS.mmm`)

use crate::core::TimeSec;

/// Parses a `minutes:seconds.fraction` string into seconds.
///
/// - No colon: the whole string is read as seconds.
/// - `h:mm:ss.ms` is accepted as well.
/// - Anything unparsable, empty, negative or non-finite yields `0.0`.
///
/// ```
/// use lyricframe_lib::core::captions::parse_timestamp;
/// assert_eq!(parse_timestamp("1:02.5"), 62.5);
/// assert_eq!(parse_timestamp("5"), 5.0);
/// assert_eq!(parse_timestamp(""), 0.0);
/// ```
pub fn parse_timestamp(s: &str) -> TimeSec {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }

    let parts: Vec<&str> = s.split(':').collect();
    let seconds = match parts.as_slice() {
        [secs] => parse_component(secs),
        [mins, secs] => parse_component(mins) * 60.0 + parse_component(secs),
        [hours, mins, secs] => {
            parse_component(hours) * 3600.0 + parse_component(mins) * 60.0 + parse_component(secs)
        }
        _ => 0.0,
    };

    if seconds.is_finite() && seconds >= 0.0 {
        seconds
    } else {
        0.0
    }
}

fn parse_component(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(0.0)
}

/// Formats seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Milliseconds are rounded; hours are not wrapped.
pub fn format_srt_timestamp(seconds: TimeSec) -> String {
    let (hours, mins, secs, ms) = split_millis(seconds);
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, ms)
}

/// Formats seconds as a WebVTT timestamp (`HH:MM:SS.mmm`).
pub fn format_vtt_timestamp(seconds: TimeSec) -> String {
    let (hours, mins, secs, ms) = split_millis(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
}

/// Formats seconds for the editor as `M:SS`.
///
/// Invalid input (negative, NaN, infinite) renders as `0:00`.
pub fn format_display_time(seconds: TimeSec) -> String {
    let total = sanitize(seconds).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Formats seconds for fine editing as `M:SS.mmm`.
pub fn format_precise_time(seconds: TimeSec) -> String {
    let total_ms = (sanitize(seconds) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!("{}:{:02}.{:03}", total_secs / 60, total_secs % 60, ms)
}

fn sanitize(seconds: TimeSec) -> TimeSec {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

fn split_millis(seconds: TimeSec) -> (u64, u64, u64, u64) {
    let total_ms = (sanitize(seconds) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    (total_mins / 60, total_mins % 60, secs, ms)
}
