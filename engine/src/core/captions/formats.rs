//! Caption Format Parsers and Exporters
//!
//! Supports:
//! - SRT (SubRip) export and import
//! - WebVTT export
//!
//! Exported text is the caption's display text (emoji + text, trimmed).

use super::models::{sort_captions, CaptionLine};
use super::timestamp::{format_srt_timestamp, format_vtt_timestamp};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during caption parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Invalid timestamp format
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Invalid caption format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// Missing required data
    #[error("Missing data: {0}")]
    MissingData(String),
}

// =============================================================================
// SRT Format
// =============================================================================

/// Exports captions to SRT format.
///
/// ```text
/// 1
/// 00:00:01,000 --> 00:00:04,000
/// 🔥 First caption text
///
/// 2
/// 00:00:05,500 --> 00:00:08,000
/// Second caption text
/// ```
pub fn export_srt(captions: &[CaptionLine]) -> String {
    captions
        .iter()
        .enumerate()
        .map(|(index, caption)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                index + 1,
                format_srt_timestamp(caption.start_time),
                format_srt_timestamp(caption.end_time),
                caption.display_text()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses SRT content into captions sorted by start time.
///
/// Multi-line cue text is joined with a single space, since a caption line is
/// wrapped by the compositor rather than by the file.
pub fn parse_srt(content: &str) -> Result<Vec<CaptionLine>, ParseError> {
    let mut captions = Vec::new();
    let content = content.trim_start_matches('\u{FEFF}');
    let mut lines = content.lines().peekable();

    loop {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }
        let Some(first) = lines.next() else {
            break;
        };

        // The sequence number is optional in practice
        let timestamp_line = if first.contains("-->") {
            first
        } else {
            lines
                .next()
                .ok_or_else(|| ParseError::MissingData(format!("timestamps after '{}'", first)))?
        };
        let (start, end) = parse_srt_timestamp_line(timestamp_line)?;

        let mut text_lines = Vec::new();
        while let Some(line) = lines.peek() {
            if line.trim().is_empty() {
                break;
            }
            text_lines.push(line.trim().to_string());
            lines.next();
        }
        if text_lines.is_empty() {
            return Err(ParseError::MissingData("Caption text".to_string()));
        }

        captions.push(CaptionLine::new(start, end, &text_lines.join(" ")));
    }

    sort_captions(&mut captions);
    Ok(captions)
}

/// Parses an SRT timestamp line (e.g., "00:00:01,000 --> 00:00:04,000")
fn parse_srt_timestamp_line(line: &str) -> Result<(f64, f64), ParseError> {
    let (start, end) = line.split_once("-->").ok_or_else(|| {
        ParseError::InvalidFormat(format!("Expected 'start --> end' format: {}", line))
    })?;

    let start = parse_srt_timestamp(start.trim())?;
    let end = parse_srt_timestamp(end.trim())?;
    if end <= start {
        return Err(ParseError::InvalidFormat(format!(
            "End time must be after start time: {}",
            line
        )));
    }
    Ok((start, end))
}

/// Parses an SRT timestamp (e.g., "00:01:23,456") into seconds
fn parse_srt_timestamp(ts: &str) -> Result<f64, ParseError> {
    let normalized = ts.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() != 3 {
        return Err(ParseError::InvalidTimestamp(ts.to_string()));
    }

    let mut total = 0.0;
    for (part, scale) in parts.iter().zip([3600.0, 60.0, 1.0]) {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidTimestamp(ts.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(ParseError::InvalidTimestamp(ts.to_string()));
        }
        total += value * scale;
    }
    Ok(total)
}

// =============================================================================
// VTT Format
// =============================================================================

/// Exports captions to WebVTT format
pub fn export_vtt(captions: &[CaptionLine]) -> String {
    let mut output = String::from("WEBVTT\n\n");
    for caption in captions {
        output.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_vtt_timestamp(caption.start_time),
            format_vtt_timestamp(caption.end_time),
            caption.display_text()
        ));
    }
    output.trim_end().to_string()
}

// =============================================================================
// Tests
// =============================================================================
