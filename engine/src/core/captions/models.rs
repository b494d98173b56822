//! Caption Data Models
//!
//! Defines the caption line and the pure transformations applied to the
//! ordered caption sequence.
//!
//! # Overview
//!
//! - Captions are kept sorted by start time after insertion.
//! - Overlapping intervals are allowed. The caption shown at a given time is
//!   the first match in list order.
//! - Every operation returns a new sequence; nothing here holds hidden state.

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, TimeSec};

/// Duration given to lines created with "add line"
pub const DEFAULT_LINE_DURATION: TimeSec = 3.0;

// =============================================================================
// Caption Line
// =============================================================================

/// A single timed lyric/text segment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionLine {
    /// Start time in seconds
    pub start_time: TimeSec,
    /// End time in seconds
    pub end_time: TimeSec,
    /// Caption text
    pub text: String,
    /// Pending emoji suggestion from the captioning collaborator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl CaptionLine {
    /// Creates a new caption line without an emoji suggestion
    pub fn new(start_time: TimeSec, end_time: TimeSec, text: &str) -> Self {
        Self {
            start_time,
            end_time,
            text: text.to_string(),
            emoji: None,
        }
    }

    /// Attaches an emoji suggestion
    pub fn with_emoji(mut self, emoji: &str) -> Self {
        self.emoji = Some(emoji.to_string());
        self
    }

    /// Returns the duration of this caption in seconds
    pub fn duration(&self) -> TimeSec {
        self.end_time - self.start_time
    }

    /// Returns true if the caption is displayed at the given time (inclusive on both ends)
    pub fn contains(&self, time: TimeSec) -> bool {
        time >= self.start_time && time <= self.end_time
    }

    /// Returns true if this caption overlaps with another
    pub fn overlaps(&self, other: &CaptionLine) -> bool {
        self.start_time < other.end_time && self.end_time > other.start_time
    }

    /// Text as displayed and exported: emoji (if any) followed by the text, trimmed
    pub fn display_text(&self) -> String {
        match self.emoji.as_deref() {
            Some(emoji) if !emoji.trim().is_empty() => {
                format!("{} {}", emoji.trim(), self.text.trim())
                    .trim()
                    .to_string()
            }
            _ => self.text.trim().to_string(),
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Returns the caption displayed at `time`: the first entry in list order
/// whose closed interval contains it.
pub fn active_caption(captions: &[CaptionLine], time: TimeSec) -> Option<(usize, &CaptionLine)> {
    captions
        .iter()
        .enumerate()
        .find(|(_, caption)| caption.contains(time))
}

/// Returns the end time of the last-ending caption
pub fn timeline_extent(captions: &[CaptionLine]) -> TimeSec {
    captions
        .iter()
        .map(|c| c.end_time)
        .fold(0.0, f64::max)
}

/// Returns index pairs of captions whose intervals overlap
pub fn overlapping_pairs(captions: &[CaptionLine]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in captions.iter().enumerate() {
        for (j, b) in captions.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Sorts captions by start time. The sort is stable, so captions with equal
/// start times keep their relative order.
pub fn sort_captions(captions: &mut [CaptionLine]) {
    captions.sort_by(|a, b| {
        a.start_time
            .partial_cmp(&b.start_time)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

// =============================================================================
// Transformations
// =============================================================================

/// Inserts a new line spanning `[current_time, current_time + duration]` and re-sorts.
pub fn add_line(
    captions: &[CaptionLine],
    current_time: TimeSec,
    duration: TimeSec,
    default_text: &str,
) -> CoreResult<Vec<CaptionLine>> {
    let start = if current_time.is_finite() {
        current_time.max(0.0)
    } else {
        0.0
    };
    if !duration.is_finite() || duration <= 0.0 {
        return Err(CoreError::InvalidTimeRange(start, start + duration));
    }

    let mut next = captions.to_vec();
    next.push(CaptionLine::new(start, start + duration, default_text));
    sort_captions(&mut next);
    Ok(next)
}

/// Removes the line at `index`.
pub fn delete_line(captions: &[CaptionLine], index: usize) -> CoreResult<Vec<CaptionLine>> {
    ensure_index(captions, index)?;
    let mut next = captions.to_vec();
    next.remove(index);
    Ok(next)
}

/// Replaces the text of the line at `index`.
pub fn update_text(
    captions: &[CaptionLine],
    index: usize,
    text: &str,
) -> CoreResult<Vec<CaptionLine>> {
    ensure_index(captions, index)?;
    let mut next = captions.to_vec();
    next[index].text = text.to_string();
    Ok(next)
}

/// Replaces both endpoints of the line at `index`.
///
/// Callers clamp before calling; a degenerate or non-finite interval is still
/// rejected here so the `end > start` invariant cannot be broken.
pub fn retime(
    captions: &[CaptionLine],
    index: usize,
    new_start: TimeSec,
    new_end: TimeSec,
) -> CoreResult<Vec<CaptionLine>> {
    ensure_index(captions, index)?;
    if !new_start.is_finite() || !new_end.is_finite() || new_start < 0.0 || new_end <= new_start
    {
        return Err(CoreError::InvalidTimeRange(new_start, new_end));
    }
    let mut next = captions.to_vec();
    next[index].start_time = new_start;
    next[index].end_time = new_end;
    Ok(next)
}

/// Merges the emoji suggestion into the text (`"<emoji> <text>"`) and clears it.
pub fn accept_emoji_suggestion(
    captions: &[CaptionLine],
    index: usize,
) -> CoreResult<Vec<CaptionLine>> {
    ensure_index(captions, index)?;
    let mut next = captions.to_vec();
    let line = &mut next[index];
    if let Some(emoji) = line.emoji.take() {
        line.text = format!("{} {}", emoji, line.text).trim().to_string();
    }
    Ok(next)
}

/// Drops the emoji suggestion, leaving the text untouched.
pub fn reject_emoji_suggestion(
    captions: &[CaptionLine],
    index: usize,
) -> CoreResult<Vec<CaptionLine>> {
    ensure_index(captions, index)?;
    let mut next = captions.to_vec();
    next[index].emoji = None;
    Ok(next)
}

fn ensure_index(captions: &[CaptionLine], index: usize) -> CoreResult<()> {
    if index < captions.len() {
        Ok(())
    } else {
        Err(CoreError::CaptionNotFound(index))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn times(captions: &[CaptionLine]) -> Vec<(f64, f64)> {
        captions
            .iter()
            .map(|c| (c.start_time, c.end_time))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Caption Line Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_caption_contains_is_inclusive() {
        let caption = CaptionLine::new(2.0, 5.0, "Test");
        assert!(!caption.contains(1.99));
        assert!(caption.contains(2.0));
        assert!(caption.contains(5.0));
        assert!(!caption.contains(5.01));
    }

    #[test]
    fn test_display_text_prepends_emoji() {
        let line = CaptionLine::new(0.0, 1.0, " Hello ").with_emoji("🔥");
        assert_eq!(line.display_text(), "🔥 Hello");
        let plain = CaptionLine::new(0.0, 1.0, "  Hi  ");
        assert_eq!(plain.display_text(), "Hi");
    }

    #[test]
    fn test_serialization_uses_camel_case_and_skips_empty_emoji() {
        let json = serde_json::to_string(&CaptionLine::new(1.0, 2.0, "x")).unwrap();
        assert!(json.contains("startTime"));
        assert!(json.contains("endTime"));
        assert!(!json.contains("emoji"));
    }

    // -------------------------------------------------------------------------
    // Active Caption Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_active_caption_boundary_picks_first_in_list_order() {
        let captions = vec![
            CaptionLine::new(0.0, 3.0, "A"),
            CaptionLine::new(3.0, 6.0, "B"),
        ];
        let (index, line) = active_caption(&captions, 3.0).unwrap();
        assert_eq!(index, 0);
        assert_eq!(line.text, "A");
    }

    #[test]
    fn test_active_caption_overlap_picks_first_in_list_order() {
        let captions = vec![
            CaptionLine::new(0.0, 5.0, "A"),
            CaptionLine::new(2.0, 4.0, "B"),
        ];
        assert_eq!(active_caption(&captions, 3.0).unwrap().1.text, "A");
        assert_eq!(active_caption(&captions, 4.5).unwrap().1.text, "A");
    }

    #[test]
    fn test_active_caption_none_in_gap() {
        let captions = vec![
            CaptionLine::new(0.0, 1.0, "A"),
            CaptionLine::new(2.0, 3.0, "B"),
        ];
        assert!(active_caption(&captions, 1.5).is_none());
        assert!(active_caption(&[], 0.0).is_none());
    }

    #[test]
    fn test_overlapping_pairs() {
        let captions = vec![
            CaptionLine::new(0.0, 3.0, "A"),
            CaptionLine::new(2.0, 5.0, "B"),
            CaptionLine::new(5.0, 6.0, "C"),
        ];
        assert_eq!(overlapping_pairs(&captions), vec![(0, 1)]);
        assert_eq!(timeline_extent(&captions), 6.0);
    }

    // -------------------------------------------------------------------------
    // Transformation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_add_line_inserts_sorted() {
        let captions = vec![
            CaptionLine::new(0.0, 3.0, "A"),
            CaptionLine::new(5.0, 8.0, "B"),
        ];
        let next = add_line(&captions, 10.0, DEFAULT_LINE_DURATION, "New line").unwrap();
        assert_eq!(times(&next), vec![(0.0, 3.0), (5.0, 8.0), (10.0, 13.0)]);

        let middle = add_line(&captions, 4.0, DEFAULT_LINE_DURATION, "Mid").unwrap();
        assert_eq!(middle[1].text, "Mid");
        // Input is untouched
        assert_eq!(captions.len(), 2);
    }

    #[test]
    fn test_add_line_equal_start_goes_after_existing() {
        let captions = vec![CaptionLine::new(5.0, 6.0, "Existing")];
        let next = add_line(&captions, 5.0, 3.0, "New").unwrap();
        assert_eq!(next[0].text, "Existing");
        assert_eq!(next[1].text, "New");
    }

    #[test]
    fn test_add_line_rejects_bad_duration() {
        assert!(add_line(&[], 1.0, 0.0, "x").is_err());
    }

    #[test]
    fn test_delete_line() {
        let captions = vec![
            CaptionLine::new(0.0, 1.0, "A"),
            CaptionLine::new(1.0, 2.0, "B"),
        ];
        let next = delete_line(&captions, 0).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].text, "B");
        assert!(matches!(
            delete_line(&captions, 5),
            Err(CoreError::CaptionNotFound(5))
        ));
    }

    #[test]
    fn test_update_text_only_changes_text() {
        let captions = vec![CaptionLine::new(1.0, 2.0, "old").with_emoji("🎵")];
        let next = update_text(&captions, 0, "new").unwrap();
        assert_eq!(next[0].text, "new");
        assert_eq!(next[0].start_time, 1.0);
        assert_eq!(next[0].emoji.as_deref(), Some("🎵"));
    }

    #[test]
    fn test_retime_rejects_inverted_interval() {
        let captions = vec![CaptionLine::new(1.0, 2.0, "A")];
        assert!(matches!(
            retime(&captions, 0, 3.0, 3.0),
            Err(CoreError::InvalidTimeRange(_, _))
        ));
        let next = retime(&captions, 0, 4.0, 6.5).unwrap();
        assert_eq!(times(&next), vec![(4.0, 6.5)]);
    }

    #[test]
    fn test_accept_emoji_suggestion() {
        let captions = vec![CaptionLine::new(0.0, 1.0, "Hello").with_emoji("🔥")];
        let next = accept_emoji_suggestion(&captions, 0).unwrap();
        assert_eq!(next[0].text, "🔥 Hello");
        assert_eq!(next[0].emoji, None);
    }

    #[test]
    fn test_reject_emoji_suggestion() {
        let captions = vec![CaptionLine::new(0.0, 1.0, "Hello").with_emoji("🔥")];
        let next = reject_emoji_suggestion(&captions, 0).unwrap();
        assert_eq!(next[0].text, "Hello");
        assert_eq!(next[0].emoji, None);
    }

    #[test]
    fn test_accept_without_emoji_is_noop() {
        let captions = vec![CaptionLine::new(0.0, 1.0, "Hello")];
        let next = accept_emoji_suggestion(&captions, 0).unwrap();
        assert_eq!(next, captions);
    }
}
