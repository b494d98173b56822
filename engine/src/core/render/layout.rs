//! Layout Helpers
//!
//! Geometry used by the compositor: line splitting, cover scaling of the
//! background image, text measurement and preview sizing.

use crate::core::theme::ThemeConfig;
use crate::core::{Rect, Size2D};

/// Splits caption text into at most two lines.
///
/// Text is split only when `max_lines == 2`, it is longer than `threshold`
/// characters and it contains a space. The split happens at the space
/// nearest the character midpoint; on a tie the earlier space wins.
pub fn split_caption_lines(text: &str, max_lines: u8, threshold: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    if max_lines < 2 || chars.len() <= threshold {
        return vec![text.to_string()];
    }

    let midpoint = chars.len() / 2;
    let split_at = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == ' ')
        .map(|(i, _)| i)
        .min_by_key(|i| i.abs_diff(midpoint));

    match split_at {
        Some(i) => {
            let first: String = chars[..i].iter().collect();
            let second: String = chars[i + 1..].iter().collect();
            [first, second]
                .into_iter()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect()
        }
        None => vec![text.to_string()],
    }
}

/// Source crop for drawing `image` into `target` with cover scaling.
///
/// The image fills the target completely; the longer axis (relative to the
/// target's aspect ratio) is center-cropped. Returns `None` for an image
/// without pixels.
pub fn cover_source_rect(image: Size2D, target: Size2D) -> Option<Rect> {
    if image.width == 0 || image.height == 0 || target.width == 0 || target.height == 0 {
        return None;
    }

    let iw = f64::from(image.width);
    let ih = f64::from(image.height);
    let image_aspect = iw / ih;
    let target_aspect = f64::from(target.width) / f64::from(target.height);

    let rect = if image_aspect > target_aspect {
        let crop_width = ih * target_aspect;
        Rect::new((iw - crop_width) / 2.0, 0.0, crop_width, ih)
    } else {
        let crop_height = iw / target_aspect;
        Rect::new(0.0, (ih - crop_height) / 2.0, iw, crop_height)
    };
    Some(rect)
}

/// Scales an export size down to the preview width, keeping the aspect ratio
pub fn preview_size(export: Size2D, preview_width: u32) -> Size2D {
    if export.width == 0 {
        return export;
    }
    let scale = f64::from(preview_width) / f64::from(export.width);
    let height = (f64::from(export.height) * scale).round().max(1.0) as u32;
    Size2D::new(preview_width.max(1), height)
}

// =============================================================================
// Text Measurement
// =============================================================================

/// Measures rendered text width in pixels
pub trait TextMeasurer: Send + Sync {
    fn measure(&self, text: &str, theme: &ThemeConfig) -> f64;
}

/// Deterministic measurer using a fixed average glyph advance.
///
/// Wide glyphs (emoji, CJK) count double.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApproxTextMeasurer {
    /// Average advance as a multiple of the font size
    pub advance: f64,
}

impl Default for ApproxTextMeasurer {
    fn default() -> Self {
        Self { advance: 0.55 }
    }
}

impl ApproxTextMeasurer {
    pub fn new(advance: f64) -> Self {
        Self { advance }
    }
}

impl TextMeasurer for ApproxTextMeasurer {
    fn measure(&self, text: &str, theme: &ThemeConfig) -> f64 {
        let units: f64 = text
            .chars()
            .map(|c| if u32::from(c) >= 0x2E80 { 2.0 } else { 1.0 })
            .sum();
        units * theme.font_size * self.advance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_not_split() {
        assert_eq!(split_caption_lines("short line", 2, 20), vec!["short line"]);
        assert!(split_caption_lines("   ", 2, 20).is_empty());
    }

    #[test]
    fn test_split_at_space_nearest_midpoint() {
        // 27 chars, midpoint 13; spaces at 3, 9, 12, 18, 22
        let lines = split_caption_lines("the night is young and free", 2, 20);
        assert_eq!(lines, vec!["the night is", "young and free"]);
    }

    #[test]
    fn test_split_long_caption_line() {
        // 29 chars, midpoint 14; nearest space at 11
        let lines = split_caption_lines("a very long caption line here", 2, 20);
        assert_eq!(lines, vec!["a very long", "caption line here"]);
    }

    #[test]
    fn test_split_tie_prefers_earlier_space() {
        // 22 chars, midpoint 11; spaces at 9 and 13 are equally near
        let lines = split_caption_lines("aaaaaaaaa bbb cccccccc", 2, 20);
        assert_eq!(lines, vec!["aaaaaaaaa", "bbb cccccccc"]);
    }

    #[test]
    fn test_no_split_without_space_or_single_line() {
        let long = "a".repeat(40);
        assert_eq!(split_caption_lines(&long, 2, 20), vec![long.clone()]);
        let spaced = "this line is much longer than twenty chars";
        assert_eq!(split_caption_lines(spaced, 1, 20), vec![spaced]);
    }

    #[test]
    fn test_split_counts_chars_not_bytes() {
        // Multi-byte glyphs must not panic or skew the midpoint
        let lines = split_caption_lines("🔥🔥🔥🔥🔥 🔥🔥🔥🔥🔥 🔥🔥🔥🔥🔥 🔥🔥🔥🔥🔥", 2, 20);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_cover_crops_wide_image() {
        // 2:1 image into 1:1 target: crop the width
        let rect = cover_source_rect(Size2D::new(2000, 1000), Size2D::new(1080, 1080)).unwrap();
        assert_eq!(rect, Rect::new(500.0, 0.0, 1000.0, 1000.0));
    }

    #[test]
    fn test_cover_crops_tall_image() {
        // 1:2 image into 16:9 target: crop the height
        let rect = cover_source_rect(Size2D::new(900, 1800), Size2D::new(1280, 720)).unwrap();
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.width, 900.0);
        assert!((rect.height - 506.25).abs() < 1e-9);
        assert!((rect.y - 646.875).abs() < 1e-9);
    }

    #[test]
    fn test_cover_empty_image() {
        assert!(cover_source_rect(Size2D::new(0, 10), Size2D::new(10, 10)).is_none());
    }

    #[test]
    fn test_preview_size() {
        assert_eq!(preview_size(Size2D::new(1280, 720), 640), Size2D::new(640, 360));
        assert_eq!(preview_size(Size2D::new(1080, 1350), 640), Size2D::new(640, 800));
    }

    #[test]
    fn test_approx_measurer() {
        let theme = ThemeConfig {
            font_size: 40.0,
            ..ThemeConfig::default()
        };
        let measurer = ApproxTextMeasurer::new(0.5);
        assert_eq!(measurer.measure("abcd", &theme), 80.0);
        assert_eq!(measurer.measure("🔥", &theme), 40.0);
    }
}
