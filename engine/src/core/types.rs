//! LyricFrame Core Type Definitions
//!
//! Defines fundamental types used throughout the project.

use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

// =============================================================================
// Spatial Types
// =============================================================================

/// 2D coordinates in pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 2D size in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size2D {
    pub width: u32,
    pub height: u32,
}

impl Size2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the rectangle grown by `padding` on every side
    pub fn inflate(&self, padding: f64) -> Self {
        Self {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

// =============================================================================
// Color
// =============================================================================

/// Color (RGBA)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red (0.0 ~ 1.0)
    pub r: f32,
    /// Green (0.0 ~ 1.0)
    pub g: f32,
    /// Blue (0.0 ~ 1.0)
    pub b: f32,
    /// Alpha (0.0 ~ 1.0, optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<f32>,
}

impl Color {
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: None,
        }
    }

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: Some(a.clamp(0.0, 1.0)),
        }
    }

    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Effective alpha (opaque when unset)
    pub fn alpha(&self) -> f32 {
        self.a.unwrap_or(1.0)
    }

    /// Returns the same color with the given alpha
    pub fn with_alpha(&self, a: f32) -> Self {
        Self::rgba(self.r, self.g, self.b, a)
    }

    /// Parses a hex color string (e.g. `#RRGGBB`, `#RRGGBBAA`, `#RGB`, `#RGBA`).
    pub fn try_from_hex(hex: &str) -> Result<Self, String> {
        let hex = hex.trim().trim_start_matches('#');
        let len = hex.len();

        if len != 3 && len != 4 && len != 6 && len != 8 {
            return Err(format!("Invalid hex color length: {}", len));
        }
        if !hex.is_ascii() {
            return Err(format!("Invalid hex color: {}", hex));
        }

        if len == 3 || len == 4 {
            // Expand "F" to "FF"
            let nibble = |i: usize| -> Result<f32, String> {
                u8::from_str_radix(&hex[i..i + 1], 16)
                    .map(|v| (v * 17) as f32 / 255.0)
                    .map_err(|e| e.to_string())
            };
            let (r, g, b) = (nibble(0)?, nibble(1)?, nibble(2)?);
            return if len == 4 {
                Ok(Self::rgba(r, g, b, nibble(3)?))
            } else {
                Ok(Self::rgb(r, g, b))
            };
        }

        let channel = |i: usize| -> Result<f32, String> {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|e| e.to_string())
        };
        let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
        if len == 8 {
            Ok(Self::rgba(r, g, b, channel(6)?))
        } else {
            Ok(Self::rgb(r, g, b))
        }
    }

    /// Parses a hex color string, falling back to black on invalid input.
    pub fn from_hex(hex: &str) -> Self {
        match Self::try_from_hex(hex) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "Failed to parse hex color '{}': {}, defaulting to black",
                    hex, e
                );
                Self::black()
            }
        }
    }

    /// Formats as `#RRGGBB` or `#RRGGBBAA` when translucent
    pub fn to_hex(&self) -> String {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        match self.a {
            Some(a) if a < 1.0 => format!(
                "#{:02X}{:02X}{:02X}{:02X}",
                to_u8(self.r),
                to_u8(self.g),
                to_u8(self.b),
                to_u8(a)
            ),
            _ => format!(
                "#{:02X}{:02X}{:02X}",
                to_u8(self.r),
                to_u8(self.g),
                to_u8(self.b)
            ),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

// =============================================================================
// Aspect Ratio
// =============================================================================

/// Output aspect ratio; each maps to a fixed export resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    /// 16:9 landscape
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait (Reels / Shorts / TikTok)
    #[serde(rename = "9:16")]
    Portrait,
    /// 1:1 square
    #[serde(rename = "1:1")]
    Square,
    /// 4:5 Instagram portrait
    #[serde(rename = "4:5")]
    Vertical,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Square,
        AspectRatio::Vertical,
    ];

    /// Export pixel size for this ratio
    pub fn export_size(self) -> Size2D {
        match self {
            AspectRatio::Landscape => Size2D::new(1280, 720),
            AspectRatio::Portrait => Size2D::new(720, 1280),
            AspectRatio::Square => Size2D::new(1080, 1080),
            AspectRatio::Vertical => Size2D::new(1080, 1350),
        }
    }

    /// Short label (`"16:9"` etc.)
    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Vertical => "4:5",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .into_iter()
            .find(|ar| ar.label() == s.trim())
            .ok_or_else(|| format!("Unknown aspect ratio: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_round_trip() {
        let c = Color::from_hex("#FF8000");
        assert_eq!(c.to_hex(), "#FF8000");
        let t = Color::from_hex("#00000080");
        assert_eq!(t.to_hex(), "#00000080");
    }

    #[test]
    fn test_color_short_hex() {
        let c = Color::try_from_hex("#fff").unwrap();
        assert_eq!(c, Color::white());
    }

    #[test]
    fn test_color_invalid_hex_falls_back_to_black() {
        assert!(Color::try_from_hex("#12").is_err());
        assert_eq!(Color::from_hex("zzzzzz"), Color::black());
    }

    #[test]
    fn test_aspect_ratio_export_sizes() {
        assert_eq!(AspectRatio::Landscape.export_size(), Size2D::new(1280, 720));
        assert_eq!(AspectRatio::Portrait.export_size(), Size2D::new(720, 1280));
        assert_eq!(AspectRatio::Square.export_size(), Size2D::new(1080, 1080));
        assert_eq!(AspectRatio::Vertical.export_size(), Size2D::new(1080, 1350));
    }

    #[test]
    fn test_aspect_ratio_serde_uses_labels() {
        let json = serde_json::to_string(&AspectRatio::Portrait).unwrap();
        assert_eq!(json, "\"9:16\"");
        let parsed: AspectRatio = serde_json::from_str("\"4:5\"").unwrap();
        assert_eq!(parsed, AspectRatio::Vertical);
        assert_eq!("1:1".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
    }

    #[test]
    fn test_rect_inflate() {
        let r = Rect::new(10.0, 10.0, 100.0, 20.0).inflate(5.0);
        assert_eq!(r, Rect::new(5.0, 5.0, 110.0, 30.0));
        assert_eq!(r.right(), 115.0);
        assert_eq!(r.bottom(), 35.0);
    }
}
