//! Caption Themes
//!
//! A theme is a named text style for the caption overlay. The document keeps
//! one [`ThemeConfig`] per theme name and exactly one active theme; style
//! edits only ever touch the active theme's config.
//!
//! Colors are stored as hex strings (`#RRGGBB` or `#RRGGBBAA`) and resolved
//! when a frame is composed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult};

/// Theme selected for new documents
pub const DEFAULT_THEME: &str = "classic";

/// Map of theme name to its style
pub type ThemeConfigs = BTreeMap<String, ThemeConfig>;

// =============================================================================
// Style Enums
// =============================================================================

/// Horizontal text alignment around the caption anchor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
    Black,
}

impl FontWeight {
    pub fn numeric(self) -> u16 {
        match self {
            FontWeight::Normal => 400,
            FontWeight::Bold => 700,
            FontWeight::Black => 900,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Box drawn behind the caption text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundStyle {
    #[default]
    None,
    Solid,
    Translucent,
}

// =============================================================================
// Effects
// =============================================================================

/// Soft colored halo around the glyphs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlowEffect {
    pub enabled: bool,
    pub color: String,
}

/// Outline traced around the glyphs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeEffect {
    pub enabled: bool,
    pub color: String,
    /// Outline width in pixels
    pub width: f64,
}

/// Left-to-right two-color fill across the text's horizontal extent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientFill {
    pub enabled: bool,
    pub from: String,
    pub to: String,
}

// =============================================================================
// Theme Config
// =============================================================================

/// Visual style of the caption overlay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    /// Fill color of the text
    pub text_color: String,
    pub font_family: String,
    #[serde(default)]
    pub font_weight: FontWeight,
    /// Font size in pixels at export resolution
    pub font_size: f64,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub align: TextAlignment,
    #[serde(default)]
    pub background: BackgroundStyle,
    /// Color of the background box (ignored when `background` is `None`)
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glow: Option<GlowEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<StrokeEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientFill>,
    /// 1 or 2
    #[serde(default = "default_max_lines")]
    pub max_lines: u8,
}

fn default_background_color() -> String {
    "#000000".to_string()
}

fn default_max_lines() -> u8 {
    2
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            text_color: "#FFFFFF".to_string(),
            font_family: "Inter".to_string(),
            font_weight: FontWeight::Bold,
            font_size: 48.0,
            font_style: FontStyle::Normal,
            align: TextAlignment::Center,
            background: BackgroundStyle::None,
            background_color: default_background_color(),
            glow: None,
            stroke: None,
            gradient: None,
            max_lines: default_max_lines(),
        }
    }
}

impl ThemeConfig {
    pub fn glow_active(&self) -> Option<&GlowEffect> {
        self.glow.as_ref().filter(|g| g.enabled)
    }

    pub fn stroke_active(&self) -> Option<&StrokeEffect> {
        self.stroke.as_ref().filter(|s| s.enabled && s.width > 0.0)
    }

    pub fn gradient_active(&self) -> Option<&GradientFill> {
        self.gradient.as_ref().filter(|g| g.enabled)
    }

    /// Font shorthand in CSS order, e.g. `italic 700 48px Inter`
    pub fn font_descriptor(&self) -> String {
        let style = match self.font_style {
            FontStyle::Normal => "",
            FontStyle::Italic => "italic ",
        };
        format!(
            "{}{} {}px {}",
            style,
            self.font_weight.numeric(),
            self.font_size,
            self.font_family
        )
    }

    /// Clamps fields into their valid ranges
    pub fn normalized(mut self) -> Self {
        self.max_lines = self.max_lines.clamp(1, 2);
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            self.font_size = ThemeConfig::default().font_size;
        }
        self.font_size = self.font_size.min(400.0);
        if let Some(stroke) = self.stroke.as_mut() {
            if !stroke.width.is_finite() || stroke.width < 0.0 {
                stroke.width = 0.0;
            }
        }
        if self.font_family.trim().is_empty() {
            self.font_family = ThemeConfig::default().font_family;
        }
        self
    }
}

// =============================================================================
// Presets
// =============================================================================

/// White bold text on a translucent box
pub fn classic() -> ThemeConfig {
    ThemeConfig {
        background: BackgroundStyle::Translucent,
        ..ThemeConfig::default()
    }
}

/// Cyan text with a magenta glow
pub fn neon() -> ThemeConfig {
    ThemeConfig {
        text_color: "#00FFFF".to_string(),
        font_family: "Orbitron".to_string(),
        font_size: 56.0,
        glow: Some(GlowEffect {
            enabled: true,
            color: "#FF00FF".to_string(),
        }),
        ..ThemeConfig::default()
    }
}

/// Yellow-to-orange gradient with a black outline
pub fn karaoke() -> ThemeConfig {
    ThemeConfig {
        text_color: "#FFD700".to_string(),
        font_weight: FontWeight::Black,
        font_size: 60.0,
        stroke: Some(StrokeEffect {
            enabled: true,
            color: "#000000".to_string(),
            width: 4.0,
        }),
        gradient: Some(GradientFill {
            enabled: true,
            from: "#FFD700".to_string(),
            to: "#FF4500".to_string(),
        }),
        ..ThemeConfig::default()
    }
}

/// Light single-line italic text
pub fn minimal() -> ThemeConfig {
    ThemeConfig {
        font_family: "Helvetica".to_string(),
        font_weight: FontWeight::Normal,
        font_size: 40.0,
        font_style: FontStyle::Italic,
        max_lines: 1,
        ..ThemeConfig::default()
    }
}

/// Built-in themes keyed by name
pub fn builtin_themes() -> ThemeConfigs {
    [
        ("classic", classic()),
        ("neon", neon()),
        ("karaoke", karaoke()),
        ("minimal", minimal()),
    ]
    .into_iter()
    .map(|(name, config)| (name.to_string(), config))
    .collect()
}

/// Looks up a theme by name
pub fn resolve_theme<'a>(configs: &'a ThemeConfigs, name: &str) -> CoreResult<&'a ThemeConfig> {
    configs
        .get(name)
        .ok_or_else(|| CoreError::ThemeNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_themes_present() {
        let themes = builtin_themes();
        assert_eq!(themes.len(), 4);
        assert!(themes.contains_key(DEFAULT_THEME));
        assert!(resolve_theme(&themes, "neon").unwrap().glow_active().is_some());
        assert!(matches!(
            resolve_theme(&themes, "vaporwave"),
            Err(CoreError::ThemeNotFound(_))
        ));
    }

    #[test]
    fn test_disabled_effects_are_inactive() {
        let mut theme = karaoke();
        theme.gradient.as_mut().unwrap().enabled = false;
        theme.stroke.as_mut().unwrap().width = 0.0;
        assert!(theme.gradient_active().is_none());
        assert!(theme.stroke_active().is_none());
    }

    #[test]
    fn test_normalized_clamps_max_lines_and_size() {
        let theme = ThemeConfig {
            max_lines: 7,
            font_size: f64::NAN,
            font_family: " ".to_string(),
            ..ThemeConfig::default()
        }
        .normalized();
        assert_eq!(theme.max_lines, 2);
        assert_eq!(theme.font_size, 48.0);
        assert_eq!(theme.font_family, "Inter");
    }

    #[test]
    fn test_font_descriptor() {
        assert_eq!(minimal().font_descriptor(), "italic 400 40px Helvetica");
        assert_eq!(classic().font_descriptor(), "700 48px Inter");
    }

    #[test]
    fn test_theme_config_deserializes_with_defaults() {
        let theme: ThemeConfig = serde_json::from_str(
            r##"{"textColor":"#fff","fontFamily":"Arial","fontSize":32}"##,
        )
        .unwrap();
        assert_eq!(theme.max_lines, 2);
        assert_eq!(theme.background, BackgroundStyle::None);
        assert!(theme.glow.is_none());
    }
}
