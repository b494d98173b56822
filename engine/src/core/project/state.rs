//! Editor State Module
//!
//! The editable document: everything undo/redo snapshots as one unit.

use serde::{Deserialize, Serialize};

use crate::core::captions::CaptionLine;
use crate::core::theme::{builtin_themes, resolve_theme, ThemeConfig, ThemeConfigs, DEFAULT_THEME};
use crate::core::{AspectRatio, CoreResult, Size2D};

// =============================================================================
// Caption Position
// =============================================================================

/// Caption anchor as percentages of the frame, both axes clamped to `[0, 100]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCaptionPosition")]
pub struct CaptionPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Deserialize)]
struct RawCaptionPosition {
    x: f64,
    y: f64,
}

impl From<RawCaptionPosition> for CaptionPosition {
    fn from(raw: RawCaptionPosition) -> Self {
        CaptionPosition::new(raw.x, raw.y)
    }
}

impl CaptionPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }

    /// Resolves the anchor point in pixels for a frame of the given size
    pub fn to_pixels(&self, size: Size2D) -> (f64, f64) {
        (
            self.x / 100.0 * f64::from(size.width),
            self.y / 100.0 * f64::from(size.height),
        )
    }
}

impl Default for CaptionPosition {
    fn default() -> Self {
        Anchor::BottomCenter.position()
    }
}

impl From<Anchor> for CaptionPosition {
    fn from(anchor: Anchor) -> Self {
        anchor.position()
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        50.0
    }
}

/// Named positions on a 3×3 grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    Center,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub fn position(self) -> CaptionPosition {
        let (column, row) = match self {
            Anchor::TopLeft => (0, 0),
            Anchor::TopCenter => (1, 0),
            Anchor::TopRight => (2, 0),
            Anchor::MiddleLeft => (0, 1),
            Anchor::Center => (1, 1),
            Anchor::MiddleRight => (2, 1),
            Anchor::BottomLeft => (0, 2),
            Anchor::BottomCenter => (1, 2),
            Anchor::BottomRight => (2, 2),
        };
        const STOPS: [f64; 3] = [10.0, 50.0, 90.0];
        CaptionPosition::new(STOPS[column], STOPS[row])
    }
}

// =============================================================================
// Image Handle
// =============================================================================

/// Opaque handle to a decoded image resource with its intrinsic size
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageHandle {
    /// Where the image came from (path or URL)
    pub source: String,
    pub width: u32,
    pub height: u32,
}

impl ImageHandle {
    pub fn new(source: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            source: source.into(),
            width,
            height,
        }
    }

    pub fn size(&self) -> Size2D {
        Size2D::new(self.width, self.height)
    }
}

// =============================================================================
// Editor State
// =============================================================================

/// The editable document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    /// `None` until captions are generated, imported, or a line is added
    #[serde(default)]
    pub captions: Option<Vec<CaptionLine>>,
    /// Name of the active theme
    pub theme: String,
    pub theme_configs: ThemeConfigs,
    #[serde(default)]
    pub background_image: Option<ImageHandle>,
    #[serde(default)]
    pub caption_position: CaptionPosition,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            captions: None,
            theme: DEFAULT_THEME.to_string(),
            theme_configs: builtin_themes(),
            background_image: None,
            caption_position: CaptionPosition::default(),
            aspect_ratio: AspectRatio::default(),
        }
    }
}

impl EditorState {
    /// Captions as a slice, empty when absent
    pub fn caption_lines(&self) -> &[CaptionLine] {
        self.captions.as_deref().unwrap_or(&[])
    }

    pub fn active_theme(&self) -> CoreResult<&ThemeConfig> {
        resolve_theme(&self.theme_configs, &self.theme)
    }

    /// Applies a patch, replacing every field it carries
    pub fn apply(&self, patch: &EditorPatch) -> EditorState {
        let mut next = self.clone();
        if let Some(captions) = &patch.captions {
            next.captions = captions.clone();
        }
        if let Some(theme) = &patch.theme {
            next.theme = theme.clone();
        }
        if let Some(configs) = &patch.theme_configs {
            next.theme_configs = configs.clone();
        }
        if let Some(image) = &patch.background_image {
            next.background_image = image.clone();
        }
        if let Some(position) = patch.caption_position {
            next.caption_position = position;
        }
        if let Some(aspect_ratio) = patch.aspect_ratio {
            next.aspect_ratio = aspect_ratio;
        }
        next
    }
}

// =============================================================================
// Editor Patch
// =============================================================================

/// Partial replacement of [`EditorState`] fields.
///
/// Optional document fields use a nested `Option` so a patch can clear them:
/// `Some(None)` removes the value, `None` leaves it untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorPatch {
    pub captions: Option<Option<Vec<CaptionLine>>>,
    pub theme: Option<String>,
    pub theme_configs: Option<ThemeConfigs>,
    pub background_image: Option<Option<ImageHandle>>,
    pub caption_position: Option<CaptionPosition>,
    pub aspect_ratio: Option<AspectRatio>,
}

impl EditorPatch {
    pub fn captions(captions: Vec<CaptionLine>) -> Self {
        Self {
            captions: Some(Some(captions)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Field-wise merge: fields set in `other` win
    pub fn merge(mut self, other: EditorPatch) -> Self {
        if other.captions.is_some() {
            self.captions = other.captions;
        }
        if other.theme.is_some() {
            self.theme = other.theme;
        }
        if other.theme_configs.is_some() {
            self.theme_configs = other.theme_configs;
        }
        if other.background_image.is_some() {
            self.background_image = other.background_image;
        }
        if other.caption_position.is_some() {
            self.caption_position = other.caption_position;
        }
        if other.aspect_ratio.is_some() {
            self.aspect_ratio = other.aspect_ratio;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoreError;

    #[test]
    fn test_position_clamps() {
        let pos = CaptionPosition::new(-5.0, 140.0);
        assert_eq!((pos.x, pos.y), (0.0, 100.0));
        let pos = CaptionPosition::new(f64::NAN, 20.0);
        assert_eq!(pos.x, 50.0);
    }

    #[test]
    fn test_position_clamps_on_deserialize() {
        let pos: CaptionPosition = serde_json::from_str(r#"{"x": 250, "y": -1}"#).unwrap();
        assert_eq!(pos, CaptionPosition::new(100.0, 0.0));
    }

    #[test]
    fn test_anchor_grid() {
        assert_eq!(Anchor::TopLeft.position(), CaptionPosition::new(10.0, 10.0));
        assert_eq!(Anchor::Center.position(), CaptionPosition::new(50.0, 50.0));
        assert_eq!(
            Anchor::BottomRight.position(),
            CaptionPosition::new(90.0, 90.0)
        );
    }

    #[test]
    fn test_position_to_pixels() {
        let (x, y) = CaptionPosition::new(50.0, 90.0).to_pixels(Size2D::new(1280, 720));
        assert_eq!((x, y), (640.0, 648.0));
    }

    #[test]
    fn test_default_state() {
        let state = EditorState::default();
        assert!(state.captions.is_none());
        assert!(state.caption_lines().is_empty());
        assert_eq!(state.active_theme().unwrap(), &crate::core::theme::classic());
    }

    #[test]
    fn test_unknown_active_theme() {
        let state = EditorState {
            theme: "missing".to_string(),
            ..EditorState::default()
        };
        assert!(matches!(
            state.active_theme(),
            Err(CoreError::ThemeNotFound(_))
        ));
    }

    #[test]
    fn test_apply_patch_replaces_only_set_fields() {
        let state = EditorState {
            background_image: Some(ImageHandle::new("bg.png", 10, 10)),
            ..EditorState::default()
        };
        let patch = EditorPatch {
            aspect_ratio: Some(AspectRatio::Square),
            background_image: Some(None),
            ..EditorPatch::default()
        };
        let next = state.apply(&patch);
        assert_eq!(next.aspect_ratio, AspectRatio::Square);
        assert!(next.background_image.is_none());
        assert_eq!(next.theme, state.theme);
    }

    #[test]
    fn test_patch_merge_later_wins() {
        let a = EditorPatch {
            theme: Some("neon".to_string()),
            aspect_ratio: Some(AspectRatio::Portrait),
            ..EditorPatch::default()
        };
        let b = EditorPatch {
            theme: Some("minimal".to_string()),
            ..EditorPatch::default()
        };
        let merged = a.merge(b);
        assert_eq!(merged.theme.as_deref(), Some("minimal"));
        assert_eq!(merged.aspect_ratio, Some(AspectRatio::Portrait));
        assert!(EditorPatch::default().is_empty());
    }
}
