//! Settings Persistence System
//!
//! Provides persistent editor settings with:
//! - Atomic file writes (temp file + rename)
//! - Schema defaults for every missing field
//! - Tolerant normalization instead of hard validation failures
//!
//! Storage location: {config_dir}/settings.json

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::fs::{atomic_write_json_pretty, read_json};
use crate::core::{CoreResult, TimeSec};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Timeline editing settings
    #[serde(default)]
    pub editor: EditorSettings,

    /// Frame composition settings
    #[serde(default)]
    pub compositor: CompositorSettings,

    /// Video export settings
    #[serde(default)]
    pub export: ExportSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            editor: EditorSettings::default(),
            compositor: CompositorSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

impl AppSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected rather than rejected, so an old or hand-edited
    /// file still loads.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        let editor = &mut self.editor;
        editor.default_line_duration = clamp_f64(editor.default_line_duration, 0.5, 60.0);
        editor.min_caption_duration = clamp_f64(editor.min_caption_duration, 0.05, 5.0);
        editor.history_limit = editor.history_limit.clamp(1, 1000);
        editor.edge_handle_px = clamp_f64(editor.edge_handle_px, 1.0, 64.0);
        if editor.default_line_text.trim().is_empty() {
            editor.default_line_text = default_line_text();
        }

        let compositor = &mut self.compositor;
        compositor.two_line_threshold = compositor.two_line_threshold.clamp(1, 500);
        compositor.line_height_factor = clamp_f64(compositor.line_height_factor, 0.5, 4.0);
        compositor.box_padding = clamp_f64(compositor.box_padding, 0.0, 200.0);
        compositor.glow_blur = clamp_f64(compositor.glow_blur, 0.0, 200.0);
        compositor.shadow_offset = clamp_f64(compositor.shadow_offset, 0.0, 100.0);
        compositor.shadow_blur = clamp_f64(compositor.shadow_blur, 0.0, 100.0);
        compositor.translucent_alpha = clamp_f64(compositor.translucent_alpha, 0.0, 1.0);
        compositor.char_advance = clamp_f64(compositor.char_advance, 0.1, 2.0);
        compositor.preview_width = compositor.preview_width.clamp(160, 3840);
        if !is_hex_color(&compositor.base_fill_color) {
            warn!(
                value = %compositor.base_fill_color,
                "Invalid base fill color in settings, using default"
            );
            compositor.base_fill_color = default_base_fill_color();
        }

        let export = &mut self.export;
        export.fps = export.fps.clamp(1, 120);
        export.container_extension = normalize_enum(
            &export.container_extension,
            &["webm", "mp4"],
            default_container_extension(),
        );
        if export.artifact_suffix.contains(['/', '\\']) {
            export.artifact_suffix = default_artifact_suffix();
        }
        export.done_dismiss_ms = export.done_dismiss_ms.min(600_000);
    }
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

fn normalize_enum(value: &str, allowed: &[&str], fallback: String) -> String {
    if allowed.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        value.to_ascii_lowercase()
    } else {
        fallback
    }
}

fn is_hex_color(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 7 || bytes[0] != b'#' {
        return false;
    }
    bytes[1..].iter().all(|b| b.is_ascii_hexdigit())
}

/// Timeline editing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditorSettings {
    /// Duration of lines created with "add line"
    #[serde(default = "default_line_duration")]
    pub default_line_duration: TimeSec,

    /// Text of lines created with "add line"
    #[serde(default = "default_line_text")]
    pub default_line_text: String,

    /// Shortest interval a drag or repair may produce
    #[serde(default = "default_min_caption_duration")]
    pub min_caption_duration: TimeSec,

    /// Maximum number of undo steps kept
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Width of the resize handles at each end of a caption block
    #[serde(default = "default_edge_handle_px")]
    pub edge_handle_px: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_line_duration: default_line_duration(),
            default_line_text: default_line_text(),
            min_caption_duration: default_min_caption_duration(),
            history_limit: default_history_limit(),
            edge_handle_px: default_edge_handle_px(),
        }
    }
}

fn default_line_duration() -> TimeSec {
    3.0
}

fn default_line_text() -> String {
    "New lyric line".to_string()
}

fn default_min_caption_duration() -> TimeSec {
    0.2
}

fn default_history_limit() -> usize {
    100
}

fn default_edge_handle_px() -> f64 {
    6.0
}

/// Frame composition settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositorSettings {
    /// Display text longer than this (in characters) may wrap to two lines
    #[serde(default = "default_two_line_threshold")]
    pub two_line_threshold: usize,

    /// Line spacing as a multiple of the font size
    #[serde(default = "default_line_height_factor")]
    pub line_height_factor: f64,

    /// Padding between text bounds and the background box
    #[serde(default = "default_box_padding")]
    pub box_padding: f64,

    /// Canvas fill drawn before the background image ("#RRGGBB")
    #[serde(default = "default_base_fill_color")]
    pub base_fill_color: String,

    /// Blur radius of the glow layer
    #[serde(default = "default_glow_blur")]
    pub glow_blur: f64,

    /// Offset of the fallback drop shadow
    #[serde(default = "default_shadow_offset")]
    pub shadow_offset: f64,

    /// Blur radius of the fallback drop shadow
    #[serde(default = "default_shadow_blur")]
    pub shadow_blur: f64,

    /// Alpha applied to the box color for translucent backgrounds
    #[serde(default = "default_translucent_alpha")]
    pub translucent_alpha: f64,

    /// Average glyph advance as a multiple of the font size
    #[serde(default = "default_char_advance")]
    pub char_advance: f64,

    /// Width of the live preview surface in pixels
    #[serde(default = "default_preview_width")]
    pub preview_width: u32,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            two_line_threshold: default_two_line_threshold(),
            line_height_factor: default_line_height_factor(),
            box_padding: default_box_padding(),
            base_fill_color: default_base_fill_color(),
            glow_blur: default_glow_blur(),
            shadow_offset: default_shadow_offset(),
            shadow_blur: default_shadow_blur(),
            translucent_alpha: default_translucent_alpha(),
            char_advance: default_char_advance(),
            preview_width: default_preview_width(),
        }
    }
}

fn default_two_line_threshold() -> usize {
    20
}

fn default_line_height_factor() -> f64 {
    1.2
}

fn default_box_padding() -> f64 {
    16.0
}

fn default_base_fill_color() -> String {
    "#000000".to_string()
}

fn default_glow_blur() -> f64 {
    20.0
}

fn default_shadow_offset() -> f64 {
    2.0
}

fn default_shadow_blur() -> f64 {
    4.0
}

fn default_translucent_alpha() -> f64 {
    0.5
}

fn default_char_advance() -> f64 {
    0.55
}

fn default_preview_width() -> u32 {
    640
}

/// Video export settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// Frames rendered per second of audio
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Appended to the audio file stem to name the artifact
    #[serde(default = "default_artifact_suffix")]
    pub artifact_suffix: String,

    /// Container extension: "webm" or "mp4"
    #[serde(default = "default_container_extension")]
    pub container_extension: String,

    /// How long the finished export stays visible before returning to idle
    #[serde(default = "default_done_dismiss_ms")]
    pub done_dismiss_ms: u64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            artifact_suffix: default_artifact_suffix(),
            container_extension: default_container_extension(),
            done_dismiss_ms: default_done_dismiss_ms(),
        }
    }
}

impl ExportSettings {
    /// MIME type matching the container extension
    pub fn mime_type(&self) -> &'static str {
        match self.container_extension.as_str() {
            "mp4" => "video/mp4",
            _ => "video/webm",
        }
    }
}

fn default_fps() -> u32 {
    30
}

fn default_artifact_suffix() -> String {
    "_lyrics".to_string()
}

fn default_container_extension() -> String {
    "webm".to_string()
}

fn default_done_dismiss_ms() -> u64 {
    5000
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager for the given config directory
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            settings_path: config_dir.as_ref().join(SETTINGS_FILE),
        }
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if the file is missing or corrupt
    pub fn load(&self) -> AppSettings {
        if !self.settings_path.exists() {
            info!("Settings file not found, using defaults");
            return AppSettings::default();
        }

        match read_json::<AppSettings>(&self.settings_path) {
            Ok(mut settings) => {
                if settings.version < SETTINGS_VERSION {
                    info!(
                        "Migrating settings from version {} to {}",
                        settings.version, SETTINGS_VERSION
                    );
                }
                settings.normalize();
                settings
            }
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Save settings to disk atomically. Returns the normalized settings actually written.
    pub fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        let mut normalized = settings.clone();
        normalized.normalize();
        atomic_write_json_pretty(&self.settings_path, &normalized)?;
        info!("Settings saved to {:?}", self.settings_path);
        Ok(normalized)
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<AppSettings> {
        if self.settings_path.exists() {
            fs::remove_file(&self.settings_path)?;
            info!("Settings file deleted");
        }
        Ok(AppSettings::default())
    }
}
