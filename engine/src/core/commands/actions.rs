//! Editor Actions
//!
//! Discrete user actions and the pure reducer that turns one into a patch
//! against the current document. The reducer never mutates; the session
//! decides whether the patch becomes a history step.

use serde::{Deserialize, Serialize};

use crate::core::captions::{self, CaptionLine};
use crate::core::project::{CaptionPosition, EditorPatch, EditorState, ImageHandle};
use crate::core::settings::EditorSettings;
use crate::core::theme::{resolve_theme, ThemeConfig};
use crate::core::{AspectRatio, CoreResult, TimeSec};

/// A discrete edit of the document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditorAction {
    /// Inserts a default line at the playback time
    AddLine { current_time: TimeSec },
    DeleteLine { index: usize },
    UpdateText { index: usize, text: String },
    Retime {
        index: usize,
        start: TimeSec,
        end: TimeSec,
    },
    AcceptEmoji { index: usize },
    RejectEmoji { index: usize },
    /// Replaces all captions (AI result or file import)
    SetCaptions { captions: Vec<CaptionLine> },
    /// Switches the active theme
    SetTheme { name: String },
    /// Replaces the active theme's config
    UpdateActiveThemeConfig { config: ThemeConfig },
    SetCaptionPosition { position: CaptionPosition },
    SetAspectRatio { aspect_ratio: AspectRatio },
    SetBackgroundImage { image: Option<ImageHandle> },
}

impl EditorAction {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            EditorAction::AddLine { .. } => "addLine",
            EditorAction::DeleteLine { .. } => "deleteLine",
            EditorAction::UpdateText { .. } => "updateText",
            EditorAction::Retime { .. } => "retime",
            EditorAction::AcceptEmoji { .. } => "acceptEmoji",
            EditorAction::RejectEmoji { .. } => "rejectEmoji",
            EditorAction::SetCaptions { .. } => "setCaptions",
            EditorAction::SetTheme { .. } => "setTheme",
            EditorAction::UpdateActiveThemeConfig { .. } => "updateActiveThemeConfig",
            EditorAction::SetCaptionPosition { .. } => "setCaptionPosition",
            EditorAction::SetAspectRatio { .. } => "setAspectRatio",
            EditorAction::SetBackgroundImage { .. } => "setBackgroundImage",
        }
    }
}

/// Computes the patch an action produces against `state`.
///
/// Caption edits on a document without captions yield an empty patch,
/// except `AddLine`, which starts a new list.
pub fn apply_action(
    state: &EditorState,
    action: &EditorAction,
    settings: &EditorSettings,
) -> CoreResult<EditorPatch> {
    let patch = match action {
        EditorAction::AddLine { current_time } => EditorPatch::captions(captions::add_line(
            state.caption_lines(),
            *current_time,
            settings.default_line_duration,
            &settings.default_line_text,
        )?),
        EditorAction::DeleteLine { index } => {
            edit_captions(state, |lines| captions::delete_line(lines, *index))?
        }
        EditorAction::UpdateText { index, text } => {
            edit_captions(state, |lines| captions::update_text(lines, *index, text))?
        }
        EditorAction::Retime { index, start, end } => {
            edit_captions(state, |lines| captions::retime(lines, *index, *start, *end))?
        }
        EditorAction::AcceptEmoji { index } => {
            edit_captions(state, |lines| captions::accept_emoji_suggestion(lines, *index))?
        }
        EditorAction::RejectEmoji { index } => {
            edit_captions(state, |lines| captions::reject_emoji_suggestion(lines, *index))?
        }
        EditorAction::SetCaptions { captions: lines } => {
            let mut lines = lines.clone();
            captions::sort_captions(&mut lines);
            EditorPatch::captions(lines)
        }
        EditorAction::SetTheme { name } => {
            resolve_theme(&state.theme_configs, name)?;
            EditorPatch {
                theme: Some(name.clone()),
                ..EditorPatch::default()
            }
        }
        EditorAction::UpdateActiveThemeConfig { config } => {
            resolve_theme(&state.theme_configs, &state.theme)?;
            let mut configs = state.theme_configs.clone();
            configs.insert(state.theme.clone(), config.clone().normalized());
            EditorPatch {
                theme_configs: Some(configs),
                ..EditorPatch::default()
            }
        }
        EditorAction::SetCaptionPosition { position } => EditorPatch {
            caption_position: Some(CaptionPosition::new(position.x, position.y)),
            ..EditorPatch::default()
        },
        EditorAction::SetAspectRatio { aspect_ratio } => EditorPatch {
            aspect_ratio: Some(*aspect_ratio),
            ..EditorPatch::default()
        },
        EditorAction::SetBackgroundImage { image } => EditorPatch {
            background_image: Some(image.clone()),
            ..EditorPatch::default()
        },
    };
    Ok(patch)
}

/// Applies an action and returns the resulting document
pub fn reduce(
    state: &EditorState,
    action: &EditorAction,
    settings: &EditorSettings,
) -> CoreResult<EditorState> {
    let patch = apply_action(state, action, settings)?;
    Ok(state.apply(&patch))
}

fn edit_captions<F>(state: &EditorState, edit: F) -> CoreResult<EditorPatch>
where
    F: FnOnce(&[CaptionLine]) -> CoreResult<Vec<CaptionLine>>,
{
    match state.captions.as_deref() {
        Some(lines) => Ok(EditorPatch::captions(edit(lines)?)),
        None => Ok(EditorPatch::default()),
    }
}
