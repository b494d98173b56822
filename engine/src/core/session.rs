//! Editor Session
//!
//! The single owner of an editing session: the document history, the active
//! drag gesture, the settings, and the audio resource. Every mutation of the
//! document goes through here so history and gesture rules hold in one place.
//!
//! A drag gesture owns the document exclusively until release: discrete
//! actions and undo/redo are rejected with [`CoreError::GestureInProgress`]
//! while one is active.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::core::captions::{
    self, append_utterance, export_srt, parse_srt, timeline_extent, transcribe_captions,
    CaptionProvider, DictationSource,
};
use crate::core::commands::{apply_action, EditorAction, History};
use crate::core::project::{CaptionPosition, EditorPatch, EditorState, ImageHandle, Snapshot};
use crate::core::render::{
    preview_size, render_frame, ApproxTextMeasurer, AudioSource, ExportArtifact,
    ExportOrchestrator, ExportResources, FrameInput, FramePlan, ImageLoader,
};
use crate::core::settings::AppSettings;
use crate::core::theme::ThemeConfig;
use crate::core::timeline::{hit_test, DragEngine, DragMode, DragSession, TrackGeometry, TrackHit};
use crate::core::{AspectRatio, CoreError, CoreResult, TimeSec};

/// Interactive editing session over one document
#[derive(Debug)]
pub struct EditorSession {
    history: History,
    drag: DragEngine,
    /// Whether the active drag has pushed its undo checkpoint
    drag_checkpointed: bool,
    settings: AppSettings,
    audio: Option<AudioSource>,
    measurer: ApproxTextMeasurer,
    is_dirty: bool,
}

impl EditorSession {
    /// Creates a session over an empty document
    pub fn new(settings: AppSettings) -> Self {
        Self::with_state(EditorState::default(), settings)
    }

    /// Creates a session over an existing document
    pub fn with_state(state: EditorState, mut settings: AppSettings) -> Self {
        settings.normalize();
        let measurer = ApproxTextMeasurer::new(settings.compositor.char_advance);
        Self {
            history: History::with_limit(state, settings.editor.history_limit),
            drag: DragEngine::new(),
            drag_checkpointed: false,
            settings,
            audio: None,
            measurer,
            is_dirty: false,
        }
    }

    /// Opens a saved document. History starts empty.
    pub fn open(path: &Path, settings: AppSettings) -> CoreResult<Self> {
        let data = Snapshot::load(path)?;
        info!(path = %path.display(), "Document opened");
        Ok(Self::with_state(data.state, settings))
    }

    /// Saves the current document and clears the dirty flag
    pub fn save(&mut self, path: &Path) -> CoreResult<()> {
        Snapshot::save(path, self.history.present())?;
        self.is_dirty = false;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn state(&self) -> &EditorState {
        self.history.present()
    }

    pub fn captions(&self) -> &[captions::CaptionLine] {
        self.state().caption_lines()
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn audio(&self) -> Option<&AudioSource> {
        self.audio.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    pub fn can_undo(&self) -> bool {
        !self.is_dragging() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.is_dragging() && self.history.can_redo()
    }

    /// Length the timeline track spans: the audio if loaded, else the captions
    pub fn total_duration(&self) -> TimeSec {
        match &self.audio {
            Some(audio) if audio.has_playable_duration() => audio.duration,
            _ => timeline_extent(self.captions()),
        }
    }

    /// Geometry of a track `width_px` wide over the whole timeline
    pub fn track_geometry(&self, width_px: f64) -> TrackGeometry {
        TrackGeometry::new(width_px, self.total_duration())
    }

    // -------------------------------------------------------------------------
    // Discrete actions
    // -------------------------------------------------------------------------

    /// Applies an action as one undo step.
    ///
    /// Returns false when the action changed nothing (no history entry).
    pub fn dispatch(&mut self, action: EditorAction) -> CoreResult<bool> {
        if self.drag.is_active() {
            return Err(CoreError::GestureInProgress);
        }

        let patch = apply_action(self.history.present(), &action, &self.settings.editor)?;
        if patch.is_empty() {
            debug!(action = action.kind(), "Action produced no change");
            return Ok(false);
        }

        self.history.commit(&patch);
        self.is_dirty = true;
        debug!(action = action.kind(), "Action applied");
        Ok(true)
    }

    pub fn add_line(&mut self, current_time: TimeSec) -> CoreResult<bool> {
        self.dispatch(EditorAction::AddLine { current_time })
    }

    pub fn delete_line(&mut self, index: usize) -> CoreResult<bool> {
        self.dispatch(EditorAction::DeleteLine { index })
    }

    pub fn update_text(&mut self, index: usize, text: impl Into<String>) -> CoreResult<bool> {
        self.dispatch(EditorAction::UpdateText {
            index,
            text: text.into(),
        })
    }

    pub fn retime(&mut self, index: usize, start: TimeSec, end: TimeSec) -> CoreResult<bool> {
        self.dispatch(EditorAction::Retime { index, start, end })
    }

    pub fn accept_emoji(&mut self, index: usize) -> CoreResult<bool> {
        self.dispatch(EditorAction::AcceptEmoji { index })
    }

    pub fn reject_emoji(&mut self, index: usize) -> CoreResult<bool> {
        self.dispatch(EditorAction::RejectEmoji { index })
    }

    pub fn set_theme(&mut self, name: impl Into<String>) -> CoreResult<bool> {
        self.dispatch(EditorAction::SetTheme { name: name.into() })
    }

    pub fn update_active_theme_config(&mut self, config: ThemeConfig) -> CoreResult<bool> {
        self.dispatch(EditorAction::UpdateActiveThemeConfig { config })
    }

    pub fn set_caption_position(&mut self, position: CaptionPosition) -> CoreResult<bool> {
        self.dispatch(EditorAction::SetCaptionPosition { position })
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) -> CoreResult<bool> {
        self.dispatch(EditorAction::SetAspectRatio { aspect_ratio })
    }

    /// Replaces the background image; the previous handle is released
    pub fn set_background(&mut self, image: Option<ImageHandle>) -> CoreResult<bool> {
        let previous = self.state().background_image.clone();
        let changed = self.dispatch(EditorAction::SetBackgroundImage { image })?;
        if changed {
            if let Some(previous) = previous {
                debug!(source = %previous.source, "Released background image");
            }
        }
        Ok(changed)
    }

    /// Loads an image through `loader` and makes it the background
    pub async fn load_background(
        &mut self,
        loader: &dyn ImageLoader,
        source: &str,
    ) -> CoreResult<bool> {
        if self.drag.is_active() {
            return Err(CoreError::GestureInProgress);
        }
        let image = loader.load(source).await?;
        self.set_background(Some(image))
    }

    /// Replaces the audio track. Captions and history are kept.
    pub fn set_audio(&mut self, audio: AudioSource) {
        info!(
            name = %audio.name,
            duration = audio.duration,
            "Audio loaded"
        );
        if let Some(previous) = self.audio.replace(audio) {
            debug!(name = %previous.name, "Released previous audio");
        }
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    pub fn undo(&mut self) -> CoreResult<bool> {
        if self.drag.is_active() {
            return Err(CoreError::GestureInProgress);
        }
        let changed = self.history.undo();
        self.is_dirty |= changed;
        Ok(changed)
    }

    pub fn redo(&mut self) -> CoreResult<bool> {
        if self.drag.is_active() {
            return Err(CoreError::GestureInProgress);
        }
        let changed = self.history.redo();
        self.is_dirty |= changed;
        Ok(changed)
    }

    // -------------------------------------------------------------------------
    // Track interaction
    // -------------------------------------------------------------------------

    /// Handles a pointer-down on the track.
    ///
    /// A hit on a caption block begins a drag (and suppresses seeking); a hit
    /// on empty track returns the time to seek to.
    pub fn track_pointer_down(
        &mut self,
        pointer_x: f64,
        geometry: &TrackGeometry,
    ) -> CoreResult<TrackHit> {
        let hit = hit_test(
            self.captions(),
            pointer_x,
            geometry,
            self.settings.editor.edge_handle_px,
        );
        if let TrackHit::Caption { index, mode } = hit {
            self.drag_begin(index, mode, pointer_x)?;
        }
        Ok(hit)
    }

    pub fn drag_begin(
        &mut self,
        index: usize,
        mode: DragMode,
        pointer_x: f64,
    ) -> CoreResult<DragSession> {
        let history = &self.history;
        let session = self
            .drag
            .begin(history.present().caption_lines(), index, mode, pointer_x)?;
        self.drag_checkpointed = false;
        Ok(session)
    }

    /// Moves the active drag to `pointer_x`.
    ///
    /// The first change pushes one undo checkpoint; every later update
    /// overwrites the present so the whole gesture undoes in one step.
    pub fn drag_update(&mut self, pointer_x: f64, geometry: &TrackGeometry) -> CoreResult<bool> {
        let min_duration = self.settings.editor.min_caption_duration;
        let Some(patch) = self.drag.update(pointer_x, geometry, min_duration)? else {
            return Ok(false);
        };

        if !self.drag_checkpointed {
            self.history.commit(&EditorPatch::default());
            self.drag_checkpointed = true;
        }
        self.history.commit_coalesced(&patch);
        self.is_dirty = true;
        Ok(true)
    }

    /// Releases the drag. The last computed interval stays; no history action.
    pub fn drag_end(&mut self) -> CoreResult<DragSession> {
        let session = self.drag.end()?;
        self.drag_checkpointed = false;
        Ok(session)
    }

    // -------------------------------------------------------------------------
    // Caption sources
    // -------------------------------------------------------------------------

    /// Generates captions for the loaded audio and replaces the caption list.
    ///
    /// On failure the existing captions are untouched.
    pub async fn import_captions(&mut self, provider: &dyn CaptionProvider) -> CoreResult<usize> {
        if self.drag.is_active() {
            return Err(CoreError::GestureInProgress);
        }
        let audio = self
            .audio
            .as_ref()
            .ok_or_else(|| CoreError::ValidationError("No audio loaded".to_string()))?;

        let lines = transcribe_captions(
            provider,
            &audio.bytes,
            &audio.mime_type,
            self.settings.editor.min_caption_duration,
        )
        .await?;

        let count = lines.len();
        self.dispatch(EditorAction::SetCaptions { captions: lines })?;
        Ok(count)
    }

    /// Replaces the caption list with the contents of an SRT file
    pub fn import_srt(&mut self, content: &str) -> CoreResult<usize> {
        let lines = parse_srt(content).map_err(|e| CoreError::ValidationError(e.to_string()))?;
        let count = lines.len();
        self.dispatch(EditorAction::SetCaptions { captions: lines })?;
        Ok(count)
    }

    /// Exports the current captions as SRT
    pub fn export_srt(&self) -> String {
        export_srt(self.captions())
    }

    /// Appends each utterance from `source` to the caption at `index`.
    ///
    /// Each non-blank utterance is one undo step. Returns the number applied.
    pub async fn dictate(
        &mut self,
        source: &mut dyn DictationSource,
        index: usize,
    ) -> CoreResult<usize> {
        let mut applied = 0;
        while let Some(utterance) = source.next_transcript().await {
            if utterance.trim().is_empty() {
                continue;
            }
            let current = self
                .captions()
                .get(index)
                .ok_or(CoreError::CaptionNotFound(index))?;
            let text = append_utterance(&current.text, &utterance);
            if self.update_text(index, text)? {
                applied += 1;
            }
        }
        debug!(index, applied, "Dictation finished");
        Ok(applied)
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Composes the frame at `time` at export resolution
    pub fn render_frame(&self, time: TimeSec) -> CoreResult<FramePlan> {
        let input = FrameInput::from_state(self.state(), time)?;
        Ok(render_frame(&input, &self.settings.compositor, &self.measurer))
    }

    /// Composes the frame at `time` scaled to the preview width
    pub fn preview_frame(&self, time: TimeSec) -> CoreResult<FramePlan> {
        let frame = self.render_frame(time)?;
        let target = preview_size(frame.size(), self.settings.compositor.preview_width);
        Ok(frame.scaled(target))
    }

    /// Export orchestrator configured from the session settings
    pub fn export_orchestrator(&self) -> ExportOrchestrator {
        ExportOrchestrator::new(
            self.settings.compositor.clone(),
            self.settings.export.clone(),
        )
    }

    /// Exports the current document against the loaded audio
    pub async fn export<'a>(
        &self,
        orchestrator: &'a mut ExportOrchestrator,
        resources: ExportResources<'_>,
    ) -> CoreResult<&'a ExportArtifact> {
        if self.drag.is_active() {
            return Err(CoreError::GestureInProgress);
        }
        let Some(audio) = &self.audio else {
            warn!("Export requested without audio");
            return Err(CoreError::ExportFailed("No audio loaded".to_string()));
        };
        orchestrator.run(self.state(), audio, resources).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::captions::{CaptionLine, RawCaption, ScriptedDictation};
    use crate::core::render::{InMemorySink, PassthroughMuxer, StaticImageLoader};
    use crate::core::Size2D;
    use async_trait::async_trait;
    use tempfile::TempDir;

    fn session_with(captions: Vec<CaptionLine>) -> EditorSession {
        let state = EditorState {
            captions: Some(captions),
            ..EditorState::default()
        };
        let mut session = EditorSession::with_state(state, AppSettings::default());
        session.set_audio(AudioSource::new("song.mp3", "audio/mpeg", vec![1u8, 2, 3], 20.0));
        session
    }

    fn two_lines() -> Vec<CaptionLine> {
        vec![
            CaptionLine::new(2.0, 5.0, "first").with_emoji("🔥"),
            CaptionLine::new(8.0, 10.0, "second"),
        ]
    }

    // 1 px == 0.1 s over 20 s
    fn track() -> TrackGeometry {
        TrackGeometry::new(200.0, 20.0)
    }

    struct FixedProvider(Vec<RawCaption>);

    #[async_trait]
    impl CaptionProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn transcribe(&self, _audio: &[u8], _mime: &str) -> CoreResult<Vec<RawCaption>> {
            if self.0.is_empty() {
                return Err(CoreError::Internal("service unavailable".to_string()));
            }
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_dispatch_commits_one_step_per_action() {
        let mut session = session_with(two_lines());
        assert!(session.add_line(12.0).unwrap());
        assert!(session.update_text(0, "changed").unwrap());
        assert_eq!(session.history().past_len(), 2);
        assert!(session.is_dirty());

        assert!(session.undo().unwrap());
        assert_eq!(session.captions()[0].text, "first");
        assert!(session.redo().unwrap());
        assert_eq!(session.captions()[0].text, "changed");
    }

    #[test]
    fn test_caption_action_without_captions_is_noop() {
        let mut session = EditorSession::new(AppSettings::default());
        assert!(!session.delete_line(0).unwrap());
        assert!(!session.history().can_undo());

        assert!(session.add_line(1.0).unwrap());
        assert_eq!(session.captions()[0].text, "New lyric line");
    }

    #[test]
    fn test_accept_emoji_merges_into_text() {
        let mut session = session_with(two_lines());
        session.accept_emoji(0).unwrap();
        assert_eq!(session.captions()[0].text, "🔥 first");
        assert_eq!(session.captions()[0].emoji, None);
    }

    #[test]
    fn test_pointer_down_on_empty_track_seeks() {
        let mut session = session_with(two_lines());
        let hit = session.track_pointer_down(150.0, &track()).unwrap();
        assert_eq!(hit, TrackHit::Empty { time: 15.0 });
        assert!(!session.is_dragging());
    }

    #[test]
    fn test_drag_is_one_undo_step() {
        let mut session = session_with(two_lines());
        let hit = session.track_pointer_down(35.0, &track()).unwrap();
        assert_eq!(
            hit,
            TrackHit::Caption {
                index: 0,
                mode: DragMode::Move
            }
        );

        for x in [40.0, 45.0, 50.0, 55.0] {
            assert!(session.drag_update(x, &track()).unwrap());
        }
        session.drag_end().unwrap();

        let moved = &session.captions()[0];
        assert!((moved.start_time - 4.0).abs() < 1e-9);
        assert!((moved.end_time - 7.0).abs() < 1e-9);
        assert_eq!(session.history().past_len(), 1);

        session.undo().unwrap();
        assert_eq!(session.captions()[0].start_time, 2.0);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_drag_without_movement_leaves_no_history() {
        let mut session = session_with(two_lines());
        session.track_pointer_down(35.0, &track()).unwrap();
        assert!(!session.drag_update(35.0, &track()).unwrap());
        session.drag_end().unwrap();
        assert!(!session.history().can_undo());
    }

    #[test]
    fn test_actions_rejected_during_drag() {
        let mut session = session_with(two_lines());
        session.drag_begin(1, DragMode::ResizeEnd, 100.0).unwrap();

        assert!(matches!(
            session.add_line(0.0),
            Err(CoreError::GestureInProgress)
        ));
        assert!(matches!(session.undo(), Err(CoreError::GestureInProgress)));
        assert!(matches!(
            session.drag_begin(0, DragMode::Move, 30.0),
            Err(CoreError::GestureInProgress)
        ));

        session.drag_end().unwrap();
        assert!(session.add_line(0.0).unwrap());
    }

    #[test]
    fn test_resize_end_keeps_minimum_duration() {
        let mut session = session_with(two_lines());
        session.drag_begin(1, DragMode::ResizeEnd, 100.0).unwrap();
        session.drag_update(0.0, &track()).unwrap();
        session.drag_end().unwrap();

        let line = &session.captions()[1];
        assert_eq!(line.start_time, 8.0);
        assert!((line.end_time - 8.2).abs() < 1e-9);
    }

    #[test]
    fn test_drag_end_without_drag_fails() {
        let mut session = session_with(two_lines());
        assert!(matches!(session.drag_end(), Err(CoreError::NoActiveGesture)));
    }

    #[tokio::test]
    async fn test_import_captions_replaces_list() {
        let mut session = session_with(two_lines());
        let provider = FixedProvider(vec![
            RawCaption::new("00:03.000", "00:04.000", "b"),
            RawCaption::new("00:01.000", "00:02.000", "a"),
        ]);
        assert_eq!(session.import_captions(&provider).await.unwrap(), 2);
        assert_eq!(session.captions()[0].text, "a");
        assert!(session.can_undo());
    }

    #[tokio::test]
    async fn test_import_failure_keeps_captions() {
        let mut session = session_with(two_lines());
        let err = session
            .import_captions(&FixedProvider(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::CaptioningFailed(_)));
        assert_eq!(session.captions(), two_lines().as_slice());
        assert!(!session.can_undo());
    }

    #[tokio::test]
    async fn test_import_requires_audio() {
        let mut session = EditorSession::new(AppSettings::default());
        let err = session
            .import_captions(&FixedProvider(vec![RawCaption::new("0:01", "0:02", "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_dictation_appends_per_utterance() {
        let mut session = session_with(two_lines());
        let mut source = ScriptedDictation::new(["hello", "  ", "world"]);
        assert_eq!(session.dictate(&mut source, 1).await.unwrap(), 2);
        assert_eq!(session.captions()[1].text, "second hello world");
        assert_eq!(session.history().past_len(), 2);
    }

    #[test]
    fn test_srt_import_and_export() {
        let mut session = EditorSession::new(AppSettings::default());
        let count = session
            .import_srt("1\n00:00:01,000 --> 00:00:02,500\nHi there\n")
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            session.export_srt(),
            "1\n00:00:01,000 --> 00:00:02,500\nHi there\n"
        );

        let err = session.import_srt("garbage").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_background_swap() {
        let mut session = session_with(two_lines());
        let loader = StaticImageLoader::new()
            .with_image("a.png", Size2D::new(10, 10))
            .with_image("b.png", Size2D::new(20, 20));

        session.load_background(&loader, "a.png").await.unwrap();
        session.load_background(&loader, "b.png").await.unwrap();
        assert_eq!(
            session.state().background_image.as_ref().unwrap().source,
            "b.png"
        );

        assert!(session.load_background(&loader, "missing.png").await.is_err());
        assert_eq!(
            session.state().background_image.as_ref().unwrap().source,
            "b.png"
        );
    }

    #[test]
    fn test_preview_frame_is_scaled() {
        let session = session_with(two_lines());
        let frame = session.preview_frame(3.0).unwrap();
        assert_eq!(frame.width, 640);
        assert_eq!(frame.height, 360);
        assert_eq!(frame.text_lines(), vec!["🔥 first"]);
    }

    #[test]
    fn test_save_and_open_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = Snapshot::default_path(dir.path());

        let mut session = session_with(two_lines());
        session.set_theme("neon").unwrap();
        session.save(&path).unwrap();
        assert!(!session.is_dirty());

        let reopened = EditorSession::open(&path, AppSettings::default()).unwrap();
        assert_eq!(reopened.state().theme, "neon");
        assert_eq!(reopened.captions().len(), 2);
        assert!(!reopened.can_undo());
    }

    #[tokio::test]
    async fn test_export_through_session() {
        let session = session_with(vec![CaptionLine::new(0.0, 1.0, "hi")]);
        let mut orchestrator = session.export_orchestrator();
        let mut sink = InMemorySink::new();
        let images = StaticImageLoader::new();
        let measurer = ApproxTextMeasurer::default();

        let artifact = session
            .export(
                &mut orchestrator,
                ExportResources {
                    sink: &mut sink,
                    muxer: &PassthroughMuxer,
                    images: &images,
                    measurer: &measurer,
                },
            )
            .await
            .unwrap();
        assert_eq!(artifact.file_name, "song_lyrics.webm");
        assert_eq!(sink.frames().len(), 600);
    }
}
