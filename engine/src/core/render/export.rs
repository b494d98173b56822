//! Export Orchestrator
//!
//! Renders the whole song offline: a virtual clock steps through the audio
//! at a fixed frame rate, each tick is composed and pushed into a frame
//! sink, and the finished stream is muxed with the audio.
//!
//! ```text
//! Idle -> Initializing -> Rendering -> Encoding -> Done -> (dismiss) -> Idle
//!            \______________\______________\
//!                     failure / cancel ------> Idle
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::clock::{PlaybackClock, VirtualClock};
use super::compositor::{render_frame, FrameInput};
use super::layout::TextMeasurer;
use super::media::{AudioSource, ImageLoader};
use super::sink::{AudioMuxer, FrameSink, SinkConfig};
use crate::core::project::EditorState;
use crate::core::settings::{CompositorSettings, ExportSettings};
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ExportPhase {
    #[default]
    Idle,
    Initializing,
    Rendering,
    Encoding,
    Done,
}

impl ExportPhase {
    pub fn is_running(self) -> bool {
        matches!(
            self,
            ExportPhase::Initializing | ExportPhase::Rendering | ExportPhase::Encoding
        )
    }
}

/// Export progress update
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProgress {
    pub phase: ExportPhase,
    /// Progress percentage (0-100)
    pub percent: f32,
    /// Frames rendered so far
    pub frame: u64,
    pub total_frames: u64,
}

/// Export error
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Audio has no playable duration")]
    InvalidDuration,
    #[error("Background image failed to load: {0}")]
    ImageLoad(String),
    #[error("Frame rendering failed: {0}")]
    Render(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Export cancelled")]
    Cancelled,
}

impl From<ExportError> for CoreError {
    fn from(err: ExportError) -> Self {
        CoreError::ExportFailed(err.to_string())
    }
}

/// The finished video
#[derive(Clone, Debug, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Names the artifact after the audio file: `<stem><suffix>.<extension>`
pub fn artifact_file_name(audio: &AudioSource, suffix: &str, extension: &str) -> String {
    format!("{}{}.{}", audio.stem(), suffix, extension)
}

/// Cancellation flag checked once per frame
#[derive(Clone, Debug, Default)]
pub struct ExportCancel(Arc<AtomicBool>);

impl ExportCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Collaborators an export run needs
pub struct ExportResources<'a> {
    pub sink: &'a mut dyn FrameSink,
    pub muxer: &'a dyn AudioMuxer,
    pub images: &'a dyn ImageLoader,
    pub measurer: &'a dyn TextMeasurer,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Drives one export at a time through the phase state machine
pub struct ExportOrchestrator {
    compositor: CompositorSettings,
    export: ExportSettings,
    phase: ExportPhase,
    percent: f32,
    artifact: Option<ExportArtifact>,
    last_error: Option<String>,
    done_at: Option<Instant>,
    cancel: ExportCancel,
    progress_tx: Option<mpsc::Sender<ExportProgress>>,
}

impl ExportOrchestrator {
    pub fn new(compositor: CompositorSettings, export: ExportSettings) -> Self {
        Self {
            compositor,
            export,
            phase: ExportPhase::Idle,
            percent: 0.0,
            artifact: None,
            last_error: None,
            done_at: None,
            cancel: ExportCancel::new(),
            progress_tx: None,
        }
    }

    /// Streams progress updates to `tx`
    pub fn with_progress(mut self, tx: mpsc::Sender<ExportProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn artifact(&self) -> Option<&ExportArtifact> {
        self.artifact.as_ref()
    }

    /// Takes the artifact out, returning the orchestrator to idle
    pub fn take_artifact(&mut self) -> Option<ExportArtifact> {
        let artifact = self.artifact.take();
        if self.phase == ExportPhase::Done {
            self.reset_to_idle();
        }
        artifact
    }

    /// Message of the last failed run
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Handle that cancels the running export from elsewhere
    pub fn cancel_handle(&self) -> ExportCancel {
        self.cancel.clone()
    }

    /// Returns to idle once the finished export has been shown long enough.
    ///
    /// Returns true if the orchestrator was dismissed.
    pub fn dismiss_if_expired(&mut self, now: Instant) -> bool {
        let delay = Duration::from_millis(self.export.done_dismiss_ms);
        match (self.phase, self.done_at) {
            (ExportPhase::Done, Some(done_at)) if now.saturating_duration_since(done_at) >= delay => {
                debug!("Export result dismissed");
                self.artifact = None;
                self.reset_to_idle();
                true
            }
            _ => false,
        }
    }

    /// Renders and muxes the whole document
    pub async fn run(
        &mut self,
        state: &EditorState,
        audio: &AudioSource,
        resources: ExportResources<'_>,
    ) -> CoreResult<&ExportArtifact> {
        if self.phase.is_running() {
            return Err(CoreError::ExportInProgress);
        }

        self.artifact = None;
        self.last_error = None;
        self.percent = 0.0;
        self.cancel.reset();

        let ExportResources {
            sink,
            muxer,
            images,
            measurer,
        } = resources;

        let result = self
            .execute(state, audio, &mut *sink, muxer, images, measurer)
            .await;
        match result {
            Ok(artifact) => {
                info!(
                    file_name = %artifact.file_name,
                    bytes = artifact.bytes.len(),
                    "Export finished"
                );
                self.percent = 100.0;
                self.done_at = Some(Instant::now());
                self.set_phase(ExportPhase::Done, 0, 0).await;
                Ok(self.artifact.insert(artifact))
            }
            Err(err) => {
                warn!("Export failed: {}", err);
                sink.abort();
                self.last_error = Some(err.to_string());
                self.reset_to_idle();
                self.report(0, 0).await;
                Err(err.into())
            }
        }
    }

    async fn execute(
        &mut self,
        state: &EditorState,
        audio: &AudioSource,
        sink: &mut dyn FrameSink,
        muxer: &dyn AudioMuxer,
        images: &dyn ImageLoader,
        measurer: &dyn TextMeasurer,
    ) -> Result<ExportArtifact, ExportError> {
        self.set_phase(ExportPhase::Initializing, 0, 0).await;

        if !audio.has_playable_duration() {
            return Err(ExportError::InvalidDuration);
        }

        let size = state.aspect_ratio.export_size();
        let fps = self.export.fps.max(1);
        sink.begin(SinkConfig {
            width: size.width,
            height: size.height,
            fps,
        })
        .map_err(|e| ExportError::Encode(e.to_string()))?;

        let background = match &state.background_image {
            Some(handle) => Some(
                images
                    .load(&handle.source)
                    .await
                    .map_err(|e| ExportError::ImageLoad(e.to_string()))?,
            ),
            None => None,
        };

        let theme = state
            .active_theme()
            .map_err(|e| ExportError::Render(e.to_string()))?;

        let mut clock = VirtualClock::new(fps, audio.duration);
        let total_frames = clock.total_frames();
        self.set_phase(ExportPhase::Rendering, 0, total_frames).await;
        clock.play();

        while !clock.is_finished() {
            if self.cancel.is_cancelled() {
                return Err(ExportError::Cancelled);
            }

            let input = FrameInput {
                time: clock.current_time(),
                captions: state.caption_lines(),
                theme,
                position: state.caption_position,
                aspect_ratio: state.aspect_ratio,
                background: background.as_ref(),
            };
            let plan = render_frame(&input, &self.compositor, measurer);
            sink.push_frame(clock.frame(), &plan)
                .map_err(|e| ExportError::Render(e.to_string()))?;
            clock.tick();

            self.percent = ((clock.current_time() / audio.duration) * 100.0).min(100.0) as f32;
            self.report(clock.frame(), total_frames).await;
            tokio::task::yield_now().await;
        }

        self.set_phase(ExportPhase::Encoding, total_frames, total_frames)
            .await;
        let video = sink
            .finish()
            .map_err(|e| ExportError::Encode(e.to_string()))?;
        let bytes = muxer
            .mux(video, audio, self.export.mime_type())
            .await
            .map_err(|e| ExportError::Encode(e.to_string()))?;

        if self.cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        Ok(ExportArtifact {
            file_name: artifact_file_name(
                audio,
                &self.export.artifact_suffix,
                &self.export.container_extension,
            ),
            bytes,
            mime: self.export.mime_type().to_string(),
        })
    }

    fn reset_to_idle(&mut self) {
        self.phase = ExportPhase::Idle;
        self.percent = 0.0;
        self.done_at = None;
    }

    async fn set_phase(&mut self, phase: ExportPhase, frame: u64, total_frames: u64) {
        info!(?phase, "Export phase");
        self.phase = phase;
        self.report(frame, total_frames).await;
    }

    async fn report(&self, frame: u64, total_frames: u64) {
        if let Some(tx) = &self.progress_tx {
            let update = ExportProgress {
                phase: self.phase,
                percent: self.percent,
                frame,
                total_frames,
            };
            // A dropped receiver only means nobody is watching
            let _ = tx.send(update).await;
        }
    }
}
