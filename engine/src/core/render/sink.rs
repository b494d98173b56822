//! Frame Sinks and Muxers
//!
//! Export pushes composed frames into a [`FrameSink`] in timeline order, then
//! hands the finished video stream and the audio to an [`AudioMuxer`].
//! Real encoders live outside the engine; the in-memory implementations here
//! back the CLI and the tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::compositor::FramePlan;
use super::media::AudioSource;
use crate::core::{CoreError, CoreResult};

/// Configuration handed to a sink before the first frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// A finished video stream without audio
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedVideo {
    pub config: SinkConfig,
    pub frame_count: u64,
    pub bytes: Vec<u8>,
}

/// Consumes frames in strictly increasing index order
pub trait FrameSink: Send {
    /// Called once before any frame is pushed
    fn begin(&mut self, config: SinkConfig) -> CoreResult<()>;
    fn push_frame(&mut self, index: u64, frame: &FramePlan) -> CoreResult<()>;
    /// Called once after the last frame
    fn finish(&mut self) -> CoreResult<EncodedVideo>;
    /// Drops anything buffered so far
    fn abort(&mut self);
}

/// Sink that keeps frame plans in memory and encodes them as JSON Lines
#[derive(Debug, Default)]
pub struct InMemorySink {
    config: Option<SinkConfig>,
    frames: Vec<(u64, FramePlan)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.config
    }

    pub fn frames(&self) -> &[(u64, FramePlan)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, config: SinkConfig) -> CoreResult<()> {
        self.config = Some(config);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, index: u64, frame: &FramePlan) -> CoreResult<()> {
        if self.config.is_none() {
            return Err(CoreError::RenderFailed(
                "Frame pushed before sink was configured".to_string(),
            ));
        }
        if let Some((last, _)) = self.frames.last() {
            if index <= *last {
                return Err(CoreError::RenderFailed(format!(
                    "Frame {} pushed after frame {}",
                    index, last
                )));
            }
        }
        self.frames.push((index, frame.clone()));
        Ok(())
    }

    fn finish(&mut self) -> CoreResult<EncodedVideo> {
        let config = self.config.ok_or_else(|| {
            CoreError::RenderFailed("Sink finished before it was configured".to_string())
        })?;

        let mut bytes = Vec::new();
        for (_, frame) in &self.frames {
            serde_json::to_writer(&mut bytes, frame)?;
            bytes.push(b'\n');
        }
        Ok(EncodedVideo {
            config,
            frame_count: self.frames.len() as u64,
            bytes,
        })
    }

    fn abort(&mut self) {
        self.frames.clear();
        self.config = None;
    }
}

/// Combines a video stream and an audio track into a container
#[async_trait]
pub trait AudioMuxer: Send + Sync {
    async fn mux(
        &self,
        video: EncodedVideo,
        audio: &AudioSource,
        mime_type: &str,
    ) -> CoreResult<Vec<u8>>;
}

/// Muxer that returns the video stream unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughMuxer;

#[async_trait]
impl AudioMuxer for PassthroughMuxer {
    async fn mux(
        &self,
        video: EncodedVideo,
        _audio: &AudioSource,
        _mime_type: &str,
    ) -> CoreResult<Vec<u8>> {
        Ok(video.bytes)
    }
}
