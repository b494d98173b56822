//! Render Pipeline Module
//!
//! Handles frame composition for preview and the offline export loop.
//!
//! # Modules
//!
//! - `clock`: Playback clocks (audio-driven preview, frame-stepped export)
//! - `compositor`: Pure frame composition into ordered draw layers
//! - `export`: Export orchestrator and its phase state machine
//! - `layout`: Line splitting, cover-fit cropping and text measurement
//! - `media`: Audio source and background image loading
//! - `sink`: Frame sinks and audio muxers

mod clock;
mod compositor;
mod export;
mod layout;
mod media;
mod sink;

pub use clock::{PlaybackClock, VirtualClock};
pub use compositor::{
    render_frame, DrawLayer, FontSpec, FrameInput, FramePlan, Paint, TextRun,
};
pub use export::*;
pub use layout::{
    cover_source_rect, preview_size, split_caption_lines, ApproxTextMeasurer, TextMeasurer,
};
pub use media::{AudioSource, FsImageLoader, ImageLoader, StaticImageLoader};
pub use sink::{AudioMuxer, EncodedVideo, FrameSink, InMemorySink, PassthroughMuxer, SinkConfig};
