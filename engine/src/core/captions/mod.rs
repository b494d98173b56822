//! Caption System Module
//!
//! Timed lyric lines and everything that reads or writes them:
//! - Caption data model and pure timeline transformations
//! - Timestamp parsing and formatting
//! - SRT import/export and WebVTT export
//! - The captioning collaborator boundary and dictation input
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caption System                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  models.rs      - CaptionLine and timeline transformations      │
//! │  timestamp.rs   - "m:ss.ms" parsing, SRT/display formatting     │
//! │  formats.rs     - SRT/VTT parsing and export                    │
//! │  transcript.rs  - AI captioning provider trait and conversion   │
//! │  dictation.rs   - Speech-to-text input for a single line        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod dictation;
mod formats;
mod models;
mod timestamp;
pub mod transcript;

pub use dictation::{append_utterance, DictationSource, ScriptedDictation};
pub use formats::{export_srt, export_vtt, parse_srt, ParseError};
pub use models::{
    accept_emoji_suggestion, active_caption, add_line, delete_line, overlapping_pairs,
    reject_emoji_suggestion, retime, sort_captions, timeline_extent, update_text, CaptionLine,
    DEFAULT_LINE_DURATION,
};
pub use timestamp::{
    format_display_time, format_precise_time, format_srt_timestamp, format_vtt_timestamp,
    parse_timestamp,
};
pub use transcript::{
    captioning_prompt, captions_from_raw, parse_caption_response, transcribe_captions,
    CaptionProvider, RawCaption,
};
