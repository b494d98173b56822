//! Captioning Collaborator Boundary
//!
//! The AI captioning call is an external collaborator: audio bytes and a mime
//! type go in, an ordered list of raw caption lines comes out. This module
//! defines that contract, converts raw lines into [`CaptionLine`]s, and parses
//! model replies that arrive as loosely formatted JSON text.
//!
//! The call is atomic from the editor's point of view: it either yields a
//! full caption list or fails, and a failure never leaves partial captions.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use super::models::{sort_captions, CaptionLine};
use super::timestamp::parse_timestamp;
use crate::core::{CoreError, CoreResult, TimeSec};

// =============================================================================
// Raw Caption
// =============================================================================

/// One caption line as produced by the captioning collaborator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCaption {
    /// Start time as `"mm:ss.ms"`
    #[serde(deserialize_with = "string_or_number")]
    pub start_time: String,
    /// End time as `"mm:ss.ms"`
    #[serde(deserialize_with = "string_or_number")]
    pub end_time: String,
    /// Lyric text
    pub text: String,
    /// Optional emoji suggestion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl RawCaption {
    pub fn new(start_time: &str, end_time: &str, text: &str) -> Self {
        Self {
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            text: text.to_string(),
            emoji: None,
        }
    }

    pub fn with_emoji(mut self, emoji: &str) -> Self {
        self.emoji = Some(emoji.to_string());
        self
    }
}

/// Models occasionally emit bare seconds instead of strings
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected timestamp string or number, got {}",
            other
        ))),
    }
}

// =============================================================================
// Provider Trait
// =============================================================================

/// Trait for captioning collaborators (generative AI services, fixtures, ...)
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Returns the provider name
    fn name(&self) -> &str;

    /// Produces ordered caption lines for the given audio
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> CoreResult<Vec<RawCaption>>;
}

/// Instruction text sent alongside the audio
pub fn captioning_prompt() -> &'static str {
    "Transcribe the lyrics of this song into short caption lines suitable for a lyric video. \
     Return only a JSON array. Each element must have \"startTime\" and \"endTime\" formatted \
     as \"mm:ss.ms\", \"text\" with the lyric line, and an optional \"emoji\" that matches the \
     mood of the line. Lines must be in chronological order and must not be empty."
}

// =============================================================================
// Conversion
// =============================================================================

/// Awaits the collaborator and converts its result into caption lines.
///
/// Any failure, including an empty result, is reported as
/// [`CoreError::CaptioningFailed`]; no partial list is returned.
pub async fn transcribe_captions(
    provider: &dyn CaptionProvider,
    audio: &[u8],
    mime_type: &str,
    min_duration: TimeSec,
) -> CoreResult<Vec<CaptionLine>> {
    if audio.is_empty() {
        return Err(CoreError::ValidationError(
            "Audio data is empty".to_string(),
        ));
    }

    info!(
        provider = provider.name(),
        bytes = audio.len(),
        mime_type,
        "Requesting captions"
    );

    let raw = provider.transcribe(audio, mime_type).await.map_err(|e| {
        warn!(provider = provider.name(), "Captioning call failed: {}", e);
        match e {
            CoreError::CaptioningFailed(msg) => CoreError::CaptioningFailed(msg),
            other => CoreError::CaptioningFailed(other.to_string()),
        }
    })?;

    if raw.is_empty() {
        warn!(provider = provider.name(), "Captioning returned no lines");
        return Err(CoreError::CaptioningFailed(
            "No caption lines were returned".to_string(),
        ));
    }

    let captions = captions_from_raw(&raw, min_duration);
    info!(count = captions.len(), "Captions generated");
    Ok(captions)
}

/// Converts raw lines into sorted caption lines.
///
/// Unparsable timestamps read as `0`. A line whose end does not come after its
/// start is stretched to `start + min_duration`.
pub fn captions_from_raw(raw: &[RawCaption], min_duration: TimeSec) -> Vec<CaptionLine> {
    let mut captions: Vec<CaptionLine> = raw
        .iter()
        .map(|line| {
            let start_time = parse_timestamp(&line.start_time);
            let mut end_time = parse_timestamp(&line.end_time);
            if end_time <= start_time {
                end_time = start_time + min_duration;
            }
            CaptionLine {
                start_time,
                end_time,
                text: line.text.trim().to_string(),
                emoji: line
                    .emoji
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string),
            }
        })
        .collect();
    sort_captions(&mut captions);
    captions
}

// =============================================================================
// Response Parsing
// =============================================================================

#[derive(Deserialize)]
struct WrappedCaptions {
    captions: Vec<RawCaption>,
}

/// Parses a model reply into raw caption lines.
///
/// Accepts a bare JSON array or an object with a `captions` array, optionally
/// wrapped in a Markdown code fence.
pub fn parse_caption_response(text: &str) -> CoreResult<Vec<RawCaption>> {
    let body = strip_code_fence(text);

    if let Ok(lines) = serde_json::from_str::<Vec<RawCaption>>(body) {
        return Ok(lines);
    }
    if let Ok(wrapped) = serde_json::from_str::<WrappedCaptions>(body) {
        return Ok(wrapped.captions);
    }

    // Last resort: the outermost [...] span inside surrounding prose
    if let (Some(open), Some(close)) = (body.find('['), body.rfind(']')) {
        if open < close {
            return serde_json::from_str::<Vec<RawCaption>>(&body[open..=close])
                .map_err(|e| CoreError::AIResponseInvalid(e.to_string()));
        }
    }

    Err(CoreError::AIResponseInvalid(
        "Response does not contain a caption array".to_string(),
    ))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

// =============================================================================
// Tests
// =============================================================================
