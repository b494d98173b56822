//! Dictation Input
//!
//! Speech recognition is an external capability. The editor only consumes
//! finished utterances and appends them to the text of one caption line.

use std::collections::VecDeque;

use async_trait::async_trait;

/// A source of recognized speech
#[async_trait]
pub trait DictationSource: Send {
    /// Waits for the next finished utterance. `None` once the source is exhausted.
    async fn next_transcript(&mut self) -> Option<String>;
}

/// Dictation source that replays a fixed list of utterances
#[derive(Debug, Default, Clone)]
pub struct ScriptedDictation {
    utterances: VecDeque<String>,
}

impl ScriptedDictation {
    pub fn new<I, S>(utterances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            utterances: utterances.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.utterances.len()
    }
}

#[async_trait]
impl DictationSource for ScriptedDictation {
    async fn next_transcript(&mut self) -> Option<String> {
        self.utterances.pop_front()
    }
}

/// Appends an utterance to existing caption text, space-joined and trimmed
pub fn append_utterance(existing: &str, utterance: &str) -> String {
    format!("{} {}", existing.trim(), utterance.trim())
        .trim()
        .to_string()
}
