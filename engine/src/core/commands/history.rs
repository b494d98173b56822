//! History Module
//!
//! Snapshot-based undo/redo over the whole [`EditorState`].
//!
//! Three slots: `past`, `present`, `future`. A commit pushes the current
//! present onto `past` and clears `future`. A coalesced commit overwrites
//! `present` in place so a continuous gesture collapses into one step.

use std::collections::VecDeque;

use tracing::debug;

use crate::core::project::{EditorPatch, EditorState};

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Undo/redo history of editor document snapshots
#[derive(Debug, Clone)]
pub struct History {
    /// Oldest first
    past: VecDeque<EditorState>,
    present: EditorState,
    /// Next redo first
    future: VecDeque<EditorState>,
    limit: usize,
}

impl History {
    pub fn new(initial: EditorState) -> Self {
        Self::with_limit(initial, DEFAULT_HISTORY_LIMIT)
    }

    /// Creates a history that keeps at most `limit` undo steps (minimum 1)
    pub fn with_limit(initial: EditorState, limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn present(&self) -> &EditorState {
        &self.present
    }

    /// Records a new undoable step
    pub fn commit(&mut self, patch: &EditorPatch) {
        let next = self.present.apply(patch);
        let previous = std::mem::replace(&mut self.present, next);
        self.past.push_back(previous);
        self.future.clear();

        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        debug!(past = self.past.len(), "History commit");
    }

    /// Replaces the present without creating an undo step
    pub fn commit_coalesced(&mut self, patch: &EditorPatch) {
        self.present = self.present.apply(patch);
    }

    /// Steps back one snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        debug!(
            past = self.past.len(),
            future = self.future.len(),
            "History undo"
        );
        true
    }

    /// Steps forward one snapshot. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        debug!(
            past = self.past.len(),
            future = self.future.len(),
            "History redo"
        );
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Drops all undo and redo steps, keeping the present
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Replaces the whole document and forgets its history (e.g. after loading a file)
    pub fn reset(&mut self, state: EditorState) {
        self.present = state;
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::captions::CaptionLine;
    use crate::core::AspectRatio;

    fn captions_patch(lines: &[(f64, f64)]) -> EditorPatch {
        EditorPatch::captions(
            lines
                .iter()
                .map(|&(s, e)| CaptionLine::new(s, e, "x"))
                .collect(),
        )
    }

    #[test]
    fn test_commit_then_undo_restores_prior_state() {
        let mut history = History::new(EditorState::default());
        let before = history.present().clone();

        history.commit(&captions_patch(&[(0.0, 3.0)]));
        let after = history.present().clone();
        assert_ne!(before, after);
        assert!(history.can_undo());
        assert!(!history.can_redo());

        assert!(history.undo());
        assert_eq!(history.present(), &before);
        assert!(history.can_redo());

        assert!(history.redo());
        assert_eq!(history.present(), &after);
    }

    #[test]
    fn test_round_trip_over_many_commits() {
        let mut history = History::new(EditorState::default());
        let mut states = vec![history.present().clone()];
        for i in 0..5 {
            history.commit(&captions_patch(&[(i as f64, i as f64 + 1.0)]));
            states.push(history.present().clone());
        }

        for expected in states.iter().rev().skip(1) {
            assert!(history.undo());
            assert_eq!(history.present(), expected);
        }
        assert!(!history.undo());

        for expected in states.iter().skip(1) {
            assert!(history.redo());
            assert_eq!(history.present(), expected);
        }
        assert!(!history.redo());
    }

    #[test]
    fn test_commit_clears_future() {
        let mut history = History::new(EditorState::default());
        history.commit(&captions_patch(&[(0.0, 1.0)]));
        history.undo();
        assert_eq!(history.future_len(), 1);

        history.commit(&EditorPatch {
            aspect_ratio: Some(AspectRatio::Square),
            ..EditorPatch::default()
        });
        assert!(!history.can_redo());
    }

    #[test]
    fn test_coalesced_never_grows_past() {
        let mut history = History::new(EditorState::default());
        history.commit(&captions_patch(&[(2.0, 5.0)]));
        let past_before = history.past_len();

        for n in 1..=10 {
            let start = 2.0 + n as f64 * 0.1;
            history.commit_coalesced(&captions_patch(&[(start, start + 3.0)]));
            assert_eq!(history.past_len(), past_before);
        }

        // Present reflects only the last coalesced input
        let lines = history.present().caption_lines();
        assert_eq!(lines.len(), 1);
        assert!((lines[0].start_time - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_coalesced_keeps_future() {
        let mut history = History::new(EditorState::default());
        history.commit(&captions_patch(&[(0.0, 1.0)]));
        history.undo();
        history.commit_coalesced(&EditorPatch::default());
        assert!(history.can_redo());
    }

    #[test]
    fn test_undo_redo_on_empty_history_are_noops() {
        let mut history = History::new(EditorState::default());
        let before = history.present().clone();
        assert!(!history.undo());
        assert!(!history.redo());
        assert_eq!(history.present(), &before);
    }

    #[test]
    fn test_past_is_bounded_by_limit() {
        let mut history = History::with_limit(EditorState::default(), 3);
        for i in 0..10 {
            history.commit(&captions_patch(&[(i as f64, i as f64 + 1.0)]));
        }
        assert_eq!(history.past_len(), 3);

        while history.undo() {}
        // Oldest retained snapshot is the one before commit #7
        assert_eq!(history.present().caption_lines()[0].start_time, 6.0);
    }

    #[test]
    fn test_clear_keeps_present() {
        let mut history = History::new(EditorState::default());
        history.commit(&captions_patch(&[(0.0, 1.0)]));
        let present = history.present().clone();
        history.clear();
        assert!(!history.can_undo());
        assert_eq!(history.present(), &present);
    }
}
