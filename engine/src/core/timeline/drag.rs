//! Interval Drag/Resize Engine
//!
//! Maps pointer movement on the caption track to new `[start, end]`
//! intervals. A gesture moves a whole block or drags one of its edges:
//!
//! ```text
//!   |<-6px->|                 |<-6px->|
//!   [resize ]      move       [ resize]
//!   [ start ]                 [  end  ]
//! ```
//!
//! All math is relative to the state captured when the gesture began, so
//! every update is independent of the previous one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::captions::{self, CaptionLine};
use crate::core::project::EditorPatch;
use crate::core::{CoreError, CoreResult, TimeSec};

/// Default width of the edge handles in pixels
pub const DEFAULT_HANDLE_PX: f64 = 6.0;

// =============================================================================
// Geometry
// =============================================================================

/// Pixel mapping of the caption track
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackGeometry {
    pub width_px: f64,
    /// Audio duration shown across the track
    pub total_duration: TimeSec,
}

impl TrackGeometry {
    pub fn new(width_px: f64, total_duration: TimeSec) -> Self {
        Self {
            width_px,
            total_duration,
        }
    }

    /// False for a collapsed track or an empty timeline
    pub fn is_usable(&self) -> bool {
        self.width_px.is_finite()
            && self.width_px > 0.0
            && self.total_duration.is_finite()
            && self.total_duration > 0.0
    }

    /// Time offset for a pointer offset in pixels
    pub fn delta_time(&self, pointer_dx: f64) -> TimeSec {
        if !self.is_usable() || !pointer_dx.is_finite() {
            return 0.0;
        }
        pointer_dx / self.width_px * self.total_duration
    }

    pub fn time_to_x(&self, time: TimeSec) -> f64 {
        if !self.is_usable() {
            return 0.0;
        }
        time / self.total_duration * self.width_px
    }

    /// Time under a pointer position, clamped to the timeline
    pub fn x_to_time(&self, x: f64) -> TimeSec {
        if !self.is_usable() || !x.is_finite() {
            return 0.0;
        }
        (x / self.width_px * self.total_duration).clamp(0.0, self.total_duration)
    }
}

// =============================================================================
// Drag Session
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DragMode {
    /// Shift the whole interval, keeping its duration
    Move,
    ResizeStart,
    ResizeEnd,
}

/// State captured on pointer-down
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragSession {
    pub index: usize,
    pub mode: DragMode,
    pub initial_pointer_x: f64,
    pub initial_start: TimeSec,
    pub initial_end: TimeSec,
}

/// Clamp where `lo` wins over `hi` when the range is empty
fn clamp_low_wins(value: f64, lo: f64, hi: f64) -> f64 {
    value.min(hi).max(lo)
}

/// Computes the interval for the current pointer position.
///
/// - move: both ends shift by the same delta, clamped as a unit to
///   `[0, total_duration]`; duration is preserved exactly.
/// - resize-start: start is clamped to `[0, initial_end - min_duration]`.
/// - resize-end: end is clamped to `[initial_start + min_duration, total_duration]`.
///
/// A collapsed track or an empty timeline leaves the interval where it started.
pub fn compute_interval(
    session: &DragSession,
    pointer_x: f64,
    geometry: &TrackGeometry,
    min_duration: TimeSec,
) -> (TimeSec, TimeSec) {
    if !geometry.is_usable() {
        return (session.initial_start, session.initial_end);
    }
    let delta = geometry.delta_time(pointer_x - session.initial_pointer_x);
    let total = geometry.total_duration;

    match session.mode {
        DragMode::Move => {
            let duration = session.initial_end - session.initial_start;
            let latest_start = (total - duration).max(0.0);
            let start = clamp_low_wins(session.initial_start + delta, 0.0, latest_start);
            (start, start + duration)
        }
        DragMode::ResizeStart => {
            let start = clamp_low_wins(
                session.initial_start + delta,
                0.0,
                session.initial_end - min_duration,
            );
            (start, session.initial_end)
        }
        DragMode::ResizeEnd => {
            let end = clamp_low_wins(
                session.initial_end + delta,
                session.initial_start + min_duration,
                total,
            );
            (session.initial_start, end)
        }
    }
}

// =============================================================================
// Hit Testing
// =============================================================================

/// Result of a pointer-down on the track
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackHit {
    /// Landed on a caption block: begin a potential drag, no seek
    Caption { index: usize, mode: DragMode },
    /// Landed on empty track: seek only
    Empty { time: TimeSec },
}

/// Hit-tests a pointer position against each caption's pixel span.
///
/// Captions are tested in list order. Within a block, the outer `handle_px`
/// on each side selects a resize mode; on blocks too narrow for both
/// handles the nearer edge wins.
pub fn hit_test(
    captions: &[CaptionLine],
    pointer_x: f64,
    geometry: &TrackGeometry,
    handle_px: f64,
) -> TrackHit {
    if geometry.is_usable() && pointer_x.is_finite() {
        for (index, caption) in captions.iter().enumerate() {
            let left = geometry.time_to_x(caption.start_time);
            let right = geometry.time_to_x(caption.end_time);
            if pointer_x < left || pointer_x > right {
                continue;
            }

            let from_left = pointer_x - left;
            let from_right = right - pointer_x;
            let mode = if from_left <= handle_px || from_right <= handle_px {
                if from_left <= from_right {
                    DragMode::ResizeStart
                } else {
                    DragMode::ResizeEnd
                }
            } else {
                DragMode::Move
            };
            return TrackHit::Caption { index, mode };
        }
    }

    TrackHit::Empty {
        time: geometry.x_to_time(pointer_x),
    }
}

// =============================================================================
// Drag Engine
// =============================================================================

#[derive(Debug, Clone)]
struct ActiveDrag {
    session: DragSession,
    /// Captions as they were on pointer-down
    base: Vec<CaptionLine>,
    last: Option<(TimeSec, TimeSec)>,
}

/// Owns at most one drag gesture at a time
#[derive(Debug, Clone, Default)]
pub struct DragEngine {
    active: Option<ActiveDrag>,
}

impl DragEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.active.as_ref().map(|a| &a.session)
    }

    /// Interval produced by the latest update, if the block has moved
    pub fn last_interval(&self) -> Option<(TimeSec, TimeSec)> {
        self.active.as_ref().and_then(|a| a.last)
    }

    /// Captures a gesture on the caption at `index`
    pub fn begin(
        &mut self,
        captions: &[CaptionLine],
        index: usize,
        mode: DragMode,
        pointer_x: f64,
    ) -> CoreResult<DragSession> {
        if self.active.is_some() {
            return Err(CoreError::GestureInProgress);
        }
        let caption = captions.get(index).ok_or(CoreError::CaptionNotFound(index))?;

        let session = DragSession {
            index,
            mode,
            initial_pointer_x: pointer_x,
            initial_start: caption.start_time,
            initial_end: caption.end_time,
        };
        debug!(index, ?mode, pointer_x, "Drag started");
        self.active = Some(ActiveDrag {
            session,
            base: captions.to_vec(),
            last: None,
        });
        Ok(session)
    }

    /// Computes the patch for a pointer move.
    ///
    /// Returns `None` when the interval is unchanged since the last update.
    pub fn update(
        &mut self,
        pointer_x: f64,
        geometry: &TrackGeometry,
        min_duration: TimeSec,
    ) -> CoreResult<Option<EditorPatch>> {
        let active = self.active.as_mut().ok_or(CoreError::NoActiveGesture)?;
        let (start, end) = compute_interval(&active.session, pointer_x, geometry, min_duration);

        let previous = active
            .last
            .unwrap_or((active.session.initial_start, active.session.initial_end));
        if previous == (start, end) {
            return Ok(None);
        }

        let lines = captions::retime(&active.base, active.session.index, start, end)?;
        active.last = Some((start, end));
        Ok(Some(EditorPatch::captions(lines)))
    }

    /// Releases the gesture. The last computed interval stays in place.
    pub fn end(&mut self) -> CoreResult<DragSession> {
        let active = self.active.take().ok_or(CoreError::NoActiveGesture)?;
        debug!(
            index = active.session.index,
            interval = ?active.last,
            "Drag ended"
        );
        Ok(active.session)
    }
}
