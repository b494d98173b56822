//! Playback Clocks
//!
//! The compositor is keyed by a clock time. Live preview reads the audio
//! element's clock; export drives a [`VirtualClock`] that steps one frame at
//! a time, independent of wall time.

use crate::core::TimeSec;

/// Playback clock consumed by the preview and export loops
pub trait PlaybackClock {
    fn current_time(&self) -> TimeSec;
    fn duration(&self) -> TimeSec;
    fn is_playing(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    /// Moves the playhead, clamped to `[0, duration]`
    fn seek(&mut self, time: TimeSec);
}

/// Frame-stepped clock for offline rendering.
///
/// Time is derived from an integer frame counter so it never accumulates
/// floating point drift.
#[derive(Clone, Debug, PartialEq)]
pub struct VirtualClock {
    fps: u32,
    duration: TimeSec,
    frame: u64,
    playing: bool,
}

impl VirtualClock {
    pub fn new(fps: u32, duration: TimeSec) -> Self {
        Self {
            fps: fps.max(1),
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            frame: 0,
            playing: false,
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of ticks until [`is_finished`](Self::is_finished) holds
    pub fn total_frames(&self) -> u64 {
        let fps = f64::from(self.fps);
        let finished_at = |frame: u64| frame as f64 / fps >= self.duration;

        // The float product is only an estimate; settle on the stop test itself
        let mut frames = (self.duration * fps).ceil() as u64;
        while frames > 0 && finished_at(frames - 1) {
            frames -= 1;
        }
        while !finished_at(frames) {
            frames += 1;
        }
        frames
    }

    /// True once the clock has reached the end of the audio
    pub fn is_finished(&self) -> bool {
        self.current_time() >= self.duration
    }

    /// Advances by one frame (`1 / fps` seconds)
    pub fn tick(&mut self) {
        self.frame += 1;
        if self.is_finished() {
            self.playing = false;
        }
    }
}

impl PlaybackClock for VirtualClock {
    fn current_time(&self) -> TimeSec {
        self.frame as f64 / f64::from(self.fps)
    }

    fn duration(&self) -> TimeSec {
        self.duration
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) {
        self.playing = !self.is_finished();
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, time: TimeSec) {
        let time = if time.is_finite() {
            time.clamp(0.0, self.duration)
        } else {
            0.0
        };
        self.frame = (time * f64::from(self.fps)).floor() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_advances_one_frame() {
        let mut clock = VirtualClock::new(30, 1.0);
        clock.play();
        assert!(clock.is_playing());
        clock.tick();
        assert!((clock.current_time() - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_runs_to_duration_without_drift() {
        let mut clock = VirtualClock::new(30, 2.0);
        clock.play();
        let mut ticks = 0;
        while !clock.is_finished() {
            clock.tick();
            ticks += 1;
        }
        assert_eq!(ticks, 60);
        assert_eq!(clock.total_frames(), 60);
        assert_eq!(clock.current_time(), 2.0);
        assert!(!clock.is_playing());
    }

    #[test]
    fn test_partial_last_frame_is_counted() {
        assert_eq!(VirtualClock::new(30, 1.01).total_frames(), 31);
        assert_eq!(VirtualClock::new(30, 0.0).total_frames(), 0);
    }

    #[test]
    fn test_total_frames_matches_tick_count() {
        for (fps, duration) in [(25, 2.2), (30, 1.01), (24, 3.37), (60, 0.07), (10, 2.3)] {
            let mut clock = VirtualClock::new(fps, duration);
            let mut ticks = 0;
            while !clock.is_finished() {
                clock.tick();
                ticks += 1;
            }
            assert_eq!(clock.total_frames(), ticks, "{} fps over {} s", fps, duration);
        }
        assert_eq!(VirtualClock::new(25, 2.2).total_frames(), 55);
    }

    #[test]
    fn test_seek_clamps() {
        let mut clock = VirtualClock::new(10, 5.0);
        clock.seek(2.55);
        assert_eq!(clock.frame(), 25);
        clock.seek(99.0);
        assert_eq!(clock.current_time(), 5.0);
        clock.seek(f64::NAN);
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn test_zero_fps_is_raised_to_one() {
        assert_eq!(VirtualClock::new(0, 3.0).fps(), 1);
    }
}
