// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Virtual playback clock for the canvas mock.
//!
//! [`VirtualClock`] turns host frame timestamps into a media position:
//!
//! ```text
//! time += (host_ms - last_host_ms) / 1000      while playing
//! ```
//!
//! clamped to `[0, duration]`. Reaching the end stops the clock and reports
//! `ended` exactly once; a seek back below the end re-arms it.

/// The result of advancing the clock by one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockTick {
    /// Media time after the advance, in seconds.
    pub time: f64,
    /// `true` on the one tick that reached the end.
    pub ended: bool,
}

/// A media clock driven by host timestamps.
#[derive(Clone, Debug)]
pub struct VirtualClock {
    /// Total length in seconds.
    duration: f64,
    /// Current media time in seconds.
    time: f64,
    /// Whether ticks advance the clock.
    playing: bool,
    /// Host timestamp of the previous tick, in milliseconds.
    last_host_ms: Option<f64>,
    /// Whether `ended` has been reported since the last seek.
    ended_reported: bool,
}

impl VirtualClock {
    /// Creates a paused clock at `0` with the given duration in seconds.
    /// Negative or non-finite durations are treated as `0`.
    #[must_use]
    pub fn new(duration: f64) -> Self {
        Self {
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            time: 0.0,
            playing: false,
            last_host_ms: None,
            ended_reported: false,
        }
    }

    /// Current media time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Total length in seconds.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Whether the clock is running.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Starts the clock. Returns `false` (and stays paused) at the end.
    ///
    /// The next [`tick`](Self::tick) only sets the baseline, so time spent
    /// paused is never counted.
    pub fn play(&mut self) -> bool {
        if self.time >= self.duration {
            return false;
        }
        self.playing = true;
        self.last_host_ms = None;
        true
    }

    /// Stops the clock.
    pub fn pause(&mut self) {
        self.playing = false;
        self.last_host_ms = None;
    }

    /// Moves to `time`, clamped to `[0, duration]`.
    pub fn seek(&mut self, time: f64) {
        let time = if time.is_nan() { 0.0 } else { time };
        self.time = time.clamp(0.0, self.duration);
        if self.time < self.duration {
            self.ended_reported = false;
        }
    }

    /// Feeds a host frame timestamp (milliseconds, e.g. from
    /// `requestAnimationFrame`).
    ///
    /// Returns `None` while paused. A host clock that steps backwards counts
    /// as zero elapsed time.
    pub fn tick(&mut self, host_ms: f64) -> Option<ClockTick> {
        if !self.playing {
            return None;
        }
        let dt = self
            .last_host_ms
            .map_or(0.0, |last| ((host_ms - last) / 1000.0).max(0.0));
        self.last_host_ms = Some(host_ms);
        Some(self.advance(dt))
    }

    /// Advances by `dt` seconds regardless of host timestamps.
    pub fn advance(&mut self, dt: f64) -> ClockTick {
        if dt.is_finite() && dt > 0.0 {
            self.time = (self.time + dt).min(self.duration);
        }
        let mut ended = false;
        if self.time >= self.duration {
            self.playing = false;
            self.last_host_ms = None;
            ended = !self.ended_reported;
            self.ended_reported = true;
        }
        ClockTick {
            time: self.time,
            ended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_clock_does_not_tick() {
        let mut clock = VirtualClock::new(20.0);
        assert!(clock.tick(0.0).is_none());
        assert!(clock.tick(1000.0).is_none());
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn first_tick_sets_baseline() {
        let mut clock = VirtualClock::new(20.0);
        assert!(clock.play());
        assert_eq!(clock.tick(5_000.0).map(|t| t.time), Some(0.0));
        assert_eq!(clock.tick(5_500.0).map(|t| t.time), Some(0.5));
        assert_eq!(clock.tick(6_500.0).map(|t| t.time), Some(1.5));
    }

    #[test]
    fn time_spent_paused_is_not_counted() {
        let mut clock = VirtualClock::new(20.0);
        clock.play();
        clock.tick(0.0);
        clock.tick(1_000.0);
        clock.pause();
        clock.play();
        clock.tick(60_000.0);
        let t = clock.tick(60_250.0).unwrap();
        assert!((t.time - 1.25).abs() < 1e-9, "got {}", t.time);
    }

    #[test]
    fn backwards_host_time_is_ignored() {
        let mut clock = VirtualClock::new(20.0);
        clock.play();
        clock.tick(1_000.0);
        clock.tick(2_000.0);
        let t = clock.tick(1_500.0).unwrap();
        assert_eq!(t.time, 1.0);
    }

    #[test]
    fn ended_fires_once_and_rearms_on_seek() {
        let mut clock = VirtualClock::new(2.0);
        clock.play();
        let t = clock.advance(5.0);
        assert_eq!(t, ClockTick { time: 2.0, ended: true });
        assert!(!clock.is_playing());
        assert!(!clock.play(), "cannot play at the end");
        assert!(!clock.advance(1.0).ended);

        clock.seek(1.0);
        assert!(clock.play());
        assert!(clock.advance(1.0).ended);
    }

    #[test]
    fn seek_is_clamped() {
        let mut clock = VirtualClock::new(10.0);
        clock.seek(-3.0);
        assert_eq!(clock.time(), 0.0);
        clock.seek(99.0);
        assert_eq!(clock.time(), 10.0);
        clock.seek(f64::NAN);
        assert_eq!(clock.time(), 0.0);
    }
}
