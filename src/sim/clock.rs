//! Playback clock abstraction
//!
//! The session never reads wall time. It asks a [`PlaybackClock`] where the
//! backing track is, with any start delay already folded in.

/// Time source for scheduling and judging
pub trait PlaybackClock {
    /// Current song time in seconds, start delay included. Must not decrease
    /// while the track plays.
    fn current_time(&self) -> f64;

    /// True once the track has stopped or reached its end. Latches.
    fn has_ended(&self) -> bool;

    /// Advance by one frame delta. Clocks driven by an audio device ignore this.
    fn advance(&mut self, _dt: f64) {}

    /// Return to the start of the track (session reset)
    fn rewind(&mut self) {}
}

/// Simulated track: a duration played after a start delay
///
/// `current_time()` reports `position + delay`, so chart times line up with
/// notes that were spawned ahead of the audio by the delay.
#[derive(Debug, Clone)]
pub struct TrackClock {
    duration: f64,
    delay: f64,
    elapsed: f64,
    stopped: bool,
    ended: bool,
}

impl TrackClock {
    pub fn new(duration: f64, delay: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            delay: delay.max(0.0),
            elapsed: 0.0,
            stopped: false,
            ended: false,
        }
    }

    /// Playback position within the track (0..=duration)
    pub fn position(&self) -> f64 {
        (self.elapsed - self.delay).clamp(0.0, self.duration)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Stop playback early; the clock reports ended from now on
    pub fn stop(&mut self) {
        self.stopped = true;
        self.ended = true;
    }
}

impl PlaybackClock for TrackClock {
    fn current_time(&self) -> f64 {
        self.position() + self.delay
    }

    fn has_ended(&self) -> bool {
        self.ended
    }

    fn advance(&mut self, dt: f64) {
        if self.stopped || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.elapsed += dt;
        if self.elapsed - self.delay >= self.duration {
            self.ended = true;
        }
    }

    fn rewind(&mut self) {
        self.elapsed = 0.0;
        self.stopped = false;
        self.ended = false;
    }
}
