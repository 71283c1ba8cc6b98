//! Tick-driven delay-then-fade timer
//!
//! Replaces wait/fade coroutines with explicit state advanced once per tick.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum FadeState {
    #[default]
    Idle,
    /// Counting down before the fade begins
    Waiting { remaining: f32 },
    /// Fade in progress, 0..1
    Fading { progress: f32 },
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FadeTimer {
    delay: f32,
    duration: f32,
    state: FadeState,
}

impl FadeTimer {
    pub fn new(delay: f32, duration: f32) -> Self {
        Self {
            delay: delay.max(0.0),
            duration: duration.max(0.0),
            state: FadeState::Idle,
        }
    }

    pub fn state(&self) -> FadeState {
        self.state
    }

    /// Begin the wait. Restarting a running timer is ignored.
    pub fn start(&mut self) {
        if self.state != FadeState::Idle {
            return;
        }
        self.state = FadeState::Waiting {
            remaining: self.delay,
        };
        self.advance(0.0);
    }

    pub fn advance(&mut self, dt: f32) {
        let mut dt = dt.max(0.0);
        if let FadeState::Waiting { remaining } = self.state {
            if remaining > dt {
                self.state = FadeState::Waiting {
                    remaining: remaining - dt,
                };
                return;
            }
            // Leftover time carries into the fade
            dt -= remaining;
            self.state = FadeState::Fading { progress: 0.0 };
        }
        if let FadeState::Fading { progress } = self.state {
            if self.duration <= 0.0 {
                self.state = FadeState::Done;
                return;
            }
            let progress = progress + dt / self.duration;
            self.state = if progress >= 1.0 {
                FadeState::Done
            } else {
                FadeState::Fading { progress }
            };
        }
    }

    /// Opacity of whatever is fading in
    pub fn alpha(&self) -> f32 {
        match self.state {
            FadeState::Idle | FadeState::Waiting { .. } => 0.0,
            FadeState::Fading { progress } => progress,
            FadeState::Done => 1.0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == FadeState::Done
    }

    pub fn reset(&mut self) {
        self.state = FadeState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wait_then_fade() {
        let mut fade = FadeTimer::new(0.5, 1.0);
        assert_eq!(fade.state(), FadeState::Idle);
        fade.advance(10.0);
        assert_eq!(fade.state(), FadeState::Idle);

        fade.start();
        assert!(matches!(fade.state(), FadeState::Waiting { .. }));
        fade.advance(0.25);
        assert_relative_eq!(fade.alpha(), 0.0);

        // 0.25 finishes the wait, 0.5 goes into the fade
        fade.advance(0.75);
        assert_relative_eq!(fade.alpha(), 0.5);

        fade.advance(1.0);
        assert!(fade.is_done());
        assert_relative_eq!(fade.alpha(), 1.0);
    }

    #[test]
    fn test_zero_delay_and_duration() {
        let mut fade = FadeTimer::new(0.0, 0.0);
        fade.start();
        assert!(fade.is_done());
    }

    #[test]
    fn test_zero_delay_starts_fading() {
        let mut fade = FadeTimer::new(0.0, 2.0);
        fade.start();
        assert_eq!(fade.state(), FadeState::Fading { progress: 0.0 });
    }

    #[test]
    fn test_start_is_idempotent_and_reset() {
        let mut fade = FadeTimer::new(0.0, 1.0);
        fade.start();
        fade.advance(0.5);
        fade.start();
        assert_relative_eq!(fade.alpha(), 0.5);
        fade.reset();
        assert_eq!(fade.state(), FadeState::Idle);
    }
}
