//! Seeded autoplay bot
//!
//! Presses each lane near its oldest pending note's expected hit time, with
//! uniform random jitter. Same seed, same presses.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::{GameSession, NoteId, TickInput};

#[derive(Debug, Clone, Copy, Default)]
struct LanePlan {
    /// Note the plan was made for, and when to press (None = let it pass)
    target: Option<(NoteId, Option<f64>)>,
    /// Pressed on the previous tick; must release to make a new edge
    held: bool,
}

pub struct AutoPlayer {
    rng: Pcg32,
    /// Max press error either side of the expected hit time (seconds)
    jitter: f64,
    /// Probability of ignoring a note entirely
    skip_chance: f64,
    lanes: Vec<LanePlan>,
}

impl AutoPlayer {
    pub fn new(seed: u64, lane_count: usize, jitter: f64, skip_chance: f64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            jitter: if jitter.is_finite() { jitter.abs() } else { 0.0 },
            skip_chance: skip_chance.clamp(0.0, 1.0),
            lanes: vec![LanePlan::default(); lane_count],
        }
    }

    /// Decide the input for the tick that will be judged at song time `now`
    pub fn input(&mut self, session: &GameSession, now: f64) -> TickInput {
        let mut input = TickInput::pressed(self.lanes.len(), &[]);

        for (lane, plan) in self.lanes.iter_mut().enumerate() {
            if plan.held {
                plan.held = false;
                continue;
            }
            let Some(front) = session.judge().front(lane) else {
                continue;
            };

            let planned_for = plan.target.map(|(id, _)| id);
            if planned_for != Some(front.id) {
                let skip = self.rng.random::<f64>() < self.skip_chance;
                let error = self.rng.random_range(-self.jitter..=self.jitter);
                let press_at = (!skip).then_some(front.expected_hit_time + error);
                plan.target = Some((front.id, press_at));
            }

            if let Some((_, Some(press_at))) = plan.target {
                if now >= press_at {
                    input.lanes[lane] = true;
                    plan.held = true;
                }
            }
        }

        input
    }
}
