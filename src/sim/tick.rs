//! Per-frame session tick
//!
//! Order within one tick: clock → spawns → presses → expiry → score → end
//! check. Nothing here assumes a fixed `dt`.

use super::judge::{JudgeMetric, NoteId, PendingNote, ScoreTier};
use super::state::{GameSession, SessionState};

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Raw pressed state, one entry per lane
    pub lanes: Vec<bool>,
    /// Explicit end trigger ("end song")
    pub end_song: bool,
}

impl TickInput {
    /// Input with the given lanes held down
    pub fn pressed(lane_count: usize, held: &[usize]) -> Self {
        let mut lanes = vec![false; lane_count];
        for &lane in held {
            if let Some(slot) = lanes.get_mut(lane) {
                *slot = true;
            }
        }
        Self {
            lanes,
            end_song: false,
        }
    }
}

/// Advance the session by one frame. Scheduling and judging only run while
/// `Playing`; after the end only the end banner keeps animating.
///
/// The end of the track is checked last, so beats due and presses made on
/// the final tick still count before pending notes are discarded.
pub fn tick(session: &mut GameSession, input: &TickInput, dt: f64) {
    if session.state == SessionState::Ended {
        session.end_banner.advance(dt as f32);
        return;
    }
    if session.state != SessionState::Playing || session.disabled.is_some() {
        return;
    }
    let Some(clock) = session.clock.as_mut() else {
        return;
    };
    clock.advance(dt);
    let (track_ended, now) = (clock.has_ended(), clock.current_time());

    if now < session.last_time {
        log::debug!("Clock went backwards ({} < {}); holding", now, session.last_time);
    }
    let now = now.max(session.last_time);
    session.last_time = now;
    session.time_ticks += 1;

    session.spawn_due(now);
    session.judge_presses(input, now);

    session.playfield.update(now);
    for (lane, id) in session.playfield.take_expired() {
        session.judge.force_miss(lane, id);
    }

    session.apply_judgements();

    if track_ended || input.end_song {
        session.end();
    }
}

impl GameSession {
    /// Method form of [`tick`]
    pub fn tick(&mut self, input: &TickInput, dt: f64) {
        tick(self, input, dt);
    }

    /// Resolve a note that left the field unhit. For embedders that run their
    /// own note visuals; returns false if the note was not pending.
    pub fn force_miss(&mut self, lane: usize, note: NoteId) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        let missed = self.judge.force_miss(lane, note);
        self.apply_judgements();
        missed
    }

    fn spawn_due(&mut self, now: f64) {
        let travel = self.playfield.travel_time();
        let lane_count = self.settings.lane_count();

        for index in self.scheduler.tick(&self.timeline, now) {
            let Some(&event) = self.timeline.get(index) else {
                continue;
            };
            if event.lane >= lane_count {
                log::warn!(
                    "Beat {} at {:.3}s targets lane {} but only {} lanes exist; skipped",
                    index,
                    event.time,
                    event.lane,
                    lane_count
                );
                continue;
            }

            let id = self.next_note_id();
            let note = PendingNote {
                id,
                lane: event.lane,
                spawn_time: event.time,
                expected_hit_time: event.time + travel,
            };
            self.judge.register(note);
            self.playfield.spawn(id, event.lane, event.time);
            log::trace!(
                "Spawned {:?} in lane {} (hit at {:.3}s)",
                id,
                event.lane,
                note.expected_hit_time
            );

            if let Some(listener) = self.listener.as_mut() {
                listener.on_spawn(event.lane, id, note.expected_hit_time);
            }
        }
    }

    fn judge_presses(&mut self, input: &TickInput, now: f64) {
        if input.lanes.len() < self.input.lane_count() && !self.short_input_warned {
            log::warn!(
                "Input reports {} lanes, expected {}; missing lanes read as released",
                input.lanes.len(),
                self.input.lane_count()
            );
            self.short_input_warned = true;
        }

        // Positions must be current before measuring distances
        if self.settings.judge.metric == JudgeMetric::Distance {
            self.playfield.update(now);
        }

        for lane in self.input.poll_edges(&input.lanes) {
            let tier = match self.settings.judge.metric {
                JudgeMetric::Time => self.judge.resolve(lane, now),
                JudgeMetric::Distance => {
                    let playfield = &self.playfield;
                    self.judge.resolve_by(lane, |note| {
                        playfield
                            .distance_to_hit_zone(note.id)
                            .map_or(f64::INFINITY, f64::from)
                    })
                }
            };
            if tier == ScoreTier::None {
                log::trace!("Press on empty lane {}", lane);
            }
        }
    }

    fn apply_judgements(&mut self) {
        for judgement in self.judge.drain_resolved() {
            self.score.apply(judgement.tier, judgement.delta);
            self.playfield.remove(judgement.note);
            log::debug!(
                "{:?} lane {}: {} ({:+}) -> {}",
                judgement.note,
                judgement.lane,
                judgement.tier.as_str(),
                judgement.delta,
                self.score.total
            );
            if let Some(listener) = self.listener.as_mut() {
                listener.on_resolve(judgement.note, judgement.tier, judgement.delta);
            }
        }
    }
}
