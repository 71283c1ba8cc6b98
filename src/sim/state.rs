//! Session state and collaborator wiring
//!
//! [`GameSession`] is the composition root. The clock and listener are
//! handed in directly; nothing is looked up at runtime.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::chart::BeatTimeline;
use super::clock::PlaybackClock;
use super::fade::FadeTimer;
use super::field::Playfield;
use super::input::LaneInput;
use super::judge::{HitJudge, NoteId, ScoreTier};
use super::scheduler::BeatScheduler;
use crate::settings::Settings;

/// Session lifecycle. Forward transitions only; `reset()` is the way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    NotStarted,
    Playing,
    /// Terminal until reset
    Ended,
}

/// A collaborator the session cannot run without
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingCollaborator {
    #[error("no playback clock wired")]
    Clock,
    #[error("no session listener (spawn sink) wired")]
    Listener,
}

/// Callbacks out of the core. All default to no-ops.
pub trait SessionListener {
    /// A note was spawned and should become visible
    fn on_spawn(&mut self, _lane: usize, _note: NoteId, _expected_hit_time: f64) {}

    /// A note was judged; `delta` has already been applied to the score
    fn on_resolve(&mut self, _note: NoteId, _tier: ScoreTier, _delta: i64) {}

    fn on_session_ended(&mut self, _final_score: i64) {}
}

impl<T: SessionListener> SessionListener for Rc<RefCell<T>> {
    fn on_spawn(&mut self, lane: usize, note: NoteId, expected_hit_time: f64) {
        self.borrow_mut().on_spawn(lane, note, expected_hit_time);
    }

    fn on_resolve(&mut self, note: NoteId, tier: ScoreTier, delta: i64) {
        self.borrow_mut().on_resolve(note, tier, delta);
    }

    fn on_session_ended(&mut self, final_score: i64) {
        self.borrow_mut().on_session_ended(final_score);
    }
}

/// Everything the listener was told, as data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Spawned {
        lane: usize,
        note: NoteId,
        expected_hit_time: f64,
    },
    Resolved {
        note: NoteId,
        tier: ScoreTier,
        delta: i64,
    },
    Ended {
        final_score: i64,
    },
}

/// Listener that records every callback
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<SessionEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle: give one clone to the session, keep the other
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn spawn_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Spawned { .. }))
            .count()
    }

    pub fn resolutions(&self) -> impl Iterator<Item = (NoteId, ScoreTier, i64)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            SessionEvent::Resolved { note, tier, delta } => Some((note, tier, delta)),
            _ => None,
        })
    }
}

impl SessionListener for EventLog {
    fn on_spawn(&mut self, lane: usize, note: NoteId, expected_hit_time: f64) {
        self.events.push(SessionEvent::Spawned {
            lane,
            note,
            expected_hit_time,
        });
    }

    fn on_resolve(&mut self, note: NoteId, tier: ScoreTier, delta: i64) {
        self.events.push(SessionEvent::Resolved { note, tier, delta });
    }

    fn on_session_ended(&mut self, final_score: i64) {
        self.events.push(SessionEvent::Ended { final_score });
    }
}

/// Running score and per-tier tallies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    /// Not clamped; misses can drive it negative
    pub total: i64,
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
}

impl Score {
    pub fn apply(&mut self, tier: ScoreTier, delta: i64) {
        self.total += delta;
        match tier {
            ScoreTier::Perfect => self.perfect += 1,
            ScoreTier::Good => self.good += 1,
            ScoreTier::Miss => self.miss += 1,
            ScoreTier::None => {}
        }
    }

    pub fn judged(&self) -> u32 {
        self.perfect + self.good + self.miss
    }
}

/// One play-through of a chart
pub struct GameSession {
    pub(super) settings: Settings,
    pub(super) timeline: BeatTimeline,
    pub(super) state: SessionState,
    pub(super) scheduler: BeatScheduler,
    pub(super) input: LaneInput,
    pub(super) judge: HitJudge,
    pub(super) playfield: Playfield,
    pub(super) clock: Option<Box<dyn PlaybackClock>>,
    pub(super) listener: Option<Box<dyn SessionListener>>,
    pub(super) score: Score,
    pub(super) end_banner: FadeTimer,
    /// Set when `start` found a collaborator missing; the session stays inert
    pub(super) disabled: Option<MissingCollaborator>,
    /// Last song time read, so time seen by the core never goes backwards
    pub(super) last_time: f64,
    pub(super) time_ticks: u64,
    pub(super) short_input_warned: bool,
    next_id: u32,
}

impl GameSession {
    /// Create a session for a chart. Settings are validated here.
    pub fn new(timeline: BeatTimeline, mut settings: Settings) -> Self {
        settings.validate();
        let lanes = settings.lane_count();
        Self {
            scheduler: BeatScheduler::new(),
            input: LaneInput::new(lanes),
            judge: HitJudge::with_scoring(lanes, settings.judge, settings.scoring),
            playfield: Playfield::new(settings.lane_layout()),
            end_banner: FadeTimer::new(settings.end_banner_delay, settings.end_banner_fade),
            settings,
            timeline,
            state: SessionState::NotStarted,
            clock: None,
            listener: None,
            score: Score::default(),
            disabled: None,
            last_time: 0.0,
            time_ticks: 0,
            short_input_warned: false,
            next_id: 1,
        }
    }

    pub fn with_clock(mut self, clock: impl PlaybackClock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn with_listener(mut self, listener: impl SessionListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Begin playing. A missing collaborator is logged once and leaves the
    /// session permanently inert.
    pub fn start(&mut self) -> Result<(), MissingCollaborator> {
        if let Some(missing) = self.disabled {
            return Err(missing);
        }
        let missing = if self.clock.is_none() {
            Some(MissingCollaborator::Clock)
        } else if self.listener.is_none() {
            Some(MissingCollaborator::Listener)
        } else {
            None
        };
        if let Some(missing) = missing {
            log::error!("Session disabled: {}", missing);
            self.disabled = Some(missing);
            return Err(missing);
        }

        if self.state == SessionState::NotStarted {
            self.state = SessionState::Playing;
            self.last_time = self.clock.as_ref().map_or(0.0, |c| c.current_time());
            log::info!(
                "Session started: {} events on {} lanes",
                self.timeline.len(),
                self.settings.lane_count()
            );
        }
        Ok(())
    }

    /// End the session now (explicit end trigger). Only leaves `Playing`;
    /// repeated calls do nothing.
    pub fn end(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }
        self.state = SessionState::Ended;

        let dropped = self.judge.clear();
        self.playfield.clear();
        if dropped > 0 {
            log::debug!("Discarded {} pending notes at session end", dropped);
        }

        log::info!(
            "Session ended: score {} ({} perfect, {} good, {} miss)",
            self.score.total,
            self.score.perfect,
            self.score.good,
            self.score.miss
        );
        if let Some(listener) = self.listener.as_mut() {
            listener.on_session_ended(self.score.total);
        }
        self.end_banner.start();
    }

    /// Full reset back to `NotStarted`, as if the scene were reloaded.
    /// A disabled session stays disabled.
    pub fn reset(&mut self) {
        self.state = SessionState::NotStarted;
        self.scheduler.reset();
        self.input.reset();
        self.judge.clear();
        self.playfield.clear();
        self.score = Score::default();
        self.end_banner.reset();
        self.last_time = 0.0;
        self.time_ticks = 0;
        self.short_input_warned = false;
        self.next_id = 1;
        if let Some(clock) = self.clock.as_mut() {
            clock.rewind();
        }
        log::debug!("Session reset");
    }

    pub(super) fn next_note_id(&mut self) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.is_some()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn timeline(&self) -> &BeatTimeline {
        &self.timeline
    }

    pub fn scheduler(&self) -> &BeatScheduler {
        &self.scheduler
    }

    pub fn judge(&self) -> &HitJudge {
        &self.judge
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    /// Current song time as last seen by the session
    pub fn song_time(&self) -> f64 {
        self.last_time
    }

    /// Opacity of the end-of-session banner
    pub fn end_banner_alpha(&self) -> f32 {
        self.end_banner.alpha()
    }

    /// Ticks processed while playing
    pub fn ticks(&self) -> u64 {
        self.time_ticks
    }
}
