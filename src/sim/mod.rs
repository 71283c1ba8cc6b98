//! Rhythm timing core
//!
//! Everything that decides what spawns and how presses score lives here.
//! This module must stay free of rendering, audio and platform code:
//! - Song time comes from a [`PlaybackClock`]
//! - Presses arrive as plain booleans per lane
//! - Results leave through [`SessionListener`] callbacks

pub mod chart;
pub mod clock;
pub mod fade;
pub mod field;
pub mod input;
pub mod judge;
pub mod scheduler;
pub mod state;
pub mod tick;

pub use chart::{
    BeatEvent, BeatTimeline, ChartError, ChartOrder, ChartReport, ChartWarning, ChartWarningKind,
};
pub use clock::{PlaybackClock, TrackClock};
pub use fade::{FadeState, FadeTimer};
pub use field::{LaneLayout, Playfield, VisibleNote};
pub use input::LaneInput;
pub use judge::{
    HitJudge, JudgeMetric, JudgeWindows, Judgement, NoteId, PendingNote, ScoreTable, ScoreTier,
};
pub use scheduler::BeatScheduler;
pub use state::{
    EventLog, GameSession, MissingCollaborator, Score, SessionEvent, SessionListener, SessionState,
};
pub use tick::{TickInput, tick};
