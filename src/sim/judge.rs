//! Hit judging
//!
//! Each lane holds a FIFO of pending notes in spawn order. A press always
//! matches the oldest pending note of its lane, however far away it is.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Opaque handle for a spawned note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(pub u32);

/// Judgement result for a single note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoreTier {
    /// Nothing was judged (press on an empty lane)
    #[default]
    None,
    Perfect,
    Good,
    Miss,
}

impl ScoreTier {
    /// Score delta with the default table
    pub fn score_delta(self) -> i64 {
        ScoreTable::default().delta(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTier::None => "None",
            ScoreTier::Perfect => "Perfect",
            ScoreTier::Good => "Good",
            ScoreTier::Miss => "Miss",
        }
    }
}

/// Points awarded per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    pub perfect: i64,
    pub good: i64,
    pub miss: i64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            perfect: 100,
            good: 50,
            miss: -20,
        }
    }
}

impl ScoreTable {
    pub fn delta(&self, tier: ScoreTier) -> i64 {
        match tier {
            ScoreTier::None => 0,
            ScoreTier::Perfect => self.perfect,
            ScoreTier::Good => self.good,
            ScoreTier::Miss => self.miss,
        }
    }
}

/// How a press is measured against its note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeMetric {
    /// Seconds between the press and the note's expected hit time
    #[default]
    Time,
    /// World-space distance between the note and its lane's hit zone
    Distance,
}

/// Judging windows, in the units of `metric`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeWindows {
    pub metric: JudgeMetric,
    pub perfect: f64,
    pub good: f64,
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self {
            metric: JudgeMetric::Time,
            perfect: 0.05,
            good: 0.12,
        }
    }
}

impl JudgeWindows {
    /// Perfect ⊂ Good ⊂ everything else (Miss)
    pub fn classify(&self, offset: f64) -> ScoreTier {
        let offset = offset.abs();
        if offset <= self.perfect {
            ScoreTier::Perfect
        } else if offset <= self.good {
            ScoreTier::Good
        } else {
            ScoreTier::Miss
        }
    }
}

/// A spawned note waiting for a press
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingNote {
    pub id: NoteId,
    pub lane: usize,
    pub spawn_time: f64,
    pub expected_hit_time: f64,
}

/// A resolved note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Judgement {
    pub note: NoteId,
    pub lane: usize,
    pub tier: ScoreTier,
    /// Measured offset; `None` for forced misses
    pub offset: Option<f64>,
    pub delta: i64,
}

#[derive(Debug, Clone)]
pub struct HitJudge {
    lanes: Vec<VecDeque<PendingNote>>,
    windows: JudgeWindows,
    scoring: ScoreTable,
    resolved: Vec<Judgement>,
}

impl HitJudge {
    pub fn new(lane_count: usize, windows: JudgeWindows) -> Self {
        Self::with_scoring(lane_count, windows, ScoreTable::default())
    }

    pub fn with_scoring(lane_count: usize, windows: JudgeWindows, scoring: ScoreTable) -> Self {
        Self {
            lanes: vec![VecDeque::new(); lane_count],
            windows,
            scoring,
            resolved: Vec::new(),
        }
    }

    pub fn windows(&self) -> &JudgeWindows {
        &self.windows
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Take ownership of a spawned note. False if its lane does not exist.
    pub fn register(&mut self, note: PendingNote) -> bool {
        match self.lanes.get_mut(note.lane) {
            Some(queue) => {
                queue.push_back(note);
                true
            }
            None => false,
        }
    }

    /// Judge a press on `lane` at `judge_time` against the oldest pending note
    pub fn resolve(&mut self, lane: usize, judge_time: f64) -> ScoreTier {
        self.resolve_by(lane, |note| (judge_time - note.expected_hit_time).abs())
    }

    /// Judge a press using a caller-measured offset (same units as the windows)
    pub fn resolve_by<F>(&mut self, lane: usize, offset_of: F) -> ScoreTier
    where
        F: FnOnce(&PendingNote) -> f64,
    {
        let Some(note) = self.lanes.get_mut(lane).and_then(|q| q.pop_front()) else {
            return ScoreTier::None;
        };

        let offset = offset_of(&note);
        let tier = self.windows.classify(offset);
        log::trace!(
            "Note {:?} lane {} judged {} (offset {:.4})",
            note.id,
            lane,
            tier.as_str(),
            offset
        );
        self.record(note, tier, Some(offset));
        tier
    }

    /// Resolve a note that was never pressed as a Miss.
    ///
    /// Returns false if the note is not pending (already resolved or unknown).
    pub fn force_miss(&mut self, lane: usize, id: NoteId) -> bool {
        let Some(queue) = self.lanes.get_mut(lane) else {
            return false;
        };
        let Some(pos) = queue.iter().position(|n| n.id == id) else {
            return false;
        };
        let Some(note) = queue.remove(pos) else {
            return false;
        };

        log::trace!("Note {:?} lane {} expired", id, lane);
        self.record(note, ScoreTier::Miss, None);
        true
    }

    fn record(&mut self, note: PendingNote, tier: ScoreTier, offset: Option<f64>) {
        self.resolved.push(Judgement {
            note: note.id,
            lane: note.lane,
            tier,
            offset,
            delta: self.scoring.delta(tier),
        });
    }

    /// Judgements made since the last drain, oldest first
    pub fn drain_resolved(&mut self) -> std::vec::Drain<'_, Judgement> {
        self.resolved.drain(..)
    }

    /// Oldest pending note in a lane
    pub fn front(&self, lane: usize) -> Option<&PendingNote> {
        self.lanes.get(lane).and_then(|q| q.front())
    }

    pub fn pending(&self, lane: usize) -> impl Iterator<Item = &PendingNote> {
        self.lanes.get(lane).into_iter().flatten()
    }

    pub fn pending_count(&self) -> usize {
        self.lanes.iter().map(VecDeque::len).sum()
    }

    /// Drop every pending note without judging it. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending_count();
        for queue in &mut self.lanes {
            queue.clear();
        }
        self.resolved.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: u32, lane: usize, expected: f64) -> PendingNote {
        PendingNote {
            id: NoteId(id),
            lane,
            spawn_time: expected - 1.0,
            expected_hit_time: expected,
        }
    }

    #[test]
    fn test_classify_windows() {
        let w = JudgeWindows::default();
        assert_eq!(w.classify(0.0), ScoreTier::Perfect);
        assert_eq!(w.classify(0.05), ScoreTier::Perfect);
        assert_eq!(w.classify(-0.05), ScoreTier::Perfect);
        assert_eq!(w.classify(0.08), ScoreTier::Good);
        assert_eq!(w.classify(0.12), ScoreTier::Good);
        assert_eq!(w.classify(0.5), ScoreTier::Miss);
    }

    #[test]
    fn test_score_deltas() {
        assert_eq!(ScoreTier::Perfect.score_delta(), 100);
        assert_eq!(ScoreTier::Good.score_delta(), 50);
        assert_eq!(ScoreTier::Miss.score_delta(), -20);
        assert_eq!(ScoreTier::None.score_delta(), 0);
    }

    #[test]
    fn test_resolve_empty_lane_is_noop() {
        let mut judge = HitJudge::new(2, JudgeWindows::default());
        assert_eq!(judge.resolve(0, 1.0), ScoreTier::None);
        assert_eq!(judge.resolve(9, 1.0), ScoreTier::None);
        assert_eq!(judge.drain_resolved().count(), 0);
    }

    #[test]
    fn test_resolve_is_fifo() {
        let mut judge = HitJudge::new(1, JudgeWindows::default());
        assert!(judge.register(note(1, 0, 1.0)));
        assert!(judge.register(note(2, 0, 2.0)));

        // Pressing right on the second note still consumes the first
        assert_eq!(judge.resolve(0, 2.0), ScoreTier::Miss);
        let resolved: Vec<_> = judge.drain_resolved().collect();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].note, NoteId(1));
        assert_eq!(resolved[0].delta, -20);
        assert_eq!(judge.front(0).map(|n| n.id), Some(NoteId(2)));
    }

    #[test]
    fn test_register_rejects_unknown_lane() {
        let mut judge = HitJudge::new(2, JudgeWindows::default());
        assert!(!judge.register(note(1, 2, 1.0)));
        assert_eq!(judge.pending_count(), 0);
    }

    #[test]
    fn test_force_miss_once() {
        let mut judge = HitJudge::new(1, JudgeWindows::default());
        judge.register(note(1, 0, 1.0));
        judge.register(note(2, 0, 2.0));

        assert!(judge.force_miss(0, NoteId(2)));
        assert!(!judge.force_miss(0, NoteId(2)));
        assert!(!judge.force_miss(3, NoteId(1)));

        let resolved: Vec<_> = judge.drain_resolved().collect();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].tier, ScoreTier::Miss);
        assert_eq!(resolved[0].offset, None);
        assert_eq!(judge.pending(0).count(), 1);
    }

    #[test]
    fn test_resolve_by_custom_offset() {
        let windows = JudgeWindows {
            metric: JudgeMetric::Distance,
            perfect: 0.25,
            good: 0.6,
        };
        let mut judge = HitJudge::new(1, windows);
        judge.register(note(1, 0, 1.0));
        assert_eq!(judge.resolve_by(0, |_| 0.4), ScoreTier::Good);
    }

    #[test]
    fn test_custom_score_table() {
        let table = ScoreTable {
            perfect: 300,
            good: 100,
            miss: 0,
        };
        let mut judge = HitJudge::with_scoring(1, JudgeWindows::default(), table);
        judge.register(note(1, 0, 1.0));
        judge.resolve(0, 1.0);
        assert_eq!(judge.drain_resolved().next().map(|j| j.delta), Some(300));
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut judge = HitJudge::new(2, JudgeWindows::default());
        judge.register(note(1, 0, 1.0));
        judge.register(note(2, 1, 1.0));
        assert_eq!(judge.clear(), 2);
        assert_eq!(judge.pending_count(), 0);
        assert_eq!(judge.resolve(0, 1.0), ScoreTier::None);
    }
}
