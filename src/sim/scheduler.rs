//! Forward-only beat scheduler

use std::ops::Range;

use super::chart::BeatTimeline;

/// Walks a timeline against song time with a single cursor.
///
/// The cursor never moves backwards. If the chart is not time-ascending, an
/// early event stored after a later one is emitted as soon as the cursor
/// reaches it, i.e. late.
#[derive(Debug, Clone, Default)]
pub struct BeatScheduler {
    next_index: usize,
}

impl BeatScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit every event whose time has arrived. Returns the emitted index
    /// range (possibly empty), in ascending order.
    pub fn tick(&mut self, timeline: &BeatTimeline, now: f64) -> Range<usize> {
        let start = self.next_index;
        while let Some(event) = timeline.get(self.next_index) {
            if now < event.time {
                break;
            }
            self.next_index += 1;
        }
        start..self.next_index
    }

    /// Index of the next event to emit
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn remaining(&self, timeline: &BeatTimeline) -> usize {
        timeline.len().saturating_sub(self.next_index)
    }

    pub fn is_finished(&self, timeline: &BeatTimeline) -> bool {
        self.next_index >= timeline.len()
    }

    pub fn reset(&mut self) {
        self.next_index = 0;
    }
}
