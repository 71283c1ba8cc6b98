//! Per-lane rising-edge detection
//!
//! One physical press yields exactly one hit attempt, no matter how many
//! ticks the lane is held.

#[derive(Debug, Clone)]
pub struct LaneInput {
    previous: Vec<bool>,
}

impl LaneInput {
    pub fn new(lane_count: usize) -> Self {
        Self {
            previous: vec![false; lane_count],
        }
    }

    pub fn lane_count(&self) -> usize {
        self.previous.len()
    }

    /// Lanes that went from released to pressed since the last poll, ascending.
    ///
    /// Lanes missing from `current` count as released; extra entries are ignored.
    pub fn poll_edges(&mut self, current: &[bool]) -> Vec<usize> {
        let pressed = |lane: usize| current.get(lane).copied().unwrap_or(false);

        let edges: Vec<usize> = (0..self.previous.len())
            .filter(|&lane| pressed(lane) && !self.previous[lane])
            .collect();

        for (lane, prev) in self.previous.iter_mut().enumerate() {
            *prev = pressed(lane);
        }

        edges
    }

    /// Whether the lane was pressed at the last poll
    pub fn is_held(&self, lane: usize) -> bool {
        self.previous.get(lane).copied().unwrap_or(false)
    }

    pub fn reset(&mut self) {
        self.previous.fill(false);
    }
}
