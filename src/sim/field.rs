//! Falling-note playfield
//!
//! Notes appear at their lane's spawn point and fall at a constant speed
//! past the hit zone. A note that drops below the despawn bound without
//! being hit is reported as expired so it can be force-missed.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::judge::NoteId;

/// Lane geometry and note motion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneLayout {
    /// Where notes appear, one per lane
    pub spawn_points: Vec<Vec2>,
    /// Height of the hit zone shared by all lanes
    pub hit_zone_y: f32,
    /// Notes below this height have been missed
    pub despawn_y: f32,
    /// Fall speed in world units per second
    pub note_speed: f32,
}

impl LaneLayout {
    pub fn lane_count(&self) -> usize {
        self.spawn_points.len()
    }

    /// Seconds a note takes to fall from its spawn point to the hit zone
    pub fn travel_time(&self) -> f64 {
        let Some(spawn) = self.spawn_points.first() else {
            return 0.0;
        };
        if self.note_speed <= 0.0 {
            return 0.0;
        }
        (((spawn.y - self.hit_zone_y) / self.note_speed) as f64).max(0.0)
    }

    /// Center of the hit zone for a lane
    pub fn hit_point(&self, lane: usize) -> Option<Vec2> {
        self.spawn_points
            .get(lane)
            .map(|p| Vec2::new(p.x, self.hit_zone_y))
    }
}

/// A note currently visible on the field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleNote {
    pub id: NoteId,
    pub lane: usize,
    pub spawn_time: f64,
    pub pos: Vec2,
}

#[derive(Debug, Clone)]
pub struct Playfield {
    layout: LaneLayout,
    /// Sorted by id (spawn order)
    notes: Vec<VisibleNote>,
}

impl Playfield {
    pub fn new(layout: LaneLayout) -> Self {
        Self {
            layout,
            notes: Vec::new(),
        }
    }

    pub fn layout(&self) -> &LaneLayout {
        &self.layout
    }

    pub fn travel_time(&self) -> f64 {
        self.layout.travel_time()
    }

    /// Place a note at its lane's spawn point. False for an unknown lane.
    /// Spawning an id that is already on the field replaces that note.
    pub fn spawn(&mut self, id: NoteId, lane: usize, spawn_time: f64) -> bool {
        let Some(&origin) = self.layout.spawn_points.get(lane) else {
            return false;
        };
        let note = VisibleNote {
            id,
            lane,
            spawn_time,
            pos: origin,
        };
        match self.notes.binary_search_by_key(&id, |n| n.id) {
            Ok(i) => self.notes[i] = note,
            Err(i) => self.notes.insert(i, note),
        }
        true
    }

    /// Recompute positions for song time `now`
    pub fn update(&mut self, now: f64) {
        let speed = self.layout.note_speed;
        for note in &mut self.notes {
            let origin = self.layout.spawn_points[note.lane];
            let fallen = (now - note.spawn_time).max(0.0) as f32 * speed;
            note.pos = origin - Vec2::Y * fallen;
        }
    }

    /// Remove and return notes that fell below the despawn bound, as `(lane, id)`
    pub fn take_expired(&mut self) -> Vec<(usize, NoteId)> {
        let despawn_y = self.layout.despawn_y;
        let mut expired = Vec::new();
        self.notes.retain(|n| {
            if n.pos.y < despawn_y {
                expired.push((n.lane, n.id));
                false
            } else {
                true
            }
        });
        expired
    }

    /// Distance from a note to its lane's hit zone
    pub fn distance_to_hit_zone(&self, id: NoteId) -> Option<f32> {
        let note = self.get(id)?;
        let hit = self.layout.hit_point(note.lane)?;
        Some(note.pos.distance(hit))
    }

    pub fn get(&self, id: NoteId) -> Option<&VisibleNote> {
        self.notes
            .binary_search_by_key(&id, |n| n.id)
            .ok()
            .map(|i| &self.notes[i])
    }

    pub fn remove(&mut self, id: NoteId) -> bool {
        match self.notes.binary_search_by_key(&id, |n| n.id) {
            Ok(i) => {
                self.notes.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    pub fn notes(&self) -> &[VisibleNote] {
        &self.notes
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn layout() -> LaneLayout {
        LaneLayout {
            spawn_points: vec![Vec2::new(-1.0, 6.0), Vec2::new(1.0, 6.0)],
            hit_zone_y: -4.0,
            despawn_y: -6.0,
            note_speed: 5.0,
        }
    }

    #[test]
    fn test_travel_time() {
        assert_relative_eq!(layout().travel_time(), 2.0);

        let mut stalled = layout();
        stalled.note_speed = 0.0;
        assert_relative_eq!(stalled.travel_time(), 0.0);
    }

    #[test]
    fn test_note_falls_and_reaches_hit_zone() {
        let mut field = Playfield::new(layout());
        assert!(field.spawn(NoteId(1), 1, 1.0));
        field.update(2.0);
        assert_relative_eq!(field.notes()[0].pos.y, 1.0);
        field.update(3.0);
        assert_relative_eq!(field.distance_to_hit_zone(NoteId(1)).unwrap_or(f32::MAX), 0.0);
    }

    #[test]
    fn test_unknown_lane_not_spawned() {
        let mut field = Playfield::new(layout());
        assert!(!field.spawn(NoteId(1), 5, 0.0));
        assert!(field.notes().is_empty());
    }

    #[test]
    fn test_expiry() {
        let mut field = Playfield::new(layout());
        field.spawn(NoteId(1), 0, 0.0);
        field.spawn(NoteId(2), 1, 1.0);
        // Note 1 at y = 6 - 5*2.5 = -6.5, note 2 at y = -1.5
        field.update(2.5);
        assert_eq!(field.take_expired(), vec![(0, NoteId(1))]);
        assert!(field.take_expired().is_empty());
        assert_eq!(field.notes().len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut field = Playfield::new(layout());
        field.spawn(NoteId(1), 0, 0.0);
        field.spawn(NoteId(2), 0, 0.5);
        assert!(field.remove(NoteId(1)));
        assert!(!field.remove(NoteId(1)));
        assert!(field.get(NoteId(2)).is_some());
    }

    #[test]
    fn test_spawn_out_of_id_order() {
        let mut field = Playfield::new(layout());
        field.spawn(NoteId(3), 0, 0.0);
        field.spawn(NoteId(1), 1, 0.0);
        field.spawn(NoteId(2), 0, 0.5);
        let ids: Vec<_> = field.notes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NoteId(1), NoteId(2), NoteId(3)]);
        assert_eq!(field.get(NoteId(1)).map(|n| n.lane), Some(1));
        assert!(field.remove(NoteId(3)));
        assert!(field.get(NoteId(3)).is_none());

        field.spawn(NoteId(2), 1, 1.0);
        assert_eq!(field.notes().len(), 2);
        assert_eq!(field.get(NoteId(2)).map(|n| n.lane), Some(1));
    }
}
