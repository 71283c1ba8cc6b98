//! Session settings
//!
//! Loaded from JSON. Every field is optional; missing fields take defaults.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{ChartOrder, JudgeWindows, LaneLayout, ScoreTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Lanes ===
    /// Note spawn point per lane; the lane count is this length
    pub lane_spawn_points: Vec<Vec2>,
    /// Height of the hit zone
    pub hit_zone_y: f32,
    /// Unhit notes below this height are missed
    pub despawn_y: f32,
    /// Fall speed (units/s)
    pub note_speed: f32,

    // === Timing ===
    /// Seconds between session start and audio start
    pub start_delay: f64,
    pub judge: JudgeWindows,
    pub scoring: ScoreTable,
    pub chart_order: ChartOrder,

    // === End screen ===
    /// Wait before the end banner starts fading in
    pub end_banner_delay: f32,
    pub end_banner_fade: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lane_spawn_points: default_spawn_points(),
            hit_zone_y: HIT_ZONE_Y,
            despawn_y: DESPAWN_Y,
            note_speed: NOTE_SPEED,

            start_delay: 0.0,
            judge: JudgeWindows::default(),
            scoring: ScoreTable::default(),
            chart_order: ChartOrder::Preserve,

            end_banner_delay: 0.5,
            end_banner_fade: 0.5,
        }
    }
}

fn default_spawn_points() -> Vec<Vec2> {
    LANE_X
        .iter()
        .map(|&x| Vec2::new(x, SPAWN_Y))
        .collect()
}

impl Settings {
    pub fn lane_count(&self) -> usize {
        self.lane_spawn_points.len()
    }

    pub fn lane_layout(&self) -> LaneLayout {
        LaneLayout {
            spawn_points: self.lane_spawn_points.clone(),
            hit_zone_y: self.hit_zone_y,
            despawn_y: self.despawn_y,
            note_speed: self.note_speed,
        }
    }

    /// Repair inconsistent values, logging each fix
    pub fn validate(&mut self) {
        if self.lane_spawn_points.is_empty() {
            log::warn!("Settings define no lanes; using the default layout");
            self.lane_spawn_points = default_spawn_points();
        }
        if !(self.note_speed > 0.0) {
            log::warn!("Invalid note speed {}; using {}", self.note_speed, NOTE_SPEED);
            self.note_speed = NOTE_SPEED;
        }
        if !(self.start_delay >= 0.0) {
            log::warn!("Invalid start delay {}; using 0", self.start_delay);
            self.start_delay = 0.0;
        }
        if !(self.judge.perfect >= 0.0) {
            log::warn!("Invalid perfect window {}; using 0", self.judge.perfect);
            self.judge.perfect = 0.0;
        }
        if !(self.judge.good >= self.judge.perfect) {
            log::warn!(
                "Good window {} is narrower than perfect window {}; widening",
                self.judge.good,
                self.judge.perfect
            );
            self.judge.good = self.judge.perfect;
        }
    }

    /// Parse settings JSON and validate
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.validate();
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => log::warn!("Malformed settings {}: {}", path.display(), e),
            },
            Err(e) => log::warn!("Cannot read settings {}: {}", path.display(), e),
        }

        log::info!("Using default settings");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::JudgeMetric;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.lane_count(), 4);
        assert_eq!(settings.scoring.miss, -20);
        assert!((settings.lane_layout().travel_time() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(
            r#"{ "note_speed": 10.0, "judge": { "metric": "distance", "perfect": 0.3 } }"#,
        )
        .unwrap();
        assert_eq!(settings.note_speed, 10.0);
        assert_eq!(settings.judge.metric, JudgeMetric::Distance);
        assert_eq!(settings.judge.perfect, 0.3);
        assert_eq!(settings.judge.good, 0.3);
        assert_eq!(settings.lane_count(), 4);
    }

    #[test]
    fn test_validate_repairs() {
        let mut settings = Settings {
            lane_spawn_points: Vec::new(),
            note_speed: -1.0,
            start_delay: f64::NAN,
            ..Default::default()
        };
        settings.judge.good = 0.01;
        settings.validate();
        assert_eq!(settings.lane_count(), 4);
        assert_eq!(settings.note_speed, NOTE_SPEED);
        assert_eq!(settings.start_delay, 0.0);
        assert_eq!(settings.judge.good, settings.judge.perfect);
    }

    #[test]
    fn test_json_roundtrip() {
        let settings = Settings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_malformed_json() {
        assert!(Settings::from_json("{ not json").is_err());
        assert!(Settings::from_json(r#"{ "chart_order": "shuffle" }"#).is_err());
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        assert_eq!(Settings::load("/no/such/settings.json"), Settings::default());
    }
}
