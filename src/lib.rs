//! Lane Rhythm - timing core for a lane-based rhythm game
//!
//! Core modules:
//! - `sim`: Chart loading, beat scheduling, input edges, hit judging, session state
//! - `settings`: Data-driven lane layout, judge windows and scoring
//! - `autoplay`: Seeded bot for demos and soak tests

pub mod autoplay;
pub mod settings;
pub mod sim;

pub use autoplay::AutoPlayer;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed tick for the demo loop (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default lane columns (four lanes)
    pub const LANE_X: [f32; 4] = [-3.0, -1.0, 1.0, 3.0];
    /// Height notes spawn at
    pub const SPAWN_Y: f32 = 6.0;
    /// Height of the hit zone
    pub const HIT_ZONE_Y: f32 = -4.0;
    /// Unhit notes below this are missed
    pub const DESPAWN_Y: f32 = -6.0;
    /// Note fall speed (units/s); with the heights above, travel is 2s
    pub const NOTE_SPEED: f32 = 5.0;
}
