//! Night Drive - lane-based night driving game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (traffic, lane changes, collisions, crash physics)
//! - `settings`: Data-driven tuning and time step configuration
//! - `audio`: Routing of simulation events to the audio collaborator

pub mod audio;
pub mod settings;
pub mod sim;

pub use settings::{Settings, StepMode, TimeStep};

/// Game configuration constants
pub mod consts {
    /// Nominal simulation timestep (60 Hz, the rate the tuning was authored at)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Updates per second the per-tick tuning constants assume
    pub const REFERENCE_HZ: f32 = 60.0;

    /// Road layout: four lanes, outer-left to outer-right
    pub const LANE_COUNT: usize = 4;
    pub const LANE_OFFSETS: [f32; LANE_COUNT] = [-4.5, -1.5, 1.5, 4.5];
    /// Player starts in the inner-right lane
    pub const PLAYER_START_LANE: usize = 2;

    /// Slowest a traffic car may ever drive (units per tick)
    pub const MIN_TRAFFIC_SPEED: f32 = 0.1;
}

/// Linear interpolation from `a` to `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic ease-in-out over [0, 1]
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
