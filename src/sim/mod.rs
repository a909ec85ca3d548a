//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Configured timestep only, no wall clock
//! - Seeded RNG only, threaded through explicitly
//! - Stable iteration order (spawn order for traffic)
//! - No rendering or audio dependencies; collaborators hear about changes
//!   through `GameEvent`s

pub mod camera;
pub mod clock;
pub mod collision;
pub mod geometry;
pub mod lane_change;
pub mod lanes;
pub mod responder;
pub mod state;
pub mod tick;
pub mod traffic;

pub use camera::CameraRig;
pub use clock::{DifficultyState, SimulationClock};
pub use collision::{CollisionEvent, detect};
pub use geometry::{Aabb, Pose};
pub use lane_change::{LaneChangeController, PlayerState, SteerDirection};
pub use lanes::Lane;
pub use responder::{CollisionResponder, CrashBody, CrashPhase};
pub use state::{GameEvent, GamePhase, GameState, RunSummary};
pub use tick::{TickInput, tick};
pub use traffic::{LaneTrafficSimulator, TrafficVehicle, VehicleId, follow_target_speed};
