//! Player vs traffic overlap detection
//!
//! Resolution is first-match in spawn order, not nearest-match. When the
//! player box overlaps several cars at once, the car that has been on the road
//! longest is the one that gets hit. Keep it that way: the crash physics
//! depends on which car is chosen.

use serde::{Deserialize, Serialize};

use super::geometry::Aabb;
use super::traffic::{TrafficVehicle, VehicleId};

/// A detected hit, consumed once by the collision responder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// The car the player ran into
    pub struck: VehicleId,
    /// Score at the moment of impact
    pub score: f64,
}

/// Return the first car in `vehicles` whose box overlaps `player`
pub fn detect(player: &Aabb, vehicles: &[TrafficVehicle]) -> Option<VehicleId> {
    vehicles
        .iter()
        .find(|v| player.intersects(&v.bounds))
        .map(|v| v.id)
}
