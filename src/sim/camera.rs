//! Chase camera
//!
//! Follows the player while driving. During a crash the collision responder
//! takes the camera over and this rig is left where it was at impact.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::lane_change::PlayerState;
use crate::lerp;
use crate::settings::{CameraTuning, TimeStep};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Roll (radians), a softened copy of the player's bank
    pub roll: f32,
    #[serde(skip)]
    tuning: CameraTuning,
}

impl CameraRig {
    pub fn new(tuning: CameraTuning) -> Self {
        Self {
            position: Vec3::new(0.0, tuning.height, tuning.distance),
            look_at: Vec3::ZERO,
            roll: 0.0,
            tuning,
        }
    }

    pub fn follow(&mut self, player: &PlayerState, step: &TimeStep) {
        let t = &self.tuning;
        let target_roll = player.bank * t.roll_factor;
        self.roll = lerp(self.roll, target_roll, step.blend(t.roll_smoothing));

        self.position.x = lerp(self.position.x, player.position.x, step.blend(t.follow_smoothing));
        self.position.y = t.height;
        self.position.z = player.position.z + t.distance;

        self.look_at = Vec3::new(
            player.position.x,
            player.position.y,
            player.position.z - t.look_ahead,
        );
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.tuning);
    }
}
