//! Player lane changes
//!
//! A steer command moves the player one lane over along a cubic ease-in-out
//! curve. The car yaws and banks into the move and settles back to neutral
//! once it arrives.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::geometry::{Aabb, Pose};
use super::lanes::Lane;
use super::state::{GameEvent, SoundEffect};
use crate::settings::{LaneChangeTuning, TimeStep};
use crate::{ease_in_out_cubic, lerp};

/// Progress values this close to 1 count as finished (float accumulation)
const PROGRESS_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SteerDirection {
    Left,
    Right,
}

/// The player's car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Lane the player is in, or moving into
    pub lane: Lane,
    /// x is lateral; z stays 0 because the world scrolls instead
    pub position: Vec3,
    /// Nose up/down (radians); only a crash tumble moves it
    pub pitch: f32,
    /// Steering angle (radians)
    pub yaw: f32,
    /// Roll into the turn (radians)
    pub bank: f32,
    pub yaw_target: f32,
    pub bank_target: f32,
    /// Lane change progress in [0, 1]; 1 once a change has finished
    pub progress: f32,
    pub changing_lanes: bool,
    pub start_x: f32,
    pub target_x: f32,
    pub bounds: Aabb,
}

impl PlayerState {
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, Vec3::new(self.pitch, self.yaw, self.bank))
    }
}

#[derive(Debug, Clone)]
pub struct LaneChangeController {
    player: PlayerState,
    tuning: LaneChangeTuning,
}

impl LaneChangeController {
    pub fn new(tuning: LaneChangeTuning) -> Self {
        let lane = Lane::start();
        let position = Vec3::new(lane.offset(), tuning.ride_height, 0.0);
        Self {
            player: PlayerState {
                lane,
                position,
                pitch: 0.0,
                yaw: 0.0,
                bank: 0.0,
                yaw_target: 0.0,
                bank_target: 0.0,
                progress: 0.0,
                changing_lanes: false,
                start_x: position.x,
                target_x: position.x,
                bounds: Aabb::from_center_half_extents(position, tuning.half_extents),
            },
            tuning,
        }
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn is_changing_lanes(&self) -> bool {
        self.player.changing_lanes
    }

    /// Start a lane change; ignored mid-change or at the road edge
    pub fn command(&mut self, direction: SteerDirection, events: &mut Vec<GameEvent>) -> bool {
        if self.player.changing_lanes {
            log::debug!("Steer {:?} ignored: lane change in progress", direction);
            return false;
        }

        let next = match direction {
            SteerDirection::Left => self.player.lane.left(),
            SteerDirection::Right => self.player.lane.right(),
        };
        let Some(next) = next else {
            return false;
        };

        let p = &mut self.player;
        p.lane = next;
        p.changing_lanes = true;
        p.progress = 0.0;
        p.start_x = p.position.x;
        p.target_x = next.offset();

        let moving_right = p.target_x > p.start_x;
        p.yaw_target = if moving_right {
            -self.tuning.max_yaw
        } else {
            self.tuning.max_yaw
        };
        p.bank_target = if moving_right {
            self.tuning.max_bank
        } else {
            -self.tuning.max_bank
        };

        events.push(GameEvent::Sound(SoundEffect::LaneChange));
        true
    }

    /// Advance the lane change and settle yaw/bank
    pub fn update(&mut self, step: &TimeStep) {
        let t = self.tuning;
        let p = &mut self.player;

        if p.changing_lanes {
            p.progress += step.seconds / t.duration;
            if p.progress >= 1.0 - PROGRESS_EPSILON {
                p.progress = 1.0;
                p.changing_lanes = false;
                p.position.x = p.target_x;
                p.yaw_target = 0.0;
                p.bank_target = 0.0;
            } else {
                p.position.x = lerp(p.start_x, p.target_x, ease_in_out_cubic(p.progress));
            }
        }

        p.yaw = lerp(p.yaw, p.yaw_target, step.blend(t.yaw_smoothing));
        p.bank = lerp(p.bank, p.bank_target, step.blend(t.bank_smoothing));

        if p.yaw.abs() < t.snap_epsilon && p.yaw_target.abs() < t.snap_epsilon {
            p.yaw = 0.0;
        }
        if p.bank.abs() < t.snap_epsilon && p.bank_target.abs() < t.snap_epsilon {
            p.bank = 0.0;
        }

        p.bounds = Aabb::from_center_half_extents(p.position, t.half_extents);
    }

    /// Place the player at an externally driven pose (crash tumble)
    pub fn follow_pose(&mut self, pose: Pose) {
        let p = &mut self.player;
        p.position = pose.position;
        p.pitch = pose.rotation.x;
        p.yaw = pose.rotation.y;
        p.bank = pose.rotation.z;
        p.bounds = Aabb::from_center_half_extents(p.position, self.tuning.half_extents);
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.tuning);
    }
}
