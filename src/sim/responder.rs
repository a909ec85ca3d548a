//! Crash sequence
//!
//! Once triggered, the responder owns both cars' motion: they are launched
//! apart, tumble, fall under gravity and bounce on the road until the physics
//! window closes. The camera shakes around where it was at impact, then
//! freezes and the final score is revealed.
//!
//! Phases: `Idle -> PhysicsActive -> ScoreRevealed`. Only `reset` leaves
//! `ScoreRevealed`.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::CollisionEvent;
use super::geometry::Pose;
use super::state::{GameEvent, SoundEffect};
use super::traffic::VehicleId;
use crate::settings::{CrashTuning, TimeStep};

/// Slack on the end-of-physics comparison so float step accumulation does
/// not cost an extra tick
const TIME_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrashPhase {
    #[default]
    Idle,
    PhysicsActive,
    ScoreRevealed,
}

/// A tumbling car
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CrashBody {
    pub position: Vec3,
    pub rotation: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl CrashBody {
    pub fn at_rest(pose: Pose) -> Self {
        Self {
            position: pose.position,
            rotation: pose.rotation,
            ..Default::default()
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    /// One physics tick; returns true if the body bounced off the road
    pub fn integrate(&mut self, tuning: &CrashTuning, step: &TimeStep) -> bool {
        let k = step.ticks();
        let friction = step.damp(tuning.friction);

        self.velocity.y += tuning.gravity * k;
        self.velocity.x *= friction;
        self.velocity.z *= friction;
        self.angular_velocity *= step.damp(tuning.angular_friction);

        self.position += self.velocity * k;
        self.rotation += self.angular_velocity * k;

        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity.y = -self.velocity.y * tuning.restitution;
            self.velocity.x *= tuning.bounce_friction;
            self.velocity.z *= tuning.bounce_friction;
            self.angular_velocity *= tuning.bounce_spin_damping;
            return true;
        }
        false
    }
}

/// Uniform random vector in [-0.5, 0.5) per axis, scaled by `width`
fn centered_jitter<R: Rng>(rng: &mut R, width: Vec3) -> Vec3 {
    Vec3::new(
        rng.random::<f32>() - 0.5,
        rng.random::<f32>() - 0.5,
        rng.random::<f32>() - 0.5,
    ) * width
}

#[derive(Debug, Clone)]
pub struct CollisionResponder {
    phase: CrashPhase,
    /// Simulated seconds since trigger
    elapsed: f64,
    player: CrashBody,
    other: CrashBody,
    struck: Option<VehicleId>,
    score: f64,
    shake: f32,
    /// Camera position at impact; shake is always relative to this
    camera_anchor: Vec3,
    camera: Vec3,
    camera_frozen: bool,
    revealed_score: Option<u64>,
    tuning: CrashTuning,
}

impl CollisionResponder {
    pub fn new(tuning: CrashTuning) -> Self {
        Self {
            phase: CrashPhase::Idle,
            elapsed: 0.0,
            player: CrashBody::default(),
            other: CrashBody::default(),
            struck: None,
            score: 0.0,
            shake: 0.0,
            camera_anchor: Vec3::ZERO,
            camera: Vec3::ZERO,
            camera_frozen: false,
            revealed_score: None,
            tuning,
        }
    }

    /// Arm the crash sequence; a no-op unless idle
    pub fn trigger<R: Rng>(
        &mut self,
        event: &CollisionEvent,
        player: Pose,
        other: Pose,
        camera: Vec3,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        if self.phase != CrashPhase::Idle {
            log::warn!("Collision trigger ignored: crash already {:?}", self.phase);
            return false;
        }

        let t = self.tuning;
        let mut offset = player.position - other.position;
        offset.y = 0.0;
        let dir = offset.try_normalize().unwrap_or(Vec3::Z);

        self.player = CrashBody::at_rest(player);
        self.player.velocity = Vec3::new(
            dir.x * t.impact_force + (rng.random::<f32>() - 0.5) * t.launch_jitter,
            t.upward_force + rng.random::<f32>() * t.launch_lift_jitter,
            dir.z * t.impact_force + (rng.random::<f32>() - 0.5) * t.launch_jitter,
        );

        self.other = CrashBody::at_rest(other);
        let reaction = t.impact_force * t.reaction_scale;
        self.other.velocity = Vec3::new(
            -dir.x * reaction,
            t.upward_force * t.reaction_lift,
            -dir.z * reaction,
        );

        self.player.angular_velocity = centered_jitter(rng, t.player_spin);
        self.other.angular_velocity = centered_jitter(rng, t.other_spin);

        self.phase = CrashPhase::PhysicsActive;
        self.elapsed = 0.0;
        self.struck = Some(event.struck);
        self.score = event.score;
        self.shake = t.shake_peak;
        self.camera_anchor = camera;
        self.camera = camera;
        self.camera_frozen = false;
        self.revealed_score = None;

        events.push(GameEvent::Sound(SoundEffect::Collision));
        log::info!("Collision with {:?} at score {:.1}", event.struck, event.score);
        true
    }

    /// Advance the crash by one tick
    pub fn tick<R: Rng>(&mut self, step: &TimeStep, rng: &mut R, events: &mut Vec<GameEvent>) {
        if self.phase != CrashPhase::PhysicsActive {
            return;
        }

        self.elapsed += f64::from(step.seconds);
        let duration = f64::from(self.tuning.duration);

        if self.elapsed + TIME_EPSILON < duration {
            self.player.integrate(&self.tuning, step);
            self.other.integrate(&self.tuning, step);

            let progress = (self.elapsed / duration) as f32;
            self.shake = (self.tuning.shake_peak * (1.0 - progress)).max(0.0);
            self.camera = self.camera_anchor + centered_jitter(rng, Vec3::ONE) * self.shake;
        } else {
            self.reveal(events);
        }
    }

    fn reveal(&mut self, events: &mut Vec<GameEvent>) {
        // Camera holds wherever the last shake left it
        self.camera_frozen = true;
        self.shake = 0.0;
        let score = self.score.max(0.0).floor() as u64;
        self.revealed_score = Some(score);
        self.phase = CrashPhase::ScoreRevealed;
        events.push(GameEvent::ScoreRevealed { score });
        log::info!("Final score: {}", score);
    }

    /// Back to idle from any phase; safe to call repeatedly
    pub fn reset(&mut self, events: &mut Vec<GameEvent>) {
        if self.revealed_score.is_some() {
            events.push(GameEvent::ScoreOverlayRemoved);
        }
        *self = Self::new(self.tuning);
    }

    pub fn phase(&self) -> CrashPhase {
        self.phase
    }

    /// True from trigger until reset
    pub fn is_active(&self) -> bool {
        self.phase != CrashPhase::Idle
    }

    /// True once the score is revealed and a restart may happen
    pub fn is_complete(&self) -> bool {
        self.phase == CrashPhase::ScoreRevealed
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn shake(&self) -> f32 {
        self.shake
    }

    /// Camera position the host should render from, while a crash is live
    pub fn camera_position(&self) -> Option<Vec3> {
        self.is_active().then_some(self.camera)
    }

    pub fn is_camera_frozen(&self) -> bool {
        self.camera_frozen
    }

    pub fn player_body(&self) -> &CrashBody {
        &self.player
    }

    pub fn other_body(&self) -> &CrashBody {
        &self.other
    }

    pub fn struck(&self) -> Option<VehicleId> {
        self.struck
    }

    pub fn revealed_score(&self) -> Option<u64> {
        self.revealed_score
    }
}
