//! Game settings and tuning
//!
//! Every number the simulation uses lives here so runs can be re-tuned from a
//! JSON file without recompiling. `Settings::default()` is the shipped game.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::{REFERENCE_HZ, SIM_DT};

/// How per-tick motion constants relate to the configured step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Motion constants apply once per tick regardless of `seconds`
    #[default]
    FixedTick,
    /// Motion constants are scaled by `seconds * REFERENCE_HZ`
    DeltaTime,
}

/// Simulated time per tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeStep {
    /// Seconds of simulated time each tick advances clocks and timers by
    pub seconds: f32,
    pub mode: StepMode,
}

impl Default for TimeStep {
    fn default() -> Self {
        Self {
            seconds: SIM_DT,
            mode: StepMode::FixedTick,
        }
    }
}

impl TimeStep {
    pub fn fixed(seconds: f32) -> Self {
        Self {
            seconds,
            mode: StepMode::FixedTick,
        }
    }

    pub fn delta(seconds: f32) -> Self {
        Self {
            seconds,
            mode: StepMode::DeltaTime,
        }
    }

    /// Timers only move forward with a finite, positive step
    pub fn is_valid(&self) -> bool {
        self.seconds.is_finite() && self.seconds > 0.0
    }

    /// Number of reference ticks this step is worth
    #[inline]
    pub fn ticks(&self) -> f32 {
        match self.mode {
            StepMode::FixedTick => 1.0,
            StepMode::DeltaTime => self.seconds * REFERENCE_HZ,
        }
    }

    /// Exponential smoothing gain for this step, given the per-tick gain
    #[inline]
    pub fn blend(&self, gain: f32) -> f32 {
        match self.mode {
            StepMode::FixedTick => gain,
            StepMode::DeltaTime => 1.0 - (1.0 - gain).powf(self.ticks()),
        }
    }

    /// Multiplicative damping for this step, given the per-tick factor
    #[inline]
    pub fn damp(&self, factor: f32) -> f32 {
        match self.mode {
            StepMode::FixedTick => factor,
            StepMode::DeltaTime => factor.powf(self.ticks()),
        }
    }
}

/// Progressive speed-up over the course of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    /// Target multiplier at elapsed = 0
    pub base_multiplier: f32,
    /// Multiplier the first run starts from before smoothing catches up
    pub initial_multiplier: f32,
    /// Multiplier a restarted run starts from
    pub restart_multiplier: f32,
    /// Target increase per simulated second
    pub increase_rate: f32,
    pub max_multiplier: f32,
    /// Per-tick gain toward the target
    pub smoothing: f32,
    /// Score gained per tick at multiplier 1.0
    pub score_rate: f32,
    /// Speedometer reading per unit of multiplier
    pub kmh_per_multiplier: f32,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            base_multiplier: 1.8,
            initial_multiplier: 1.2,
            restart_multiplier: 1.0,
            increase_rate: 0.01,
            max_multiplier: 30.0,
            smoothing: 0.02,
            score_rate: 0.1,
            kmh_per_multiplier: 30.0,
        }
    }
}

/// Oncoming traffic spawning and car-following
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficTuning {
    /// Longitudinal position new cars appear at (ahead of the player)
    pub spawn_z: f32,
    /// Cars past this position (behind the player) are removed
    pub despawn_z: f32,
    /// Cars further than this beyond `spawn_z` are removed
    pub overshoot: f32,
    /// Ticks between spawn attempts at multiplier 1.0
    pub base_spawn_interval: f32,
    /// Floor on the spawn interval at high multipliers
    pub min_spawn_interval: f32,
    /// Probability a spawn attempt produces a car
    pub spawn_chance: f32,
    /// Baseline speed of oncoming cars (units per tick)
    pub oncoming_speed: f32,
    /// Baseline speed varies by up to this much either way
    pub speed_jitter: f32,
    /// Minimum gap between cars in one lane
    pub min_clearance: f32,
    /// Distance a car looks ahead for a slower leader
    pub look_ahead: f32,
    /// Fresh spawns are capped to this fraction of their leader's speed
    pub spawn_leader_factor: f32,
    /// Followers inside `min_clearance` are capped to this fraction
    pub close_follow_factor: f32,
    /// Per-tick gain toward the car-following target speed
    pub speed_smoothing: f32,
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
    pub half_extents: Vec3,
}

impl Default for TrafficTuning {
    fn default() -> Self {
        Self {
            spawn_z: -100.0,
            despawn_z: 50.0,
            overshoot: 20.0,
            base_spawn_interval: 45.0,
            min_spawn_interval: 20.0,
            spawn_chance: 0.8,
            oncoming_speed: 0.6,
            speed_jitter: 0.15,
            min_clearance: 15.0,
            look_ahead: 30.0,
            spawn_leader_factor: 0.9,
            close_follow_factor: 0.8,
            speed_smoothing: 0.05,
            bob_amplitude: 0.02,
            bob_frequency: 2.0,
            half_extents: Vec3::new(1.0, 0.5, 2.0),
        }
    }
}

/// Player lane change animation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneChangeTuning {
    /// Seconds a full lane change takes
    pub duration: f32,
    /// Steering yaw at full lock (radians)
    pub max_yaw: f32,
    /// Body roll into the turn (radians)
    pub max_bank: f32,
    pub yaw_smoothing: f32,
    pub bank_smoothing: f32,
    /// Yaw/bank snap to zero once within this of a neutral target
    pub snap_epsilon: f32,
    /// Height of the player body's center above the road
    pub ride_height: f32,
    pub half_extents: Vec3,
}

impl Default for LaneChangeTuning {
    fn default() -> Self {
        Self {
            duration: 0.4,
            max_yaw: 0.4,
            max_bank: 0.1,
            yaw_smoothing: 0.15,
            bank_smoothing: 0.12,
            snap_epsilon: 0.01,
            ride_height: 0.5,
            half_extents: Vec3::new(1.0, 0.5, 2.0),
        }
    }
}

/// Post-collision physics and camera shake
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashTuning {
    /// Seconds of physics before the score is revealed
    pub duration: f32,
    /// Added to vertical velocity every tick
    pub gravity: f32,
    /// Horizontal velocity factor per tick
    pub friction: f32,
    /// Angular velocity factor per tick
    pub angular_friction: f32,
    /// Fraction of vertical speed kept (reversed) on a ground bounce
    pub restitution: f32,
    /// Horizontal velocity factor on a ground bounce
    pub bounce_friction: f32,
    /// Per-axis angular velocity factor on a ground bounce
    pub bounce_spin_damping: Vec3,
    pub impact_force: f32,
    pub upward_force: f32,
    /// Full width of the random horizontal kick on the player
    pub launch_jitter: f32,
    /// Extra random lift on the player, up to this much
    pub launch_lift_jitter: f32,
    /// Struck car's horizontal reaction relative to the player's impulse
    pub reaction_scale: f32,
    /// Struck car's lift relative to `upward_force`
    pub reaction_lift: f32,
    /// Full width of random player spin per axis
    pub player_spin: Vec3,
    /// Full width of random struck-car spin per axis
    pub other_spin: Vec3,
    /// Camera shake amplitude at impact
    pub shake_peak: f32,
}

impl Default for CrashTuning {
    fn default() -> Self {
        Self {
            duration: 2.0,
            gravity: -0.02,
            friction: 0.98,
            angular_friction: 0.95,
            restitution: 0.3,
            bounce_friction: 0.8,
            bounce_spin_damping: Vec3::new(0.7, 0.9, 0.7),
            impact_force: 0.8,
            upward_force: 0.4,
            launch_jitter: 0.3,
            launch_lift_jitter: 0.2,
            reaction_scale: 0.6,
            reaction_lift: 0.3,
            player_spin: Vec3::new(0.3, 0.4, 0.3),
            other_spin: Vec3::new(0.2, 0.3, 0.2),
            shake_peak: 0.5,
        }
    }
}

/// Chase camera behind the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    pub height: f32,
    /// Distance behind the player
    pub distance: f32,
    /// Per-tick gain of the lateral follow
    pub follow_smoothing: f32,
    /// Camera roll as a fraction of the player's bank
    pub roll_factor: f32,
    pub roll_smoothing: f32,
    /// Look-at point sits this far ahead of the player
    pub look_ahead: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            height: 4.0,
            distance: 8.0,
            follow_smoothing: 0.08,
            roll_factor: 0.3,
            roll_smoothing: 0.1,
            look_ahead: 3.0,
        }
    }
}

/// Volumes handed to the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    pub engine_volume: f32,
    pub lane_change_volume: f32,
    pub collision_volume: f32,
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            engine_volume: 0.3,
            lane_change_volume: 0.5,
            collision_volume: 0.7,
            muted: false,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run seed for reproducibility
    pub seed: u64,
    pub step: TimeStep,
    pub difficulty: DifficultyTuning,
    pub traffic: TrafficTuning,
    pub lane_change: LaneChangeTuning,
    pub crash: CrashTuning,
    pub camera: CameraTuning,
    pub audio: AudioSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5eed_d21e,
            step: TimeStep::default(),
            difficulty: DifficultyTuning::default(),
            traffic: TrafficTuning::default(),
            lane_change: LaneChangeTuning::default(),
            crash: CrashTuning::default(),
            camera: CameraTuning::default(),
            audio: AudioSettings::default(),
        }
    }
}

impl Settings {
    /// Default settings with a specific run seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Replace values the simulation cannot run with
    pub fn sanitized(mut self) -> Self {
        if !self.step.is_valid() {
            log::warn!(
                "Invalid time step {} s - using {} s",
                self.step.seconds,
                TimeStep::default().seconds
            );
            self.step.seconds = TimeStep::default().seconds;
        }
        self
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
                    settings
                }
                Err(e) => {
                    log::warn!("Invalid settings in {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read {}: {} - using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
