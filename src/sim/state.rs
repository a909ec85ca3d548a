//! Game state and outgoing events
//!
//! `GameState` is the one owned aggregate the host drives: clock, traffic,
//! player, crash responder, camera, score and the run's RNG. Everything the
//! outside world needs to hear about is queued as a `GameEvent`.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::camera::CameraRig;
use super::clock::{DifficultyState, SimulationClock};
use super::collision::CollisionEvent;
use super::geometry::Pose;
use super::lane_change::{LaneChangeController, SteerDirection};
use super::lanes::Lane;
use super::responder::{CollisionResponder, CrashPhase};
use super::traffic::{LaneTrafficSimulator, VehicleId};
use crate::settings::{Settings, TimeStep};

pub use crate::audio::SoundEffect;

/// Signals for the rendering, audio and presentation collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A traffic car needs a visual
    VehicleSpawned { id: VehicleId, lane: Lane },
    /// A traffic car's visual should go
    VehicleDespawned { id: VehicleId },
    /// One-shot sound effect
    Sound(SoundEffect),
    EngineStarted,
    EngineStopped,
    /// Show the game-over overlay with the final (floored) score
    ScoreRevealed { score: u64 },
    ScoreOverlayRemoved,
    RunRestarted,
}

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Normal driving: traffic, steering and collision checks run
    Driving,
    /// A collision happened; only the crash sequence runs
    Crashed,
}

/// End-of-run digest for logs and tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub runs: u32,
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub crash_phase: CrashPhase,
    pub score: u64,
    pub speed_kmh: u32,
    pub difficulty: DifficultyState,
    pub live_vehicles: usize,
    pub player_lane: Lane,
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    rng: Pcg32,
    pub clock: SimulationClock,
    pub traffic: LaneTrafficSimulator,
    pub lane_change: LaneChangeController,
    pub responder: CollisionResponder,
    pub camera: CameraRig,
    /// Distance-based score, fractional
    pub score: f64,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Runs started so far, including the current one
    pub runs: u32,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game; the engine starts right away
    pub fn new(settings: Settings) -> Self {
        let settings = settings.sanitized();
        let mut state = Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            clock: SimulationClock::new(settings.difficulty),
            traffic: LaneTrafficSimulator::new(settings.traffic),
            lane_change: LaneChangeController::new(settings.lane_change),
            responder: CollisionResponder::new(settings.crash),
            camera: CameraRig::new(settings.camera),
            score: 0.0,
            phase: GamePhase::Driving,
            time_ticks: 0,
            runs: 1,
            events: Vec::new(),
            settings,
        };
        state.events.push(GameEvent::EngineStarted);
        log::info!("Run 1 starting (seed {})", state.settings.seed);
        state
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(Settings::with_seed(seed))
    }

    /// Events queued since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run the traffic half of a driving tick
    pub(crate) fn step_traffic(&mut self, step: &TimeStep) {
        let multiplier = self.clock.multiplier();
        let elapsed = self.clock.elapsed();
        self.traffic
            .tick(multiplier, elapsed, step, &mut self.rng, &mut self.events);
    }

    /// Forward a steer command to the lane change controller
    pub fn steer(&mut self, direction: SteerDirection) -> bool {
        if self.phase != GamePhase::Driving {
            return false;
        }
        self.lane_change.command(direction, &mut self.events)
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.clock.multiplier()
    }

    pub fn speed_kmh(&self) -> u32 {
        self.clock.speed_kmh()
    }

    /// Score as shown on the HUD
    pub fn display_score(&self) -> u64 {
        self.score.max(0.0).floor() as u64
    }

    /// True from the moment of impact until restart
    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::Crashed
    }

    /// Restart is allowed once the crash sequence has revealed the score
    pub fn can_restart(&self) -> bool {
        self.is_game_over() && self.responder.is_complete()
    }

    /// Where the player's car should be drawn
    pub fn player_pose(&self) -> Pose {
        self.lane_change.player().pose()
    }

    /// Where the camera should be rendered from
    pub fn camera_position(&self) -> Vec3 {
        self.responder
            .camera_position()
            .unwrap_or(self.camera.position)
    }

    /// Hand the run over to the crash responder
    ///
    /// Returns false if the struck car is unknown or a crash is already live.
    pub fn begin_crash(&mut self, event: CollisionEvent) -> bool {
        let Some(other) = self.traffic.vehicle(event.struck) else {
            log::warn!("Collision with unknown vehicle {:?} ignored", event.struck);
            return false;
        };
        let other = Pose::new(other.position, other.rotation);
        let player = self.player_pose();
        let camera = self.camera.position;

        if !self.responder.trigger(&event, player, other, camera, &mut self.rng, &mut self.events) {
            return false;
        }
        self.phase = GamePhase::Crashed;
        self.events.push(GameEvent::EngineStopped);
        true
    }

    /// Advance the crash sequence and copy the tumbling bodies back onto
    /// the player and the struck car
    pub(crate) fn step_crash(&mut self) {
        let step = self.settings.step;
        self.responder.tick(&step, &mut self.rng, &mut self.events);

        let body = *self.responder.player_body();
        self.lane_change.follow_pose(body.pose());

        if let Some(id) = self.responder.struck() {
            let body = *self.responder.other_body();
            let half_extents = self.traffic.tuning().half_extents;
            if let Some(vehicle) = self.traffic.vehicle_mut(id) {
                vehicle.position = body.position;
                vehicle.rotation = body.rotation;
                vehicle.refresh_bounds(half_extents);
            }
        }
    }

    /// Start a fresh run; the RNG carries on so runs differ
    pub fn restart(&mut self) {
        self.responder.reset(&mut self.events);
        self.traffic.clear(&mut self.events);
        self.lane_change.reset();
        self.clock.reset();
        self.camera.reset();
        self.score = 0.0;
        self.phase = GamePhase::Driving;
        self.runs += 1;
        self.events.push(GameEvent::RunRestarted);
        self.events.push(GameEvent::EngineStarted);
        log::info!("Run {} starting", self.runs);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seed: self.settings.seed,
            runs: self.runs,
            time_ticks: self.time_ticks,
            phase: self.phase,
            crash_phase: self.responder.phase(),
            score: self.display_score(),
            speed_kmh: self.speed_kmh(),
            difficulty: self.clock.state(),
            live_vehicles: self.traffic.len(),
            player_lane: self.lane_change.player().lane,
        }
    }
}
