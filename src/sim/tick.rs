//! Fixed timestep simulation tick
//!
//! Advances the whole game by one step. While driving the order is clock,
//! traffic, steering, lane change, collision, score, camera. While crashed
//! only the crash sequence runs until a restart is requested.

use super::collision::CollisionEvent;
use super::lane_change::SteerDirection;
use super::state::{GamePhase, GameState};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Steer one lane left (A / left arrow)
    pub steer_left: bool,
    /// Steer one lane right (D / right arrow)
    pub steer_right: bool,
    /// Start a new run once the final score is showing
    pub restart: bool,
}

impl TickInput {
    pub fn steer(direction: SteerDirection) -> Self {
        match direction {
            SteerDirection::Left => Self {
                steer_left: true,
                ..Self::default()
            },
            SteerDirection::Right => Self {
                steer_right: true,
                ..Self::default()
            },
        }
    }

    /// Left wins when both directions arrive in the same tick
    pub fn direction(&self) -> Option<SteerDirection> {
        if self.steer_left {
            Some(SteerDirection::Left)
        } else if self.steer_right {
            Some(SteerDirection::Right)
        } else {
            None
        }
    }
}

/// Advance the game state by one step
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.time_ticks += 1;

    match state.phase {
        GamePhase::Crashed => {
            state.step_crash();
            if input.restart && state.can_restart() {
                state.restart();
            }
        }
        GamePhase::Driving => drive(state, input),
    }
}

fn drive(state: &mut GameState, input: &TickInput) {
    let step = state.settings.step;

    state.clock.advance(&step);
    state.step_traffic(&step);

    if let Some(direction) = input.direction() {
        state.steer(direction);
    }
    state.lane_change.update(&step);

    // A hit ends the run before this tick's score is added
    let bounds = state.lane_change.player().bounds;
    if let Some(struck) = state.traffic.check_collision(&bounds) {
        let event = CollisionEvent {
            struck,
            score: state.score,
        };
        state.begin_crash(event);
        return;
    }

    let multiplier = state.clock.multiplier();
    state.score += f64::from(state.settings.difficulty.score_rate * multiplier * step.ticks());
    state.camera.follow(state.lane_change.player(), &step);
}
