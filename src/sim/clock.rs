//! Run clock and progressive difficulty
//!
//! The speed multiplier drives traffic speed, spawn rate and score accrual.
//! Its target rises linearly with elapsed time; the live value chases the
//! target with exponential smoothing so it never jumps.

use serde::{Deserialize, Serialize};

use crate::lerp;
use crate::settings::{DifficultyTuning, TimeStep};

/// Difficulty progress for the current run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    /// Simulated seconds since the run started
    pub elapsed: f64,
    pub multiplier: f32,
    pub target_multiplier: f32,
}

#[derive(Debug, Clone)]
pub struct SimulationClock {
    state: DifficultyState,
    tuning: DifficultyTuning,
}

impl SimulationClock {
    pub fn new(tuning: DifficultyTuning) -> Self {
        Self {
            state: DifficultyState {
                elapsed: 0.0,
                multiplier: tuning.initial_multiplier,
                target_multiplier: tuning.base_multiplier,
            },
            tuning,
        }
    }

    /// Advance by one tick
    pub fn advance(&mut self, step: &TimeStep) {
        self.state.elapsed += f64::from(step.seconds);
        self.state.target_multiplier = self.target_at(self.state.elapsed);
        self.state.multiplier = lerp(
            self.state.multiplier,
            self.state.target_multiplier,
            step.blend(self.tuning.smoothing),
        );
    }

    /// Target multiplier after `elapsed` seconds
    pub fn target_at(&self, elapsed: f64) -> f32 {
        let t = &self.tuning;
        (t.base_multiplier + elapsed as f32 * t.increase_rate).min(t.max_multiplier)
    }

    #[inline]
    pub fn multiplier(&self) -> f32 {
        self.state.multiplier
    }

    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.state.elapsed
    }

    pub fn state(&self) -> DifficultyState {
        self.state
    }

    /// Speedometer reading
    pub fn speed_kmh(&self) -> u32 {
        (self.state.multiplier * self.tuning.kmh_per_multiplier).floor() as u32
    }

    /// Start a new run from the restart multiplier
    pub fn reset(&mut self) {
        *self = Self::new(self.tuning);
        self.state.multiplier = self.tuning.restart_multiplier;
    }
}
