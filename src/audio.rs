//! Audio routing
//!
//! The simulation never plays sound itself. It queues `GameEvent`s and the
//! host hands them to an `AudioRouter`, which applies the mixer settings and
//! drives whatever `AudioSink` the platform provides.

use serde::{Deserialize, Serialize};

use crate::settings::AudioSettings;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Player starts a lane change
    LaneChange,
    /// Player hits a traffic car
    Collision,
}

/// Platform audio backend
pub trait AudioSink {
    /// Play a one-shot effect at `volume` (0.0 - 1.0)
    fn play(&mut self, effect: SoundEffect, volume: f32);
    /// Start the looping engine sound
    fn start_engine(&mut self, volume: f32);
    fn stop_engine(&mut self);
    /// Engine loop playback rate, 1.0 = recorded pitch
    fn set_engine_rate(&mut self, rate: f32);
}

/// Sink that drops everything (tests, muted hosts)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, _effect: SoundEffect, _volume: f32) {}
    fn start_engine(&mut self, _volume: f32) {}
    fn stop_engine(&mut self) {}
    fn set_engine_rate(&mut self, _rate: f32) {}
}

/// Engine loop pitch for a speed multiplier; tops out at multiplier 10
pub fn engine_playback_rate(multiplier: f32) -> f32 {
    0.8 + (multiplier / 10.0).clamp(0.0, 1.0) * 0.7
}

/// Routes simulation events to an audio sink
#[derive(Debug, Clone)]
pub struct AudioRouter {
    settings: AudioSettings,
    engine_running: bool,
}

impl AudioRouter {
    pub fn new(settings: AudioSettings) -> Self {
        Self {
            settings,
            engine_running: false,
        }
    }

    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.settings.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
    }

    pub fn engine_running(&self) -> bool {
        self.engine_running
    }

    /// Final volume for a channel after master and mute
    fn effective_volume(&self, channel: f32) -> f32 {
        if self.settings.muted {
            0.0
        } else {
            (self.settings.master_volume * channel).clamp(0.0, 1.0)
        }
    }

    pub fn effect_volume(&self, effect: SoundEffect) -> f32 {
        let channel = match effect {
            SoundEffect::LaneChange => self.settings.lane_change_volume,
            SoundEffect::Collision => self.settings.collision_volume,
        };
        self.effective_volume(channel)
    }

    /// Forward one event; events with no audio side are ignored
    pub fn handle(&mut self, event: &GameEvent, sink: &mut impl AudioSink) {
        match event {
            GameEvent::Sound(effect) => {
                let vol = self.effect_volume(*effect);
                if vol > 0.0 {
                    sink.play(*effect, vol);
                }
            }
            GameEvent::EngineStarted => {
                if !self.engine_running {
                    self.engine_running = true;
                    sink.start_engine(self.effective_volume(self.settings.engine_volume));
                }
            }
            GameEvent::EngineStopped => {
                if self.engine_running {
                    self.engine_running = false;
                    sink.stop_engine();
                }
            }
            _ => {}
        }
    }

    /// Retune the engine loop to the current speed; no-op while stopped
    pub fn update_engine_speed(&self, multiplier: f32, sink: &mut impl AudioSink) {
        if self.engine_running {
            sink.set_engine_rate(engine_playback_rate(multiplier));
        }
    }
}

impl Default for AudioRouter {
    fn default() -> Self {
        Self::new(AudioSettings::default())
    }
}
