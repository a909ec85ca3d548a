//! Night Drive headless runner
//!
//! Drives the simulation core without a window: an autopilot dodges traffic,
//! collaborator signals go to the log, and a JSON summary is printed at the end.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use clap::Parser;

    use night_drive::audio::{AudioRouter, AudioSink, SoundEffect};
    use night_drive::sim::{GameEvent, GameState, Lane, SteerDirection, TickInput, tick};
    use night_drive::{Settings, StepMode, TimeStep};

    #[derive(Parser)]
    #[command(name = "night-drive")]
    #[command(about = "Headless night drive simulation with an autopilot")]
    struct Cli {
        /// Maximum number of simulation ticks to run
        #[arg(long, default_value = "36000")]
        ticks: u64,

        /// Run seed (overrides the settings file)
        #[arg(long)]
        seed: Option<u64>,

        /// Settings JSON file
        #[arg(long)]
        settings: Option<std::path::PathBuf>,

        /// Stop after this many crashes
        #[arg(long, default_value = "1")]
        runs: u32,

        /// Seconds per tick; switches to delta-time stepping when set
        #[arg(long)]
        delta: Option<f32>,

        /// Let the car drive straight ahead
        #[arg(long)]
        no_autopilot: bool,
    }

    /// Audio sink that writes to the log
    #[derive(Default)]
    struct LogSink {
        last_rate: f32,
    }

    impl AudioSink for LogSink {
        fn play(&mut self, effect: SoundEffect, volume: f32) {
            log::debug!("[audio] {:?} at {:.2}", effect, volume);
        }

        fn start_engine(&mut self, volume: f32) {
            log::debug!("[audio] engine on at {:.2}", volume);
        }

        fn stop_engine(&mut self) {
            log::debug!("[audio] engine off");
        }

        fn set_engine_rate(&mut self, rate: f32) {
            // Only log audible changes
            if (rate - self.last_rate).abs() > 0.05 {
                log::trace!("[audio] engine rate {:.2}", rate);
                self.last_rate = rate;
            }
        }
    }

    /// How far ahead the autopilot looks for cars in its lane
    const AUTOPILOT_HORIZON: f32 = 35.0;

    /// Steer away from the nearest oncoming car in the current lane
    fn autopilot(state: &GameState) -> TickInput {
        let player = state.lane_change.player();
        if player.changing_lanes {
            return TickInput::default();
        }

        let threatened = |lane: Lane| {
            state
                .traffic
                .vehicles()
                .iter()
                .filter(|v| v.lane == lane)
                .any(|v| v.position.z < 2.0 && v.position.z > -AUTOPILOT_HORIZON)
        };

        if !threatened(player.lane) {
            return TickInput::default();
        }

        let escape = [
            (SteerDirection::Left, player.lane.left()),
            (SteerDirection::Right, player.lane.right()),
        ]
        .into_iter()
        .find_map(|(direction, lane)| match lane {
            Some(lane) if !threatened(lane) => Some(direction),
            _ => None,
        });

        match escape {
            Some(direction) => TickInput::steer(direction),
            None => TickInput::default(),
        }
    }

    /// Log the events a renderer or HUD would act on
    fn present(event: &GameEvent) {
        match event {
            GameEvent::VehicleSpawned { id, lane } => {
                log::debug!("[scene] spawn {:?} in lane {}", id, lane.index());
            }
            GameEvent::VehicleDespawned { id } => log::debug!("[scene] despawn {:?}", id),
            GameEvent::ScoreRevealed { score } => log::info!("[hud] GAME OVER - score {}", score),
            GameEvent::ScoreOverlayRemoved => log::debug!("[hud] overlay removed"),
            GameEvent::RunRestarted => log::info!("[hud] new run"),
            GameEvent::Sound(_) | GameEvent::EngineStarted | GameEvent::EngineStopped => {}
        }
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let cli = Cli::parse();

        let mut settings = match &cli.settings {
            Some(path) => Settings::load(path),
            None => Settings::default(),
        };
        if let Some(seed) = cli.seed {
            settings.seed = seed;
        }
        if let Some(seconds) = cli.delta {
            settings.step = TimeStep {
                seconds,
                mode: StepMode::DeltaTime,
            };
        }

        log::info!("Night Drive (headless) starting...");
        log::info!("Seed {}, step {:?}", settings.seed, settings.step);

        let mut router = AudioRouter::new(settings.audio);
        let mut sink = LogSink::default();
        let mut state = GameState::new(settings);
        let mut crashes = 0;
        let mut restart_pending = false;

        for _ in 0..cli.ticks {
            let mut input = if cli.no_autopilot {
                TickInput::default()
            } else {
                autopilot(&state)
            };
            input.restart = restart_pending;

            tick(&mut state, &input);

            for event in state.drain_events() {
                router.handle(&event, &mut sink);
                present(&event);
                match event {
                    GameEvent::ScoreRevealed { .. } => {
                        crashes += 1;
                        restart_pending = crashes < cli.runs;
                    }
                    GameEvent::RunRestarted => restart_pending = false,
                    _ => {}
                }
            }
            router.update_engine_speed(state.speed_multiplier(), &mut sink);

            if state.time_ticks % 600 == 0 && !state.is_game_over() {
                log::info!(
                    "t={:.0}s score {} speed {} km/h traffic {}",
                    state.clock.elapsed(),
                    state.display_score(),
                    state.speed_kmh(),
                    state.traffic.len()
                );
            }

            if crashes >= cli.runs && state.can_restart() {
                break;
            }
        }

        match serde_json::to_string_pretty(&state.summary()) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to serialize run summary: {}", e),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser hosts drive the library directly
}
