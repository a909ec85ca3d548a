//! End-to-end driving scenarios against the public API

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use night_drive::settings::{CrashTuning, LaneChangeTuning, TrafficTuning};
use night_drive::sim::{
    CollisionEvent, CollisionResponder, GameEvent, GamePhase, GameState, Lane,
    LaneChangeController, LaneTrafficSimulator, Pose, SteerDirection, TickInput, VehicleId, tick,
};
use night_drive::{Settings, TimeStep};

fn quiet(seed: u64) -> Settings {
    let mut settings = Settings::with_seed(seed);
    settings.traffic.spawn_chance = 0.0;
    settings
}

#[test]
fn free_car_holds_speed_for_100_ticks() {
    let mut traffic = LaneTrafficSimulator::new(TrafficTuning {
        spawn_chance: 0.0,
        ..TrafficTuning::default()
    });
    let mut rng = Pcg32::seed_from_u64(0);
    let mut events = Vec::new();
    let step = TimeStep::default();
    let id = traffic.insert_vehicle(Lane::ALL[2], -100.0, 0.6);

    for i in 0..100 {
        traffic.tick(1.0, f64::from(i) / 60.0, &step, &mut rng, &mut events);
    }

    let car = traffic.vehicle(id).expect("car is still on the road");
    assert!((car.speed - 0.6).abs() < 1e-4);
    assert!((car.position.z - (-100.0 + 60.0)).abs() < 0.01);
    assert!(events.is_empty());
}

#[test]
fn crash_reveals_floored_score_after_two_seconds() {
    let mut responder = CollisionResponder::new(CrashTuning::default());
    let mut rng = Pcg32::seed_from_u64(11);
    let mut events = Vec::new();
    let step = TimeStep::default();
    let event = CollisionEvent {
        struck: VehicleId(1),
        score: 123.7,
    };
    let player = Pose::new(Vec3::new(1.5, 0.5, 0.0), Vec3::ZERO);
    let other = Pose::new(Vec3::new(1.5, 0.0, -3.5), Vec3::ZERO);
    assert!(responder.trigger(&event, player, other, Vec3::new(1.5, 4.0, 8.0), &mut rng, &mut events));

    for _ in 0..120 {
        responder.tick(&step, &mut rng, &mut events);
    }

    assert!(responder.is_complete());
    assert_eq!(responder.revealed_score(), Some(123));
    let reveals: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, GameEvent::ScoreRevealed { .. }))
        .collect();
    assert_eq!(reveals, vec![&GameEvent::ScoreRevealed { score: 123 }]);
}

#[test]
fn steer_mid_change_is_ignored() {
    let mut lc = LaneChangeController::new(LaneChangeTuning::default());
    let mut events = Vec::new();
    let step = TimeStep::default();

    assert!(lc.command(SteerDirection::Left, &mut events));
    for _ in 0..6 {
        lc.update(&step);
    }
    assert!(!lc.command(SteerDirection::Left, &mut events));
    assert_eq!(lc.player().lane, Lane::ALL[1]);

    while lc.is_changing_lanes() {
        lc.update(&step);
    }
    assert_eq!(lc.player().position.x, -1.5);

    // Accepted again once the first change has landed
    assert!(lc.command(SteerDirection::Left, &mut events));
    assert_eq!(lc.player().lane, Lane::ALL[0]);
    assert_eq!(events.len(), 2);
}

/// Scripted steering so runs exercise lane changes
fn scripted_input(t: u64) -> TickInput {
    match t % 90 {
        0 => TickInput::steer(SteerDirection::Left),
        45 => TickInput::steer(SteerDirection::Right),
        _ => TickInput {
            restart: true,
            ..TickInput::default()
        },
    }
}

fn run(seed: u64, ticks: u64) -> (GameState, Vec<GameEvent>) {
    let mut state = GameState::with_seed(seed);
    let mut log = Vec::new();
    for t in 0..ticks {
        tick(&mut state, &scripted_input(t));
        log.extend(state.drain_events());
    }
    (state, log)
}

#[test]
fn same_seed_same_run() {
    let (a, log_a) = run(2024, 3000);
    let (b, log_b) = run(2024, 3000);

    assert_eq!(log_a, log_b);
    assert_eq!(a.score, b.score);
    assert_eq!(a.runs, b.runs);
    assert_eq!(a.player_pose(), b.player_pose());
    assert_eq!(a.traffic.len(), b.traffic.len());
    for (va, vb) in a.traffic.vehicles().iter().zip(b.traffic.vehicles()) {
        assert_eq!(va.id, vb.id);
        assert_eq!(va.position, vb.position);
        assert_eq!(va.speed, vb.speed);
    }
}

#[test]
fn different_seeds_diverge() {
    let (_, log_a) = run(1, 1500);
    let (_, log_b) = run(2, 1500);
    assert_ne!(log_a, log_b);
}

#[test]
fn crash_freezes_world_until_restart() {
    let mut state = GameState::new(quiet(9));
    state.drain_events();
    let bystander = state.traffic.insert_vehicle(Lane::ALL[0], -40.0, 0.6);
    let struck = state.traffic.insert_vehicle(Lane::start(), -3.0, 0.6);

    tick(&mut state, &TickInput::default());
    assert_eq!(state.phase, GamePhase::Crashed);
    assert_eq!(state.responder.struck(), Some(struck));
    let impact = state.drain_events();
    assert_eq!(
        impact,
        vec![
            GameEvent::Sound(night_drive::audio::SoundEffect::Collision),
            GameEvent::EngineStopped,
        ]
    );

    let bystander_z = state.traffic.vehicle(bystander).expect("live").position.z;
    let score = state.score;
    let multiplier = state.speed_multiplier();

    // Steering and restart requests during physics change nothing
    let noisy = TickInput {
        steer_left: true,
        steer_right: false,
        restart: true,
    };
    for _ in 0..119 {
        tick(&mut state, &noisy);
        assert!(state.is_game_over());
        assert!(!state.lane_change.is_changing_lanes());
    }
    assert_eq!(state.traffic.vehicle(bystander).expect("live").position.z, bystander_z);
    assert_eq!(state.score, score);
    assert_eq!(state.speed_multiplier(), multiplier);

    // The reveal tick restarts because restart is held
    tick(&mut state, &noisy);
    let events = state.drain_events();
    let revealed = events
        .iter()
        .position(|e| matches!(e, GameEvent::ScoreRevealed { .. }))
        .expect("score revealed");
    let restarted = events
        .iter()
        .position(|e| *e == GameEvent::RunRestarted)
        .expect("run restarted");
    assert!(revealed < restarted);
    assert!(events.contains(&GameEvent::ScoreOverlayRemoved));
    assert!(events.contains(&GameEvent::VehicleDespawned { id: bystander }));
    assert_eq!(events.last(), Some(&GameEvent::EngineStarted));

    assert_eq!(state.phase, GamePhase::Driving);
    assert_eq!(state.score, 0.0);
    assert!(state.traffic.is_empty());
    assert_eq!(state.player_pose().position.x, Lane::start().offset());
}

#[test]
fn restart_not_requested_keeps_overlay() {
    let mut state = GameState::new(quiet(4));
    state.traffic.insert_vehicle(Lane::start(), -3.0, 0.6);
    for _ in 0..400 {
        tick(&mut state, &TickInput::default());
    }
    assert!(state.can_restart());
    assert_eq!(state.runs, 1);
    assert_eq!(state.responder.revealed_score(), Some(0));
}

#[test]
fn delta_time_scales_motion() {
    let mut settings = quiet(6);
    settings.step = TimeStep::delta(1.0 / 30.0);
    let mut state = GameState::new(settings);
    let car = state.traffic.insert_vehicle(Lane::ALL[0], -100.0, 0.6);

    tick(&mut state, &TickInput::steer(SteerDirection::Left));
    let mut ticks = 1;
    while state.lane_change.is_changing_lanes() {
        tick(&mut state, &TickInput::default());
        ticks += 1;
    }
    // 0.4 s at 30 Hz
    assert_eq!(ticks, 12);
    assert_eq!(state.player_pose().position.x, Lane::ALL[1].offset());

    // Two reference ticks of travel per step
    let z = state.traffic.vehicle(car).expect("live").position.z;
    assert!((z - (-100.0 + 0.6 * 2.0 * 12.0)).abs() < 0.01);
    assert!((state.clock.elapsed() - 0.4).abs() < 1e-5);
}

#[test]
fn spawned_traffic_eventually_hits_a_passive_driver() {
    let mut settings = Settings::with_seed(77);
    settings.traffic.spawn_chance = 1.0;
    let mut state = GameState::new(settings);
    let mut spawned = 0;
    for _ in 0..5000 {
        tick(&mut state, &TickInput::default());
        spawned += state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::VehicleSpawned { .. }))
            .count();
        if state.is_game_over() {
            break;
        }
    }
    assert!(spawned > 0);
    assert!(state.is_game_over());
    assert!(state.responder.struck().is_some());
}

#[test]
fn zero_step_from_json_still_ends_the_crash() {
    let mut settings =
        Settings::from_json(r#"{ "seed": 3, "step": { "seconds": 0.0 } }"#).expect("valid json");
    settings.traffic.spawn_chance = 0.0;
    let mut state = GameState::new(settings);
    state.traffic.insert_vehicle(Lane::start(), -3.0, 0.6);

    let restart = TickInput {
        restart: true,
        ..TickInput::default()
    };
    tick(&mut state, &restart);
    assert!(state.is_game_over());
    for _ in 0..120 {
        tick(&mut state, &restart);
    }
    assert_eq!(state.phase, GamePhase::Driving);
    assert_eq!(state.runs, 2);
}

#[test]
fn restarted_run_starts_from_restart_multiplier() {
    let mut state = GameState::new(quiet(12));
    state.traffic.insert_vehicle(Lane::start(), -3.0, 0.6);
    tick(&mut state, &TickInput::default());
    for _ in 0..120 {
        tick(
            &mut state,
            &TickInput {
                restart: true,
                ..TickInput::default()
            },
        );
    }
    assert_eq!(state.runs, 2);
    assert_eq!(state.speed_multiplier(), 1.0);
    assert_eq!(state.speed_kmh(), 30);
}
