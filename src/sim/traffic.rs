//! Oncoming traffic
//!
//! Cars spawn far ahead of the player and drive toward +z. Within a lane they
//! follow the car in front: a follower never targets more than its leader's
//! speed once inside the look-ahead distance, and drops to 80% of it when
//! inside the minimum clearance. Speeds move toward their targets by
//! exponential smoothing so nobody brakes instantly.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision;
use super::geometry::Aabb;
use super::lanes::Lane;
use super::state::GameEvent;
use crate::consts::MIN_TRAFFIC_SPEED;
use crate::lerp;
use crate::settings::{TimeStep, TrafficTuning};

/// Stable handle of a traffic car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

/// A traffic car
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficVehicle {
    pub id: VehicleId,
    pub lane: Lane,
    /// z is longitudinal; the player sits at z = 0
    pub position: Vec3,
    pub rotation: Vec3,
    /// Current speed (units per tick)
    pub speed: f32,
    /// Speed assigned at spawn; never exceeded
    pub baseline_speed: f32,
    pub bounds: Aabb,
}

impl TrafficVehicle {
    /// Recompute the bounding box from the current position
    pub fn refresh_bounds(&mut self, half_extents: Vec3) {
        self.bounds = Aabb::from_center_half_extents(self.position, half_extents);
    }
}

/// Target speed for a car with a leader `gap` units ahead
pub fn follow_target_speed(
    baseline: f32,
    gap: f32,
    leader_speed: f32,
    tuning: &TrafficTuning,
) -> f32 {
    let capped = if gap < tuning.min_clearance {
        baseline.min(leader_speed * tuning.close_follow_factor)
    } else if gap < tuning.look_ahead {
        let ratio = gap / tuning.look_ahead;
        let factor = tuning.close_follow_factor + ratio * (1.0 - tuning.close_follow_factor);
        baseline.min(leader_speed * factor)
    } else {
        baseline
    };
    capped.max(MIN_TRAFFIC_SPEED)
}

#[derive(Debug, Clone)]
pub struct LaneTrafficSimulator {
    /// Live cars in spawn order
    vehicles: Vec<TrafficVehicle>,
    /// Ticks since the last spawn attempt
    spawn_timer: f32,
    next_id: u32,
    tuning: TrafficTuning,
}

impl LaneTrafficSimulator {
    pub fn new(tuning: TrafficTuning) -> Self {
        Self {
            vehicles: Vec::new(),
            spawn_timer: 0.0,
            next_id: 1,
            tuning,
        }
    }

    pub fn tuning(&self) -> &TrafficTuning {
        &self.tuning
    }

    /// Live cars in spawn order
    pub fn vehicles(&self) -> &[TrafficVehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&TrafficVehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut TrafficVehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// One traffic tick: maybe spawn, move everyone, drop cars out of range
    pub fn tick<R: Rng>(
        &mut self,
        multiplier: f32,
        time: f64,
        step: &TimeStep,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        self.spawn_timer += step.ticks();
        if self.spawn_timer >= self.spawn_interval(multiplier) {
            self.spawn_timer = 0.0;
            if rng.random_bool(f64::from(self.tuning.spawn_chance.clamp(0.0, 1.0))) {
                let lane = Lane::ALL[rng.random_range(0..Lane::ALL.len())];
                self.try_spawn_in_lane(lane, multiplier, rng, events);
            }
        }

        self.advance(time, step);
        self.retire(events);
    }

    /// Ticks between spawn attempts; shorter at higher speed, never below the floor
    pub fn spawn_interval(&self, multiplier: f32) -> f32 {
        (self.tuning.base_spawn_interval / multiplier.max(f32::EPSILON))
            .max(self.tuning.min_spawn_interval)
    }

    /// Spawn a car at the spawn line of `lane` unless a car is too close to it
    pub fn try_spawn_in_lane<R: Rng>(
        &mut self,
        lane: Lane,
        multiplier: f32,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> Option<VehicleId> {
        let spawn_z = self.tuning.spawn_z;
        if !self.is_lane_clear(lane, spawn_z) {
            log::debug!("Spawn rejected: lane {} is occupied near the spawn line", lane.index());
            return None;
        }

        let jitter = rng.random::<f32>() * 2.0 * self.tuning.speed_jitter - self.tuning.speed_jitter;
        let speed = (self.tuning.oncoming_speed + jitter) * multiplier;
        let speed = self.max_allowed_speed(lane, spawn_z, speed);

        let id = self.insert_vehicle(lane, spawn_z, speed);
        events.push(GameEvent::VehicleSpawned { id, lane });
        Some(id)
    }

    /// Place a car directly; its current speed starts at `baseline`
    ///
    /// Does not notify collaborators, callers that need a visual do that.
    pub fn insert_vehicle(&mut self, lane: Lane, z: f32, baseline: f32) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;

        let baseline = baseline.max(MIN_TRAFFIC_SPEED);
        let mut vehicle = TrafficVehicle {
            id,
            lane,
            position: Vec3::new(lane.offset(), 0.0, z),
            // Cars face the player
            rotation: Vec3::new(0.0, std::f32::consts::PI, 0.0),
            speed: baseline,
            baseline_speed: baseline,
            bounds: Aabb::default(),
        };
        vehicle.refresh_bounds(self.tuning.half_extents);
        self.vehicles.push(vehicle);
        id
    }

    /// True if no car in `lane` is within the minimum clearance of `z`
    pub fn is_lane_clear(&self, lane: Lane, z: f32) -> bool {
        self.vehicles
            .iter()
            .filter(|v| v.lane == lane)
            .all(|v| (v.position.z - z).abs() >= self.tuning.min_clearance)
    }

    /// Cap `speed` for a car at `z` by the nearest leader inside the look-ahead
    pub fn max_allowed_speed(&self, lane: Lane, z: f32, speed: f32) -> f32 {
        let leader = self
            .vehicles
            .iter()
            .filter(|v| v.lane == lane)
            .map(|v| (v.position.z - z, v.speed))
            .filter(|&(gap, _)| gap > 0.0 && gap < self.tuning.look_ahead)
            .min_by(|a, b| a.0.total_cmp(&b.0));

        let capped = match leader {
            Some((_, leader_speed)) => speed.min(leader_speed * self.tuning.spawn_leader_factor),
            None => speed,
        };
        capped.max(MIN_TRAFFIC_SPEED)
    }

    /// Car-following update and movement for every car
    ///
    /// Within each lane cars are visited front (closest to the player) to
    /// back, so every follower sees its leader's already-updated speed and
    /// position.
    pub fn advance(&mut self, time: f64, step: &TimeStep) {
        let mut order: Vec<usize> = (0..self.vehicles.len()).collect();
        order.sort_by(|&a, &b| {
            let (va, vb) = (&self.vehicles[a], &self.vehicles[b]);
            va.lane
                .cmp(&vb.lane)
                .then(vb.position.z.total_cmp(&va.position.z))
        });

        let gain = step.blend(self.tuning.speed_smoothing);
        let distance_scale = step.ticks();
        let time = time as f32;
        let mut leader: Option<usize> = None;

        for idx in order {
            let lead = leader
                .map(|l| &self.vehicles[l])
                .filter(|l| l.lane == self.vehicles[idx].lane)
                .map(|l| (l.position.z, l.speed));

            let vehicle = &mut self.vehicles[idx];
            let target = match lead {
                Some((leader_z, leader_speed)) => follow_target_speed(
                    vehicle.baseline_speed,
                    leader_z - vehicle.position.z,
                    leader_speed,
                    &self.tuning,
                ),
                None => vehicle.baseline_speed,
            };

            vehicle.speed = lerp(vehicle.speed, target, gain)
                .clamp(MIN_TRAFFIC_SPEED, vehicle.baseline_speed.max(MIN_TRAFFIC_SPEED));
            vehicle.position.z += vehicle.speed * distance_scale;
            vehicle.position.y = (time * self.tuning.bob_frequency + vehicle.position.x).sin()
                * self.tuning.bob_amplitude;
            vehicle.refresh_bounds(self.tuning.half_extents);

            leader = Some(idx);
        }
    }

    /// Remove cars behind the player or stalled beyond the spawn line
    pub fn retire(&mut self, events: &mut Vec<GameEvent>) {
        let despawn_z = self.tuning.despawn_z;
        let far_z = self.tuning.spawn_z - self.tuning.overshoot;
        self.vehicles.retain(|v| {
            let out = v.position.z > despawn_z || v.position.z < far_z;
            if out {
                events.push(GameEvent::VehicleDespawned { id: v.id });
            }
            !out
        });
    }

    /// First car whose box overlaps the player's, in spawn order
    pub fn check_collision(&self, player: &Aabb) -> Option<VehicleId> {
        collision::detect(player, &self.vehicles)
    }

    /// Remove every car (run restart)
    pub fn clear(&mut self, events: &mut Vec<GameEvent>) {
        events.extend(
            self.vehicles
                .drain(..)
                .map(|v| GameEvent::VehicleDespawned { id: v.id }),
        );
        self.spawn_timer = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn sim() -> LaneTrafficSimulator {
        LaneTrafficSimulator::new(TrafficTuning::default())
    }

    fn lane(i: usize) -> Lane {
        Lane::ALL[i]
    }

    #[test]
    fn test_free_car_keeps_baseline() {
        let mut traffic = sim();
        let step = TimeStep::default();
        let id = traffic.insert_vehicle(lane(2), -100.0, 0.6);
        for i in 0..100 {
            traffic.advance(i as f64 / 60.0, &step);
        }
        let car = traffic.vehicle(id).expect("still live");
        assert!((car.speed - 0.6).abs() < 1e-4);
        assert!((car.position.z - (-40.0)).abs() < 0.01);
    }

    #[test]
    fn test_follower_slows_behind_close_leader() {
        let mut traffic = sim();
        let step = TimeStep::default();
        let leader = traffic.insert_vehicle(lane(1), -50.0, 0.5);
        let follower = traffic.insert_vehicle(lane(1), -51.0, 0.6);
        // Start the follower at its leader's pace
        traffic.vehicle_mut(follower).expect("live").speed = 0.5;

        let mut converged = false;
        for i in 0..120 {
            traffic.advance(i as f64 / 60.0, &step);
            let lead = traffic.vehicle(leader).expect("live");
            let follow = traffic.vehicle(follower).expect("live");
            assert!(lead.position.z - follow.position.z < traffic.tuning().min_clearance);
            if follow.speed <= 0.8 * lead.speed + 1e-3 {
                converged = true;
                break;
            }
        }
        assert!(converged, "follower never dropped to 80% of its leader");
    }

    #[test]
    fn test_lanes_do_not_interact() {
        let mut traffic = sim();
        let step = TimeStep::default();
        traffic.insert_vehicle(lane(0), -50.0, 0.2);
        let other = traffic.insert_vehicle(lane(1), -55.0, 0.7);
        for i in 0..30 {
            traffic.advance(i as f64 / 60.0, &step);
        }
        assert!((traffic.vehicle(other).expect("live").speed - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_follow_target_blend() {
        let t = TrafficTuning::default();
        assert!((follow_target_speed(1.0, 10.0, 0.5, &t) - 0.4).abs() < 1e-6);
        assert!((follow_target_speed(1.0, 22.5, 0.5, &t) - 0.475).abs() < 1e-6);
        assert_eq!(follow_target_speed(1.0, 40.0, 0.5, &t), 1.0);
        // Slow baseline is never raised to the leader's pace
        assert_eq!(follow_target_speed(0.3, 20.0, 0.5, &t), 0.3);
        // Floor
        assert_eq!(follow_target_speed(1.0, 1.0, 0.05, &t), MIN_TRAFFIC_SPEED);
    }

    #[test]
    fn test_spawn_rejected_in_crowded_lane() {
        let mut traffic = sim();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = Vec::new();
        traffic.insert_vehicle(lane(3), -95.0, 0.6);
        for _ in 0..200 {
            assert!(traffic.try_spawn_in_lane(lane(3), 1.0, &mut rng, &mut events).is_none());
        }
        assert_eq!(traffic.len(), 1);
        assert!(events.is_empty());
    }

    #[test]
    fn test_spawn_capped_by_leader() {
        let mut traffic = sim();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut events = Vec::new();
        traffic.insert_vehicle(lane(0), -80.0, 0.2);
        let id = traffic
            .try_spawn_in_lane(lane(0), 1.0, &mut rng, &mut events)
            .expect("20 units is enough clearance");
        let car = traffic.vehicle(id).expect("live");
        assert!((car.baseline_speed - 0.18).abs() < 1e-6);
        assert_eq!(car.speed, car.baseline_speed);
        assert_eq!(events, vec![GameEvent::VehicleSpawned { id, lane: lane(0) }]);
    }

    #[test]
    fn test_spawn_speed_in_jitter_range() {
        let mut traffic = sim();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut events = Vec::new();
        for i in 0..Lane::ALL.len() {
            let id = traffic
                .try_spawn_in_lane(lane(i), 2.0, &mut rng, &mut events)
                .expect("empty lane");
            let speed = traffic.vehicle(id).expect("live").baseline_speed;
            assert!((0.9..=1.5).contains(&speed), "speed {speed} out of range");
        }
    }

    #[test]
    fn test_spawn_interval_floor() {
        let traffic = sim();
        assert_eq!(traffic.spawn_interval(1.0), 45.0);
        assert_eq!(traffic.spawn_interval(1.5), 30.0);
        assert_eq!(traffic.spawn_interval(10.0), 20.0);
    }

    #[test]
    fn test_retire_both_ends() {
        let mut traffic = sim();
        let mut events = Vec::new();
        let behind = traffic.insert_vehicle(lane(0), 50.5, 0.6);
        let stalled = traffic.insert_vehicle(lane(1), -121.0, 0.6);
        let live = traffic.insert_vehicle(lane(2), 0.0, 0.6);
        traffic.retire(&mut events);
        assert_eq!(traffic.len(), 1);
        assert!(traffic.vehicle(live).is_some());
        assert_eq!(
            events,
            vec![
                GameEvent::VehicleDespawned { id: behind },
                GameEvent::VehicleDespawned { id: stalled },
            ]
        );
    }

    #[test]
    fn test_tick_spawns_over_time() {
        let mut traffic = sim();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut events = Vec::new();
        let step = TimeStep::default();
        for i in 0..600 {
            traffic.tick(1.0, i as f64 / 60.0, &step, &mut rng, &mut events);
        }
        let spawned = events
            .iter()
            .filter(|e| matches!(e, GameEvent::VehicleSpawned { .. }))
            .count();
        // 600 ticks / 45 = 13 attempts at 80%
        assert!((5..=13).contains(&spawned), "spawned {spawned}");
    }

    #[test]
    fn test_clear_notifies() {
        let mut traffic = sim();
        let mut events = Vec::new();
        traffic.insert_vehicle(lane(0), -10.0, 0.6);
        traffic.insert_vehicle(lane(1), -20.0, 0.6);
        traffic.clear(&mut events);
        assert!(traffic.is_empty());
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_bob_stays_small() {
        let mut traffic = sim();
        let step = TimeStep::default();
        let id = traffic.insert_vehicle(lane(0), -60.0, 0.6);
        for i in 0..50 {
            traffic.advance(i as f64 / 60.0, &step);
            let car = traffic.vehicle(id).expect("live");
            assert!(car.position.y.abs() <= 0.02 + 1e-6);
            assert!((car.bounds.center() - car.position).length() < 1e-5);
        }
    }

    proptest! {
        #[test]
        fn prop_speed_within_bounds(
            seed in any::<u64>(),
            multiplier in 1.0f32..6.0,
            ticks in 50usize..400,
        ) {
            let mut traffic = sim();
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut events = Vec::new();
            let step = TimeStep::default();
            for i in 0..ticks {
                traffic.tick(multiplier, i as f64 / 60.0, &step, &mut rng, &mut events);
                for car in traffic.vehicles() {
                    prop_assert!(car.speed >= MIN_TRAFFIC_SPEED);
                    prop_assert!(car.speed <= car.baseline_speed);
                }
            }
        }

        #[test]
        fn prop_crowded_spawn_always_rejected(
            seed in any::<u64>(),
            lane_index in 0usize..4,
            offset in -14.9f32..14.9,
        ) {
            let mut traffic = sim();
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut events = Vec::new();
            let lane = Lane::ALL[lane_index];
            traffic.insert_vehicle(lane, traffic.tuning().spawn_z + offset, 0.6);
            prop_assert!(traffic.try_spawn_in_lane(lane, 1.0, &mut rng, &mut events).is_none());
            prop_assert_eq!(traffic.len(), 1);
        }
    }
}
