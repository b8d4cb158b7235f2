//! Sensing systems: vision refresh, footstep hearing, gunshot fan-out.

use bevy::prelude::*;

use crate::components::{Actor, Health, NavVelocity, Stance};
use crate::sensing::{LoudNoise, Perception, SensorConfig, SensoryMemory};
use crate::spatial::SpatialIndex;
use crate::SimTime;

/// Occlusion slack: a static hit this close to the target still counts as a
/// clear line (the ray ends on the target's surface, not its center).
const OCCLUSION_EPSILON: f32 = 0.1;

/// System: vision refresh.
///
/// A target is visible iff all three gates pass:
/// 1. distance <= sight_range
/// 2. angle(facing, to-target) <= fov/2
/// 3. the eye-height to torso-height ray hits no static geometry short of
///    the target
///
/// The nearest passing enemy becomes the current perception target and the
/// visual memory trace is stamped with its position.
pub fn update_vision(
    mut agents: Query<(
        Entity,
        &Actor,
        &Transform,
        &Health,
        &SensorConfig,
        &mut SensoryMemory,
        &mut Perception,
    )>,
    targets: Query<(Entity, &Actor, &Transform, &Health)>,
    spatial: Res<SpatialIndex>,
    time: Res<SimTime>,
) {
    for (agent, actor, transform, health, config, mut memory, mut perception) in agents.iter_mut() {
        if !health.is_alive() {
            perception.target = None;
            continue;
        }

        let forward = *transform.forward();
        let half_fov = (config.fov_degrees * 0.5).to_radians();
        let eye = transform.translation + Vec3::Y * config.eye_height;

        let mut best: Option<(Entity, f32, Vec3)> = None;

        for (candidate, candidate_actor, candidate_transform, candidate_health) in targets.iter() {
            if candidate == agent
                || candidate_actor.faction_id == actor.faction_id
                || !candidate_health.is_alive()
            {
                continue;
            }

            let to_target = candidate_transform.translation - transform.translation;
            let distance = to_target.length();
            if distance > config.sight_range {
                continue;
            }
            if to_target.length_squared() > 1e-6 && forward.angle_between(to_target) > half_fov {
                continue;
            }

            // Line of sight: eye height to torso height
            let torso = candidate_transform.translation + Vec3::Y * config.torso_height;
            let ray = torso - eye;
            let ray_length = ray.length();
            if ray_length > 1e-6 {
                let direction = ray / ray_length;
                if let Some(hit) = spatial.raycast(eye, direction, ray_length) {
                    if hit.distance < ray_length - OCCLUSION_EPSILON {
                        continue; // blocked
                    }
                }
            }

            if best.map_or(true, |(_, best_distance, _)| distance < best_distance) {
                best = Some((candidate, distance, candidate_transform.translation));
            }
        }

        match best {
            Some((target, distance, position)) => {
                if perception.target != Some(target) {
                    crate::logger::log(&format!(
                        "👁️ {:?} spotted {:?} at {:.1}m",
                        agent, target, distance
                    ));
                }
                perception.target = Some(target);
                perception.distance = distance;
                memory.record_visual(position, time.now);
            }
            None => {
                perception.target = None;
                perception.distance = 0.0;
            }
        }
    }
}

/// System: footstep hearing.
///
/// Audible iff the target is within footstep range, moving faster than the
/// threshold, and not crouched. Direction-agnostic; hearing has no cone.
pub fn update_hearing(
    mut agents: Query<(
        Entity,
        &Actor,
        &Transform,
        &Health,
        &SensorConfig,
        &mut SensoryMemory,
    )>,
    targets: Query<(
        Entity,
        &Actor,
        &Transform,
        &Health,
        Option<&NavVelocity>,
        Option<&Stance>,
    )>,
    time: Res<SimTime>,
) {
    for (agent, actor, transform, health, config, mut memory) in agents.iter_mut() {
        if !health.is_alive() {
            continue;
        }

        let mut best: Option<(f32, Vec3)> = None;

        for (candidate, candidate_actor, candidate_transform, candidate_health, velocity, stance) in
            targets.iter()
        {
            if candidate == agent
                || candidate_actor.faction_id == actor.faction_id
                || !candidate_health.is_alive()
            {
                continue;
            }

            let distance = transform
                .translation
                .distance(candidate_transform.translation);
            if distance > config.footstep_hearing_range {
                continue;
            }

            let speed = velocity.map(|v| v.horizontal_speed()).unwrap_or(0.0);
            if speed <= config.movement_speed_threshold {
                continue;
            }

            // Crouched targets are silent
            if stance.map_or(false, |s| s.is_crouching(config.crouch_height_threshold)) {
                continue;
            }

            if best.map_or(true, |(best_distance, _)| distance < best_distance) {
                best = Some((distance, candidate_transform.translation));
            }
        }

        if let Some((_, position)) = best {
            memory.record_footstep(position, time.now);
        }
    }
}

/// System: gunshot fan-out.
///
/// Consumes `LoudNoise` events and stamps the gunshot trace of every agent in
/// hearing range. An agent that has never actually seen its target also gets
/// the visual slot seeded; a shot from the dark is treated with the urgency
/// of a sighting. Own and same-faction gunfire carries no target information
/// and is skipped.
pub fn hear_loud_noises(
    mut noise_events: EventReader<LoudNoise>,
    mut agents: Query<(
        Entity,
        &Actor,
        &Transform,
        &Health,
        &SensorConfig,
        &mut SensoryMemory,
    )>,
    sources: Query<&Actor>,
    time: Res<SimTime>,
) {
    for noise in noise_events.read() {
        for (agent, actor, transform, health, config, mut memory) in agents.iter_mut() {
            if !health.is_alive() {
                continue;
            }
            if noise.source == Some(agent) {
                continue;
            }
            if let Some(source) = noise.source {
                if let Ok(source_actor) = sources.get(source) {
                    if source_actor.faction_id == actor.faction_id {
                        continue;
                    }
                }
            }

            // Quiet weapons cap audibility below the listener's own range
            let audible_range = config.gunshot_hearing_range.min(noise.range);
            let distance = transform.translation.distance(noise.position);
            if distance > audible_range {
                continue;
            }

            memory.record_gunshot(noise.position, time.now);
            if !memory.ever_seen {
                memory.seed_visual(noise.position, time.now);
            }

            crate::logger::log(&format!(
                "🔊 {:?} heard gunfire at {:.1}m (range {:.1}m)",
                agent, distance, audible_range
            ));
        }
    }
}
