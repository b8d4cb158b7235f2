//! AI movement systems: state → MovementCommand, patrol waypoints, facing.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::{AiConfig, AiState};
use crate::components::MovementCommand;
use crate::spatial::SpatialIndex;
use crate::{DeterministicRng, SimTime};

/// Height above a sampled waypoint from which the ground probe is cast.
const GROUND_PROBE_START: f32 = 0.5;

/// System: convert AiState into a MovementCommand.
///
/// Also owns patrol waypoint lifecycle: sampling a random point within
/// `walk_point_range`, validating ground beneath it, and resampling once the
/// point is reached. A failed ground probe is a recoverable miss; the
/// waypoint stays `None` and the next tick tries a fresh sample.
pub fn ai_movement_from_state(
    mut agents: Query<(
        Entity,
        &Transform,
        &mut AiState,
        &AiConfig,
        &mut MovementCommand,
    )>,
    spatial: Res<SpatialIndex>,
    mut rng: ResMut<DeterministicRng>,
) {
    for (entity, transform, mut state, config, mut command) in agents.iter_mut() {
        match state.as_mut() {
            AiState::Dead => {
                if !matches!(*command, MovementCommand::Stop) {
                    *command = MovementCommand::Stop;
                }
            }

            AiState::Patrol { waypoint } => {
                if let Some(point) = *waypoint {
                    let to_point = point - transform.translation;
                    let horizontal = Vec3::new(to_point.x, 0.0, to_point.z).length();
                    if horizontal < config.waypoint_tolerance {
                        // Reached, resample next tick
                        *waypoint = None;
                        if !matches!(*command, MovementCommand::Idle) {
                            *command = MovementCommand::Idle;
                        }
                    } else if !matches!(*command, MovementCommand::MoveToPosition { target } if target == point)
                    {
                        *command = MovementCommand::MoveToPosition { target: point };
                    }
                } else {
                    match sample_waypoint(transform.translation, config, &spatial, &mut rng) {
                        Some(point) => {
                            crate::logger::log(&format!(
                                "AI: {:?} patrol waypoint {:.1},{:.1}",
                                entity, point.x, point.z
                            ));
                            *waypoint = Some(point);
                            *command = MovementCommand::MoveToPosition { target: point };
                        }
                        None => {
                            // No ground under the sample; retry next tick
                            if !matches!(*command, MovementCommand::Idle) {
                                *command = MovementCommand::Idle;
                            }
                        }
                    }
                }
            }

            AiState::Chase { target } => {
                let target = *target;
                if !matches!(*command, MovementCommand::FollowEntity { target: t } if t == target)
                {
                    *command = MovementCommand::FollowEntity { target };
                }
            }

            AiState::Attack { .. } => {
                // Hold position; facing is handled by face_attack_targets
                if !matches!(*command, MovementCommand::Stop) {
                    *command = MovementCommand::Stop;
                }
            }

            AiState::Investigate { position } => {
                let position = *position;
                if !matches!(*command, MovementCommand::MoveToPosition { target } if target == position)
                {
                    *command = MovementCommand::MoveToPosition { target: position };
                }
            }
        }
    }
}

/// Sample a random point within `walk_point_range` of `origin` and validate
/// there is ground beneath it. Square sampling on XZ, matching the patrol
/// feel of the tuning constants.
fn sample_waypoint(
    origin: Vec3,
    config: &AiConfig,
    spatial: &SpatialIndex,
    rng: &mut DeterministicRng,
) -> Option<Vec3> {
    let range = config.walk_point_range;
    let dx = rng.rng.gen_range(-range..range);
    let dz = rng.rng.gen_range(-range..range);
    let candidate = origin + Vec3::new(dx, 0.0, dz);

    let probe_origin = candidate + Vec3::Y * GROUND_PROBE_START;
    let hit = spatial.raycast(
        probe_origin,
        Vec3::NEG_Y,
        GROUND_PROBE_START + config.ground_probe_depth,
    )?;

    Some(Vec3::new(candidate.x, hit.point.y, candidate.z))
}

/// System: bounded-rate rotation toward the target while attacking.
///
/// Runs every tick in Attack regardless of burst phase; the turn rate cap
/// (`rotation_speed_degrees`) keeps tracking honest against strafing targets.
/// Yaw only; aim pitch is the combat module's concern.
pub fn face_attack_targets(
    mut actors: Query<(Entity, &mut Transform, Option<&AiState>, Option<&AiConfig>)>,
    time: Res<SimTime>,
) {
    // Positions snapshot first; the mutable pass below needs target lookups
    let positions: Vec<(Entity, Vec3)> = actors
        .iter()
        .map(|(entity, transform, _, _)| (entity, transform.translation))
        .collect();

    for (_, mut transform, state, config) in actors.iter_mut() {
        let (Some(AiState::Attack { target }), Some(config)) = (state, config) else {
            continue;
        };
        let Some(&(_, target_position)) = positions.iter().find(|(e, _)| e == target) else {
            continue;
        };

        let mut to_target = target_position - transform.translation;
        to_target.y = 0.0; // horizontal tracking only
        if to_target.length_squared() < 1e-6 {
            continue;
        }

        let desired = Transform::default()
            .looking_to(to_target.normalize(), Vec3::Y)
            .rotation;
        let max_step = config.rotation_speed_degrees.to_radians() * time.delta;
        let angle = transform.rotation.angle_between(desired);

        transform.rotation = if angle <= max_step || angle < 1e-4 {
            desired
        } else {
            transform.rotation.slerp(desired, max_step / angle)
        };
    }
}
