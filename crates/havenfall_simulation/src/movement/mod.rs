//! Navigation executor: MovementCommand → transform integration.
//!
//! Straight-line kinematics on the XZ plane. The host engine substitutes its
//! own pathfinding in production; this executor keeps headless runs and tests
//! self-contained.

use bevy::prelude::*;

use crate::components::{Actor, MovementCommand, MovementSpeed, NavVelocity};
use crate::{SimSet, SimTime};

/// Destination closer than this counts as arrived (meters).
const ARRIVAL_EPSILON: f32 = 0.05;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, apply_movement_commands.in_set(SimSet::Navigate));
    }
}

/// System: advance transforms per MovementCommand, publish NavVelocity.
///
/// FollowEntity resolves the target's position from a snapshot taken before
/// mutation, so two actors following each other read consistent positions.
pub fn apply_movement_commands(
    mut actors: Query<
        (
            Entity,
            &mut Transform,
            Option<&MovementCommand>,
            Option<&MovementSpeed>,
            Option<&mut NavVelocity>,
        ),
        With<Actor>,
    >,
    time: Res<SimTime>,
) {
    let positions: Vec<(Entity, Vec3)> = actors
        .iter()
        .map(|(entity, transform, _, _, _)| (entity, transform.translation))
        .collect();

    for (_, mut transform, command, speed, velocity) in actors.iter_mut() {
        let destination = match command {
            Some(MovementCommand::MoveToPosition { target }) => Some(*target),
            Some(MovementCommand::FollowEntity { target }) => positions
                .iter()
                .find(|(e, _)| e == target)
                .map(|(_, p)| *p),
            Some(MovementCommand::Idle) | Some(MovementCommand::Stop) | None => None,
        };

        let mut linvel = Vec3::ZERO;
        if let Some(destination) = destination {
            let mut to_destination = destination - transform.translation;
            to_destination.y = 0.0;
            let distance = to_destination.length();

            if distance > ARRIVAL_EPSILON {
                let speed = speed.map(|s| s.speed).unwrap_or_else(|| MovementSpeed::default().speed);
                let direction = to_destination / distance;
                let step = (speed * time.delta).min(distance);

                transform.translation += direction * step;
                transform.look_to(direction, Vec3::Y);
                linvel = direction * speed;
            }
        }

        if let Some(mut velocity) = velocity {
            if velocity.linvel != linvel {
                velocity.linvel = linvel;
            }
        }
    }
}
