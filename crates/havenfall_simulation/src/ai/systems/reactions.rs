//! Event-driven reactions: damage memory and death cleanup.

use bevy::prelude::*;

use crate::ai::AiState;
use crate::combat::{BurstState, DamageDealt, Dead, DespawnAfter, EntityDied};
use crate::components::{Actor, MovementCommand, NavVelocity};
use crate::sensing::SensoryMemory;
use crate::SimTime;

/// System: stamp damage-source memory from last tick's resolved hits.
///
/// Best-available source position: the event's `source_position`, else the
/// attacker's current transform, else the victim's own position (being hurt
/// with no direction still puts the agent on alert). An agent that has never
/// seen its attacker also gets a seeded visual trace, so the ladder treats
/// the hit as a sighting hint.
pub fn react_to_damage(
    mut events: EventReader<DamageDealt>,
    mut agents: Query<(&Transform, &mut SensoryMemory), With<Actor>>,
    attackers: Query<&Transform, With<Actor>>,
    time: Res<SimTime>,
) {
    for event in events.read() {
        let Ok((transform, mut memory)) = agents.get_mut(event.target) else {
            continue;
        };

        let position = event
            .source_position
            .or_else(|| {
                event
                    .attacker
                    .and_then(|attacker| attackers.get(attacker).ok())
                    .map(|t| t.translation)
            })
            .unwrap_or(transform.translation);

        memory.record_damage(position, time.now);
        if !memory.ever_seen {
            memory.seed_visual(position, time.now);
        }

        crate::logger::log(&format!(
            "⚠️ {:?} took {:.0} damage from {:.1},{:.1}",
            event.target, event.amount, position.x, position.z
        ));
    }
}

/// System: death cleanup for agents and plain actors.
///
/// Agents get the full teardown (absorbing Dead state, movement stopped,
/// in-flight burst cancelled, velocity zeroed); any dying actor gets the
/// `Dead` marker plus a corpse-despawn timer. Duplicate death events for the
/// same entity are ignored.
pub fn handle_actor_death(
    mut events: EventReader<EntityDied>,
    mut agents: Query<(
        &mut AiState,
        &mut MovementCommand,
        &mut BurstState,
        &mut NavVelocity,
    )>,
    already_dead: Query<&Dead>,
    mut commands: Commands,
) {
    for event in events.read() {
        if already_dead.contains(event.entity) {
            continue;
        }

        if let Ok((mut state, mut command, mut burst, mut velocity)) =
            agents.get_mut(event.entity)
        {
            *state = AiState::Dead;
            *command = MovementCommand::Stop;
            burst.clear();
            velocity.linvel = Vec3::ZERO;
        }

        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.insert((Dead, DespawnAfter::default()));
        }

        crate::logger::log(&format!(
            "💀 {:?} died{}",
            event.entity,
            event
                .killer
                .map(|k| format!(" (killed by {k:?})"))
                .unwrap_or_default()
        ));
    }
}
