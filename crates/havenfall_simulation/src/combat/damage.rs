//! Damage pipeline: request events in, resolved events + death out.

use bevy::prelude::*;

use crate::components::Health;
use crate::SimTime;

/// Request: deal `amount` damage to `target`.
///
/// Raised by the burst driver for bullet hits and by
/// [`crate::Simulation::take_damage`] for external sources.
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageInflicted {
    pub target: Entity,
    pub amount: f32,
    /// Attacking actor, when there is one.
    pub attacker: Option<Entity>,
    /// Where the damage came from; drives damage-source memory.
    pub source_position: Option<Vec3>,
}

/// Resolved: damage was applied to a living target.
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub amount: f32,
    pub source_position: Option<Vec3>,
    pub target_died: bool,
}

/// Resolved: `entity` just ran out of health. Emitted at most once.
#[derive(Event, Debug, Clone, Copy)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// A bullet left the muzzle (presentation hook: muzzle flash, tracer, audio).
#[derive(Event, Debug, Clone, Copy)]
pub struct ShotFired {
    pub shooter: Entity,
    pub origin: Vec3,
    pub direction: Vec3,
}

/// A bullet struck an actor; the host physics layer applies the knockback.
#[derive(Event, Debug, Clone, Copy)]
pub struct ImpactImpulse {
    pub target: Entity,
    pub point: Vec3,
    pub impulse: Vec3,
}

/// Marker: this entity has died. Damage to marked entities is discarded.
#[derive(Component, Debug, Default, Reflect)]
#[reflect(Component)]
pub struct Dead;

/// Corpse timer; the entity despawns when it runs out.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct DespawnAfter {
    pub remaining: f32,
}

impl Default for DespawnAfter {
    fn default() -> Self {
        Self { remaining: 2.0 }
    }
}

/// System: drain damage requests, mutate health, emit resolved events.
///
/// Requests against despawned or already-dead targets are dropped, which
/// makes redundant post-mortem damage idempotent and guarantees a single
/// `EntityDied` per entity.
pub fn apply_damage(
    mut requests: EventReader<DamageInflicted>,
    mut targets: Query<&mut Health, Without<Dead>>,
    mut dealt: EventWriter<DamageDealt>,
    mut deaths: EventWriter<EntityDied>,
) {
    for request in requests.read() {
        let Ok(mut health) = targets.get_mut(request.target) else {
            continue;
        };
        if !health.is_alive() {
            continue;
        }

        health.take_damage(request.amount);
        let target_died = !health.is_alive();

        dealt.write(DamageDealt {
            attacker: request.attacker,
            target: request.target,
            amount: request.amount,
            source_position: request.source_position,
            target_died,
        });

        if target_died {
            deaths.write(EntityDied {
                entity: request.target,
                killer: request.attacker,
            });
        }
    }
}

/// System: tick corpse timers and despawn expired entities.
pub fn despawn_after_timeout(
    mut corpses: Query<(Entity, &mut DespawnAfter)>,
    time: Res<SimTime>,
    mut commands: Commands,
) {
    for (entity, mut timer) in corpses.iter_mut() {
        timer.remaining -= time.delta;
        if timer.remaining <= 0.0 {
            crate::logger::log(&format!("🧹 despawning {entity:?}"));
            if let Ok(mut entity_commands) = commands.get_entity(entity) {
                entity_commands.despawn();
            }
        }
    }
}
