//! Combat: burst-fire scheduling, probabilistic hit resolution, damage, death.
//!
//! Shots are hitscan rays fired against the injected [`SpatialIndex`] plus
//! sphere tests on live actors. A started burst is committed to its target
//! entity and keeps firing even if the behavior FSM has already moved on;
//! only target death (or the shooter's own) cuts it short.

use bevy::prelude::*;

pub mod damage;
pub mod systems;
pub mod weapon;

pub use damage::{
    DamageDealt, DamageInflicted, Dead, DespawnAfter, EntityDied, ImpactImpulse, ShotFired,
};
pub use weapon::{AccuracyState, BurstState, RangedWeapon};

use crate::SimSet;

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageInflicted>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<ShotFired>()
            .add_event::<ImpactImpulse>()
            .add_systems(
                Update,
                (
                    systems::drive_bursts,
                    systems::recover_accuracy,
                    damage::apply_damage,
                    damage::despawn_after_timeout,
                )
                    .chain()
                    .in_set(SimSet::Act),
            );
    }
}
