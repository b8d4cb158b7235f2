//! Behavior controller: finite-state machine over the sensing output.
//!
//! States: Patrol ⇄ Chase ⇄ Attack ⇄ Investigate, plus an absorbing Dead.
//! Transitions are a fixed priority ladder evaluated every tick (first match
//! wins); destinations for Investigate come from sensory-memory recency.

use bevy::prelude::*;

pub mod components;
pub mod systems;

pub use components::{AiConfig, AiState};
pub use systems::fsm::ai_fsm_transitions;
pub use systems::movement::{ai_movement_from_state, face_attack_targets};
pub use systems::reactions::{handle_actor_death, react_to_damage};

use crate::SimSet;

/// AI Plugin.
///
/// Decision order per tick:
/// 1. handle_actor_death: death pre-empts everything, cancels bursts
/// 2. react_to_damage: stamp damage-source memory from last tick's hits
/// 3. ai_fsm_transitions: evaluate the priority ladder
/// 4. ai_movement_from_state: state → MovementCommand (+ patrol waypoints)
/// 5. face_attack_targets: bounded-rate rotation while attacking
pub struct AiPlugin;

impl Plugin for AiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                handle_actor_death,
                react_to_damage,
                ai_fsm_transitions,
                ai_movement_from_state,
                face_attack_targets,
            )
                .chain()
                .in_set(SimSet::Decide),
        );
    }
}
