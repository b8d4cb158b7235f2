//! Sensing module: vision cone + line of sight, hearing, sensory memory.
//!
//! Detection fuses three gates for vision (range, field of view, occlusion)
//! and two hearing channels (footsteps gated by target speed/stance, gunshot
//! broadcasts). Every positive detection stamps a per-modality memory trace;
//! the FSM consumes trace freshness, never raw detection flags.

use bevy::prelude::*;

pub mod components;
pub mod systems;

pub use components::{MemoryTrace, Perception, SensorConfig, SensoryMemory};
pub use systems::{hear_loud_noises, update_hearing, update_vision};

use crate::SimSet;

/// Event: a loud noise (gunshot) at a world position.
///
/// Process-wide fan-out: every listening agent checks the position against
/// its own hearing range. Events are double-buffered by the ECS, so the
/// broadcast always iterates a snapshot; agents registering or dying during
/// a tick never invalidate the dispatch.
#[derive(Event, Debug, Clone)]
pub struct LoudNoise {
    pub position: Vec3,
    /// Emitting entity, `None` for external sources (the player's weapon).
    pub source: Option<Entity>,
    /// How far this particular noise carries (meters). Listeners hear it
    /// within the smaller of this and their own gunshot hearing range.
    pub range: f32,
}

pub struct SensingPlugin;

impl Plugin for SensingPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<LoudNoise>().add_systems(
            Update,
            (update_vision, update_hearing, hear_loud_noises)
                .chain()
                .in_set(SimSet::Sense),
        );
    }
}
