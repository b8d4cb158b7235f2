//! Movement components: navigation commands, speed, velocity.

use bevy::prelude::*;

/// High-level navigation command for an actor.
///
/// Architecture:
/// - AI systems write MovementCommand (strategic intent)
/// - The navigation executor (headless kinematic mover here, a real
///   navigation agent in the host engine) reads it and moves the body
///
/// Single-writer: only the owning agent's decision systems write its command.
#[derive(Component, Debug, Clone, PartialEq)]
pub enum MovementCommand {
    /// Hold position (keep current destination state untouched).
    Idle,
    /// Move to a world position.
    MoveToPosition { target: Vec3 },
    /// Follow an entity (destination refreshed every tick).
    FollowEntity { target: Entity },
    /// Stop immediately and drop velocity.
    Stop,
}

impl Default for MovementCommand {
    fn default() -> Self {
        Self::Idle
    }
}

/// Travel speed of an actor (meters/second).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct MovementSpeed {
    pub speed: f32,
}

impl Default for MovementSpeed {
    fn default() -> Self {
        Self { speed: 3.5 }
    }
}

/// Current velocity, written only by the navigation executor.
///
/// Sensing reads the horizontal component for footstep audibility; the
/// presentation sink reads the magnitude for locomotion blending.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct NavVelocity {
    pub linvel: Vec3,
}

impl NavVelocity {
    pub fn horizontal_speed(&self) -> f32 {
        Vec3::new(self.linvel.x, 0.0, self.linvel.z).length()
    }
}
