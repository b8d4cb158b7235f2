//! Behavior FSM components (state machine + tuning).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Behavior FSM states. Exactly one active per agent at any time.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub enum AiState {
    /// Patrol: wander between random ground-validated waypoints.
    Patrol {
        /// Current waypoint; `None` until a sampled point passes the ground
        /// probe (failed samples retry silently next tick).
        waypoint: Option<Vec3>,
    },

    /// Chase: target visible but beyond weapon range; close the distance.
    Chase { target: Entity },

    /// Attack: target visible and in range; hold position, track, fire.
    Attack { target: Entity },

    /// Investigate: move to a sensed-but-not-currently-visible position.
    Investigate { position: Vec3 },

    /// Dead: externally imposed, absorbing. No transitions out.
    Dead,
}

impl Default for AiState {
    fn default() -> Self {
        Self::Patrol { waypoint: None }
    }
}

impl AiState {
    pub fn is_dead(&self) -> bool {
        matches!(self, AiState::Dead)
    }

    /// Short label for logs and debug overlays.
    pub fn name(&self) -> &'static str {
        match self {
            AiState::Patrol { .. } => "Patrol",
            AiState::Chase { .. } => "Chase",
            AiState::Attack { .. } => "Attack",
            AiState::Investigate { .. } => "Investigate",
            AiState::Dead => "Dead",
        }
    }
}

/// Behavior tuning.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct AiConfig {
    /// Patrol waypoint sampling range around the agent (meters).
    pub walk_point_range: f32,
    /// A waypoint closer than this counts as reached.
    pub waypoint_tolerance: f32,
    /// Turn rate while tracking a target in Attack (degrees/second).
    pub rotation_speed_degrees: f32,
    /// Downward ground-probe length under a sampled waypoint (meters).
    pub ground_probe_depth: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            walk_point_range: 10.0,
            waypoint_tolerance: 2.0,
            rotation_speed_degrees: 180.0,
            ground_probe_depth: 4.0,
        }
    }
}
