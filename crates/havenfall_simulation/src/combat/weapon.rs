//! Ranged weapon tuning and per-agent fire-control state.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Ranged weapon parameters.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct RangedWeapon {
    /// Shots per burst.
    pub burst_size: u32,
    /// Seconds between shots inside a burst.
    pub time_between_shots: f32,
    /// Cooldown after a completed burst (seconds).
    pub time_between_attacks: f32,
    /// Damage per bullet.
    pub bullet_damage: f32,
    /// Maximum engagement range (meters). Also caps hitscan ray length.
    pub range: f32,
    /// Spread floor (degrees). Applies even to a fully rested shooter.
    pub base_inaccuracy: f32,
    /// Accumulated-spread ceiling (degrees).
    pub max_inaccuracy: f32,
    /// Spread added per shot fired (degrees).
    pub inaccuracy_per_shot: f32,
    /// Spread drained per second once recovery kicks in (degrees/second).
    pub accuracy_recovery_speed: f32,
    /// Extra spread per meter of target distance (degrees/meter).
    pub distance_falloff: f32,
    /// Muzzle height above the shooter's origin (meters).
    pub muzzle_height: f32,
    /// How far the muzzle report carries (meters); stamped on the emitted
    /// noise as its audibility cap.
    pub hearing_range: f32,
    /// Knockback magnitude reported with actor hits.
    pub impact_impulse: f32,
}

impl Default for RangedWeapon {
    fn default() -> Self {
        Self {
            burst_size: 3,
            time_between_shots: 0.3,
            time_between_attacks: 2.0,
            bullet_damage: 15.0,
            range: 10.0,
            base_inaccuracy: 2.0,
            max_inaccuracy: 8.0,
            inaccuracy_per_shot: 1.0,
            accuracy_recovery_speed: 3.0,
            distance_falloff: 0.1,
            muzzle_height: 1.5,
            hearing_range: 30.0,
            impact_impulse: 10.0,
        }
    }
}

/// Burst-fire state machine: idle → firing (N shots) → cooldown → idle.
///
/// All phases are timestamp comparisons against [`crate::SimTime`], never
/// suspended waits, so a burst cancelled by death mid-sequence just stops.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct BurstState {
    /// A burst is live: shots remain and the committed target was alive at
    /// the last shot.
    pub in_progress: bool,
    /// Shots fired in the current burst.
    pub shots_fired: u32,
    /// Timestamp the next shot is due (seconds).
    pub next_shot_at: f64,
    /// No new burst may start before this timestamp.
    pub cooldown_until: f64,
    /// Target committed at burst start.
    pub target: Option<Entity>,
}

impl BurstState {
    pub fn can_start(&self, now: f64) -> bool {
        !self.in_progress && now >= self.cooldown_until
    }

    /// Commit to `target` and schedule the first shot immediately.
    pub fn start(&mut self, target: Entity, now: f64) {
        self.in_progress = true;
        self.shots_fired = 0;
        self.next_shot_at = now;
        self.target = Some(target);
    }

    /// End the burst (completed or cancelled) and arm the attack cooldown.
    pub fn finish(&mut self, now: f64, cooldown: f32) {
        self.in_progress = false;
        self.target = None;
        self.cooldown_until = now + cooldown as f64;
    }

    /// Hard cancel with no cooldown (death cleanup).
    pub fn clear(&mut self) {
        self.in_progress = false;
        self.shots_fired = 0;
        self.target = None;
    }
}

/// Accumulated spread above the weapon's floor, in degrees.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct AccuracyState {
    pub current_inaccuracy: f32,
    /// Timestamp of the last shot; gates the recovery grace period.
    pub last_shot_at: f64,
}

impl Default for AccuracyState {
    fn default() -> Self {
        Self {
            current_inaccuracy: 0.0,
            last_shot_at: f64::NEG_INFINITY,
        }
    }
}

impl AccuracyState {
    /// Register a shot: add per-shot spread, clamp to the ceiling.
    pub fn bump(&mut self, weapon: &RangedWeapon, now: f64) {
        self.current_inaccuracy =
            (self.current_inaccuracy + weapon.inaccuracy_per_shot).min(weapon.max_inaccuracy);
        self.last_shot_at = now;
    }
}
