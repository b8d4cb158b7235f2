//! Sensing components: sensor tuning + per-modality memory.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Sensor tuning for one agent.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct SensorConfig {
    /// Vision range (meters).
    pub sight_range: f32,
    /// Full field-of-view cone angle (degrees); targets within half of this
    /// from the facing direction pass the angle gate.
    pub fov_degrees: f32,
    /// Eye height above the agent origin (line-of-sight ray start).
    pub eye_height: f32,
    /// Torso height above the target origin (line-of-sight ray end).
    pub torso_height: f32,

    /// Footstep audibility range (meters).
    pub footstep_hearing_range: f32,
    /// Gunshot audibility range (meters).
    pub gunshot_hearing_range: f32,
    /// Minimum horizontal target speed for audible footsteps (m/s).
    pub movement_speed_threshold: f32,
    /// Stance height below which the target counts as crouched (silent).
    pub crouch_height_threshold: f32,

    /// How long a visual trace stays fresh (seconds).
    pub visual_lost_timeout: f64,
    /// How long a sound trace stays fresh (seconds).
    pub sound_alert_duration: f64,
    /// How long a damage trace stays fresh (seconds).
    pub damage_memory_window: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sight_range: 15.0,
            fov_degrees: 120.0,
            eye_height: 1.5,
            torso_height: 1.0,
            footstep_hearing_range: 8.0,
            gunshot_hearing_range: 30.0,
            movement_speed_threshold: 0.5,
            crouch_height_threshold: 1.2,
            visual_lost_timeout: 3.0,
            sound_alert_duration: 5.0,
            damage_memory_window: 5.0,
        }
    }
}

/// One remembered detection: where and when.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct MemoryTrace {
    pub position: Vec3,
    /// Simulation time of the observation.
    pub at: f64,
}

impl MemoryTrace {
    pub fn fresh(&self, now: f64, window: f64) -> bool {
        now - self.at <= window
    }
}

/// Per-modality last-known-position memory for one agent.
///
/// Invariant: a slot is only overwritten by a strictly newer observation of
/// the same modality. The single exception is gunshot seeding of the visual
/// slot while the target has never actually been seen; the noise position
/// is treated with the urgency of a sighting, but `ever_seen` stays false.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct SensoryMemory {
    pub visual: Option<MemoryTrace>,
    pub footstep: Option<MemoryTrace>,
    pub gunshot: Option<MemoryTrace>,
    pub damage: Option<MemoryTrace>,
    /// True once the target has actually been seen (not just seeded).
    pub ever_seen: bool,
}

impl SensoryMemory {
    fn newer(slot: &Option<MemoryTrace>, now: f64) -> bool {
        slot.map_or(true, |trace| now > trace.at)
    }

    fn write(slot: &mut Option<MemoryTrace>, position: Vec3, now: f64) {
        if Self::newer(slot, now) {
            *slot = Some(MemoryTrace { position, at: now });
        }
    }

    pub fn record_visual(&mut self, position: Vec3, now: f64) {
        Self::write(&mut self.visual, position, now);
        self.ever_seen = true;
    }

    /// Seed the visual slot from a non-visual cue (gunshot, damage) without
    /// claiming an actual sighting.
    pub fn seed_visual(&mut self, position: Vec3, now: f64) {
        Self::write(&mut self.visual, position, now);
    }

    pub fn record_footstep(&mut self, position: Vec3, now: f64) {
        Self::write(&mut self.footstep, position, now);
    }

    pub fn record_gunshot(&mut self, position: Vec3, now: f64) {
        Self::write(&mut self.gunshot, position, now);
    }

    pub fn record_damage(&mut self, position: Vec3, now: f64) {
        Self::write(&mut self.damage, position, now);
    }

    /// Most recent of the two sound modalities.
    pub fn freshest_sound(&self) -> Option<MemoryTrace> {
        match (self.footstep, self.gunshot) {
            (Some(a), Some(b)) => Some(if a.at >= b.at { a } else { b }),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }
}

/// Current-tick visibility result, recomputed by `update_vision`.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Perception {
    pub target: Option<Entity>,
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_only_overwritten_by_strictly_newer() {
        let mut memory = SensoryMemory::default();
        memory.record_visual(Vec3::new(1.0, 0.0, 0.0), 5.0);
        memory.record_visual(Vec3::new(2.0, 0.0, 0.0), 5.0); // same timestamp
        assert_eq!(memory.visual.unwrap().position, Vec3::new(1.0, 0.0, 0.0));

        memory.record_visual(Vec3::new(3.0, 0.0, 0.0), 6.0);
        assert_eq!(memory.visual.unwrap().position, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_seed_visual_does_not_set_ever_seen() {
        let mut memory = SensoryMemory::default();
        memory.seed_visual(Vec3::ONE, 1.0);
        assert!(memory.visual.is_some());
        assert!(!memory.ever_seen);

        memory.record_visual(Vec3::ONE, 2.0);
        assert!(memory.ever_seen);
    }

    #[test]
    fn test_freshest_sound_picks_latest() {
        let mut memory = SensoryMemory::default();
        memory.record_footstep(Vec3::X, 1.0);
        memory.record_gunshot(Vec3::Y, 3.0);
        assert_eq!(memory.freshest_sound().unwrap().position, Vec3::Y);

        memory.record_footstep(Vec3::Z, 4.0);
        assert_eq!(memory.freshest_sound().unwrap().position, Vec3::Z);
    }

    #[test]
    fn test_trace_freshness_window() {
        let trace = MemoryTrace {
            position: Vec3::ZERO,
            at: 10.0,
        };
        assert!(trace.fresh(12.0, 3.0));
        assert!(!trace.fresh(14.0, 3.0));
    }
}
