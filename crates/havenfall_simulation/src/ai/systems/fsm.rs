//! FSM transition system: the priority ladder.

use bevy::prelude::*;

use crate::ai::AiState;
use crate::combat::RangedWeapon;
use crate::components::Health;
use crate::sensing::{MemoryTrace, Perception, SensorConfig, SensoryMemory};
use crate::SimTime;

/// System: behavior transitions, evaluated top-to-bottom each tick.
///
/// 1. dead → Dead (absorbing; cleanup handled by `handle_actor_death`)
/// 2. target visible and within weapon range → Attack
/// 3. target visible → Chase
/// 4. any fresh memory trace (damage / sound / visual) → Investigate
/// 5. otherwise → Patrol (waypoint kept across ticks)
pub fn ai_fsm_transitions(
    mut agents: Query<(
        Entity,
        &mut AiState,
        &SensorConfig,
        &Perception,
        &SensoryMemory,
        &RangedWeapon,
        &Health,
    )>,
    time: Res<SimTime>,
) {
    let now = time.now;

    for (entity, mut state, sensor, perception, memory, weapon, health) in agents.iter_mut() {
        if state.is_dead() {
            continue;
        }
        if !health.is_alive() {
            // Event-driven cleanup follows; the ladder just stops here
            *state = AiState::Dead;
            continue;
        }

        let next = if let Some(target) = perception.target {
            // Strictly inside weapon range; the exact boundary still chases
            if perception.distance < weapon.range {
                AiState::Attack { target }
            } else {
                AiState::Chase { target }
            }
        } else if let Some(position) = investigate_destination(memory, sensor, now) {
            AiState::Investigate { position }
        } else {
            // Keep the current waypoint when already patrolling
            match state.as_ref() {
                AiState::Patrol { waypoint } => AiState::Patrol {
                    waypoint: *waypoint,
                },
                _ => AiState::Patrol { waypoint: None },
            }
        };

        if *state != next {
            if state.name() != next.name() {
                crate::logger::log(&format!(
                    "AI: {:?} {} → {}",
                    entity,
                    state.name(),
                    next.name()
                ));
            }
            *state = next;
        }
    }
}

/// Pick the Investigate destination from memory, or `None` when every trace
/// has gone stale (→ Patrol).
///
/// The freshness windows are independent per modality; among the fresh
/// traces the most recent timestamp wins, not a fixed modality order. Ties
/// break visual > damage > sound. An agent that was shot from the dark
/// (`ever_seen == false`) therefore still heads for the damage source or the
/// seeded noise position, whichever observation is newer.
fn investigate_destination(
    memory: &SensoryMemory,
    sensor: &SensorConfig,
    now: f64,
) -> Option<Vec3> {
    let fresh = |trace: Option<MemoryTrace>, window: f64| trace.filter(|t| t.fresh(now, window));

    let candidates = [
        fresh(memory.visual, sensor.visual_lost_timeout),
        fresh(memory.damage, sensor.damage_memory_window),
        fresh(memory.freshest_sound(), sensor.sound_alert_duration),
    ];

    let mut best: Option<MemoryTrace> = None;
    for trace in candidates.into_iter().flatten() {
        // Strictly-greater keeps the earlier (higher-priority) slot on ties
        if best.map_or(true, |b| trace.at > b.at) {
            best = Some(trace);
        }
    }
    best.map(|trace| trace.position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor() -> SensorConfig {
        SensorConfig::default() // visual 3s, sound 5s, damage 5s
    }

    fn memory_with(
        visual: Option<(Vec3, f64)>,
        gunshot: Option<(Vec3, f64)>,
        damage: Option<(Vec3, f64)>,
    ) -> SensoryMemory {
        SensoryMemory {
            visual: visual.map(|(position, at)| MemoryTrace { position, at }),
            gunshot: gunshot.map(|(position, at)| MemoryTrace { position, at }),
            damage: damage.map(|(position, at)| MemoryTrace { position, at }),
            footstep: None,
            ever_seen: visual.is_some(),
        }
    }

    #[test]
    fn test_no_memory_means_patrol() {
        let memory = SensoryMemory::default();
        assert_eq!(investigate_destination(&memory, &sensor(), 10.0), None);
    }

    #[test]
    fn test_recent_gunshot_beats_older_visual() {
        // Seen at t=0, gunshot at t=2, asking at t=2.5: both fresh, gunshot newer
        let memory = memory_with(
            Some((Vec3::new(1.0, 0.0, 0.0), 0.0)),
            Some((Vec3::new(9.0, 0.0, 9.0), 2.0)),
            None,
        );
        assert_eq!(
            investigate_destination(&memory, &sensor(), 2.5),
            Some(Vec3::new(9.0, 0.0, 9.0))
        );
    }

    #[test]
    fn test_stale_visual_leaves_sound_actionable() {
        // Visual stale at t=4 (window 3s), gunshot from t=2 fresh until t=7
        let memory = memory_with(
            Some((Vec3::new(1.0, 0.0, 0.0), 0.0)),
            Some((Vec3::new(9.0, 0.0, 9.0), 2.0)),
            None,
        );
        assert_eq!(
            investigate_destination(&memory, &sensor(), 4.0),
            Some(Vec3::new(9.0, 0.0, 9.0))
        );
        // After both windows lapse: nothing
        assert_eq!(investigate_destination(&memory, &sensor(), 8.0), None);
    }

    #[test]
    fn test_damage_memory_newer_than_sound_wins() {
        let memory = memory_with(
            None,
            Some((Vec3::new(9.0, 0.0, 9.0), 1.0)),
            Some((Vec3::new(-4.0, 0.0, 0.0), 3.0)),
        );
        assert_eq!(
            investigate_destination(&memory, &sensor(), 4.0),
            Some(Vec3::new(-4.0, 0.0, 0.0))
        );
    }
}
