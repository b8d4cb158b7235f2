//! Behavior integration tests: sensing gates, FSM transitions, burst fire,
//! memory windows, death.
//!
//! Every scenario drives a headless [`Simulation`] with synthetic deltas, so
//! all timing assertions are exact tick arithmetic.

use bevy::ecs::event::Events;
use bevy::prelude::*;
use havenfall_simulation::*;

const DT: f32 = 1.0 / 60.0;

/// Helper: simulation on a default flat world.
fn flat_sim(seed: u64) -> Simulation {
    Simulation::new(seed)
}

/// Helper: disable vision on an agent so a scenario exercises hearing or
/// damage memory in isolation.
fn blind(sim: &mut Simulation, agent: Entity) {
    let mut sensor = sim
        .app
        .world_mut()
        .get_mut::<SensorConfig>(agent)
        .expect("agent has SensorConfig");
    sensor.sight_range = 0.0;
}

fn set_health(sim: &mut Simulation, entity: Entity, value: f32) {
    let mut health = sim
        .app
        .world_mut()
        .get_mut::<Health>(entity)
        .expect("entity has Health");
    health.max = value;
    health.current = value;
}

fn teleport(sim: &mut Simulation, entity: Entity, position: Vec3) {
    sim.app
        .world_mut()
        .get_mut::<Transform>(entity)
        .expect("entity has Transform")
        .translation = position;
}

// --- Vision gates ---

#[test]
fn test_visible_target_in_weapon_range_triggers_attack_and_shot() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    let intruder = spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, -5.0), 2);
    set_health(&mut sim, intruder, 100_000.0);

    let mut shots = sim
        .app
        .world()
        .resource::<Events<ShotFired>>()
        .get_cursor();

    sim.tick(DT);

    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Attack { target }) if target == intruder
    ));
    assert!(sim.is_attacking(hostile));

    let events = sim.app.world().resource::<Events<ShotFired>>();
    let fired: Vec<_> = shots.read(events).collect();
    assert_eq!(fired.len(), 1, "first burst shot lands on the same tick");
    assert_eq!(fired[0].shooter, hostile);
}

#[test]
fn test_visible_target_beyond_weapon_range_triggers_chase_then_attack() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    let intruder = spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, -12.0), 2);
    set_health(&mut sim, intruder, 100_000.0);

    sim.tick(DT);
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Chase { target }) if target == intruder
    ));

    // Closing 2m at 3.5 m/s takes well under 1.5s
    for _ in 0..90 {
        sim.tick(DT);
    }
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Attack { .. })
    ));
}

#[test]
fn test_target_at_exact_weapon_range_is_chased_not_attacked() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    let intruder = spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, -10.0), 2);
    set_health(&mut sim, intruder, 100_000.0);

    // Exactly on the 10m boundary: strictly inside is required to attack
    sim.tick(DT);
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Chase { target }) if target == intruder
    ));
    assert!(!sim.is_attacking(hostile));
}

#[test]
fn test_target_behind_agent_is_outside_fov() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, 5.0), 2);

    // Default facing is -Z; +Z is squarely behind. One tick: the sensing
    // pass must not promote the target before patrol movement turns the body.
    sim.tick(DT);
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Patrol { .. })
    ));
    let perception = sim.app.world().get::<Perception>(hostile).unwrap();
    assert_eq!(perception.target, None);
}

#[test]
fn test_wall_occludes_vision() {
    let mut sim = flat_sim(42);
    sim.app.insert_resource(SpatialIndex::new(
        FlatWorld::default().with_obstacle(Vec3::new(0.0, 1.5, -2.5), Vec3::new(8.0, 3.0, 0.5)),
    ));
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, -5.0), 2);

    for _ in 0..30 {
        sim.tick(DT);
        assert!(matches!(
            sim.behavior_state(hostile),
            Some(AiState::Patrol { .. })
        ));
    }
    let perception = sim.app.world().get::<Perception>(hostile).unwrap();
    assert_eq!(perception.target, None);
}

// --- Hearing ---

#[test]
fn test_running_footsteps_trigger_investigate() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    blind(&mut sim, hostile);
    let intruder = spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, 6.0), 2);
    *sim.app
        .world_mut()
        .get_mut::<MovementCommand>(intruder)
        .unwrap() = MovementCommand::MoveToPosition {
        target: Vec3::new(0.0, 0.0, 2.0),
    };

    // Tick 1 gives the intruder velocity, tick 2 makes it audible
    sim.tick(DT);
    sim.tick(DT);

    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Investigate { .. })
    ));
}

#[test]
fn test_crouched_movement_is_silent() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    blind(&mut sim, hostile);
    let intruder = spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, 6.0), 2);
    sim.app
        .world_mut()
        .entity_mut(intruder)
        .insert(Stance { height: 1.0 });
    *sim.app
        .world_mut()
        .get_mut::<MovementCommand>(intruder)
        .unwrap() = MovementCommand::MoveToPosition {
        target: Vec3::new(0.0, 0.0, 2.0),
    };

    for _ in 0..20 {
        sim.tick(DT);
    }
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Patrol { .. })
    ));
}

#[test]
fn test_slow_movement_is_silent() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    blind(&mut sim, hostile);
    let intruder = spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, 6.0), 2);
    sim.app
        .world_mut()
        .entity_mut(intruder)
        .insert(MovementSpeed { speed: 0.3 });
    *sim.app
        .world_mut()
        .get_mut::<MovementCommand>(intruder)
        .unwrap() = MovementCommand::MoveToPosition {
        target: Vec3::new(0.0, 0.0, 2.0),
    };

    for _ in 0..20 {
        sim.tick(DT);
    }
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Patrol { .. })
    ));
}

#[test]
fn test_gunshot_broadcast_triggers_investigate_at_noise_position() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    blind(&mut sim, hostile);

    let noise = Vec3::new(10.0, 0.0, -10.0);
    sim.loud_noise(noise);
    sim.tick(DT);

    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Investigate { position }) if position == noise
    ));

    // Heard, not seen
    let memory = sim.app.world().get::<SensoryMemory>(hostile).unwrap();
    assert!(!memory.ever_seen);
    assert!(memory.gunshot.is_some());

    // Both the seeded visual (3s) and the gunshot trace (5s) lapse
    for _ in 0..350 {
        sim.tick(DT);
    }
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Patrol { .. })
    ));
}

#[test]
fn test_gunshot_beyond_hearing_range_is_ignored() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    blind(&mut sim, hostile);

    sim.loud_noise(Vec3::new(40.0, 0.0, 0.0)); // > 30m
    sim.tick(DT);

    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Patrol { .. })
    ));
}

#[test]
fn test_quiet_noise_carries_only_its_own_range() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    blind(&mut sim, hostile);

    // A suppressed report 10m away that only carries 5m goes unheard
    let position = Vec3::new(10.0, 0.0, 0.0);
    sim.app.world_mut().send_event(LoudNoise {
        position,
        source: None,
        range: 5.0,
    });
    sim.tick(DT);
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Patrol { .. })
    ));

    // The same noise at full carry is heard
    sim.app.world_mut().send_event(LoudNoise {
        position,
        source: None,
        range: 30.0,
    });
    sim.tick(DT);
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Investigate { position: p }) if p == position
    ));
}

#[test]
fn test_same_faction_gunfire_is_ignored() {
    let mut sim = flat_sim(42);
    let listener = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    blind(&mut sim, listener);
    let ally = spawn_hostile(sim.app.world_mut(), Vec3::new(5.0, 0.0, 0.0), 1);
    blind(&mut sim, ally);

    sim.app.world_mut().send_event(LoudNoise {
        position: Vec3::new(5.0, 1.5, 0.0),
        source: Some(ally),
        range: 30.0,
    });
    sim.tick(DT);

    assert!(matches!(
        sim.behavior_state(listener),
        Some(AiState::Patrol { .. })
    ));
}

// --- Memory recency ---

#[test]
fn test_newer_sound_overrides_stale_visual_memory() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    let intruder = spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, -12.0), 2);

    // Seen for a moment, then gone
    for _ in 0..10 {
        sim.tick(DT);
    }
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Chase { .. })
    ));
    teleport(&mut sim, intruder, Vec3::new(0.0, 0.0, -40.0));

    // Out of sight: falls back to the last-seen position
    sim.tick(DT);
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Investigate { .. })
    ));

    // A fresh gunshot elsewhere outranks the older visual trace
    let noise = Vec3::new(15.0, 0.0, 0.0);
    sim.loud_noise(noise);
    sim.tick(DT);
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Investigate { position }) if position == noise
    ));

    // Once every window has lapsed, back to patrol
    for _ in 0..400 {
        sim.tick(DT);
    }
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Patrol { .. })
    ));
}

#[test]
fn test_damage_from_unseen_attacker_triggers_investigate() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    blind(&mut sim, hostile);

    let source = Vec3::new(10.0, 0.0, 10.0);
    sim.take_damage(hostile, 10.0, Some(source));

    // Tick 1 applies the damage, tick 2 reacts to it
    sim.tick(DT);
    sim.tick(DT);

    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Investigate { position }) if position == source
    ));
    let health = sim.app.world().get::<Health>(hostile).unwrap();
    assert_eq!(health.current, 90.0);

    // Damage memory (5s) outlives the seeded visual (3s); then patrol
    for _ in 0..330 {
        sim.tick(DT);
    }
    assert!(matches!(
        sim.behavior_state(hostile),
        Some(AiState::Patrol { .. })
    ));
}

// --- Burst fire ---

#[test]
fn test_burst_fires_three_shots_then_cools_down() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    let intruder = spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, -5.0), 2);
    set_health(&mut sim, intruder, 100_000.0);

    let mut shots = sim
        .app
        .world()
        .resource::<Events<ShotFired>>()
        .get_cursor();

    // dt = 0.1s: shots land every 3 ticks, bursts every ~20 ticks
    let mut shot_ticks: Vec<u32> = Vec::new();
    for tick in 1..=40u32 {
        sim.tick(0.1);
        let events = sim.app.world().resource::<Events<ShotFired>>();
        for _ in shots.read(events) {
            shot_ticks.push(tick);
        }
    }

    assert_eq!(shot_ticks.len(), 6, "two full bursts in 4s: {shot_ticks:?}");
    let gaps: Vec<i32> = shot_ticks
        .windows(2)
        .map(|w| w[1] as i32 - w[0] as i32)
        .collect();
    for (i, gap) in gaps.iter().enumerate() {
        let expected = if i == 2 { 20 } else { 3 };
        assert!(
            (gap - expected).abs() <= 1,
            "shot gap {i} was {gap} ticks, expected ~{expected}: {shot_ticks:?}"
        );
    }
}

#[test]
fn test_inaccuracy_grows_per_shot_and_recovers_after_grace() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    let intruder = spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, -5.0), 2);
    set_health(&mut sim, intruder, 100_000.0);

    sim.tick(0.1); // shot 1
    let accuracy = sim.app.world().get::<AccuracyState>(hostile).unwrap();
    assert_eq!(accuracy.current_inaccuracy, 1.0);

    // Let the burst finish (3 shots, one every ~3 ticks)
    for _ in 0..12 {
        sim.tick(0.1);
        if !sim.is_attacking(hostile) {
            break;
        }
    }
    assert!(!sim.is_attacking(hostile), "burst should finish within 1.2s");
    let accuracy = sim.app.world().get::<AccuracyState>(hostile).unwrap();
    assert_eq!(accuracy.current_inaccuracy, 3.0);
    let last_shot_at = accuracy.last_shot_at;

    // Target gone: no further shots, recovery starts 1s after the last one
    teleport(&mut sim, intruder, Vec3::new(0.0, 0.0, 100.0));
    while sim.app.world().resource::<SimTime>().now < last_shot_at + 1.5 {
        sim.tick(0.1);
    }
    let accuracy = sim.app.world().get::<AccuracyState>(hostile).unwrap();
    assert!(
        accuracy.current_inaccuracy < 3.0 && accuracy.current_inaccuracy > 0.5,
        "partial recovery expected, got {}",
        accuracy.current_inaccuracy
    );

    // Full drain takes 1s at 3 deg/s from the 3.0 peak
    while sim.app.world().resource::<SimTime>().now < last_shot_at + 2.5 {
        sim.tick(0.1);
    }
    let accuracy = sim.app.world().get::<AccuracyState>(hostile).unwrap();
    assert_eq!(accuracy.current_inaccuracy, 0.0);
}

#[test]
fn test_burst_stops_when_target_dies() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    let intruder = spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, -5.0), 2);

    sim.tick(0.1); // burst committed, shot 1
    assert!(sim.is_attacking(hostile));

    sim.take_damage(intruder, 999.0, None);
    sim.tick(0.1); // intruder dies this tick
    sim.tick(0.1); // burst driver sees the dead target

    assert!(!sim.is_attacking(hostile));
    let burst = sim.app.world().get::<BurstState>(hostile).unwrap();
    assert_eq!(burst.target, None);
}

// --- Death ---

#[test]
fn test_death_is_absorbing_and_idempotent() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);

    let mut cues = sim
        .app
        .world()
        .resource::<Events<PresentationEvent>>()
        .get_cursor();
    let mut deaths_seen = 0;

    sim.take_damage(hostile, 500.0, None);
    sim.tick(DT);
    sim.tick(DT);

    assert!(matches!(sim.behavior_state(hostile), Some(AiState::Dead)));
    assert_eq!(sim.movement_speed(hostile), 0.0);
    assert!(!sim.is_attacking(hostile));

    // Redundant damage after death changes nothing
    sim.take_damage(hostile, 500.0, None);

    // Corpse persists ~2s, then despawns
    let mut despawned_at_tick = None;
    for tick in 0..150u32 {
        sim.tick(DT);
        let events = sim.app.world().resource::<Events<PresentationEvent>>();
        deaths_seen += cues
            .read(events)
            .filter(|e| matches!(e, PresentationEvent::DeathTriggered { .. }))
            .count();
        if despawned_at_tick.is_none() && sim.app.world().get_entity(hostile).is_err() {
            despawned_at_tick = Some(tick);
        }
    }

    assert_eq!(deaths_seen, 1, "death cue must fire exactly once");
    let despawned_at_tick = despawned_at_tick.expect("corpse should despawn");
    // 2s at 60Hz, small slack for the event round-trip
    assert!(
        (118..=125).contains(&despawned_at_tick),
        "despawned at tick {despawned_at_tick}"
    );
}

// --- Patrol ---

#[test]
fn test_patrol_samples_ground_validated_waypoints() {
    let mut sim = flat_sim(42);
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);

    sim.tick(DT);

    let Some(AiState::Patrol {
        waypoint: Some(point),
    }) = sim.behavior_state(hostile)
    else {
        panic!("expected a patrol waypoint after the first tick");
    };
    assert!(point.x.abs() <= 10.0 && point.z.abs() <= 10.0);
    assert_eq!(point.y, 0.0, "waypoint snaps to the ground plane");
    assert!(sim.movement_speed(hostile) > 0.0);
}

#[test]
fn test_patrol_over_void_never_commits_a_waypoint() {
    let mut sim = flat_sim(42);
    sim.app.insert_resource(SpatialIndex::new(FlatWorld::void()));
    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);

    for _ in 0..60 {
        sim.tick(DT);
        assert!(matches!(
            sim.behavior_state(hostile),
            Some(AiState::Patrol { waypoint: None })
        ));
    }
    assert_eq!(sim.movement_speed(hostile), 0.0);
}
