//! HAVENFALL Simulation Core
//!
//! ECS simulation of hostile NPCs on Bevy 0.16 (strategic layer, headless).
//!
//! Architecture:
//! - ECS owns game state: sensing memory, behavior FSM, combat timers, health
//! - The host engine owns tactics: rendering, animation, real navigation, physics
//! - Boundary crossings are events (`LoudNoise`, `PresentationEvent`, damage)
//!   and one injected trait object for spatial queries (`SpatialIndex`)
//!
//! The whole simulation advances through one explicit entry point,
//! [`Simulation::tick`], fed synthetic time deltas by the owning scheduler.
//! No system reads wall-clock time, so runs with the same seed and the same
//! tick sequence are reproducible.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod ai;
pub mod combat;
pub mod components;
pub mod logger;
pub mod movement;
pub mod presentation;
pub mod sensing;
pub mod spatial;

// Re-export the working set so callers don't chase module paths
pub use ai::{AiConfig, AiPlugin, AiState};
pub use combat::{
    AccuracyState, BurstState, CombatPlugin, DamageDealt, DamageInflicted, Dead, DespawnAfter,
    EntityDied, ImpactImpulse, RangedWeapon, ShotFired,
};
pub use components::*;
pub use movement::MovementPlugin;
pub use presentation::{PresentationEvent, PresentationPlugin, PresentationState};
pub use sensing::{LoudNoise, MemoryTrace, Perception, SensingPlugin, SensorConfig, SensoryMemory};
pub use spatial::{Aabb, FlatWorld, RayHit, SpatialIndex, SpatialQuery};

/// Simulation clock, advanced once per [`Simulation::tick`].
///
/// `now` is monotonic non-decreasing; every timer in the crate (sensory
/// memory, burst fire, despawn delays) compares against it instead of
/// suspending. That keeps multi-step sequences cancellable and testable.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTime {
    /// Seconds since simulation start.
    pub now: f64,
    /// Delta of the current tick (seconds).
    pub delta: f32,
    /// Tick counter.
    pub tick: u64,
}

impl SimTime {
    pub fn advance(&mut self, delta: f32) {
        self.delta = delta.max(0.0);
        self.now += self.delta as f64;
        self.tick += 1;
    }
}

/// Deterministic RNG resource (seeded).
///
/// All simulation randomness (patrol waypoints, shot spread) draws from this
/// stream; never `thread_rng` inside systems.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Tick phases, chained for a deterministic single-owner-per-tick order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Refresh visibility/audibility and sensory memory.
    Sense,
    /// FSM transitions + movement/facing commands.
    Decide,
    /// Combat: burst scheduling, hit resolution, damage, death.
    Act,
    /// Navigation executor advances transforms.
    Navigate,
    /// Emit semantic presentation events.
    Present,
}

/// Main simulation plugin (wires all subsystems).
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimTime>()
            .init_resource::<DeterministicRng>()
            .init_resource::<SpatialIndex>()
            .configure_sets(
                Update,
                (
                    SimSet::Sense,
                    SimSet::Decide,
                    SimSet::Act,
                    SimSet::Navigate,
                    SimSet::Present,
                )
                    .chain(),
            )
            .add_plugins((
                SensingPlugin,
                AiPlugin,
                CombatPlugin,
                MovementPlugin,
                PresentationPlugin,
            ));
    }
}

/// Creates a minimal Bevy App for headless simulation.
pub fn create_headless_app(seed: u64) -> App {
    logger::init();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(SimulationPlugin);

    app
}

/// Owning handle around the headless app: the external API surface.
///
/// The scheduler that owns this struct drives [`Simulation::tick`]; everything
/// the outside world is allowed to push in (damage, loud noises) or read back
/// (state, attack flag, speed) goes through here.
pub struct Simulation {
    pub app: App,
}

impl Simulation {
    pub fn new(seed: u64) -> Self {
        Self {
            app: create_headless_app(seed),
        }
    }

    /// Advance the simulation by one tick of `delta` seconds.
    pub fn tick(&mut self, delta: f32) {
        self.app
            .world_mut()
            .resource_mut::<SimTime>()
            .advance(delta);
        self.app.update();
    }

    /// External damage entry point (player weapons, hazards).
    ///
    /// Records a damage-source observation and forces re-evaluation out of
    /// Patrol on the next tick. Redundant calls after death are no-ops.
    pub fn take_damage(&mut self, target: Entity, amount: f32, source: Option<Vec3>) {
        self.app.world_mut().send_event(DamageInflicted {
            target,
            amount,
            attacker: None,
            source_position: source,
        });
    }

    /// Sound-broadcast entry point: a loud noise (gunshot) at `position`.
    ///
    /// Fan-out to every live agent happens through the event queue, so agents
    /// spawned or despawned mid-broadcast never invalidate the dispatch.
    /// External noises carry no emitter cap; each listener gates on its own
    /// hearing range.
    pub fn loud_noise(&mut self, position: Vec3) {
        self.app.world_mut().send_event(LoudNoise {
            position,
            source: None,
            range: f32::INFINITY,
        });
    }

    /// Read-only introspection for UI/debug/tests.
    pub fn behavior_state(&self, entity: Entity) -> Option<AiState> {
        self.app.world().get::<AiState>(entity).cloned()
    }

    pub fn is_attacking(&self, entity: Entity) -> bool {
        self.app
            .world()
            .get::<BurstState>(entity)
            .map(|b| b.in_progress)
            .unwrap_or(false)
    }

    pub fn movement_speed(&self, entity: Entity) -> f32 {
        self.app
            .world()
            .get::<NavVelocity>(entity)
            .map(|v| v.linvel.length())
            .unwrap_or(0.0)
    }
}

/// Spawn a hostile NPC with the full sensing/FSM/combat kit.
pub fn spawn_hostile(world: &mut World, position: Vec3, faction_id: u64) -> Entity {
    world
        .spawn((
            Transform::from_translation(position),
            Actor { faction_id },
            Health::default(),
            AiState::default(),
            AiConfig::default(),
            SensorConfig::default(),
            SensoryMemory::default(),
            Perception::default(),
            RangedWeapon::default(),
            BurstState::default(),
            AccuracyState::default(),
            MovementCommand::Idle,
            MovementSpeed::default(),
            NavVelocity::default(),
            PresentationState::default(),
        ))
        .id()
}

/// Spawn a plain actor (player stand-in): position, health, stance, movement.
pub fn spawn_intruder(world: &mut World, position: Vec3, faction_id: u64) -> Entity {
    world
        .spawn((
            Transform::from_translation(position),
            Actor { faction_id },
            Health::default(),
            Stance::default(),
            MovementCommand::Idle,
            MovementSpeed::default(),
            NavVelocity::default(),
        ))
        .id()
}
