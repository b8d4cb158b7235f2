//! Headless HAVENFALL simulation run.
//!
//! Spawns one hostile and one intruder on a flat test world and drives the
//! tick loop for a few simulated seconds, logging behavior transitions.

use bevy::prelude::*;
use havenfall_simulation::{
    spawn_hostile, spawn_intruder, FlatWorld, Simulation, SpatialIndex,
};

fn main() {
    let seed = 42;
    println!("Starting HAVENFALL headless simulation (seed: {})", seed);

    let mut sim = Simulation::new(seed);
    sim.app.insert_resource(SpatialIndex::new(
        FlatWorld::default().with_obstacle(Vec3::new(0.0, 1.5, -8.0), Vec3::new(4.0, 3.0, 0.5)),
    ));

    let hostile = spawn_hostile(sim.app.world_mut(), Vec3::ZERO, 1);
    let intruder = spawn_intruder(sim.app.world_mut(), Vec3::new(0.0, 0.0, -12.0), 2);

    // 20 simulated seconds at 60 Hz
    for tick in 0..1200u32 {
        sim.tick(1.0 / 60.0);

        if tick % 120 == 0 {
            let state = sim
                .behavior_state(hostile)
                .map(|s| s.name())
                .unwrap_or("despawned");
            println!(
                "t={:5.1}s hostile: {} (attacking: {}, speed: {:.1})",
                tick as f32 / 60.0,
                state,
                sim.is_attacking(hostile),
                sim.movement_speed(hostile),
            );
        }

        // Halfway through, the intruder fires a shot into the air
        if tick == 600 {
            sim.loud_noise(Vec3::new(6.0, 0.0, -6.0));
            println!("-- gunshot near the hostile --");
        }
    }

    let intruder_alive = sim.app.world().get_entity(intruder).is_ok();
    println!("Simulation complete! (intruder alive: {})", intruder_alive);
}
