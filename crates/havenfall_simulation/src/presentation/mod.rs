//! Presentation sink: semantic animation/audio events for the host engine.
//!
//! Change-detected, not per-tick: the host only hears about locomotion speed
//! crossings, attack start/stop, and death. Death is terminal and emitted
//! exactly once per entity.

use bevy::prelude::*;

use crate::combat::{BurstState, Dead};
use crate::components::{Actor, NavVelocity};
use crate::SimSet;

/// Speed changes below this are noise, not animation-relevant (m/s).
const SPEED_EPSILON: f32 = 0.01;

/// Semantic animation cue for the host engine.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum PresentationEvent {
    /// Locomotion speed changed (blend walk/run cycles).
    MovementSpeed { entity: Entity, speed: f32 },
    /// Attack loop started or stopped.
    Attacking { entity: Entity, attacking: bool },
    /// Death animation trigger. Sent once.
    DeathTriggered { entity: Entity },
}

/// Last values reported to the host, per entity.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct PresentationState {
    pub speed: f32,
    pub attacking: bool,
    pub death_sent: bool,
}

pub struct PresentationPlugin;

impl Plugin for PresentationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PresentationEvent>()
            .add_systems(Update, emit_presentation_events.in_set(SimSet::Present));
    }
}

/// System: diff simulation state against the last reported values.
pub fn emit_presentation_events(
    mut actors: Query<
        (
            Entity,
            &NavVelocity,
            &BurstState,
            Option<&Dead>,
            &mut PresentationState,
        ),
        With<Actor>,
    >,
    mut events: EventWriter<PresentationEvent>,
) {
    for (entity, velocity, burst, dead, mut reported) in actors.iter_mut() {
        if dead.is_some() {
            if !reported.death_sent {
                reported.death_sent = true;
                if reported.speed != 0.0 {
                    reported.speed = 0.0;
                    events.write(PresentationEvent::MovementSpeed { entity, speed: 0.0 });
                }
                if reported.attacking {
                    reported.attacking = false;
                    events.write(PresentationEvent::Attacking {
                        entity,
                        attacking: false,
                    });
                }
                events.write(PresentationEvent::DeathTriggered { entity });
            }
            continue;
        }

        let speed = velocity.linvel.length();
        if (speed - reported.speed).abs() > SPEED_EPSILON {
            reported.speed = speed;
            events.write(PresentationEvent::MovementSpeed { entity, speed });
        }

        if burst.in_progress != reported.attacking {
            reported.attacking = burst.in_progress;
            events.write(PresentationEvent::Attacking {
                entity,
                attacking: burst.in_progress,
            });
        }
    }
}
