//! Burst-fire driver and hit resolution.

use std::f32::consts::TAU;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use rand::Rng;

use crate::ai::AiState;
use crate::components::{Actor, Health};
use crate::sensing::LoudNoise;
use crate::spatial::{ray_sphere, SpatialIndex};
use crate::{DeterministicRng, SimTime};

use super::{
    AccuracyState, BurstState, DamageInflicted, ImpactImpulse, RangedWeapon, ShotFired,
};

/// Aim point offset above a target's origin (torso height, meters).
const TORSO_OFFSET: f32 = 1.0;

/// Hit-test radius of an actor body (meters).
const BODY_RADIUS: f32 = 0.5;

/// Seconds after the last shot before accumulated spread starts draining.
const RECOVERY_GRACE: f64 = 1.0;

/// Everything a single shot needs: potential victims, world geometry, the
/// seeded spread stream, and the outgoing event queues.
#[derive(SystemParam)]
pub struct ShotResolver<'w, 's> {
    targets: Query<'w, 's, (Entity, &'static Transform, &'static Health), With<Actor>>,
    spatial: Res<'w, SpatialIndex>,
    rng: ResMut<'w, DeterministicRng>,
    shots: EventWriter<'w, ShotFired>,
    noises: EventWriter<'w, LoudNoise>,
    damage: EventWriter<'w, DamageInflicted>,
    impulses: EventWriter<'w, ImpactImpulse>,
}

impl ShotResolver<'_, '_> {
    /// Committed burst target, if it is still there and alive.
    fn living_target(&self, target: Entity) -> Option<Vec3> {
        self.targets
            .get(target)
            .ok()
            .filter(|(_, _, health)| health.is_alive())
            .map(|(_, transform, _)| transform.translation)
    }

    /// Fire one hitscan shot at `target` and resolve the nearest hit.
    fn fire(
        &mut self,
        shooter: Entity,
        shooter_transform: &Transform,
        target: Entity,
        weapon: &RangedWeapon,
        accuracy: &mut AccuracyState,
        now: f64,
    ) {
        let Some(target_position) = self.living_target(target) else {
            return;
        };

        accuracy.bump(weapon, now);

        let muzzle = shooter_transform.translation + Vec3::Y * weapon.muzzle_height;
        let aim_point = target_position + Vec3::Y * TORSO_OFFSET;
        let to_target = aim_point - muzzle;
        let distance = to_target.length();
        if distance < 1e-4 {
            return;
        }

        let spread_degrees = weapon.base_inaccuracy
            + accuracy.current_inaccuracy
            + distance * weapon.distance_falloff;
        let direction = perturb_direction(to_target / distance, spread_degrees, &mut self.rng);

        self.shots.write(ShotFired {
            shooter,
            origin: muzzle,
            direction,
        });
        self.noises.write(LoudNoise {
            position: muzzle,
            source: Some(shooter),
            range: weapon.hearing_range,
        });

        // Nearest obstruction along the ray, world geometry and actors alike
        let mut hit_distance = self
            .spatial
            .raycast(muzzle, direction, weapon.range)
            .map(|hit| hit.distance)
            .unwrap_or(f32::INFINITY);
        let mut hit_actor: Option<Entity> = None;

        for (candidate, candidate_transform, candidate_health) in self.targets.iter() {
            if candidate == shooter || !candidate_health.is_alive() {
                continue;
            }
            let center = candidate_transform.translation + Vec3::Y * TORSO_OFFSET;
            if let Some(t) = ray_sphere(muzzle, direction, center, BODY_RADIUS) {
                if t <= weapon.range && t < hit_distance {
                    hit_distance = t;
                    hit_actor = Some(candidate);
                }
            }
        }

        let Some(victim) = hit_actor else {
            return;
        };

        let point = muzzle + direction * hit_distance;
        self.damage.write(DamageInflicted {
            target: victim,
            amount: weapon.bullet_damage,
            attacker: Some(shooter),
            source_position: Some(shooter_transform.translation),
        });
        self.impulses.write(ImpactImpulse {
            target: victim,
            point,
            impulse: direction * weapon.impact_impulse,
        });

        if victim != target {
            crate::logger::log(&format!("🔫 {shooter:?} hit bystander {victim:?}"));
        }
    }
}

/// System: start, advance, and finish fire bursts.
///
/// A burst starts when the FSM sits in Attack and the cooldown has lapsed;
/// from then on the burst owns the target reference. The FSM dropping out of
/// Attack does not stop scheduled shots, only the committed target dying (or
/// despawning) does.
pub fn drive_bursts(
    mut shooters: Query<
        (
            Entity,
            &Transform,
            &AiState,
            &Health,
            &RangedWeapon,
            &mut BurstState,
            &mut AccuracyState,
        ),
        With<Actor>,
    >,
    mut resolver: ShotResolver,
    time: Res<SimTime>,
) {
    let now = time.now;

    for (shooter, transform, state, health, weapon, mut burst, mut accuracy) in
        shooters.iter_mut()
    {
        if !health.is_alive() {
            if burst.in_progress {
                burst.clear();
            }
            continue;
        }

        if let AiState::Attack { target } = state {
            if burst.can_start(now) {
                burst.start(*target, now);
                crate::logger::log(&format!("🔫 {shooter:?} opens fire on {target:?}"));
            }
        }

        if !burst.in_progress || now < burst.next_shot_at {
            continue;
        }

        let Some(target) = burst.target.filter(|&t| resolver.living_target(t).is_some())
        else {
            // Target gone mid-burst; stop and take the normal cooldown
            burst.finish(now, weapon.time_between_attacks);
            continue;
        };

        resolver.fire(shooter, transform, target, weapon, &mut accuracy, now);

        burst.shots_fired += 1;
        if burst.shots_fired >= weapon.burst_size {
            burst.finish(now, weapon.time_between_attacks);
        } else {
            burst.next_shot_at = now + weapon.time_between_shots as f64;
        }
    }
}

/// Perturb `base` (unit vector) by a random cone of up to `spread_degrees`.
///
/// Polar sampling in the plane perpendicular to the aim line; uniform angle,
/// uniform magnitude within the cone half-angle.
fn perturb_direction(base: Vec3, spread_degrees: f32, rng: &mut DeterministicRng) -> Vec3 {
    let spread = spread_degrees.to_radians();
    if spread <= 0.0 {
        return base;
    }

    let mut right = base.cross(Vec3::Y);
    if right.length_squared() < 1e-6 {
        // Shooting straight up/down; any perpendicular basis works
        right = Vec3::X;
    }
    let right = right.normalize();
    let up = right.cross(base);

    let theta: f32 = rng.rng.gen_range(0.0..TAU);
    let magnitude: f32 = rng.rng.gen_range(0.0..spread);
    let offset = (right * theta.cos() + up * theta.sin()) * magnitude.sin();

    (base + offset).normalize()
}

/// System: drain accumulated spread once the shooter has held fire.
///
/// Recovery waits out a grace period after the last shot and never runs
/// mid-burst, so a full burst lands with its intended degradation curve.
pub fn recover_accuracy(
    mut shooters: Query<(&RangedWeapon, &BurstState, &mut AccuracyState)>,
    time: Res<SimTime>,
) {
    for (weapon, burst, mut accuracy) in shooters.iter_mut() {
        if burst.in_progress || accuracy.current_inaccuracy <= 0.0 {
            continue;
        }
        if time.now - accuracy.last_shot_at <= RECOVERY_GRACE {
            continue;
        }
        accuracy.current_inaccuracy =
            (accuracy.current_inaccuracy - weapon.accuracy_recovery_speed * time.delta).max(0.0);
    }
}
