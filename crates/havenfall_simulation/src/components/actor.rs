//! Base actor components: Actor, Health, Stance.

use bevy::prelude::*;

/// Actor (NPC, player stand-in): base component for living entities.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health)]
pub struct Actor {
    /// Faction ID. Actors of a different faction are valid targets.
    pub faction_id: u64,
}

/// Health.
///
/// Invariant: 0.0 <= current <= max. The damage system is the sole writer;
/// everything else (sensing, FSM, combat) only reads `is_alive`.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).clamp(0.0, self.max);
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).clamp(0.0, self.max);
    }
}

/// Collaborator-reported stance: the target's current collider height.
///
/// The stance system of the host engine writes this; sensing only reads it
/// to infer crouching (height below the sensor threshold).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Stance {
    /// Collider height in meters.
    pub height: f32,
}

impl Default for Stance {
    fn default() -> Self {
        Self { height: 1.8 }
    }
}

impl Stance {
    pub fn is_crouching(&self, threshold: f32) -> bool {
        self.height < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps_to_zero() {
        let mut health = Health::new(100.0);
        health.take_damage(250.0);
        assert_eq!(health.current, 0.0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_health_heal_clamps_to_max() {
        let mut health = Health::new(100.0);
        health.take_damage(30.0);
        health.heal(500.0);
        assert_eq!(health.current, 100.0);
    }

    #[test]
    fn test_negative_damage_is_ignored() {
        let mut health = Health::new(100.0);
        health.take_damage(-10.0);
        assert_eq!(health.current, 100.0);
    }

    #[test]
    fn test_stance_crouch_threshold() {
        let standing = Stance { height: 1.8 };
        let crouched = Stance { height: 1.0 };
        assert!(!standing.is_crouching(1.2));
        assert!(crouched.is_crouching(1.2));
    }
}
