//! Shared components (actors, movement).

pub mod actor;
pub mod movement;

pub use actor::{Actor, Health, Stance};
pub use movement::{MovementCommand, MovementSpeed, NavVelocity};
