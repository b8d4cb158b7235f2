//! Behavior systems.

pub mod fsm;
pub mod movement;
pub mod reactions;
