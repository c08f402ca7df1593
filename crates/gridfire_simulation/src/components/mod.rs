//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: живые акторы (Actor, Health, Prone, Settled)
//! - world: физические тела в grid мире (Body, BodyKind, BodyFlags)

pub mod actor;
pub mod world;

// Re-exports для удобного импорта
pub use actor::*;
pub use world::*;
