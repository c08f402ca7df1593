//! Physics: kinematic движение по grid, коллизии, elevation
//!
//! Без физического движка: velocity интегрируем сами, стены и тела
//! проверяем по `LevelGrid` / `BodyIndex`.

use bevy::prelude::*;

pub mod movement;

pub use movement::{
    integrate_bodies, update_standing_elevation, ActorCollision, CollisionTarget, DoorBumped,
    ELEVATION_BLEND, PRONE_HEIGHT,
};

use crate::SimulationSet;

/// Plugin для kinematic движения
///
/// Регистрирует системы в FixedUpdate (SimulationSet::Motion) для детерминизма.
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ActorCollision>()
            .add_event::<DoorBumped>()
            .add_systems(
                FixedUpdate,
                (integrate_bodies, update_standing_elevation)
                    .chain()
                    .in_set(SimulationSet::Motion),
            );
    }
}
