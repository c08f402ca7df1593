//! Perception: line of sight до игрока через grid ray-march.

use bevy::prelude::*;

use crate::components::Actor;
use crate::world::{BodyIndex, LevelGrid};

/// Поворачивает актора к игроку и стреляет одним лучом вперёд
///
/// Игрок найден, только если он жив, попал в encountered bodies луча и
/// стена, в которую упёрся луч, дальше последней известной дистанции до игрока.
pub fn find_player(
    origin: Vec2,
    actor: &mut Actor,
    last_distance: f32,
    grid: &LevelGrid,
    bodies: &BodyIndex,
) -> bool {
    let Some(player) = bodies.player() else {
        return false;
    };
    if !player.alive {
        return false;
    }

    actor.face(origin, player.position);
    let cast = grid.cast_ray(origin, actor.heading, bodies);
    cast.encountered(player.entity) && cast.distance > last_distance
}

/// То же без поворота: виден ли игрок из `origin` прямо сейчас
pub fn sees_player(origin: Vec2, grid: &LevelGrid, bodies: &BodyIndex) -> bool {
    let Some(player) = bodies.player() else {
        return false;
    };
    if !player.alive {
        return false;
    }

    let to = player.position - origin;
    let cast = grid.cast_ray(origin, to.y.atan2(to.x), bodies);
    cast.encountered(player.entity) && cast.distance > player.distance_to(origin)
}
