//! Projectile: pooled снаряд
//!
//! Lifecycle: `Idle` (в пуле, вне мира) → `Travelling` → `Colliding` → `Idle`.
//! Снаряды спавнятся один раз вместе с launcher'ом и только циркулируют через пул.
//! Урон выставляется при запуске, не при конструировании.

use std::collections::VecDeque;

use bevy::prelude::*;

use super::explosion::Explosion;
use crate::components::{Body, BodyKind};
use crate::config::ExplosionProfile;
use crate::world::{BodyIndex, BodySnapshot, LevelGrid};

/// Зазор между launcher'ом и снарядом при спавне
pub const LAUNCH_CLEARANCE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectileState {
    #[default]
    Idle,
    Travelling,
    Colliding,
}

#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub state: ProjectileState,
    pub velocity: Vec2,
    pub speed: f32,
    pub damage: f32,
    /// Launcher текущего полёта (weak: очищается при возврате в пул)
    pub source: Option<Entity>,
    /// Пул, в который снаряд вернётся
    pub pool: Entity,
    pub explosion: Option<Explosion>,
}

impl Projectile {
    pub fn is_travelling(&self) -> bool {
        self.state == ProjectileState::Travelling
    }
}

/// Fixed-capacity free list снарядов (живёт на launcher'е)
#[derive(Component, Debug, Clone, Default)]
pub struct ProjectilePool {
    free: VecDeque<Entity>,
    capacity: usize,
}

impl ProjectilePool {
    pub fn new(members: Vec<Entity>) -> Self {
        Self {
            capacity: members.len(),
            free: members.into(),
        }
    }

    pub fn acquire(&mut self) -> Option<Entity> {
        self.free.pop_front()
    }

    pub fn release(&mut self, projectile: Entity) {
        if self.free.len() < self.capacity && !self.free.contains(&projectile) {
            self.free.push_back(projectile);
        }
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Куда упёрся снаряд за шаг
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileImpact {
    Body {
        entity: Entity,
        point: Vec2,
        normal: Vec2,
    },
    Wall {
        cell: IVec2,
        point: Vec2,
    },
}

impl ProjectileImpact {
    pub fn point(&self) -> Vec2 {
        match self {
            ProjectileImpact::Body { point, .. } | ProjectileImpact::Wall { point, .. } => *point,
        }
    }
}

/// Стартовая позиция снаряда перед launcher'ом
///
/// Если снаряд оказался бы в стене: спавним в позиции launcher'а.
pub fn launch_position(launcher: &BodySnapshot, angle: f32, radius: f32, grid: &LevelGrid) -> Vec2 {
    let offset = launcher.radius() + radius + LAUNCH_CLEARANCE;
    let candidate = launcher.position + Vec2::from_angle(angle) * offset;
    if grid.embeds_solid(candidate, Vec2::splat(radius)) {
        launcher.position
    } else {
        candidate
    }
}

/// Первое blocking столкновение на шаге `position → position + step`
///
/// Launcher и сам снаряд игнорируются.
pub fn find_impact(
    position: Vec2,
    step: Vec2,
    ignore: &[Entity],
    grid: &LevelGrid,
    bodies: &BodyIndex,
) -> Option<ProjectileImpact> {
    let length = step.length();
    if length <= 0.0 {
        return None;
    }

    let cast = grid.cast_ray(position, step.y.atan2(step.x), bodies);
    let reach = length.min(cast.distance);
    let end = position + cast.direction * reach;

    let body_impact = cast
        .bodies
        .iter()
        .filter_map(|entity| bodies.get(*entity))
        .filter(|body| body.blocking && body.kind != BodyKind::Projectile && !ignore.contains(&body.entity))
        .filter_map(|body| body.ray_collision(position, end).map(|hit| (body.entity, hit)))
        .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance));

    if let Some((entity, hit)) = body_impact {
        return Some(ProjectileImpact::Body {
            entity,
            point: hit.point,
            normal: hit.normal,
        });
    }

    (cast.distance <= length).then_some(ProjectileImpact::Wall {
        cell: cast.terminal_cell,
        point: cast.end,
    })
}

/// Спавнит пул снарядов для launcher'а и вешает `ProjectilePool` на него
pub fn spawn_projectile_pool(
    world: &mut World,
    launcher: Entity,
    capacity: usize,
    speed: f32,
    radius: f32,
    explosion: Option<&ExplosionProfile>,
    explosion_rays: usize,
) -> Vec<Entity> {
    let mut members = Vec::with_capacity(capacity);
    for _ in 0..capacity {
        let mut body = Body::new(BodyKind::Projectile, Vec2::ZERO, radius * 2.0, radius * 2.0);
        body.blocking = false;
        body.in_world = false;

        let projectile = Projectile {
            state: ProjectileState::Idle,
            velocity: Vec2::ZERO,
            speed,
            damage: 0.0,
            source: None,
            pool: launcher,
            explosion: explosion.map(|profile| Explosion::new(None, profile, explosion_rays)),
        };
        members.push(world.spawn((projectile, body)).id());
    }

    world
        .entity_mut(launcher)
        .insert(ProjectilePool::new(members.clone()));
    members
}
