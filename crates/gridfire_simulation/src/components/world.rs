//! World body: позиция, footprint, collision флаги
//!
//! `Body` общий для врагов, игрока, props и снарядов. Живая половина актора
//! (heading, velocity, elevation) лежит в `Actor`.

use bevy::prelude::*;
use bitflags::bitflags;

use crate::world::LevelGrid;

/// Что за тело (для typed collisions и snapshot'ов)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyKind {
    Enemy,
    Player,
    #[default]
    Prop,
    Projectile,
}

bitflags! {
    /// Свойства тела, которые читают resolver'ы
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BodyFlags: u8 {
        /// Принимает hit records
        const DESTROYABLE = 1 << 0;
        /// Игнорирует урон от explosion лучей
        const EXPLOSION_IMMUNE = 1 << 1;
        /// Тело само рисует impact cue (HitScan не спавнит spatter)
        const OWN_IMPACT_CUE = 1 << 2;
        /// Статичный prop (учитывается в весах навигации)
        const STATIC = 1 << 3;
        /// Проходит сквозь transparent клетки (floaters)
        const HOVERING = 1 << 4;
    }
}

/// Физическое тело в tile-grid мире
///
/// Footprint: axis-aligned прямоугольник `width × length` вокруг `position`.
/// `in_world = false`: тело в пуле (снаряд) или разорвано взрывом, его нет в BodyIndex.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Body {
    pub kind: BodyKind,
    pub position: Vec2,
    /// Высота над полом (prone elevation + bob)
    pub z: f32,
    pub width: f32,
    pub length: f32,
    /// Участвует в ray collisions и блокирует движение
    pub blocking: bool,
    /// Реагирует на столкновения с другими телами
    pub collision_enabled: bool,
    pub in_world: bool,
    pub flags: BodyFlags,
}

impl Default for Body {
    fn default() -> Self {
        Self::new(BodyKind::Prop, Vec2::ZERO, 0.5, 0.5)
    }
}

impl Body {
    pub fn new(kind: BodyKind, position: Vec2, width: f32, length: f32) -> Self {
        Self {
            kind,
            position,
            z: 0.0,
            width,
            length,
            blocking: true,
            collision_enabled: true,
            in_world: true,
            flags: BodyFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: BodyFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width, self.length) * 0.5
    }

    /// Collision radius (половина большей стороны footprint)
    pub fn radius(&self) -> f32 {
        self.half_extents().max_element()
    }

    pub fn cell(&self) -> IVec2 {
        LevelGrid::cell_at(self.position)
    }

    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Угол (радианы) от тела к точке
    pub fn angle_to(&self, point: Vec2) -> f32 {
        let to = point - self.position;
        to.y.atan2(to.x)
    }
}
