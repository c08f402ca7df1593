//! HitScan: мгновенный луч против мира
//!
//! `run(angle)` → упорядоченный список поражённых тел / клеток.
//! Конфигурация создаётся один раз на оружие, между выстрелами состояния нет.
//!
//! Порядок:
//! 1. Ray-march из позиции source
//! 2. Blocking тела из пройденных клеток → точные пересечения → sort по дистанции
//! 3. Nearest-first: `damage = power × (floor(rand × accuracy) + 1)`, fade, penetration
//! 4. Spatter cue в точке попадания (или на стене при промахе)
//! 5. Ненулевой урон destroyable целям → hit record

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::damage::HitRecord;
use super::events::EffectKind;
use super::outbox::CombatOutbox;
use crate::components::BodyFlags;
use crate::world::{BodyIndex, LevelGrid};

/// Cue смещается чуть назад по лучу, чтобы не утонуть в стене/спрайте
pub const IMPACT_CUE_OFFSET: f32 = 0.05;

/// Пробитие: вторичные цели рядом с первой получают ослабленный урон
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Penetration {
    /// Радиус от первой поражённой цели
    pub radius: f32,
    pub fade: f32,
}

/// Мир, против которого стреляют (только чтение)
#[derive(Clone, Copy)]
pub struct RayWorld<'a> {
    pub grid: &'a LevelGrid,
    pub bodies: &'a BodyIndex,
}

/// Что поразил луч
#[derive(Debug, Clone, PartialEq)]
pub enum Strike {
    Body {
        entity: Entity,
        point: Vec2,
        distance: f32,
        damage: f32,
    },
    Wall {
        cell: IVec2,
        point: Vec2,
        distance: f32,
    },
}

impl Strike {
    pub fn distance(&self) -> f32 {
        match self {
            Strike::Body { distance, .. } | Strike::Wall { distance, .. } => *distance,
        }
    }

    pub fn body(&self) -> Option<Entity> {
        match self {
            Strike::Body { entity, .. } => Some(*entity),
            Strike::Wall { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitScan {
    /// Владелец луча (не owned, может быть None у брошенного взрыва)
    pub source: Option<Entity>,
    pub power: f32,
    /// `None` = без ограничения
    pub range: Option<f32>,
    /// ≥ 1
    pub accuracy: u32,
    pub fade: bool,
    pub penetration: Option<Penetration>,
    pub instant_kill: bool,
    /// Луч от взрыва (explosion-immune цели не получают урон)
    pub explosive: bool,
}

impl HitScan {
    /// Нормализует конфиг: accuracy 0 → 1, non-positive range → unbounded
    pub fn new(source: Option<Entity>, power: f32, range: Option<f32>, accuracy: u32) -> Self {
        Self {
            source,
            power,
            range: range.filter(|range| *range > 0.0),
            accuracy: accuracy.max(1),
            fade: false,
            penetration: None,
            instant_kill: false,
            explosive: false,
        }
    }

    pub fn with_fade(mut self, fade: bool) -> Self {
        self.fade = fade;
        self
    }

    pub fn with_penetration(mut self, penetration: Option<Penetration>) -> Self {
        self.penetration = penetration;
        self
    }

    pub fn with_instant_kill(mut self, instant_kill: bool) -> Self {
        self.instant_kill = instant_kill;
        self
    }

    pub fn explosive(mut self) -> Self {
        self.explosive = true;
        self
    }

    pub fn max_range(&self) -> f32 {
        self.range.unwrap_or(f32::INFINITY)
    }

    /// `power × (floor(rand × accuracy) + 1)`
    pub fn roll_damage(&self, rng: &mut impl Rng) -> f32 {
        self.power * accuracy_roll(self.accuracy, rng) as f32
    }

    /// Выстрел из позиции source. Source вне мира → пустой результат
    pub fn run(
        &self,
        angle: f32,
        world: RayWorld,
        rng: &mut impl Rng,
        outbox: &mut CombatOutbox,
    ) -> Vec<Strike> {
        let Some(origin) = self
            .source
            .and_then(|source| world.bodies.get(source))
            .map(|body| body.position)
        else {
            return Vec::new();
        };
        self.run_from(origin, angle, world, rng, outbox)
    }

    /// Выстрел из произвольной точки (взрывы)
    pub fn run_from(
        &self,
        origin: Vec2,
        angle: f32,
        world: RayWorld,
        rng: &mut impl Rng,
        outbox: &mut CombatOutbox,
    ) -> Vec<Strike> {
        let cast = world.grid.cast_ray(origin, angle, world.bodies);
        let range = self.max_range();
        let cue_offset = -cast.direction * IMPACT_CUE_OFFSET;

        let mut collisions: Vec<_> = cast
            .bodies
            .iter()
            .filter_map(|entity| world.bodies.get(*entity))
            .filter(|body| body.blocking && Some(body.entity) != self.source)
            .filter_map(|body| body.ray_collision(origin, cast.end).map(|hit| (body, hit)))
            .collect();
        collisions.sort_by(|a, b| a.1.distance.total_cmp(&b.1.distance));

        let first_position = collisions.first().map(|(body, _)| body.position);
        let mut strikes = Vec::new();

        for (index, (body, hit)) in collisions.iter().enumerate() {
            if hit.distance > range {
                break;
            }

            let mut damage = self.roll_damage(rng);
            if self.fade && range.is_finite() {
                damage *= (range - hit.distance) / range;
            }
            if index > 0 {
                damage = match (self.penetration, first_position) {
                    (Some(penetration), Some(first))
                        if body.position.distance(first) <= penetration.radius =>
                    {
                        damage * penetration.fade / index as f32
                    }
                    _ => 0.0,
                };
            }

            strikes.push(Strike::Body {
                entity: body.entity,
                point: hit.point,
                distance: hit.distance,
                damage,
            });

            if !body.flags.contains(BodyFlags::OWN_IMPACT_CUE) {
                outbox.effect(EffectKind::Spatter, hit.point + cue_offset, self.source);
            }

            let immune = self.explosive && body.flags.contains(BodyFlags::EXPLOSION_IMMUNE);
            if damage > 0.0 && body.flags.contains(BodyFlags::DESTROYABLE) && !immune {
                outbox.hit(
                    body.entity,
                    self.source,
                    HitRecord {
                        damage,
                        angle,
                        instant_kill: self.instant_kill,
                    },
                );
            }
        }

        if strikes.is_empty() && !cast.hit_edge() && cast.distance <= range {
            strikes.push(Strike::Wall {
                cell: cast.terminal_cell,
                point: cast.end,
                distance: cast.distance,
            });
            outbox.effect(EffectKind::Spatter, cast.end + cue_offset, self.source);
        }

        strikes
    }
}

/// `floor(rand × accuracy) + 1` ∈ [1, accuracy]
pub fn accuracy_roll(accuracy: u32, rng: &mut impl Rng) -> u32 {
    let accuracy = accuracy.max(1);
    let roll = (rng.gen::<f32>() * accuracy as f32).floor() as u32;
    roll.min(accuracy - 1) + 1
}
