//! Combat events
//!
//! Resolver'ы пишут в `CombatOutbox`, `flush_combat_outbox` превращает буфер в эти события.
//! Хост (рендер, звук, UI) читает события и ничего не пишет обратно.

use bevy::prelude::*;

use super::damage::HitRecord;

/// Hit record долетел до цели (ляжет в её DamageAccumulator)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct HitLanded {
    pub target: Entity,
    pub source: Option<Entity>,
    pub record: HitRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// One-shot spatter в точке попадания
    Spatter,
    /// Ambient cue в центре взрыва
    Explosion,
}

/// Визуальный cue
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EffectSpawned {
    pub kind: EffectKind,
    pub position: Vec2,
    pub source: Option<Entity>,
}

/// Вспышка света (взрывы)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct FlashRequested {
    pub position: Vec2,
    pub intensity: f32,
}

/// Тряска экрана для viewer'а
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ShakeRequested {
    pub amount: f32,
}

/// Логический звук по имени. Хост сам решает что и как играть
#[derive(Event, Debug, Clone, PartialEq)]
pub enum SoundCommand {
    Play {
        name: String,
        position: Option<Vec2>,
        looped: bool,
    },
    Stop {
        name: String,
    },
}

/// Запрос на выстрел снарядом из пула launcher'а
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ProjectileLaunch {
    pub launcher: Entity,
    pub angle: f32,
    pub damage: f32,
}

/// Враг выронил предмет
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ItemDropped {
    pub item: String,
    pub position: Vec2,
    pub angle: f32,
}

/// Взрыв разбудил лежащее тело (снова тикает, пока не успокоится)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyAwakened {
    pub entity: Entity,
}

/// Актор получил collapsed урон за tick (ровно одно событие на tick)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ActorHurt {
    pub entity: Entity,
    pub damage: f32,
    pub angle: f32,
    pub instant_kill: bool,
    /// Сколько hit records схлопнулось
    pub hits: usize,
}

/// Враг перешёл в Dead
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyDied {
    pub entity: Entity,
    /// true: тело разнесло взрывом, false: легло prone
    pub exploded: bool,
}
