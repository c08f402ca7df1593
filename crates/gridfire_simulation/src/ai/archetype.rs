//! Archetypes: закрытый набор attack strategies + сборка врагов из профилей
//!
//! Хуки `attack` / `on_attack_complete` / `on_hurt_complete` диспатчатся match'ем
//! по `AttackStrategy` (см. `behavior.rs`), "непереопределённого хука" не бывает.

use bevy::prelude::*;

use super::components::{AttackBudget, AttackSpec, Enemy, EnemyState, StainProgress, StateTimers};
use crate::combat::{spawn_projectile_pool, Explosion, HitScan, DEFAULT_EXPLOSION_RAYS};
use crate::components::{Actor, Body, BodyFlags, BodyKind, Health};
use crate::config::{ArchetypeProfile, EnemyProfile, SimulationConfig};
use crate::logger;
use crate::navigation::GraphIndex;

/// Как враг наносит урон
///
/// HitScan'ы аллоцируются один раз при сборке врага, не на выстрел.
#[derive(Debug, Clone, PartialEq)]
pub enum AttackStrategy {
    /// Короткий луч в упор
    Melee { strike: HitScan },
    /// Веер дробин: (луч, смещение от угла прицела)
    HitScan { pellets: Vec<(HitScan, f32)> },
    /// Снаряд из пула на launcher'е
    Projectile { speed: f32 },
}

/// Тег archetype без данных (для dispatch хуков)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchetypeKind {
    Melee,
    HitScan,
    Projectile,
}

impl AttackStrategy {
    pub fn kind(&self) -> ArchetypeKind {
        match self {
            AttackStrategy::Melee { .. } => ArchetypeKind::Melee,
            AttackStrategy::HitScan { .. } => ArchetypeKind::HitScan,
            AttackStrategy::Projectile { .. } => ArchetypeKind::Projectile,
        }
    }

    pub fn is_projectile(&self) -> bool {
        self.kind() == ArchetypeKind::Projectile
    }
}

impl Enemy {
    /// Враг из нормализованного профиля. `me`: entity самого врага (source лучей)
    pub(crate) fn from_profile(profile: &EnemyProfile, me: Entity, explosion_rays: usize) -> Self {
        let attack = AttackSpec {
            power: profile.attack.power,
            accuracy: profile.attack.accuracy.max(1),
            range: profile.attack.range.filter(|range| *range > 0.0),
            pellets: profile.attack.pellets,
            spread: profile.attack.spread,
        };

        let template = HitScan::new(Some(me), attack.power, attack.range, attack.accuracy)
            .with_fade(profile.attack.fade)
            .with_penetration(profile.attack.penetration)
            .with_instant_kill(profile.attack.instant_kill);

        let strategy = match &profile.archetype {
            ArchetypeProfile::Melee => AttackStrategy::Melee { strike: template },
            ArchetypeProfile::HitScan => AttackStrategy::HitScan {
                pellets: attack
                    .pellet_offsets()
                    .into_iter()
                    .map(|offset| (template.clone(), offset))
                    .collect(),
            },
            ArchetypeProfile::Projectile { speed, .. } => AttackStrategy::Projectile { speed: *speed },
        };

        Self {
            name: profile.name.clone(),
            state: EnemyState::Idle,
            timers: StateTimers::default(),
            thresholds: profile.timers,
            attack,
            strategy,
            path: Vec::new(),
            path_index: 0,
            budget: AttackBudget::new(profile.attack_budget),
            evade_destination: None,
            explosion: profile
                .death_explosion
                .as_ref()
                .map(|explosion| Explosion::new(Some(me), explosion, explosion_rays)),
            bobbing: profile.bobbing,
            bob_phase: 0.0,
            graph: profile.graph,
            surrounding_open: profile.surrounding_open,
            player_distance: f32::INFINITY,
            stain: StainProgress::default(),
            drop: profile.drop.clone(),
            gibbed: false,
        }
    }
}

/// Спавнит врага по профилю (+ пул снарядов для projectile archetype)
pub fn spawn_enemy(world: &mut World, profile: &EnemyProfile, position: Vec2) -> Entity {
    let mut profile = profile.clone();
    profile.normalize();

    let explosion_rays = world
        .get_resource::<SimulationConfig>()
        .map(|config| config.explosion_ray_count)
        .unwrap_or(DEFAULT_EXPLOSION_RAYS);

    let entity = world.spawn_empty().id();
    let enemy = Enemy::from_profile(&profile, entity, explosion_rays);

    let mut flags = BodyFlags::DESTROYABLE;
    if profile.explosion_immune {
        flags |= BodyFlags::EXPLOSION_IMMUNE;
    }
    if profile.graph == GraphIndex::Floater {
        flags |= BodyFlags::HOVERING;
    }
    let body = Body::new(BodyKind::Enemy, position, profile.width, profile.length).with_flags(flags);
    let actor = Actor::new(profile.speed).with_acceleration(profile.acceleration);

    world
        .entity_mut(entity)
        .insert((enemy, actor, Health::new(profile.health), body));

    if let ArchetypeProfile::Projectile {
        speed,
        pool_size,
        radius,
        explosion,
    } = &profile.archetype
    {
        spawn_projectile_pool(
            world,
            entity,
            *pool_size,
            *speed,
            *radius,
            explosion.as_ref(),
            explosion_rays,
        );
    }

    logger::log_info(&format!(
        "Enemy '{}' spawned: {:?} at ({:.1}, {:.1})",
        profile.name, entity, position.x, position.y
    ));
    entity
}
