//! Combat: ranged resolution + damage aggregation
//!
//! - HitScan: мгновенный луч (оружие, melee удар, лучи взрыва)
//! - Explosion: кольцо HitScan лучей
//! - Projectile: pooled снаряд, превращает полёт в попадание или взрыв
//! - DamageAccumulator: все попадания за tick → один hurt
//!
//! Resolver'ы чистые: side effects пишутся в `CombatOutbox`, flush превращает их в события.

use bevy::prelude::*;

pub mod damage;
pub mod events;
pub mod explosion;
pub mod hitscan;
pub mod outbox;
pub mod projectile;
pub mod systems;

// Re-export основных типов
pub use damage::{circular_mean, CollapsedHit, DamageAccumulator, HitRecord};
pub use events::*;
pub use explosion::{Explosion, DEFAULT_EXPLOSION_RAYS};
pub use hitscan::{accuracy_roll, HitScan, Penetration, RayWorld, Strike};
pub use outbox::{flush_combat_outbox, CombatOutbox};
pub use projectile::{spawn_projectile_pool, Projectile, ProjectilePool, ProjectileState};

use crate::SimulationSet;

/// Combat Plugin
///
/// Порядок внутри tick (см. `SimulationSet`):
/// 1. Projectiles: launch из пула → полёт → столкновения → flush
/// 2. Damage: HitLanded → очереди → collapse/hurt → пробуждение тел → flush
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatOutbox>()
            .add_event::<HitLanded>()
            .add_event::<EffectSpawned>()
            .add_event::<FlashRequested>()
            .add_event::<ShakeRequested>()
            .add_event::<SoundCommand>()
            .add_event::<ProjectileLaunch>()
            .add_event::<ItemDropped>()
            .add_event::<BodyAwakened>()
            .add_event::<ActorHurt>()
            .add_event::<EnemyDied>();

        app.add_systems(
            FixedUpdate,
            (
                systems::launch_projectiles,
                systems::advance_projectiles,
                flush_combat_outbox,
            )
                .chain()
                .in_set(SimulationSet::Projectiles),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::queue_landed_hits,
                systems::resolve_damage_queues,
                flush_combat_outbox,
                systems::wake_awakened_bodies,
            )
                .chain()
                .in_set(SimulationSet::Damage),
        );
    }
}
