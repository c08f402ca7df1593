//! Enemy AI
//!
//! 9-state FSM (Idle → Alerted → Chasing/Aiming → Attacking → ... → Dead),
//! archetypes (Melee, HitScan, Projectile) и их хуки.
//! Всё детерминировано: rng только из `DeterministicRng`, порядок по Entity.

use bevy::prelude::*;

pub mod archetype;
pub mod behavior;
pub mod components;
pub mod evasion;
pub mod perception;
pub mod systems;

pub use archetype::{spawn_enemy, ArchetypeKind, AttackStrategy};
pub use behavior::{BehaviorContext, DeathContext, HurtOutcome, ARRIVE_EPSILON};
pub use components::*;

use crate::combat::flush_combat_outbox;
use crate::SimulationSet;

/// AI Plugin
///
/// Порядок выполнения:
/// 1. Behavior: tick_enemies → flush (attack hooks пишут HitLanded/launch)
/// 2. Reactions: reroute_on_enemy_collision (после Motion, видит ActorCollision)
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (systems::tick_enemies, flush_combat_outbox)
                .chain()
                .in_set(SimulationSet::Behavior),
        );

        app.add_systems(
            FixedUpdate,
            (systems::reroute_on_enemy_collision, flush_combat_outbox)
                .chain()
                .in_set(SimulationSet::Reactions),
        );
    }
}
