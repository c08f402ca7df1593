//! AI reaction systems (collisions между врагами).

use bevy::prelude::*;

use crate::ai::{BehaviorContext, Enemy};
use crate::combat::CombatOutbox;
use crate::components::{Actor, Body};
use crate::config::SimulationConfig;
use crate::navigation::NavGrid;
use crate::physics::{ActorCollision, CollisionTarget};
use crate::world::{BodyIndex, LevelGrid, StainBuffer};
use crate::DeterministicRng;

/// System: враг упёрся в другого врага → перестроить маршрут
///
/// Evading → Chasing, Chasing → Retreating, Retreating → Idle. Только если
/// второй стоит на месте (Idle) или целится (Aiming).
#[allow(clippy::too_many_arguments)]
pub fn reroute_on_enemy_collision(
    mut collisions: EventReader<ActorCollision>,
    mut enemies: Query<(&mut Enemy, &mut Actor, &Body)>,
    grid: Res<LevelGrid>,
    index: Res<BodyIndex>,
    nav: Res<NavGrid>,
    mut stains: ResMut<StainBuffer>,
    mut rng: ResMut<DeterministicRng>,
    mut outbox: ResMut<CombatOutbox>,
    config: Res<SimulationConfig>,
    time: Res<Time<Fixed>>,
) {
    let mut ctx = BehaviorContext {
        grid: &grid,
        bodies: &index,
        nav: &nav,
        stains: &mut stains,
        rng: &mut rng.rng,
        outbox: &mut outbox,
        config: &config,
        delta: time.delta_secs(),
    };

    for collision in collisions.read() {
        let CollisionTarget::Enemy(peer) = collision.target else {
            continue;
        };
        let Ok((peer_enemy, ..)) = enemies.get(peer) else {
            continue;
        };
        let peer_state = peer_enemy.state();

        let Ok((mut enemy, mut actor, body)) = enemies.get_mut(collision.actor) else {
            continue;
        };
        enemy.on_enemy_collision(collision.actor, peer_state, &mut actor, body, &mut ctx);
    }
}
