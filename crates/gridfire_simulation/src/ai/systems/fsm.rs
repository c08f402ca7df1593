//! FSM tick system (per-enemy behavior step).

use bevy::prelude::*;

use crate::ai::{BehaviorContext, Enemy};
use crate::combat::CombatOutbox;
use crate::components::{Actor, Body, Settled};
use crate::config::SimulationConfig;
use crate::navigation::NavGrid;
use crate::player::Player;
use crate::world::{BodyIndex, LevelGrid, StainBuffer};
use crate::DeterministicRng;

/// Система: один шаг FSM для каждого врага
///
/// Успокоившиеся трупы (`Settled`) не тикают. Порядок по Entity: rng
/// расходуется детерминированно.
#[allow(clippy::too_many_arguments)]
pub fn tick_enemies(
    mut commands: Commands,
    mut enemies: Query<(Entity, &mut Enemy, &mut Actor, &mut Body), (Without<Settled>, Without<Player>)>,
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

    let mut order: Vec<Entity> = enemies.iter().map(|(entity, ..)| entity).collect();
    order.sort();

    for entity in order {
        let Ok((entity, mut enemy, mut actor, mut body)) = enemies.get_mut(entity) else {
            continue;
        };
        if enemy.tick(entity, &mut actor, &mut body, &mut ctx) {
            commands.entity(entity).insert(Settled);
        }
    }
}
