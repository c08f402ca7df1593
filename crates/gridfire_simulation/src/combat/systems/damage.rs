//! Damage systems: hit records → DamageAccumulator → один hurt на tick.

use bevy::prelude::*;

use crate::ai::{DeathContext, Enemy};
use crate::combat::{ActorHurt, BodyAwakened, CombatOutbox, DamageAccumulator, HitLanded};
use crate::components::{Actor, Body, Health, Prone, Settled};
use crate::config::SimulationConfig;
use crate::player::Player;
use crate::world::{BodyIndex, LevelGrid};
use crate::DeterministicRng;

/// System: HitLanded events → очередь цели
///
/// Все атакующие этого tick'а уже отстрелялись (chain), цели ещё не резолвили урон.
pub fn queue_landed_hits(
    mut hits: EventReader<HitLanded>,
    mut targets: Query<&mut DamageAccumulator>,
) {
    for hit in hits.read() {
        match targets.get_mut(hit.target) {
            Ok(mut accumulator) => accumulator.push(hit.record),
            Err(_) => crate::logger::log_warning(&format!(
                "HitLanded: target {:?} has no DamageAccumulator",
                hit.target
            )),
        }
    }
}

/// System: collapse очередей → hurt
///
/// Ровно один `ActorHurt` на entity за tick. Враги и игрок умирают по-разному:
/// враг сразу Dead (prone или взрыв), игрок через Dying.
#[allow(clippy::too_many_arguments)]
pub fn resolve_damage_queues(
    mut commands: Commands,
    mut targets: Query<(
        Entity,
        &mut DamageAccumulator,
        &mut Actor,
        &mut Health,
        &mut Body,
        Option<&mut Enemy>,
        Option<&mut Player>,
    )>,
    grid: Res<LevelGrid>,
    mut index: ResMut<BodyIndex>,
    mut rng: ResMut<DeterministicRng>,
    mut outbox: ResMut<CombatOutbox>,
    config: Res<SimulationConfig>,
    mut hurt_events: EventWriter<ActorHurt>,
) {
    let viewer = index.player().map(|player| player.position);

    // Смерть тянет rng (scatter, взрыв): порядок по Entity
    let mut order: Vec<Entity> = targets.iter().map(|(entity, ..)| entity).collect();
    order.sort();

    for entity in order {
        let Ok((entity, mut accumulator, mut actor, mut health, mut body, enemy, player)) = targets.get_mut(entity)
        else {
            continue;
        };
        let Some(hit) = accumulator.collapse() else {
            continue;
        };

        hurt_events.write(ActorHurt {
            entity,
            damage: hit.damage,
            angle: hit.angle,
            instant_kill: hit.instant_kill,
            hits: hit.count,
        });

        if let Some(mut enemy) = enemy {
            let mut ctx = DeathContext {
                grid: &grid,
                bodies: &mut index,
                rng: &mut rng.rng,
                outbox: &mut outbox,
                config: &config,
                viewer,
            };
            let was_alive = enemy.is_alive();
            let outcome = enemy.hurt(entity, &mut actor, &mut health, &mut body, &hit, &mut ctx);

            if !was_alive {
                // Труп толкнули: снова тикает, пока не успокоится
                commands.entity(entity).remove::<Settled>();
            }
            if outcome.prone {
                commands.entity(entity).insert(Prone);
            }
        } else if let Some(mut player) = player {
            player.hurt(&mut actor, &mut health, &hit, &mut outbox, &config);
        }
    }
}

/// System: взрыв разбудил лежащее тело → снимаем Settled
pub fn wake_awakened_bodies(mut commands: Commands, mut awakened: EventReader<BodyAwakened>) {
    for event in awakened.read() {
        commands.entity(event.entity).remove::<Settled>();
    }
}
