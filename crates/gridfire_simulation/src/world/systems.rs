//! World systems: body index refresh, level install, props

use bevy::prelude::*;

use super::{AudioLedger, BodyIndex, BodySnapshot, LevelGrid, StainBuffer};
use crate::ai::Enemy;
use crate::components::{Body, BodyFlags, BodyKind, Prone};
use crate::logger;
use crate::navigation::NavGrid;
use crate::player::Player;

/// Пересобирает BodyIndex из живых `Body` компонентов
///
/// Порядок вставки: по Entity (детерминизм не зависит от порядка archetype'ов).
pub fn refresh_body_index(
    mut index: ResMut<BodyIndex>,
    bodies: Query<(Entity, &Body, Option<&Enemy>, Option<&Player>, Has<Prone>)>,
) {
    let mut snapshots: Vec<BodySnapshot> = bodies
        .iter()
        .filter(|(_, body, ..)| body.in_world)
        .map(|(entity, body, enemy, player, prone)| {
            let alive = match (enemy, player) {
                (Some(enemy), _) => enemy.is_alive(),
                (_, Some(player)) => player.is_alive(),
                _ => true,
            };
            BodySnapshot::from_body(entity, body, alive, prone)
        })
        .collect();
    snapshots.sort_by_key(|snapshot| snapshot.entity);

    index.clear();
    for snapshot in snapshots {
        index.insert(snapshot);
    }
}

pub fn advance_audio_ledger(mut ledger: ResMut<AudioLedger>) {
    ledger.begin_tick();
}

/// Ставит уровень: grid + navigation weights + stain buffer
///
/// Вызывать до спавна props (они помечают nav веса).
pub fn install_level(world: &mut World, grid: LevelGrid) {
    logger::log_info(&format!(
        "🗺️ Level installed: {}×{} cells",
        grid.width(),
        grid.height()
    ));
    world.insert_resource(NavGrid::from_level(&grid));
    world.insert_resource(StainBuffer::for_level(&grid));
    world.insert_resource(grid);
}

/// Спавнит prop (бочка, колонна). Static props поднимают nav вес клетки
pub fn spawn_prop(world: &mut World, position: Vec2, size: f32, flags: BodyFlags) -> Entity {
    let body = Body::new(BodyKind::Prop, position, size, size).with_flags(flags);
    if flags.contains(BodyFlags::STATIC) {
        if let Some(mut nav) = world.get_resource_mut::<NavGrid>() {
            nav.mark_static(body.cell());
        }
    }
    world.spawn(body).id()
}
