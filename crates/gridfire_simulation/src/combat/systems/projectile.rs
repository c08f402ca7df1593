//! Projectile systems: запуск из пула, полёт, столкновение, возврат в пул.

use bevy::prelude::*;

use crate::combat::projectile::{find_impact, launch_position, ProjectileImpact};
use crate::combat::{
    CombatOutbox, EffectKind, HitRecord, Projectile, ProjectileLaunch, ProjectilePool, ProjectileState,
};
use crate::components::{Body, BodyFlags};
use crate::config::SimulationConfig;
use crate::logger;
use crate::world::{BodyIndex, LevelGrid};
use crate::DeterministicRng;

/// Looped звук полёта: играет, пока в воздухе есть хоть один снаряд
pub const FLIGHT_LOOP: &str = "projectile_flight";

/// System: ProjectileLaunch → снаряд из пула launcher'а в мир
///
/// Launcher без пула: ошибка wiring, логируем и пропускаем.
/// Пустой пул: все снаряды в полёте, выстрел пропадает.
pub fn launch_projectiles(
    mut launches: EventReader<ProjectileLaunch>,
    mut pools: Query<&mut ProjectilePool>,
    mut projectiles: Query<(&mut Projectile, &mut Body), Without<ProjectilePool>>,
    grid: Res<LevelGrid>,
    mut index: ResMut<BodyIndex>,
    mut outbox: ResMut<CombatOutbox>,
) {
    let mut airborne = projectiles.iter().any(|(projectile, _)| projectile.is_travelling());

    for launch in launches.read() {
        let Ok(mut pool) = pools.get_mut(launch.launcher) else {
            logger::log_error(&format!(
                "ProjectileLaunch: launcher {:?} has no ProjectilePool, shot skipped",
                launch.launcher
            ));
            continue;
        };
        let Some(launcher) = index.get(launch.launcher).cloned() else {
            continue;
        };
        let Some(member) = pool.acquire() else {
            logger::log(&format!(
                "ProjectilePool of {:?} exhausted ({} in flight)",
                launch.launcher,
                pool.capacity()
            ));
            continue;
        };
        let Ok((mut projectile, mut body)) = projectiles.get_mut(member) else {
            logger::log_error(&format!("ProjectilePool member {:?} is not a projectile", member));
            continue;
        };

        body.position = launch_position(&launcher, launch.angle, body.radius(), &grid);
        body.in_world = true;
        body.blocking = false;

        projectile.state = ProjectileState::Travelling;
        projectile.velocity = Vec2::from_angle(launch.angle) * projectile.speed;
        projectile.damage = launch.damage;
        projectile.source = Some(launch.launcher);
        if let Some(explosion) = projectile.explosion.as_mut() {
            explosion.set_source(Some(launch.launcher));
        }

        index.insert_body(member, &body, true, false);
        if !airborne {
            outbox.play_looped(FLIGHT_LOOP, Some(body.position));
            airborne = true;
        }
    }
}

/// System: полёт снарядов
///
/// Первое blocking столкновение за шаг → `Colliding`: destroyable цель получает урон
/// под углом против нормали, owned Explosion взрывается, снаряд уходит в пул.
/// Последний приземлившийся снаряд глушит `FLIGHT_LOOP`.
#[allow(clippy::too_many_arguments)]
pub fn advance_projectiles(
    mut projectiles: Query<(Entity, &mut Projectile, &mut Body), Without<ProjectilePool>>,
    mut pools: Query<&mut ProjectilePool>,
    grid: Res<LevelGrid>,
    mut index: ResMut<BodyIndex>,
    mut rng: ResMut<DeterministicRng>,
    mut outbox: ResMut<CombatOutbox>,
    config: Res<SimulationConfig>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    let viewer = index.player().map(|player| player.position);

    let mut order: Vec<Entity> = projectiles
        .iter()
        .filter(|(_, projectile, _)| projectile.is_travelling())
        .map(|(entity, ..)| entity)
        .collect();
    order.sort();
    let mut landed = false;

    for entity in order {
        let Ok((entity, mut projectile, mut body)) = projectiles.get_mut(entity) else {
            continue;
        };
        if !projectile.is_travelling() {
            continue;
        }

        let step = projectile.velocity * delta;
        let ignore: Vec<Entity> = [Some(entity), projectile.source].into_iter().flatten().collect();
        let Some(impact) = find_impact(body.position, step, &ignore, &grid, &index) else {
            body.position += step;
            continue;
        };

        projectile.state = ProjectileState::Colliding;
        body.position = impact.point();

        match impact {
            ProjectileImpact::Body { entity: target, point, normal } => {
                let target_flags = index.get(target).map(|snapshot| snapshot.flags).unwrap_or_default();
                let angle = if normal == Vec2::ZERO {
                    projectile.velocity.y.atan2(projectile.velocity.x)
                } else {
                    (-normal).y.atan2(-normal.x)
                };
                if target_flags.contains(BodyFlags::DESTROYABLE) {
                    outbox.hit(
                        target,
                        projectile.source,
                        HitRecord {
                            damage: projectile.damage,
                            angle,
                            instant_kill: false,
                        },
                    );
                }
                if !target_flags.contains(BodyFlags::OWN_IMPACT_CUE) {
                    outbox.effect(EffectKind::Spatter, point, projectile.source);
                }
            }
            ProjectileImpact::Wall { point, .. } => {
                outbox.effect(EffectKind::Spatter, point, projectile.source);
            }
        }

        if let Some(explosion) = projectile.explosion.as_ref() {
            explosion.detonate(
                impact.point(),
                &grid,
                &mut index,
                &mut rng.rng,
                &mut outbox,
                viewer,
                &config,
            );
        }

        recycle(entity, &mut projectile, &mut body, &mut pools);
        landed = true;
    }

    if landed && !projectiles.iter().any(|(_, projectile, _)| projectile.is_travelling()) {
        outbox.stop(FLIGHT_LOOP);
    }
}

fn recycle(entity: Entity, projectile: &mut Projectile, body: &mut Body, pools: &mut Query<&mut ProjectilePool>) {
    projectile.state = ProjectileState::Idle;
    projectile.velocity = Vec2::ZERO;
    projectile.source = None;
    if let Some(explosion) = projectile.explosion.as_mut() {
        explosion.set_source(None);
    }
    body.in_world = false;

    match pools.get_mut(projectile.pool) {
        Ok(mut pool) => pool.release(entity),
        Err(_) => logger::log_error(&format!(
            "Projectile {:?}: pool {:?} is gone, projectile stays idle",
            entity, projectile.pool
        )),
    }
}
