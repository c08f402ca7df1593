//! Tests for projectile flight and impact (Travelling → Colliding → pool).

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use bevy::prelude::*;

    use crate::combat::projectile::spawn_projectile_pool;
    use crate::combat::systems::FLIGHT_LOOP;
    use crate::combat::{CombatOutbox, EffectKind, EffectSpawned, HitLanded, ProjectilePool};
    use crate::components::BodyFlags;
    use crate::config::ExplosionProfile;
    use crate::player::spawn_player;
    use crate::world::{install_level, spawn_prop, AudioLedger, LevelGrid};
    use crate::{create_headless_app, step_tick};

    const ROOM: &str = "
        #########
        #.......#
        #.......#
        #.......#
        #.......#
        #.......#
        #########
    ";

    const ROCKET_DAMAGE: f32 = 7.25;

    fn setup(explosion: Option<ExplosionProfile>) -> (App, Entity) {
        let mut app = create_headless_app(11);
        install_level(app.world_mut(), LevelGrid::parse(ROOM).unwrap());
        let launcher = spawn_prop(app.world_mut(), Vec2::new(3.5, 1.5), 0.5, BodyFlags::STATIC);
        spawn_projectile_pool(app.world_mut(), launcher, 1, 6.0, 0.1, explosion.as_ref(), 16);
        (app, launcher)
    }

    fn fire(app: &mut App, launcher: Entity, angle: f32) {
        app.world_mut()
            .resource_mut::<CombatOutbox>()
            .launch(launcher, angle, ROCKET_DAMAGE);
    }

    /// Tick'и до возврата снаряда в пул. Собирает hits и effects за весь полёт
    fn fly(app: &mut App, launcher: Entity) -> (Vec<HitLanded>, Vec<EffectSpawned>) {
        let mut hits = Vec::new();
        let mut effects = Vec::new();
        for _ in 0..120 {
            step_tick(app);
            let world = app.world();
            hits.extend(world.resource::<Events<HitLanded>>().iter_current_update_events().cloned());
            effects.extend(world.resource::<Events<EffectSpawned>>().iter_current_update_events().cloned());

            let pool = world.get::<ProjectilePool>(launcher).unwrap();
            if pool.available() == pool.capacity() {
                return (hits, effects);
            }
        }
        panic!("projectile never returned to the pool");
    }

    #[test]
    fn test_direct_hit_uses_reversed_normal_and_explodes() {
        let blast = ExplosionProfile {
            power: 20.0,
            range: 1.5,
            penetration: None,
            fade: false,
        };
        let (mut app, launcher) = setup(Some(blast));
        let player = spawn_player(app.world_mut(), Vec2::new(3.7, 4.5), 500.0);

        // Летит чуть наискось, упирается в нижнюю грань игрока (нормаль -Y)
        let angle = FRAC_PI_2 - 0.05;
        fire(&mut app, launcher, angle);
        let (hits, effects) = fly(&mut app, launcher);

        let direct: Vec<&HitLanded> = hits
            .iter()
            .filter(|hit| hit.target == player && hit.record.damage == ROCKET_DAMAGE)
            .collect();
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].source, Some(launcher));
        assert!((direct[0].record.angle - FRAC_PI_2).abs() < 1e-4);
        assert!((direct[0].record.angle - angle).abs() > 1e-2);

        let explosions: Vec<&EffectSpawned> = effects
            .iter()
            .filter(|effect| effect.kind == EffectKind::Explosion)
            .collect();
        assert_eq!(explosions.len(), 1);
        assert!((explosions[0].position.y - 4.25).abs() < 1e-3);
        // Взрыв у самой грани тоже задел игрока
        assert!(hits
            .iter()
            .any(|hit| hit.target == player && hit.record.damage == 20.0));
    }

    #[test]
    fn test_inert_target_gets_no_record() {
        let (mut app, launcher) = setup(None);
        let pillar = spawn_prop(app.world_mut(), Vec2::new(3.5, 3.5), 0.6, BodyFlags::STATIC);

        fire(&mut app, launcher, FRAC_PI_2);
        let (hits, effects) = fly(&mut app, launcher);

        assert!(hits.iter().all(|hit| hit.target != pillar));
        assert!(effects
            .iter()
            .any(|effect| effect.kind == EffectKind::Spatter && (effect.position.y - 3.2).abs() < 1e-3));
        assert!(effects.iter().all(|effect| effect.kind != EffectKind::Explosion));
    }

    #[test]
    fn test_spawn_inside_target_falls_back_to_flight_angle() {
        let (mut app, launcher) = setup(None);
        // Бочка вплотную к launcher'у: снаряд появляется уже внутри неё
        let barrel = spawn_prop(app.world_mut(), Vec2::new(4.0, 1.5), 0.6, BodyFlags::DESTROYABLE);

        fire(&mut app, launcher, 0.3);
        let (hits, _) = fly(&mut app, launcher);

        let barrel_hits: Vec<&HitLanded> = hits.iter().filter(|hit| hit.target == barrel).collect();
        assert_eq!(barrel_hits.len(), 1);
        assert!((barrel_hits[0].record.angle - 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_flight_loop_plays_while_airborne() {
        let (mut app, launcher) = setup(None);

        fire(&mut app, launcher, FRAC_PI_2);
        step_tick(&mut app);
        assert!(app.world().resource::<AudioLedger>().is_playing(FLIGHT_LOOP));

        fly(&mut app, launcher);
        assert!(!app.world().resource::<AudioLedger>().is_playing(FLIGHT_LOOP));
    }
}
