//! Tests for damage queue systems (one hurt per tick).

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use crate::ai::{spawn_enemy, Enemy, EnemyState};
    use crate::combat::{ActorHurt, CombatOutbox, EnemyDied, HitRecord, ItemDropped};
    use crate::components::{Body, BodyKind, Health, Prone, Settled};
    use crate::config::EnemyProfile;
    use crate::world::{install_level, LevelGrid};
    use crate::{create_headless_app, step_tick};

    const ROOM: &str = "
        #######
        #.....#
        #.....#
        #######
    ";

    fn setup() -> (App, Entity) {
        let mut app = create_headless_app(7);
        install_level(app.world_mut(), LevelGrid::parse(ROOM).unwrap());
        let enemy = spawn_enemy(app.world_mut(), &EnemyProfile::grunt(), Vec2::new(2.5, 1.5));
        (app, enemy)
    }

    fn queue_hits(app: &mut App, target: Entity, hits: &[(f32, f32)]) {
        let mut outbox = app.world_mut().resource_mut::<CombatOutbox>();
        for (damage, angle) in hits {
            outbox.hit(
                target,
                None,
                HitRecord {
                    damage: *damage,
                    angle: *angle,
                    instant_kill: false,
                },
            );
        }
    }

    fn hurt_events(app: &App) -> Vec<ActorHurt> {
        app.world()
            .resource::<Events<ActorHurt>>()
            .iter_current_update_events()
            .cloned()
            .collect()
    }

    #[test]
    fn test_many_hits_one_hurt() {
        let (mut app, enemy) = setup();
        queue_hits(&mut app, enemy, &[(2.0, 0.0), (3.0, 0.0), (4.0, 0.0)]);

        step_tick(&mut app);

        let hurts = hurt_events(&app);
        assert_eq!(hurts.len(), 1);
        assert_eq!(hurts[0].entity, enemy);
        assert_eq!(hurts[0].hits, 3);
        assert!((hurts[0].damage - 9.0).abs() < 1e-5);

        assert_eq!(app.world().get::<Health>(enemy).unwrap().current, 21.0);
        assert_eq!(app.world().get::<Enemy>(enemy).unwrap().state(), EnemyState::Hurting);

        // Очередь пуста → на следующем tick'е hurt нет
        step_tick(&mut app);
        assert!(hurt_events(&app).is_empty());
    }

    #[test]
    fn test_hurt_angle_is_circular_mean() {
        let (mut app, enemy) = setup();
        let quarter = std::f32::consts::FRAC_PI_2;
        queue_hits(&mut app, enemy, &[(1.0, 0.0), (1.0, quarter)]);

        step_tick(&mut app);

        let hurts = hurt_events(&app);
        assert!((hurts[0].angle - quarter / 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_lethal_hits_leave_prone_corpse() {
        let (mut app, enemy) = setup();
        queue_hits(&mut app, enemy, &[(20.0, 0.0), (20.0, 0.0)]);

        step_tick(&mut app);

        let world = app.world();
        assert_eq!(world.get::<Enemy>(enemy).unwrap().state(), EnemyState::Dead);
        assert!(world.get::<Prone>(enemy).is_some());
        assert!(!world.get::<Body>(enemy).unwrap().blocking);

        let deaths: Vec<EnemyDied> = world
            .resource::<Events<EnemyDied>>()
            .iter_current_update_events()
            .cloned()
            .collect();
        assert_eq!(deaths.len(), 1);
        assert!(!deaths[0].exploded);
    }

    #[derive(Component)]
    struct Marked;

    #[test]
    fn test_deaths_resolve_in_entity_order() {
        let (mut app, first) = setup();
        let shells = EnemyProfile {
            drop: Some("shells".into()),
            ..EnemyProfile::grunt()
        };
        let rockets = EnemyProfile {
            drop: Some("rockets".into()),
            ..EnemyProfile::grunt()
        };
        // Первый враг без drop'а, убиваем второго и третьего
        let second = spawn_enemy(app.world_mut(), &shells, Vec2::new(4.5, 1.5));
        let third = spawn_enemy(app.world_mut(), &rockets, Vec2::new(4.5, 2.5));
        assert!(first < second && second < third);
        // Второй уезжает в более новый archetype: обход query начнётся с третьего
        app.world_mut().entity_mut(second).insert(Marked);

        queue_hits(&mut app, third, &[(50.0, 0.0)]);
        queue_hits(&mut app, second, &[(50.0, 0.0)]);
        step_tick(&mut app);

        let drops: Vec<String> = app
            .world()
            .resource::<Events<ItemDropped>>()
            .iter_current_update_events()
            .map(|drop| drop.item.clone())
            .collect();
        assert_eq!(drops, vec!["shells".to_string(), "rockets".to_string()]);
    }

    #[test]
    fn test_awakened_body_loses_settled() {
        let (mut app, _) = setup();
        let corpse = app
            .world_mut()
            .spawn((Body::new(BodyKind::Prop, Vec2::new(4.5, 2.5), 0.5, 0.5), Settled))
            .id();
        app.world_mut().resource_mut::<CombatOutbox>().awaken(corpse);

        step_tick(&mut app);

        assert!(app.world().get::<Settled>(corpse).is_none());
    }
}
