//! Kinematic движение акторов по grid
//!
//! Архитектура:
//! - velocity ставит FSM (враги) или хост (игрок), здесь только интеграция
//! - стены: axis-separated sliding (X, потом Y) через `LevelGrid::blocking_cell`
//! - тела: blocking footprint'ы из `BodyIndex` (snapshot начала tick'а)
//! - каждое упирание → типизированный `ActorCollision` (+ `DoorBumped` для дверей)
//!
//! Детерминизм: FixedUpdate, порядок по Entity.

use bevy::prelude::*;

use crate::components::{Actor, Body, BodyFlags, BodyKind, Prone};
use crate::world::{BodyIndex, BodySnapshot, CellKind, LevelGrid};

/// Высота prone тела под ногами
pub const PRONE_HEIGHT: f32 = 0.15;

/// Доля разницы elevation, которую актор догоняет за tick
pub const ELEVATION_BLEND: f32 = 0.25;

/// Во что упёрся актор
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionTarget {
    Enemy(Entity),
    Player(Entity),
    Prop(Entity),
    Door(IVec2),
    Transparent(IVec2),
    /// Обычная или edge стена
    Wall(IVec2),
}

impl CollisionTarget {
    fn from_cell(kind: CellKind, cell: IVec2) -> Self {
        match kind {
            CellKind::Door => Self::Door(cell),
            CellKind::Transparent => Self::Transparent(cell),
            _ => Self::Wall(cell),
        }
    }

    fn from_body(body: &BodySnapshot) -> Self {
        match body.kind {
            BodyKind::Enemy => Self::Enemy(body.entity),
            BodyKind::Player => Self::Player(body.entity),
            BodyKind::Prop | BodyKind::Projectile => Self::Prop(body.entity),
        }
    }
}

/// Актор упёрся во что-то на этом tick'е
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ActorCollision {
    pub actor: Entity,
    pub target: CollisionTarget,
}

/// Актор толкнул дверь (хост решает, открывать ли)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorBumped {
    pub actor: Entity,
    pub cell: IVec2,
}

/// Blocking тело, в которое упирается footprint в `candidate`
///
/// Тела, с которыми актор уже пересекается, не держат (иначе слипшиеся
/// тела никогда не разойдутся).
fn blocking_body<'a>(
    index: &'a BodyIndex,
    me: Entity,
    position: Vec2,
    candidate: Vec2,
    half: Vec2,
) -> Option<&'a BodySnapshot> {
    index.iter().find(|other| {
        other.entity != me
            && other.blocking
            && other.kind != BodyKind::Projectile
            && !other.overlaps(position, half)
            && other.overlaps(candidate, half)
    })
}

/// Система интеграции velocity → Body.position
///
/// Работает в FixedUpdate. Трупы тоже скользят (knockback), но только
/// упираются в стены: `collision_enabled = false` выключает проверку тел.
pub fn integrate_bodies(
    mut actors: Query<(Entity, &Actor, &mut Body)>,
    grid: Res<LevelGrid>,
    index: Res<BodyIndex>,
    time: Res<Time<Fixed>>,
    mut collisions: EventWriter<ActorCollision>,
    mut doors: EventWriter<DoorBumped>,
) {
    let delta = time.delta_secs();

    let mut order: Vec<Entity> = actors.iter().map(|(entity, ..)| entity).collect();
    order.sort();

    for entity in order {
        let Ok((entity, actor, mut body)) = actors.get_mut(entity) else {
            continue;
        };
        let step = actor.velocity * delta;
        if step == Vec2::ZERO || !body.in_world {
            continue;
        }

        let half = body.half_extents();
        let hovering = body.flags.contains(BodyFlags::HOVERING);
        let check_bodies = body.collision_enabled && body.blocking;
        let mut position = body.position;
        let mut hits: Vec<CollisionTarget> = Vec::new();

        for axis in 0..2 {
            if step[axis] == 0.0 {
                continue;
            }
            let mut candidate = position;
            candidate[axis] += step[axis];

            if let Some(cell) = grid.blocking_cell(candidate, half, hovering) {
                let kind = grid.cell(cell);
                if kind == CellKind::Door {
                    doors.write(DoorBumped { actor: entity, cell });
                }
                hits.push(CollisionTarget::from_cell(kind, cell));
                continue;
            }

            if check_bodies {
                if let Some(other) = blocking_body(&index, entity, position, candidate, half) {
                    hits.push(CollisionTarget::from_body(other));
                    continue;
                }
            }

            position = candidate;
        }

        body.position = position;

        hits.dedup();
        for target in hits {
            collisions.write(ActorCollision { actor: entity, target });
        }
    }
}

/// Система: elevation от prone тел под ногами + bob offset → Body.z
///
/// Лежащие тела сами не поднимаются (Without<Prone>).
pub fn update_standing_elevation(
    mut actors: Query<(Entity, &mut Actor, &mut Body), Without<Prone>>,
    index: Res<BodyIndex>,
) {
    for (entity, mut actor, mut body) in actors.iter_mut() {
        let half = body.half_extents();
        let standing_on: Vec<Entity> = index
            .iter()
            .filter(|other| other.prone && other.entity != entity && other.overlaps(body.position, half))
            .map(|other| other.entity)
            .collect();

        let target = if standing_on.is_empty() { 0.0 } else { PRONE_HEIGHT };
        actor.elevation += (target - actor.elevation) * ELEVATION_BLEND;
        actor.standing_on = standing_on;
        body.z = actor.elevation + actor.bob_offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::refresh_body_index;

    const CORRIDOR: &str = "
        ########
        #......D
        ########
    ";

    fn app(map: &str) -> App {
        let mut app = App::new();
        app.insert_resource(LevelGrid::parse(map).unwrap())
            .init_resource::<BodyIndex>()
            .init_resource::<Time<Fixed>>()
            .add_event::<ActorCollision>()
            .add_event::<DoorBumped>()
            .add_systems(
                Update,
                (refresh_body_index, integrate_bodies, update_standing_elevation).chain(),
            );
        app.world_mut()
            .resource_mut::<Time<Fixed>>()
            .advance_by(std::time::Duration::from_millis(100));
        app
    }

    fn spawn_actor(app: &mut App, position: Vec2, velocity: Vec2) -> Entity {
        let mut actor = Actor::new(10.0);
        actor.velocity = velocity;
        app.world_mut()
            .spawn((actor, Body::new(BodyKind::Prop, position, 0.5, 0.5)))
            .id()
    }

    fn collisions(app: &App) -> Vec<ActorCollision> {
        app.world()
            .resource::<Events<ActorCollision>>()
            .iter_current_update_events()
            .copied()
            .collect()
    }

    #[test]
    fn test_slides_along_wall() {
        let mut app = app(CORRIDOR);
        // Диагонально в стену сверху: X едет, Y упирается
        let actor = spawn_actor(&mut app, Vec2::new(2.5, 1.5), Vec2::new(5.0, -5.0));

        app.update();

        let body = app.world().get::<Body>(actor).unwrap();
        assert!((body.position.x - 3.0).abs() < 1e-4);
        assert!((body.position.y - 1.5).abs() < 1e-4);
        assert_eq!(
            collisions(&app),
            vec![ActorCollision {
                actor,
                target: CollisionTarget::Wall(IVec2::new(2, 0)),
            }]
        );
    }

    #[test]
    fn test_door_bump_reported() {
        let mut app = app(CORRIDOR);
        let actor = spawn_actor(&mut app, Vec2::new(6.5, 1.5), Vec2::new(5.0, 0.0));

        app.update();

        let bumps: Vec<DoorBumped> = app
            .world()
            .resource::<Events<DoorBumped>>()
            .iter_current_update_events()
            .copied()
            .collect();
        assert_eq!(bumps, vec![DoorBumped { actor, cell: IVec2::new(7, 1) }]);
        assert!(collisions(&app)
            .iter()
            .any(|collision| collision.target == CollisionTarget::Door(IVec2::new(7, 1))));
    }

    #[test]
    fn test_blocking_body_stops_actor() {
        let mut app = app(CORRIDOR);
        let actor = spawn_actor(&mut app, Vec2::new(2.5, 1.5), Vec2::new(8.0, 0.0));
        let enemy = app
            .world_mut()
            .spawn(Body::new(BodyKind::Enemy, Vec2::new(3.5, 1.5), 0.5, 0.5))
            .id();

        app.update();

        let body = app.world().get::<Body>(actor).unwrap();
        assert_eq!(body.position, Vec2::new(2.5, 1.5));
        assert_eq!(
            collisions(&app),
            vec![ActorCollision {
                actor,
                target: CollisionTarget::Enemy(enemy),
            }]
        );
    }

    #[test]
    fn test_standing_on_prone_raises_elevation() {
        let mut app = app(CORRIDOR);
        let actor = spawn_actor(&mut app, Vec2::new(3.5, 1.5), Vec2::ZERO);
        let mut corpse = Body::new(BodyKind::Prop, Vec2::new(3.6, 1.5), 0.5, 0.5);
        corpse.blocking = false;
        let corpse = app.world_mut().spawn((corpse, Prone)).id();

        for _ in 0..20 {
            app.update();
        }

        let actor_state = app.world().get::<Actor>(actor).unwrap();
        assert_eq!(actor_state.standing_on, vec![corpse]);
        assert!((actor_state.elevation - PRONE_HEIGHT).abs() < 1e-2);
        let z = app.world().get::<Body>(actor).unwrap().z;
        assert!((z - actor_state.elevation).abs() < 1e-6);
    }
}
