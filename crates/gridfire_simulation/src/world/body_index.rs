//! Body index: snapshot всех тел на текущий tick
//!
//! Пересобирается в начале каждого tick (`refresh_body_index`). Resolver'ы
//! (HitScan, Explosion, perception) читают только snapshot, живые `Body`
//! компоненты не трогают.

use std::collections::HashMap;

use bevy::prelude::*;

use super::grid::LevelGrid;
use crate::components::{Body, BodyFlags, BodyKind};

/// Пересечение луча с AABB тела
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec2,
    pub distance: f32,
    /// Нормаль грани, в которую вошёл луч (ZERO если луч стартовал внутри)
    pub normal: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodySnapshot {
    pub entity: Entity,
    pub kind: BodyKind,
    pub position: Vec2,
    pub z: f32,
    pub half_extents: Vec2,
    pub blocking: bool,
    pub flags: BodyFlags,
    pub alive: bool,
    pub prone: bool,
}

impl BodySnapshot {
    pub fn from_body(entity: Entity, body: &Body, alive: bool, prone: bool) -> Self {
        Self {
            entity,
            kind: body.kind,
            position: body.position,
            z: body.z,
            half_extents: body.half_extents(),
            blocking: body.blocking,
            flags: body.flags,
            alive,
            prone,
        }
    }

    pub fn radius(&self) -> f32 {
        self.half_extents.max_element()
    }

    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Dead-but-inert: труп без blocking, его можно временно "разбудить" взрывом
    pub fn is_inert(&self) -> bool {
        !self.alive && !self.blocking
    }

    pub fn overlaps(&self, center: Vec2, half: Vec2) -> bool {
        let gap = (self.position - center).abs();
        let reach = self.half_extents + half;
        gap.x < reach.x && gap.y < reach.y
    }

    pub fn covered_cells(&self) -> impl Iterator<Item = IVec2> {
        LevelGrid::overlapping_cells(self.position, self.half_extents)
    }

    /// Пересечение отрезка `from → to` с AABB тела (slab method)
    pub fn ray_collision(&self, from: Vec2, to: Vec2) -> Option<RayHit> {
        let delta = to - from;
        let min = self.position - self.half_extents;
        let max = self.position + self.half_extents;

        let mut t_enter = 0.0_f32;
        let mut t_exit = 1.0_f32;
        let mut normal = Vec2::ZERO;

        for axis in 0..2 {
            let origin = from[axis];
            let direction = delta[axis];

            if direction.abs() < f32::EPSILON {
                if origin < min[axis] || origin > max[axis] {
                    return None;
                }
                continue;
            }

            let inverse = 1.0 / direction;
            let mut near = (min[axis] - origin) * inverse;
            let mut far = (max[axis] - origin) * inverse;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }

            if near > t_enter {
                t_enter = near;
                normal = Vec2::ZERO;
                normal[axis] = -direction.signum();
            }
            t_exit = t_exit.min(far);

            if t_enter > t_exit {
                return None;
            }
        }

        Some(RayHit {
            point: from + delta * t_enter,
            distance: delta.length() * t_enter,
            normal,
        })
    }
}

/// Snapshot всех тел (Resource)
#[derive(Resource, Debug, Default)]
pub struct BodyIndex {
    bodies: Vec<BodySnapshot>,
    lookup: HashMap<Entity, usize>,
    cells: HashMap<IVec2, Vec<usize>>,
    player: Option<usize>,
}

impl BodyIndex {
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.lookup.clear();
        self.cells.clear();
        self.player = None;
    }

    pub fn insert(&mut self, snapshot: BodySnapshot) {
        let slot = self.bodies.len();
        for cell in snapshot.covered_cells() {
            self.cells.entry(cell).or_default().push(slot);
        }
        if snapshot.kind == BodyKind::Player {
            self.player = Some(slot);
        }
        self.lookup.insert(snapshot.entity, slot);
        self.bodies.push(snapshot);
    }

    pub fn insert_body(&mut self, entity: Entity, body: &Body, alive: bool, prone: bool) {
        self.insert(BodySnapshot::from_body(entity, body, alive, prone));
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn get(&self, entity: Entity) -> Option<&BodySnapshot> {
        self.lookup.get(&entity).map(|slot| &self.bodies[*slot])
    }

    pub fn player(&self) -> Option<&BodySnapshot> {
        self.player.map(|slot| &self.bodies[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &BodySnapshot> {
        self.bodies.iter()
    }

    pub fn in_cell(&self, cell: IVec2) -> impl Iterator<Item = &BodySnapshot> {
        self.cells
            .get(&cell)
            .into_iter()
            .flatten()
            .map(|slot| &self.bodies[*slot])
    }

    /// Тела, центр которых в пределах `radius` от `center`
    pub fn bodies_within(&self, center: Vec2, radius: f32) -> impl Iterator<Item = &BodySnapshot> {
        self.bodies
            .iter()
            .filter(move |body| body.position.distance(center) <= radius)
    }

    /// Клетка занята blocking телом (кроме `except`)
    pub fn is_cell_occupied(&self, cell: IVec2, except: Entity) -> bool {
        self.in_cell(cell)
            .any(|body| body.blocking && body.entity != except && body.kind != BodyKind::Projectile)
    }

    /// Возвращает false если тела нет в snapshot
    pub fn set_blocking(&mut self, entity: Entity, blocking: bool) -> bool {
        match self.lookup.get(&entity) {
            Some(slot) => {
                self.bodies[*slot].blocking = blocking;
                true
            }
            None => false,
        }
    }

    /// Убирает тело из snapshot (до следующего refresh)
    pub fn remove(&mut self, entity: Entity) -> bool {
        if !self.lookup.contains_key(&entity) {
            return false;
        }
        let bodies = std::mem::take(&mut self.bodies);
        self.clear();
        for body in bodies.into_iter().filter(|body| body.entity != entity) {
            self.insert(body);
        }
        true
    }

    /// Труп лёг: перестаёт блокировать, становится prone
    pub fn mark_prone(&mut self, entity: Entity) {
        if let Some(slot) = self.lookup.get(&entity) {
            let body = &mut self.bodies[*slot];
            body.alive = false;
            body.blocking = false;
            body.prone = true;
        }
    }

    /// Временно делает inert тела в радиусе blocking. Возвращает разбуженные
    pub fn wake_inert_within(&mut self, center: Vec2, radius: f32) -> Vec<Entity> {
        let woken: Vec<Entity> = self
            .bodies_within(center, radius)
            .filter(|body| body.is_inert())
            .map(|body| body.entity)
            .collect();
        for entity in &woken {
            self.set_blocking(*entity, true);
        }
        woken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entity: u32, position: Vec2, half: f32) -> BodySnapshot {
        BodySnapshot::from_body(
            Entity::from_raw(entity),
            &Body::new(BodyKind::Enemy, position, half * 2.0, half * 2.0),
            true,
            false,
        )
    }

    #[test]
    fn test_ray_collision_front_face() {
        let body = snapshot(1, Vec2::new(5.0, 0.0), 0.5);
        let hit = body
            .ray_collision(Vec2::ZERO, Vec2::new(10.0, 0.0))
            .unwrap();

        assert!((hit.point - Vec2::new(4.5, 0.0)).length() < 1e-5);
        assert!((hit.distance - 4.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_ray_collision_miss_and_short() {
        let body = snapshot(1, Vec2::new(5.0, 2.0), 0.5);
        assert!(body.ray_collision(Vec2::ZERO, Vec2::new(10.0, 0.0)).is_none());

        // Отрезок заканчивается до тела
        let body = snapshot(2, Vec2::new(5.0, 0.0), 0.5);
        assert!(body.ray_collision(Vec2::ZERO, Vec2::new(3.0, 0.0)).is_none());
    }

    #[test]
    fn test_cells_and_occupancy() {
        let mut index = BodyIndex::default();
        let a = snapshot(1, Vec2::new(1.5, 1.5), 0.3);
        index.insert(a.clone());

        assert_eq!(index.in_cell(IVec2::new(1, 1)).count(), 1);
        assert!(index.is_cell_occupied(IVec2::new(1, 1), Entity::from_raw(99)));
        assert!(!index.is_cell_occupied(IVec2::new(1, 1), a.entity));
        assert!(!index.is_cell_occupied(IVec2::new(2, 1), Entity::from_raw(99)));
    }

    #[test]
    fn test_remove_reindexes_cells() {
        let mut index = BodyIndex::default();
        let gone = snapshot(1, Vec2::new(1.5, 1.5), 0.3);
        let kept = snapshot(2, Vec2::new(2.5, 1.5), 0.3);
        let player = BodySnapshot::from_body(
            Entity::from_raw(3),
            &Body::new(BodyKind::Player, Vec2::new(4.5, 1.5), 0.5, 0.5),
            true,
            false,
        );
        index.insert(gone.clone());
        index.insert(kept.clone());
        index.insert(player.clone());

        assert!(index.remove(gone.entity));
        assert!(!index.remove(gone.entity));

        assert_eq!(index.len(), 2);
        assert!(index.get(gone.entity).is_none());
        assert_eq!(index.in_cell(IVec2::new(1, 1)).count(), 0);
        assert_eq!(index.in_cell(IVec2::new(2, 1)).next().map(|body| body.entity), Some(kept.entity));
        assert_eq!(index.player().map(|body| body.entity), Some(player.entity));
    }

    #[test]
    fn test_wake_inert_within() {
        let mut index = BodyIndex::default();
        let corpse = snapshot(1, Vec2::new(1.0, 1.0), 0.3);
        let far_corpse = snapshot(2, Vec2::new(9.0, 1.0), 0.3);
        index.insert(corpse.clone());
        index.insert(far_corpse.clone());
        index.mark_prone(corpse.entity);
        index.mark_prone(far_corpse.entity);

        let woken = index.wake_inert_within(Vec2::ZERO, 3.0);
        assert_eq!(woken, vec![corpse.entity]);
        assert!(index.get(corpse.entity).unwrap().blocking);
        assert!(!index.get(far_corpse.entity).unwrap().blocking);
    }
}
