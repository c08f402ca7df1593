//! Grid ray-march (DDA)
//!
//! Луч идёт по клеткам до первой клетки, которая блокирует лучи.
//! Результат: пройденные секции, тела в пройденных клетках, terminal клетка и дистанция.

use bevy::prelude::*;

use super::body_index::BodyIndex;
use super::grid::{CellKind, LevelGrid, CELL_SIZE};

/// Отрезок луча внутри одной клетки
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySection {
    pub cell: IVec2,
    pub enter: f32,
    pub exit: f32,
}

/// Результат `LevelGrid::cast_ray`
#[derive(Debug, Clone)]
pub struct RayCast {
    pub origin: Vec2,
    pub angle: f32,
    pub direction: Vec2,
    /// Пройденные клетки в порядке обхода (terminal не входит)
    pub sections: Vec<RaySection>,
    /// Тела в пройденных клетках, в порядке обхода, без дублей
    pub bodies: Vec<Entity>,
    pub terminal_cell: IVec2,
    pub terminal_kind: CellKind,
    /// Дистанция от origin до входа в terminal клетку
    pub distance: f32,
    pub end: Vec2,
}

impl RayCast {
    pub fn encountered(&self, entity: Entity) -> bool {
        self.bodies.contains(&entity)
    }

    pub fn hit_edge(&self) -> bool {
        self.terminal_kind.is_edge()
    }
}

impl LevelGrid {
    /// DDA ray-march от `origin` под углом `angle` (радианы)
    pub fn cast_ray(&self, origin: Vec2, angle: f32, bodies: &BodyIndex) -> RayCast {
        let direction = Vec2::from_angle(angle);
        let mut cell = LevelGrid::cell_at(origin);

        let step = IVec2::new(axis_step(direction.x), axis_step(direction.y));
        let t_delta = Vec2::new(axis_delta(direction.x), axis_delta(direction.y));
        let mut t_max = Vec2::new(
            first_boundary(origin.x, cell.x, step.x, direction.x),
            first_boundary(origin.y, cell.y, step.y, direction.y),
        );

        let mut sections = Vec::new();
        let mut encountered: Vec<Entity> = Vec::new();

        let mut kind = self.cell(cell);
        let mut t = 0.0;
        // Любой луч выходит за карту за width + height шагов
        let max_steps = (self.width() + self.height()) as usize * 2 + 4;

        let mut steps = 0;
        while !kind.blocks_ray() && steps < max_steps {
            let exit = t_max.x.min(t_max.y);
            sections.push(RaySection { cell, enter: t, exit });

            for body in bodies.in_cell(cell) {
                if !encountered.contains(&body.entity) {
                    encountered.push(body.entity);
                }
            }

            if t_max.x < t_max.y {
                cell.x += step.x;
                t = t_max.x;
                t_max.x += t_delta.x;
            } else {
                cell.y += step.y;
                t = t_max.y;
                t_max.y += t_delta.y;
            }

            kind = self.cell(cell);
            steps += 1;
        }

        if !kind.blocks_ray() {
            // Вырожденный луч (NaN угол): считаем что упёрлись в край
            kind = CellKind::Edge;
        }

        RayCast {
            origin,
            angle,
            direction,
            sections,
            bodies: encountered,
            terminal_cell: cell,
            terminal_kind: kind,
            distance: t,
            end: origin + direction * t,
        }
    }
}

fn axis_step(component: f32) -> i32 {
    if component > f32::EPSILON {
        1
    } else if component < -f32::EPSILON {
        -1
    } else {
        0
    }
}

fn axis_delta(component: f32) -> f32 {
    if component.abs() > f32::EPSILON {
        CELL_SIZE / component.abs()
    } else {
        f32::INFINITY
    }
}

fn first_boundary(origin: f32, cell: i32, step: i32, component: f32) -> f32 {
    match step {
        1 => ((cell + 1) as f32 * CELL_SIZE - origin) / component,
        -1 => (cell as f32 * CELL_SIZE - origin) / component,
        _ => f32::INFINITY,
    }
}
