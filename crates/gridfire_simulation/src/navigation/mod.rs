//! Navigation: weighted grid search для врагов
//!
//! `NavGrid` хранит веса клеток по графам (walker / floater). Веса меняются
//! только при установке уровня и static props. Динамические тела (другие враги)
//! передаются в поиск как transient `PathOverlay` и в NavGrid не пишутся.

pub mod astar;

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::BodyKind;
use crate::world::{BodyIndex, CellKind, LevelGrid};

/// Вес свободной клетки
pub const FREE_COST: u32 = 1;
/// Дверь проходима, но дороже (враг упрётся и откроет)
pub const DOOR_COST: u32 = 4;
/// Клетка под static prop
pub const STATIC_BODY_COST: u32 = 8;
/// Клетка под другим врагом (overlay)
pub const DYNAMIC_BODY_COST: u32 = 24;

/// Какой граф использует актор
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphIndex {
    /// Graph 0: transparent клетки: стены
    #[default]
    Walker,
    /// Graph 1: floaters пролетают transparent клетки
    Floater,
}

impl GraphIndex {
    fn slot(self) -> usize {
        match self {
            GraphIndex::Walker => 0,
            GraphIndex::Floater => 1,
        }
    }

    fn base_weight(self, kind: CellKind) -> Option<u32> {
        match kind {
            CellKind::Floor => Some(FREE_COST),
            CellKind::Door => Some(DOOR_COST),
            CellKind::Transparent => match self {
                GraphIndex::Walker => None,
                GraphIndex::Floater => Some(FREE_COST),
            },
            CellKind::Wall | CellKind::Edge => None,
        }
    }
}

/// Weight grids (Resource). `None` = непроходимо
#[derive(Resource, Debug, Clone, Default)]
pub struct NavGrid {
    width: i32,
    height: i32,
    graphs: [Vec<Option<u32>>; 2],
}

impl NavGrid {
    pub fn from_level(grid: &LevelGrid) -> Self {
        let mut graphs: [Vec<Option<u32>>; 2] = [Vec::new(), Vec::new()];
        for graph in [GraphIndex::Walker, GraphIndex::Floater] {
            graphs[graph.slot()] = grid
                .cells()
                .map(|(_, kind)| graph.base_weight(kind))
                .collect();
        }

        Self {
            width: grid.width(),
            height: grid.height(),
            graphs,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        (cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height)
            .then(|| (cell.y * self.width + cell.x) as usize)
    }

    pub fn weight(&self, graph: GraphIndex, cell: IVec2) -> Option<u32> {
        self.index(cell)
            .and_then(|index| self.graphs[graph.slot()][index])
    }

    pub fn is_passable(&self, graph: GraphIndex, cell: IVec2) -> bool {
        self.weight(graph, cell).is_some()
    }

    /// Static prop в клетке: поднимает вес на обоих графах (если проходима)
    pub fn mark_static(&mut self, cell: IVec2) {
        let Some(index) = self.index(cell) else {
            return;
        };
        for graph in self.graphs.iter_mut() {
            if let Some(weight) = graph[index].as_mut() {
                *weight = (*weight).max(STATIC_BODY_COST);
            }
        }
    }
}

/// Transient добавки к весам на один поиск
#[derive(Debug, Clone, Default)]
pub struct PathOverlay {
    extra: HashMap<IVec2, u32>,
}

impl PathOverlay {
    /// Overlay из живых blocking врагов/игрока, кроме `except`
    pub fn from_bodies(bodies: &BodyIndex, except: &[Entity]) -> Self {
        let mut overlay = Self::default();
        for body in bodies.iter() {
            let dynamic = matches!(body.kind, BodyKind::Enemy | BodyKind::Player);
            if dynamic && body.blocking && !except.contains(&body.entity) {
                overlay.add(LevelGrid::cell_at(body.position), DYNAMIC_BODY_COST);
            }
        }
        overlay
    }

    pub fn add(&mut self, cell: IVec2, cost: u32) {
        *self.extra.entry(cell).or_default() += cost;
    }

    pub fn cost(&self, cell: IVec2) -> u32 {
        self.extra.get(&cell).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.extra.is_empty()
    }
}
