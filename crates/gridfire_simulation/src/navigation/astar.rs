//! Weighted A* по NavGrid (4-связность)

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use bevy::prelude::*;

use super::{GraphIndex, NavGrid, PathOverlay, FREE_COST};
use crate::world::LevelGrid;

const ORTHOGONAL: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
];

impl NavGrid {
    /// Путь `from → to` (без стартовой клетки, с целевой)
    ///
    /// Пустой результат: цель недостижима или уже на месте.
    /// `surrounding_open`: промежуточные клетки должны быть окружены проходимыми
    /// (для крупных тел). Overlay на цель не действует: там обычно стоит игрок.
    pub fn find_path(
        &self,
        from: IVec2,
        to: IVec2,
        graph: GraphIndex,
        surrounding_open: bool,
        overlay: &PathOverlay,
    ) -> Vec<IVec2> {
        if from == to || !self.is_passable(graph, to) {
            return Vec::new();
        }
        let (Some(start), Some(goal)) = (self.index(from), self.index(to)) else {
            return Vec::new();
        };

        let cells = (self.width() * self.height()) as usize;
        let mut best = vec![u32::MAX; cells];
        let mut came_from: Vec<Option<usize>> = vec![None; cells];
        let mut open = BinaryHeap::new();
        // Tie-break по порядку вставки: детерминированный обход
        let mut sequence: u32 = 0;

        best[start] = 0;
        open.push(Reverse((heuristic(from, to), sequence, start)));

        while let Some(Reverse((_, _, current))) = open.pop() {
            if current == goal {
                return self.unwind(&came_from, start, goal);
            }
            let current_cell = self.cell_of(current);

            for offset in ORTHOGONAL {
                let next_cell = current_cell + offset;
                let Some(weight) = self.weight(graph, next_cell) else {
                    continue;
                };
                let Some(next) = self.index(next_cell) else {
                    continue;
                };
                if next != goal && surrounding_open && !self.is_open_around(graph, next_cell) {
                    continue;
                }

                let extra = if next == goal { 0 } else { overlay.cost(next_cell) };
                let cost = best[current].saturating_add(weight + extra);
                if cost < best[next] {
                    best[next] = cost;
                    came_from[next] = Some(current);
                    sequence += 1;
                    open.push(Reverse((cost + heuristic(next_cell, to), sequence, next)));
                }
            }
        }

        Vec::new()
    }

    fn cell_of(&self, index: usize) -> IVec2 {
        let index = index as i32;
        IVec2::new(index % self.width(), index / self.width())
    }

    fn is_open_around(&self, graph: GraphIndex, cell: IVec2) -> bool {
        LevelGrid::neighbours(cell)
            .iter()
            .all(|neighbour| self.is_passable(graph, *neighbour))
    }

    fn unwind(&self, came_from: &[Option<usize>], start: usize, goal: usize) -> Vec<IVec2> {
        let mut path = Vec::new();
        let mut current = goal;
        while current != start {
            path.push(self.cell_of(current));
            match came_from[current] {
                Some(previous) => current = previous,
                None => break,
            }
        }
        path.reverse();
        path
    }
}

fn heuristic(from: IVec2, to: IVec2) -> u32 {
    let gap = (to - from).abs();
    (gap.x + gap.y) as u32 * FREE_COST
}
