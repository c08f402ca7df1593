//! Tile grid уровня: клетки, ASCII карты, геометрия клеток

use bevy::prelude::*;
use thiserror::Error;

/// Размер клетки в world units
pub const CELL_SIZE: f32 = 1.0;

/// Тип клетки
///
/// ASCII: `.` пол, `#` стена, `X` edge стена (край карты, без impact cue),
/// `=` transparent (видно и простреливается, но не пройти пешком), `D` дверь.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellKind {
    #[default]
    Floor,
    Wall,
    Edge,
    Transparent,
    Door,
}

impl CellKind {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(Self::Floor),
            '#' => Some(Self::Wall),
            'X' => Some(Self::Edge),
            '=' => Some(Self::Transparent),
            'D' => Some(Self::Door),
            _ => None,
        }
    }

    /// Останавливает лучи и line of sight
    pub fn blocks_ray(self) -> bool {
        matches!(self, Self::Wall | Self::Edge | Self::Door)
    }

    /// Останавливает пешие тела. `hovering` тела проходят transparent клетки
    pub fn blocks_movement(self, hovering: bool) -> bool {
        match self {
            Self::Floor => false,
            Self::Transparent => !hovering,
            Self::Wall | Self::Edge | Self::Door => true,
        }
    }

    pub fn is_edge(self) -> bool {
        self == Self::Edge
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level map is empty")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown cell symbol '{symbol}' at ({x}, {y})")]
    UnknownCell { symbol: char, x: usize, y: usize },
}

/// Level grid (Resource)
///
/// Клетка `(x, y)` покрывает `[x, x+1) × [y, y+1)` в world units (× CELL_SIZE).
/// Всё за пределами карты считается `Edge`.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LevelGrid {
    width: i32,
    height: i32,
    cells: Vec<CellKind>,
}

impl Default for LevelGrid {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl LevelGrid {
    /// Пустой уровень (весь пол)
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![CellKind::Floor; (width * height) as usize],
        }
    }

    /// Парсинг ASCII карты. Строки сверху вниз = y по возрастанию.
    /// Пустые строки и отступы игнорируются.
    pub fn parse(map: &str) -> Result<Self, LevelError> {
        let rows: Vec<&str> = map
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let Some(first) = rows.first() else {
            return Err(LevelError::Empty);
        };
        let expected = first.chars().count();

        let mut cells = Vec::with_capacity(expected * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != expected {
                return Err(LevelError::RaggedRow { row: y, expected, found });
            }
            for (x, symbol) in row.chars().enumerate() {
                let kind =
                    CellKind::from_symbol(symbol).ok_or(LevelError::UnknownCell { symbol, x, y })?;
                cells.push(kind);
            }
        }

        Ok(Self {
            width: expected as i32,
            height: rows.len() as i32,
            cells,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| (cell.y * self.width + cell.x) as usize)
    }

    pub fn cell(&self, cell: IVec2) -> CellKind {
        self.index(cell)
            .map(|index| self.cells[index])
            .unwrap_or(CellKind::Edge)
    }

    pub fn cell_at(position: Vec2) -> IVec2 {
        (position / CELL_SIZE).floor().as_ivec2()
    }

    pub fn cell_center(cell: IVec2) -> Vec2 {
        (cell.as_vec2() + Vec2::splat(0.5)) * CELL_SIZE
    }

    /// 8 соседей (сначала ортогональные, потом диагональные)
    pub fn neighbours(cell: IVec2) -> [IVec2; 8] {
        [
            cell + IVec2::new(1, 0),
            cell + IVec2::new(-1, 0),
            cell + IVec2::new(0, 1),
            cell + IVec2::new(0, -1),
            cell + IVec2::new(1, 1),
            cell + IVec2::new(-1, 1),
            cell + IVec2::new(1, -1),
            cell + IVec2::new(-1, -1),
        ]
    }

    /// Клетки, которые пересекает AABB footprint
    pub fn overlapping_cells(center: Vec2, half: Vec2) -> impl Iterator<Item = IVec2> {
        // Чуть сжимаем, чтобы footprint вплотную к стене не считался пересечением
        let shrink = Vec2::splat(1e-4);
        let min = Self::cell_at(center - half + shrink);
        let max = Self::cell_at(center + half - shrink);
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| IVec2::new(x, y)))
    }

    /// Первая клетка под footprint, которая блокирует движение
    pub fn blocking_cell(&self, center: Vec2, half: Vec2, hovering: bool) -> Option<IVec2> {
        Self::overlapping_cells(center, half).find(|cell| self.cell(*cell).blocks_movement(hovering))
    }

    /// Footprint задевает стену, через которую не пролетают лучи
    pub fn embeds_solid(&self, center: Vec2, half: Vec2) -> bool {
        Self::overlapping_cells(center, half).any(|cell| self.cell(cell).blocks_ray())
    }

    pub fn cells(&self) -> impl Iterator<Item = (IVec2, CellKind)> + '_ {
        self.cells.iter().enumerate().map(move |(index, kind)| {
            let index = index as i32;
            (IVec2::new(index % self.width, index / self.width), *kind)
        })
    }
}
