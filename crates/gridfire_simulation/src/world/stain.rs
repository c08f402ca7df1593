//! Stain buffer: floor decals (кровь под трупами)
//!
//! Буфер интенсивностей с фиксированным sub-cell разрешением. Рендер читает
//! `texel()` и рисует поверх пола.

use bevy::prelude::*;

use super::grid::{LevelGrid, CELL_SIZE};

/// Texels на одну клетку (по каждой оси)
pub const STAIN_RESOLUTION: usize = 8;

#[derive(Resource, Debug, Clone, Default)]
pub struct StainBuffer {
    width: usize,
    height: usize,
    texels: Vec<u8>,
}

impl StainBuffer {
    pub fn new(cells_wide: usize, cells_high: usize) -> Self {
        let width = cells_wide * STAIN_RESOLUTION;
        let height = cells_high * STAIN_RESOLUTION;
        Self {
            width,
            height,
            texels: vec![0; width * height],
        }
    }

    pub fn for_level(grid: &LevelGrid) -> Self {
        Self::new(grid.width() as usize, grid.height() as usize)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn texel(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.texels[y * self.width + x]
    }

    pub fn stained_at(&self, position: Vec2) -> bool {
        let texel = (position / Self::texel_size()).floor();
        if texel.x < 0.0 || texel.y < 0.0 {
            return false;
        }
        self.texel(texel.x as usize, texel.y as usize) > 0
    }

    /// Сколько texels закрашено
    pub fn coverage(&self) -> usize {
        self.texels.iter().filter(|texel| **texel > 0).count()
    }

    fn texel_size() -> f32 {
        CELL_SIZE / STAIN_RESOLUTION as f32
    }

    /// Растеризует круг: texels, чей центр внутри `radius`, закрашиваются.
    /// Возвращает сколько texels изменилось
    pub fn stain_circle(&mut self, center: Vec2, radius: f32) -> usize {
        if radius <= 0.0 || self.texels.is_empty() {
            return 0;
        }

        let size = Self::texel_size();
        let min = ((center - Vec2::splat(radius)) / size).floor().max(Vec2::ZERO);
        let max = ((center + Vec2::splat(radius)) / size).ceil();
        let max_x = (max.x.max(0.0) as usize).min(self.width);
        let max_y = (max.y.max(0.0) as usize).min(self.height);

        let mut changed = 0;
        for y in (min.y as usize)..max_y {
            for x in (min.x as usize)..max_x {
                let texel_center = (Vec2::new(x as f32, y as f32) + Vec2::splat(0.5)) * size;
                if texel_center.distance(center) > radius {
                    continue;
                }
                let texel = &mut self.texels[y * self.width + x];
                if *texel != u8::MAX {
                    *texel = u8::MAX;
                    changed += 1;
                }
            }
        }
        changed
    }
}
