//! Damage aggregation
//!
//! Все попадания за tick копятся в `DamageAccumulator` цели и схлопываются
//! в одно применение урона: сумма damage, circular mean углов, OR instant_kill.

use bevy::prelude::*;

/// Одно попадание
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    pub damage: f32,
    /// Направление удара (радианы), куда толкает цель
    pub angle: f32,
    pub instant_kill: bool,
}

/// Результат collapse: один hurt на tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollapsedHit {
    pub damage: f32,
    pub angle: f32,
    pub instant_kill: bool,
    pub count: usize,
}

/// Очередь hit records на destroyable entity
#[derive(Component, Debug, Clone, Default)]
pub struct DamageAccumulator {
    records: Vec<HitRecord>,
}

impl DamageAccumulator {
    pub fn push(&mut self, record: HitRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[HitRecord] {
        &self.records
    }

    /// Схлопывает очередь и очищает её. `None` если попаданий не было
    pub fn collapse(&mut self) -> Option<CollapsedHit> {
        let angle = circular_mean(self.records.iter().map(|record| record.angle))?;
        let collapsed = CollapsedHit {
            damage: self.records.iter().map(|record| record.damage).sum(),
            angle,
            instant_kill: self.records.iter().any(|record| record.instant_kill),
            count: self.records.len(),
        };
        self.records.clear();
        Some(collapsed)
    }
}

/// Circular mean: `atan2(Σsin, Σcos)`
///
/// Усреднение углов без разрыва на 0/2π ({350°, 10°} → 0°).
pub fn circular_mean(angles: impl IntoIterator<Item = f32>) -> Option<f32> {
    let mut sum = Vec2::ZERO;
    let mut count = 0;
    for angle in angles {
        sum += Vec2::new(angle.cos(), angle.sin());
        count += 1;
    }
    (count > 0).then(|| sum.y.atan2(sum.x))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(damage: f32, degrees: f32) -> HitRecord {
        HitRecord {
            damage,
            angle: degrees.to_radians(),
            instant_kill: false,
        }
    }

    #[test]
    fn test_circular_mean_quarter() {
        let mean = circular_mean([0.0_f32, 90.0_f32.to_radians()]).unwrap();
        assert!((mean.to_degrees() - 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_circular_mean_wraps_zero() {
        let mean = circular_mean([350.0_f32.to_radians(), 10.0_f32.to_radians()]).unwrap();
        assert!(mean.to_degrees().abs() < 1e-4);
        assert!(circular_mean(std::iter::empty()).is_none());
    }

    #[test]
    fn test_collapse_sums_and_clears() {
        let mut accumulator = DamageAccumulator::default();
        accumulator.push(record(5.0, 10.0));
        accumulator.push(record(7.5, 20.0));
        accumulator.push(record(2.5, 30.0));

        let hit = accumulator.collapse().unwrap();
        assert_eq!(hit.damage, 15.0);
        assert_eq!(hit.count, 3);
        assert!((hit.angle.to_degrees() - 20.0).abs() < 1e-3);
        assert!(!hit.instant_kill);

        // Очередь пуста: второго hurt нет
        assert!(accumulator.is_empty());
        assert!(accumulator.collapse().is_none());
    }

    #[test]
    fn test_collapse_any_instant_kill() {
        let mut accumulator = DamageAccumulator::default();
        accumulator.push(record(1.0, 0.0));
        accumulator.push(HitRecord {
            damage: 0.5,
            angle: 0.0,
            instant_kill: true,
        });

        assert!(accumulator.collapse().unwrap().instant_kill);
    }
}
