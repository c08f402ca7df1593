//! Explosion: кольцо HitScan лучей из точки
//!
//! Лучи создаются один раз при конструировании (как и у оружия) и переиспользуются.
//! Перед залпом лежащие трупы в радиусе временно становятся blocking, чтобы
//! их раскидало, после залпа возвращаются в inert.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;

use super::events::EffectKind;
use super::hitscan::{HitScan, RayWorld, Strike};
use super::outbox::CombatOutbox;
use crate::config::{ExplosionProfile, SimulationConfig};
use crate::world::{BodyIndex, LevelGrid};

pub const DEFAULT_EXPLOSION_RAYS: usize = 24;

#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    rays: Vec<(HitScan, f32)>,
    power: f32,
    range: f32,
    source: Option<Entity>,
}

impl Explosion {
    pub fn new(source: Option<Entity>, profile: &ExplosionProfile, ray_count: usize) -> Self {
        let ray_count = ray_count.max(1);
        let step = TAU / ray_count as f32;
        let template = HitScan::new(source, profile.power, Some(profile.range), 1)
            .with_fade(profile.fade)
            .with_penetration(profile.penetration)
            .explosive();

        let rays = (0..ray_count)
            .map(|index| (template.clone(), index as f32 * step))
            .collect();

        Self {
            rays,
            power: profile.power,
            range: profile.range,
            source,
        }
    }

    pub fn rays(&self) -> &[(HitScan, f32)] {
        &self.rays
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    pub fn source(&self) -> Option<Entity> {
        self.source
    }

    /// Переназначает владельца (снаряд сменил launcher, source уничтожен)
    pub fn set_source(&mut self, source: Option<Entity>) {
        self.source = source;
        for (ray, _) in self.rays.iter_mut() {
            ray.source = source;
        }
    }

    /// Взрыв в `origin`
    ///
    /// `viewer`: позиция камеры (игрока) для shake. Non-positive range:
    /// лучи не летят, ambient cues всё равно срабатывают.
    #[allow(clippy::too_many_arguments)]
    pub fn detonate(
        &self,
        origin: Vec2,
        grid: &LevelGrid,
        bodies: &mut BodyIndex,
        rng: &mut impl Rng,
        outbox: &mut CombatOutbox,
        viewer: Option<Vec2>,
        config: &SimulationConfig,
    ) -> Vec<Strike> {
        outbox.effect(EffectKind::Explosion, origin, self.source);
        outbox.play("explosion", Some(origin));
        outbox.flash(origin, config.flash_intensity);
        if let Some(viewer) = viewer {
            let distance = viewer.distance(origin).max(1.0);
            outbox.shake(self.power * config.shake_scale / distance);
        }

        if self.range <= 0.0 {
            return Vec::new();
        }

        let woken = bodies.wake_inert_within(origin, self.range);
        for entity in &woken {
            outbox.awaken(*entity);
        }

        let mut strikes = Vec::new();
        {
            let world = RayWorld { grid, bodies: &*bodies };
            for (ray, angle) in &self.rays {
                strikes.extend(ray.run_from(origin, *angle, world, rng, outbox));
            }
        }

        for entity in woken {
            bodies.set_blocking(entity, false);
        }

        strikes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Body, BodyFlags, BodyKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn profile(range: f32) -> ExplosionProfile {
        ExplosionProfile {
            power: 20.0,
            range,
            penetration: None,
            fade: false,
        }
    }

    fn arena() -> LevelGrid {
        LevelGrid::parse(
            "
            #########
            #.......#
            #.......#
            #.......#
            #.......#
            #.......#
            #########
            ",
        )
        .unwrap()
    }

    #[test]
    fn test_rays_uniformly_spaced() {
        let explosion = Explosion::new(None, &profile(3.0), DEFAULT_EXPLOSION_RAYS);
        let rays = explosion.rays();

        assert_eq!(rays.len(), 24);
        let step = TAU / 24.0;
        for (index, (ray, angle)) in rays.iter().enumerate() {
            assert!((angle - index as f32 * step).abs() < 1e-5);
            assert!(ray.explosive);
            assert_eq!(ray.range, Some(3.0));
        }
    }

    #[test]
    fn test_zero_range_only_ambient_cues() {
        let grid = arena();
        let mut bodies = BodyIndex::default();
        let mut outbox = CombatOutbox::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = SimulationConfig::default();

        let explosion = Explosion::new(None, &profile(0.0), DEFAULT_EXPLOSION_RAYS);
        let strikes = explosion.detonate(
            Vec2::new(4.5, 3.5),
            &grid,
            &mut bodies,
            &mut rng,
            &mut outbox,
            Some(Vec2::new(1.5, 3.5)),
            &config,
        );

        assert!(strikes.is_empty());
        assert_eq!(outbox.effects.len(), 1);
        assert_eq!(outbox.effects[0].kind, EffectKind::Explosion);
        assert_eq!(outbox.flashes.len(), 1);
        assert_eq!(outbox.shakes.len(), 1);
        assert!((outbox.shakes[0].amount - 20.0 * config.shake_scale / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_hits_nearby_and_restores_inert_corpse() {
        let grid = arena();
        let mut bodies = BodyIndex::default();
        let victim = Entity::from_raw(1);
        let corpse = Entity::from_raw(2);
        bodies.insert_body(
            victim,
            &Body::new(BodyKind::Enemy, Vec2::new(5.5, 3.5), 0.4, 0.4).with_flags(BodyFlags::DESTROYABLE),
            true,
            false,
        );
        bodies.insert_body(
            corpse,
            &Body::new(BodyKind::Enemy, Vec2::new(4.5, 4.5), 0.4, 0.4).with_flags(BodyFlags::DESTROYABLE),
            false,
            true,
        );
        bodies.mark_prone(corpse);

        let mut outbox = CombatOutbox::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let explosion = Explosion::new(None, &profile(3.0), DEFAULT_EXPLOSION_RAYS);
        explosion.detonate(
            Vec2::new(4.5, 3.5),
            &grid,
            &mut bodies,
            &mut rng,
            &mut outbox,
            None,
            &SimulationConfig::default(),
        );

        assert!(outbox.hits.iter().any(|hit| hit.target == victim));
        assert!(outbox.hits.iter().any(|hit| hit.target == corpse));
        assert_eq!(outbox.awakened.len(), 1);
        assert_eq!(outbox.awakened[0].entity, corpse);
        // Inert снова
        assert!(!bodies.get(corpse).unwrap().blocking);
        assert!(outbox.shakes.is_empty());
    }
}
