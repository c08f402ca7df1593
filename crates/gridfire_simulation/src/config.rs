//! Simulation config (TOML)
//!
//! `SimulationConfig`: tick rate, seed, физика трупов, cue tuning и профили врагов.
//! Всё с `#[serde(default)]`: пустой файл = дефолтная конфигурация.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::{Penetration, DEFAULT_EXPLOSION_RAYS};
use crate::navigation::GraphIndex;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// FixedUpdate частота
    pub tick_hz: f64,
    pub seed: u64,
    /// Velocity от попадания = damage × knockback_scale
    pub knockback_scale: f32,
    /// Множитель скорости трупа за tick
    pub dead_velocity_decay: f32,
    /// Ниже этой скорости труп останавливается
    pub dead_velocity_floor: f32,
    /// Интервал роста пятна (сек)
    pub stain_interval: f32,
    pub stain_growth: f32,
    pub stain_max_radius: f32,
    pub explosion_ray_count: usize,
    pub shake_scale: f32,
    pub flash_intensity: f32,
    /// Разброс угла выпавшего предмета (радианы, ±)
    pub item_scatter: f32,
    pub player_dying_time: f32,
    pub enemies: Vec<EnemyProfile>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            seed: 42,
            knockback_scale: 0.05,
            dead_velocity_decay: 0.85,
            dead_velocity_floor: 0.01,
            stain_interval: 0.1,
            stain_growth: 0.05,
            stain_max_radius: 0.45,
            explosion_ray_count: DEFAULT_EXPLOSION_RAYS,
            shake_scale: 0.1,
            flash_intensity: 1.0,
            item_scatter: 0.5,
            player_dying_time: 1.0,
            enemies: vec![
                EnemyProfile::grunt(),
                EnemyProfile::gunner(),
                EnemyProfile::rocketeer(),
            ],
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validated()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Проверка + нормализация профилей
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if !(self.tick_hz.is_finite() && self.tick_hz > 0.0) {
            return Err(ConfigError::Invalid(format!("tick_hz must be positive, got {}", self.tick_hz)));
        }
        if !(self.dead_velocity_decay > 0.0 && self.dead_velocity_decay < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "dead_velocity_decay must be in (0, 1), got {}",
                self.dead_velocity_decay
            )));
        }
        if self.stain_interval <= 0.0 {
            return Err(ConfigError::Invalid("stain_interval must be positive".into()));
        }
        self.explosion_ray_count = self.explosion_ray_count.max(1);

        for (index, profile) in self.enemies.iter_mut().enumerate() {
            if profile.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("enemy profile #{index} has no name")));
            }
            profile.normalize();
        }
        Ok(self)
    }

    pub fn profile(&self, name: &str) -> Option<&EnemyProfile> {
        self.enemies.iter().find(|profile| profile.name == name)
    }
}

/// Пороги таймеров FSM (сек)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerProfile {
    pub alert_time: f32,
    pub aim_time: f32,
    pub attack_time: f32,
    pub hurt_time: f32,
}

impl Default for TimerProfile {
    fn default() -> Self {
        Self {
            alert_time: 0.5,
            aim_time: 0.4,
            attack_time: 0.3,
            hurt_time: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackProfile {
    pub power: f32,
    pub accuracy: u32,
    /// `None` / non-positive = без ограничения
    pub range: Option<f32>,
    pub pellets: u32,
    /// Spread S: угол между дробинами `Δ = atan2(CELL, CELL·S) / 2`
    pub spread: f32,
    pub fade: bool,
    pub penetration: Option<Penetration>,
    pub instant_kill: bool,
}

impl Default for AttackProfile {
    fn default() -> Self {
        Self {
            power: 5.0,
            accuracy: 3,
            range: Some(8.0),
            pellets: 1,
            spread: 8.0,
            fade: false,
            penetration: None,
            instant_kill: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionProfile {
    pub power: f32,
    pub range: f32,
    pub penetration: Option<Penetration>,
    pub fade: bool,
}

impl Default for ExplosionProfile {
    fn default() -> Self {
        Self {
            power: 20.0,
            range: 2.5,
            penetration: None,
            fade: true,
        }
    }
}

/// Archetype: как враг атакует
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArchetypeProfile {
    Melee,
    HitScan,
    Projectile {
        speed: f32,
        pool_size: usize,
        #[serde(default = "default_projectile_radius")]
        radius: f32,
        #[serde(default)]
        explosion: Option<ExplosionProfile>,
    },
}

impl Default for ArchetypeProfile {
    fn default() -> Self {
        Self::Melee
    }
}

fn default_projectile_radius() -> f32 {
    0.1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyProfile {
    pub name: String,
    pub archetype: ArchetypeProfile,
    pub health: f32,
    pub speed: f32,
    pub acceleration: f32,
    pub width: f32,
    pub length: f32,
    pub timers: TimerProfile,
    pub attack: AttackProfile,
    pub attack_budget: u32,
    pub graph: GraphIndex,
    pub surrounding_open: bool,
    /// Амплитуда bobbing (floaters)
    pub bobbing: Option<f32>,
    pub death_explosion: Option<ExplosionProfile>,
    pub drop: Option<String>,
    pub explosion_immune: bool,
}

impl Default for EnemyProfile {
    fn default() -> Self {
        Self::grunt()
    }
}

impl EnemyProfile {
    /// Melee враг
    pub fn grunt() -> Self {
        Self {
            name: "grunt".into(),
            archetype: ArchetypeProfile::Melee,
            health: 30.0,
            speed: 2.5,
            acceleration: 0.0,
            width: 0.5,
            length: 0.5,
            timers: TimerProfile::default(),
            attack: AttackProfile {
                power: 6.0,
                accuracy: 2,
                range: Some(1.2),
                ..default()
            },
            attack_budget: 3,
            graph: GraphIndex::Walker,
            surrounding_open: false,
            bobbing: None,
            death_explosion: None,
            drop: None,
            explosion_immune: false,
        }
    }

    /// HitScan дробовик
    pub fn gunner() -> Self {
        Self {
            name: "gunner".into(),
            archetype: ArchetypeProfile::HitScan,
            health: 25.0,
            speed: 2.0,
            attack: AttackProfile {
                power: 3.0,
                accuracy: 3,
                range: Some(10.0),
                pellets: 3,
                spread: 8.0,
                fade: true,
                ..default()
            },
            attack_budget: 2,
            drop: Some("shells".into()),
            ..Self::grunt()
        }
    }

    /// Projectile + взрыв
    pub fn rocketeer() -> Self {
        Self {
            name: "rocketeer".into(),
            archetype: ArchetypeProfile::Projectile {
                speed: 6.0,
                pool_size: 3,
                radius: default_projectile_radius(),
                explosion: Some(ExplosionProfile::default()),
            },
            health: 40.0,
            speed: 1.5,
            graph: GraphIndex::Floater,
            bobbing: Some(0.05),
            attack: AttackProfile {
                power: 8.0,
                accuracy: 2,
                range: None,
                ..default()
            },
            attack_budget: 2,
            explosion_immune: true,
            ..Self::grunt()
        }
    }

    /// Out-of-range значения → безопасные
    pub fn normalize(&mut self) {
        self.health = self.health.max(1.0);
        self.speed = self.speed.max(0.0);
        self.acceleration = self.acceleration.max(0.0);
        self.attack.accuracy = self.attack.accuracy.max(1);
        self.attack.pellets = self.attack.pellets.max(1);
        self.attack.range = self.attack.range.filter(|range| *range > 0.0);
        self.attack_budget = self.attack_budget.max(1);
        if let ArchetypeProfile::Projectile { pool_size, .. } = &mut self.archetype {
            *pool_size = (*pool_size).max(1);
        }
    }
}
