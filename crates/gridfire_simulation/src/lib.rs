//! GRIDFIRE Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: enemy AI и ranged combat для grid шутера.
//! Хост (рендер, звук, ввод) читает события и ставит velocity игроку,
//! всё остальное считается здесь, детерминированно от seed.
//!
//! Порядок tick'а (FixedUpdate, `SimulationSet` chain):
//! Index → Behavior → Projectiles → Motion → Reactions → Damage

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod config;
pub mod logger;
pub mod navigation;
pub mod physics;
pub mod player;
pub mod world;

// Re-export базовых типов для удобства
pub use ai::{spawn_enemy, AIPlugin, Enemy, EnemyState};
pub use combat::{CombatOutbox, CombatPlugin, DamageAccumulator, Explosion, HitScan, Projectile, ProjectilePool};
pub use components::*;
pub use config::{ConfigError, EnemyProfile, SimulationConfig};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use navigation::{GraphIndex, NavGrid};
pub use physics::{ActorCollision, CollisionTarget, DoorBumped, PhysicsPlugin};
pub use player::{spawn_player, Player, PlayerPlugin, PlayerVitals};
pub use world::{install_level, spawn_prop, AudioLedger, BodyIndex, LevelGrid, StainBuffer};

/// Фазы одного tick'а
///
/// Все атакующие (Behavior, Projectiles) пишут hit records до того, как
/// цели резолвят очереди (Damage).
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Snapshot тел, сброс audio ledger
    Index,
    /// FSM врагов + attack hooks
    Behavior,
    /// Launch + полёт снарядов
    Projectiles,
    /// Интеграция velocity, коллизии
    Motion,
    /// Реакции на коллизии
    Reactions,
    /// Очереди урона → hurt / смерть
    Damage,
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Берёт `SimulationConfig`, если он уже вставлен, иначе дефолтный.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<SimulationConfig>()
            .cloned()
            .unwrap_or_default();

        app.insert_resource(Time::<Fixed>::from_hz(config.tick_hz))
            // Детерминистичный RNG (seed из конфига)
            .insert_resource(DeterministicRng::new(config.seed))
            .insert_resource(config)
            .init_resource::<BodyIndex>()
            .init_resource::<AudioLedger>()
            .init_resource::<LevelGrid>()
            .init_resource::<NavGrid>()
            .init_resource::<StainBuffer>()
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Index,
                    SimulationSet::Behavior,
                    SimulationSet::Projectiles,
                    SimulationSet::Motion,
                    SimulationSet::Reactions,
                    SimulationSet::Damage,
                )
                    .chain(),
            )
            .add_systems(
                FixedUpdate,
                (world::refresh_body_index, world::advance_audio_ledger)
                    .chain()
                    .in_set(SimulationSet::Index),
            )
            // Подсистемы
            .add_plugins((CombatPlugin, AIPlugin, PhysicsPlugin, PlayerPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время ручное: каждый `app.update()` (см. `step_tick`) = ровно один fixed tick.
pub fn create_headless_app(seed: u64) -> App {
    let config = SimulationConfig {
        seed,
        ..default()
    };
    create_headless_app_with_config(config)
}

pub fn create_headless_app_with_config(config: SimulationConfig) -> App {
    init_logger();

    let timestep = Duration::from_secs_f64(1.0 / config.tick_hz);
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(config)
        .add_plugins(SimulationPlugin);
    // Тот же Duration, что и у Time<Fixed>: ни накопления, ни пропусков
    let timestep = app
        .world()
        .get_resource::<Time<Fixed>>()
        .map(|time| time.timestep())
        .unwrap_or(timestep);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(timestep));

    app.finish();
    app.cleanup();
    // Первый update только заводит часы (delta = 0), fixed tick'а в нём нет
    app.update();

    app
}

/// Один fixed tick
pub fn step_tick(app: &mut App) {
    app.update();
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
