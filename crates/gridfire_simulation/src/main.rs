//! Headless симуляция GRIDFIRE
//!
//! Ставит тестовый уровень, игрока и по врагу каждого archetype и гоняет
//! fixed tick'и без рендера. Опционально: `gridfire_simulation <config.toml>`.

use bevy::prelude::*;
use gridfire_simulation::{
    create_headless_app_with_config, install_level, log_error, log_info, spawn_enemy, spawn_player,
    step_tick, Enemy, Health, LevelGrid, SimulationConfig,
};

const LEVEL: &str = "
    XXXXXXXXXXXXXXXX
    X..............X
    X..####..=.....X
    X..#...........X
    X..#....####...X
    X..............D
    X..............X
    XXXXXXXXXXXXXXXX
";

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match SimulationConfig::from_path(&path) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("{error}");
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };
    println!("Starting GRIDFIRE headless simulation (seed: {})", config.seed);

    let grid = match LevelGrid::parse(LEVEL) {
        Ok(grid) => grid,
        Err(error) => {
            log_error(&format!("Level: {error}"));
            std::process::exit(1);
        }
    };

    let profiles = config.enemies.clone();
    let mut app = create_headless_app_with_config(config);
    install_level(app.world_mut(), grid);
    let player = spawn_player(app.world_mut(), Vec2::new(2.5, 6.5), 100.0);

    for (slot, profile) in profiles.iter().enumerate() {
        let position = Vec2::new(10.5 + slot as f32, 1.5 + slot as f32 * 2.0);
        spawn_enemy(app.world_mut(), profile, position);
    }

    for tick in 0..1000 {
        step_tick(&mut app);

        if tick % 100 == 0 {
            let world = app.world_mut();
            let health = world.get::<Health>(player).map(|health| health.current).unwrap_or(0.0);
            let mut enemies = world.query::<&Enemy>();
            let alive = enemies.iter(world).filter(|enemy| enemy.is_alive()).count();
            log_info(&format!("Tick {}: player hp {:.1}, {} enemies alive", tick, health, alive));
        }
    }

    println!("Simulation complete!");
}
