//! Player component + vitals
//!
//! Игрок умирает не как враг: Alive → Dying (player_dying_time) → Dead.
//! Управление (velocity, выстрелы) ставит хост, симуляция только считает урон.

use bevy::prelude::*;

use crate::combat::{CollapsedHit, CombatOutbox};
use crate::components::{Actor, Body, BodyFlags, BodyKind, Health};
use crate::config::SimulationConfig;
use crate::logger;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PlayerVitals {
    #[default]
    Alive,
    /// Анимация смерти, урон больше не считается
    Dying { timer: f32 },
    Dead,
}

/// Marker + vitals для player-controlled entity
///
/// AI systems используют `Without<Player>` filter.
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(Actor)]
pub struct Player {
    pub vitals: PlayerVitals,
}

impl Player {
    /// Для snapshot'а тел: враги видят только живого игрока
    pub fn is_alive(&self) -> bool {
        self.vitals == PlayerVitals::Alive
    }

    pub fn is_dead(&self) -> bool {
        self.vitals == PlayerVitals::Dead
    }

    /// Collapsed урон за tick: толчок всегда, урон только пока Alive
    pub fn hurt(
        &mut self,
        actor: &mut Actor,
        health: &mut Health,
        hit: &CollapsedHit,
        outbox: &mut CombatOutbox,
        config: &SimulationConfig,
    ) {
        actor.push(hit.angle, hit.damage * config.knockback_scale);
        if !self.is_alive() {
            return;
        }

        if hit.instant_kill {
            health.deplete();
        } else {
            health.take_damage(hit.damage);
        }

        if health.is_depleted() {
            self.vitals = PlayerVitals::Dying { timer: 0.0 };
            outbox.play("player_death", None);
            logger::log_info("💀 Player dying");
        } else {
            outbox.play("player_hurt", None);
        }
    }

    /// Dying → Dead после `dying_time`. true на tick'е перехода
    pub fn advance_vitals(&mut self, delta: f32, dying_time: f32) -> bool {
        let PlayerVitals::Dying { timer } = &mut self.vitals else {
            return false;
        };
        *timer += delta;
        if *timer >= dying_time {
            self.vitals = PlayerVitals::Dead;
            logger::log_info("Player dead");
            return true;
        }
        false
    }
}

/// Система: Dying → Dead
pub fn tick_player_vitals(
    mut players: Query<&mut Player>,
    config: Res<SimulationConfig>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    for mut player in players.iter_mut() {
        player.advance_vitals(delta, config.player_dying_time);
    }
}

/// Spawn helper для игрока
pub fn spawn_player(world: &mut World, position: Vec2, health: f32) -> Entity {
    let body = Body::new(BodyKind::Player, position, 0.5, 0.5).with_flags(BodyFlags::DESTROYABLE);
    let entity = world
        .spawn((Player::default(), Actor::new(4.0), Health::new(health), body))
        .id();
    logger::log_info(&format!(
        "Player spawned: {:?} at ({:.1}, {:.1})",
        entity, position.x, position.y
    ));
    entity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(damage: f32) -> CollapsedHit {
        CollapsedHit {
            damage,
            angle: 0.0,
            instant_kill: false,
            count: 1,
        }
    }

    #[test]
    fn test_player_dies_through_dying() {
        let config = SimulationConfig::default();
        let mut outbox = CombatOutbox::default();
        let mut player = Player::default();
        let mut actor = Actor::default();
        let mut health = Health::new(10.0);

        player.hurt(&mut actor, &mut health, &hit(4.0), &mut outbox, &config);
        assert!(player.is_alive());
        assert_eq!(health.current, 6.0);

        player.hurt(&mut actor, &mut health, &hit(20.0), &mut outbox, &config);
        assert!(matches!(player.vitals, PlayerVitals::Dying { .. }));
        assert_eq!(health.current, 0.0);

        assert!(!player.advance_vitals(0.5, 1.0));
        assert!(player.advance_vitals(0.6, 1.0));
        assert!(player.is_dead());
    }

    #[test]
    fn test_dying_player_takes_only_knockback() {
        let config = SimulationConfig::default();
        let mut outbox = CombatOutbox::default();
        let mut player = Player {
            vitals: PlayerVitals::Dying { timer: 0.0 },
        };
        let mut actor = Actor::default();
        let mut health = Health::new(10.0);

        player.hurt(&mut actor, &mut health, &hit(5.0), &mut outbox, &config);

        assert_eq!(health.current, 10.0);
        assert!(actor.velocity.x > 0.0);
        assert!(outbox.sounds.is_empty());
    }
}
