//! Базовые компоненты акторов: Actor, Health, Prone, Settled

use bevy::prelude::*;

use crate::combat::DamageAccumulator;

/// Живая половина актора (враг или игрок)
///
/// Позиция и footprint лежат в `Body`. Здесь: ориентация, скорость и
/// "стою на трупе" elevation.
///
/// Автоматически добавляет Health и DamageAccumulator через Required Components.
#[derive(Component, Debug, Clone, PartialEq)]
#[require(Health, DamageAccumulator)]
pub struct Actor {
    /// Heading (радианы, 0 = +X)
    pub heading: f32,
    pub velocity: Vec2,
    /// Максимальная скорость (units/sec). 0 = турель
    pub speed: f32,
    /// Разгон (units/sec²). 0 = мгновенно до `speed`
    pub acceleration: f32,
    /// Высота от prone тел под ногами (blended)
    pub elevation: f32,
    /// Смещение от bobbing (floaters)
    pub bob_offset: f32,
    /// Prone тела, на которых актор сейчас стоит
    pub standing_on: Vec<Entity>,
}

impl Default for Actor {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl Actor {
    pub fn new(speed: f32) -> Self {
        Self {
            heading: 0.0,
            velocity: Vec2::ZERO,
            speed,
            acceleration: 0.0,
            elevation: 0.0,
            bob_offset: 0.0,
            standing_on: Vec::new(),
        }
    }

    pub fn with_acceleration(mut self, acceleration: f32) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn is_turret(&self) -> bool {
        self.speed <= 0.0
    }

    /// Скорость на этот tick: разгон от текущей до `speed`
    pub fn accelerated_speed(&self, delta: f32) -> f32 {
        if self.acceleration <= 0.0 {
            return self.speed;
        }
        (self.velocity.length() + self.acceleration * delta).min(self.speed)
    }

    pub fn face(&mut self, from: Vec2, to: Vec2) {
        let offset = to - from;
        if offset != Vec2::ZERO {
            self.heading = offset.y.atan2(offset.x);
        }
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    /// Толчок от попадания: вдоль угла удара
    pub fn push(&mut self, angle: f32, strength: f32) {
        self.velocity += Vec2::from_angle(angle) * strength;
    }
}

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    /// Instant kill
    pub fn deplete(&mut self) {
        self.current = 0.0;
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }
}

/// Marker: тело лежит на полу (труп)
///
/// Не блокирует, на него можно наступить, поднимает elevation стоящих сверху.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Prone;

/// Marker: мёртвое тело успокоилось и больше не тикает
///
/// Снимается когда взрыв "будит" тело (BodyAwakened).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Settled;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(100.0);
        health.take_damage(30.0);
        assert_eq!(health.current, 70.0);
        assert!(!health.is_depleted());

        health.take_damage(500.0); // Clamp к 0
        assert_eq!(health.current, 0.0);
        assert!(health.is_depleted());
    }

    #[test]
    fn test_health_heal() {
        let mut health = Health::new(100.0);
        health.take_damage(50.0);
        health.heal(30.0);
        assert_eq!(health.current, 80.0);

        health.heal(100.0); // Clamp к max
        assert_eq!(health.current, 100.0);
    }

    #[test]
    fn test_accelerated_speed() {
        let mut actor = Actor::new(4.0).with_acceleration(10.0);
        assert!((actor.accelerated_speed(0.1) - 1.0).abs() < 1e-6);

        actor.velocity = Vec2::new(3.5, 0.0);
        assert_eq!(actor.accelerated_speed(0.1), 4.0);

        let instant = Actor::new(3.0);
        assert_eq!(instant.accelerated_speed(0.016), 3.0);
    }
}
