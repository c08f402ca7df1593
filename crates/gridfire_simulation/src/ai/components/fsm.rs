//! Enemy FSM components (state, timers, attack spec, budget).

use bevy::prelude::*;

use crate::ai::archetype::AttackStrategy;
use crate::combat::Explosion;
use crate::components::Actor;
use crate::config::TimerProfile;
use crate::logger;
use crate::navigation::GraphIndex;
use crate::world::CELL_SIZE;

/// Состояния врага
///
/// `Dead` absorbing, любая попытка выйти из него отклоняется в `Enemy::enter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnemyState {
    /// Ждёт, пока заметит игрока
    #[default]
    Idle,
    /// Заметил, проигрывает alert (alert_time)
    Alerted,
    /// Уходит вбок после серии атак
    Evading,
    /// Идёт по пути к игроку
    Chasing,
    /// Отходит от игрока (разрулить толкотню с другими врагами)
    Retreating,
    /// Целится (aim_time)
    Aiming,
    /// Атака отыграна, ждёт attack_time
    Attacking,
    /// Получил урон, ждёт hurt_time
    Hurting,
    Dead,
}

/// Таймеры состояний (сбрасываются атомарно при каждом переходе)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateTimers {
    pub attack: f32,
    pub hurt: f32,
    pub alert: f32,
    pub aim: f32,
}

/// Сколько атак до вынужденного Evading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackBudget {
    pub current: u32,
    pub max: u32,
}

impl AttackBudget {
    pub fn new(max: u32) -> Self {
        let max = max.max(1);
        Self { current: max, max }
    }

    pub fn is_exhausted(&self) -> bool {
        self.current == 0
    }

    pub fn spend(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    /// Новое значение в `[max − 1, max]`
    pub fn refresh(&mut self, rng: &mut impl rand::Rng) {
        self.current = rng.gen_range(self.max.saturating_sub(1)..=self.max);
    }
}

/// Параметры атаки
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackSpec {
    pub power: f32,
    pub accuracy: u32,
    /// `None` = без ограничения
    pub range: Option<f32>,
    pub pellets: u32,
    pub spread: f32,
}

impl AttackSpec {
    pub fn in_range(&self, distance: f32) -> bool {
        self.range.is_none_or(|range| distance <= range)
    }

    /// Угол между соседними дробинами: `atan2(CELL, CELL·S) / 2`
    pub fn pellet_angle(&self) -> f32 {
        CELL_SIZE.atan2(CELL_SIZE * self.spread) / 2.0
    }

    /// Смещения дробин от угла прицела, симметрично вокруг 0.
    /// 0 или 1 дробина → один луч
    pub fn pellet_offsets(&self) -> Vec<f32> {
        if self.pellets <= 1 {
            return vec![0.0];
        }
        let delta = self.pellet_angle();
        let center = (self.pellets - 1) as f32 / 2.0;
        (0..self.pellets)
            .map(|index| (index as f32 - center) * delta)
            .collect()
    }
}

/// Рост пятна под трупом
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StainProgress {
    pub radius: f32,
    pub timer: f32,
}

/// Враг: FSM + attack strategy
///
/// Нет публичного конструктора: враг собирается только из `EnemyProfile`
/// (`spawn_enemy`), поэтому archetype всегда один из закрытого набора.
#[derive(Component, Debug, Clone)]
#[require(Actor)]
pub struct Enemy {
    pub(crate) name: String,
    pub(crate) state: EnemyState,
    pub(crate) timers: StateTimers,
    pub(crate) thresholds: TimerProfile,
    pub(crate) attack: AttackSpec,
    pub(crate) strategy: AttackStrategy,
    pub(crate) path: Vec<IVec2>,
    pub(crate) path_index: usize,
    pub(crate) budget: AttackBudget,
    pub(crate) evade_destination: Option<IVec2>,
    /// Взрыв при смерти (owned)
    pub(crate) explosion: Option<Explosion>,
    pub(crate) bobbing: Option<f32>,
    pub(crate) bob_phase: f32,
    pub(crate) graph: GraphIndex,
    pub(crate) surrounding_open: bool,
    /// Последняя известная дистанция до игрока
    pub(crate) player_distance: f32,
    pub(crate) stain: StainProgress,
    pub(crate) drop: Option<String>,
    /// Разнесло взрывом (без prone и пятна)
    pub(crate) gibbed: bool,
}

impl Enemy {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state != EnemyState::Dead
    }

    pub fn timers(&self) -> StateTimers {
        self.timers
    }

    pub fn thresholds(&self) -> &TimerProfile {
        &self.thresholds
    }

    pub fn attack(&self) -> &AttackSpec {
        &self.attack
    }

    pub fn strategy(&self) -> &AttackStrategy {
        &self.strategy
    }

    pub fn path(&self) -> &[IVec2] {
        &self.path
    }

    pub fn path_index(&self) -> usize {
        self.path_index
    }

    pub fn budget(&self) -> AttackBudget {
        self.budget
    }

    pub fn evade_destination(&self) -> Option<IVec2> {
        self.evade_destination
    }

    pub fn player_distance(&self) -> f32 {
        self.player_distance
    }

    pub fn graph(&self) -> GraphIndex {
        self.graph
    }

    pub fn is_gibbed(&self) -> bool {
        self.gibbed
    }

    /// Следующая клетка пути (None если путь пройден)
    pub fn next_node(&self) -> Option<IVec2> {
        self.path.get(self.path_index).copied()
    }

    /// Generic set-state gate
    ///
    /// Мёртвый враг никуда не переходит. Переход сбрасывает таймеры, путь
    /// и evade destination одним шагом.
    pub(crate) fn enter(&mut self, next: EnemyState) -> bool {
        if !self.is_alive() {
            return false;
        }

        if self.state != next {
            logger::log(&format!("AI: {} {:?} → {:?}", self.name, self.state, next));
        }
        self.state = next;
        self.timers = StateTimers::default();
        self.path.clear();
        self.path_index = 0;
        self.evade_destination = None;
        true
    }

    /// Bob offset на этот tick (floaters)
    pub(crate) fn advance_bob(&mut self, delta: f32) -> f32 {
        let Some(amount) = self.bobbing else {
            return 0.0;
        };
        self.bob_phase = (self.bob_phase + delta * BOB_FREQUENCY) % std::f32::consts::TAU;
        amount * self.bob_phase.sin()
    }
}

/// Радиан в секунду
const BOB_FREQUENCY: f32 = 3.0;
