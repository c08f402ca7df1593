//! Enemy behavior: per-tick FSM, переходы, archetype hooks, hurt и смерть.
//!
//! Всё, что читает мир, получает его через `BehaviorContext` (snapshot тел,
//! grid, nav веса). Side effects уходят в `CombatOutbox`.

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::archetype::{ArchetypeKind, AttackStrategy};
use super::components::{Enemy, EnemyState};
use super::{evasion, perception};
use crate::combat::{accuracy_roll, CollapsedHit, CombatOutbox, RayWorld};
use crate::components::{Actor, Body, BodyFlags, Health};
use crate::config::SimulationConfig;
use crate::logger;
use crate::navigation::{NavGrid, PathOverlay};
use crate::world::{BodyIndex, BodySnapshot, LevelGrid, StainBuffer};

/// Дистанция, на которой узел пути считается достигнутым
pub const ARRIVE_EPSILON: f32 = 0.05;

/// Мир для одного tick'а врагов
pub struct BehaviorContext<'a> {
    pub grid: &'a LevelGrid,
    pub bodies: &'a BodyIndex,
    pub nav: &'a NavGrid,
    pub stains: &'a mut StainBuffer,
    pub rng: &'a mut ChaCha8Rng,
    pub outbox: &'a mut CombatOutbox,
    pub config: &'a SimulationConfig,
    pub delta: f32,
}

impl<'a> BehaviorContext<'a> {
    pub fn world(&self) -> RayWorld<'a> {
        RayWorld {
            grid: self.grid,
            bodies: self.bodies,
        }
    }

    pub fn player(&self) -> Option<&'a BodySnapshot> {
        let bodies: &'a BodyIndex = self.bodies;
        bodies.player()
    }
}

/// Мир для смерти: взрыв меняет blocking в snapshot'е
pub struct DeathContext<'a> {
    pub grid: &'a LevelGrid,
    pub bodies: &'a mut BodyIndex,
    pub rng: &'a mut ChaCha8Rng,
    pub outbox: &'a mut CombatOutbox,
    pub config: &'a SimulationConfig,
    /// Позиция камеры (игрока) для screen shake
    pub viewer: Option<Vec2>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HurtOutcome {
    pub died: bool,
    /// Тело легло (нужен `Prone` marker)
    pub prone: bool,
}

impl Enemy {
    /// Один tick FSM. Возвращает true, когда мёртвое тело успокоилось
    pub(crate) fn tick(
        &mut self,
        me: Entity,
        actor: &mut Actor,
        body: &mut Body,
        ctx: &mut BehaviorContext,
    ) -> bool {
        let delta = ctx.delta;
        if let Some(player) = ctx.player() {
            self.player_distance = body.distance_to(player.position);
        }
        actor.bob_offset = if self.is_alive() { self.advance_bob(delta) } else { 0.0 };

        match self.state {
            EnemyState::Idle => {
                actor.stop();
                if perception::find_player(body.position, actor, self.player_distance, ctx.grid, ctx.bodies) {
                    self.set_alerted(actor, body, ctx);
                }
            }
            EnemyState::Alerted => {
                actor.stop();
                self.timers.alert += delta;
                if self.timers.alert >= self.thresholds.alert_time {
                    self.aim_or_chase(me, actor, body, ctx);
                }
            }
            EnemyState::Evading => {
                if !self.follow_path(actor, body, delta) {
                    if self.can_attack(actor, body, ctx) {
                        self.set_aiming(actor, body, ctx);
                    } else {
                        self.set_chasing(me, body, ctx);
                    }
                }
            }
            EnemyState::Chasing => {
                if self.can_attack(actor, body, ctx) {
                    self.set_aiming(actor, body, ctx);
                } else if !self.follow_path(actor, body, delta) {
                    if self.request_player_path(me, body, ctx) {
                        self.follow_path(actor, body, delta);
                    } else {
                        self.set_idle(actor);
                    }
                }
            }
            EnemyState::Retreating => {
                if !self.follow_path(actor, body, delta) {
                    self.set_chasing(me, body, ctx);
                }
            }
            EnemyState::Aiming => {
                actor.stop();
                if let Some(player) = ctx.player() {
                    actor.face(body.position, player.position);
                }
                self.timers.aim += delta;
                if self.timers.aim >= self.thresholds.aim_time {
                    if self.in_range_and_visible(body, ctx) {
                        self.set_attacking(me, actor, body, ctx);
                    } else {
                        self.set_chasing(me, body, ctx);
                    }
                }
            }
            EnemyState::Attacking => {
                actor.stop();
                self.timers.attack += delta;
                if self.timers.attack >= self.thresholds.attack_time {
                    if self.budget.is_exhausted() {
                        self.set_evading(me, actor, body, ctx);
                        self.budget.refresh(ctx.rng);
                    } else {
                        self.on_attack_complete(me, actor, body, ctx);
                    }
                }
            }
            EnemyState::Hurting => {
                actor.velocity *= ctx.config.dead_velocity_decay;
                self.timers.hurt += delta;
                if self.timers.hurt >= self.thresholds.hurt_time {
                    self.on_hurt_complete(me, actor, body, ctx);
                }
            }
            EnemyState::Dead => return self.settle(actor, body, ctx),
        }
        false
    }

    // --- Transitions -------------------------------------------------------

    pub(crate) fn set_idle(&mut self, actor: &mut Actor) -> bool {
        if !self.enter(EnemyState::Idle) {
            return false;
        }
        actor.stop();
        true
    }

    pub(crate) fn set_alerted(&mut self, actor: &mut Actor, body: &Body, ctx: &mut BehaviorContext) -> bool {
        if !self.enter(EnemyState::Alerted) {
            return false;
        }
        if let Some(player) = ctx.player() {
            actor.face(body.position, player.position);
        }
        ctx.outbox.play(&format!("{}_alert", self.name), Some(body.position));
        true
    }

    pub(crate) fn set_chasing(&mut self, me: Entity, body: &Body, ctx: &mut BehaviorContext) -> bool {
        if !self.enter(EnemyState::Chasing) {
            return false;
        }
        self.request_player_path(me, body, ctx);
        true
    }

    pub(crate) fn set_retreating(&mut self, me: Entity, body: &Body, ctx: &mut BehaviorContext) -> bool {
        if !self.enter(EnemyState::Retreating) {
            return false;
        }
        let Some(player) = ctx.player() else {
            return true;
        };
        let destination = evasion::choose_retreat_destination(
            body.position,
            body.radius(),
            body.flags.contains(BodyFlags::HOVERING),
            player.position,
            me,
            ctx.grid,
            ctx.bodies,
        );
        if let Some(destination) = destination {
            self.path = self.path_to(me, body.position, destination, ctx);
        }
        true
    }

    pub(crate) fn set_evading(
        &mut self,
        me: Entity,
        actor: &mut Actor,
        body: &Body,
        ctx: &mut BehaviorContext,
    ) -> bool {
        if !self.enter(EnemyState::Evading) {
            return false;
        }
        actor.stop();
        let Some(player) = ctx.player() else {
            return true;
        };
        let destination = evasion::choose_evade_destination(
            body.position,
            body.radius(),
            body.flags.contains(BodyFlags::HOVERING),
            player.position,
            me,
            ctx.grid,
            ctx.bodies,
            ctx.rng,
        );
        self.evade_destination = destination;
        if let Some(destination) = destination {
            self.path = self.path_to(me, body.position, destination, ctx);
        }
        true
    }

    pub(crate) fn set_aiming(&mut self, actor: &mut Actor, body: &Body, ctx: &BehaviorContext) -> bool {
        if !self.enter(EnemyState::Aiming) {
            return false;
        }
        actor.stop();
        if let Some(player) = ctx.player() {
            actor.face(body.position, player.position);
        }
        true
    }

    pub(crate) fn set_attacking(
        &mut self,
        me: Entity,
        actor: &mut Actor,
        body: &Body,
        ctx: &mut BehaviorContext,
    ) -> bool {
        if !self.enter(EnemyState::Attacking) {
            return false;
        }
        self.attack_hook(me, actor, body, ctx);
        true
    }

    pub(crate) fn set_hurting(&mut self, position: Vec2, outbox: &mut CombatOutbox) -> bool {
        if !self.enter(EnemyState::Hurting) {
            return false;
        }
        outbox.play(&format!("{}_hurt", self.name), Some(position));
        true
    }

    /// Any → Dead. Возвращает true, если тело легло prone (без взрыва)
    pub(crate) fn set_dead(
        &mut self,
        me: Entity,
        actor: &mut Actor,
        body: &mut Body,
        ctx: &mut DeathContext,
    ) -> bool {
        if !self.enter(EnemyState::Dead) {
            return false;
        }
        body.collision_enabled = false;
        body.blocking = false;

        let exploded = match self.explosion.as_ref() {
            Some(explosion) => {
                ctx.bodies.set_blocking(me, false);
                explosion.detonate(
                    body.position,
                    ctx.grid,
                    ctx.bodies,
                    ctx.rng,
                    ctx.outbox,
                    ctx.viewer,
                    ctx.config,
                );
                // Разорвало: тела больше нет, ни блокировать, ни будить нечего
                body.in_world = false;
                ctx.bodies.remove(me);
                true
            }
            None => {
                ctx.bodies.mark_prone(me);
                false
            }
        };
        self.gibbed = exploded;

        if let Some(item) = self.drop.as_deref() {
            let scatter = ctx.config.item_scatter.abs();
            let angle = actor.heading + ctx.rng.gen_range(-scatter..=scatter);
            ctx.outbox.drop_item(item, body.position, angle);
        }
        ctx.outbox.play(&format!("{}_death", self.name), Some(body.position));
        ctx.outbox.died(me, exploded);

        logger::log_info(&format!(
            "💀 {} {:?} died ({})",
            self.name,
            me,
            if exploded { "exploded" } else { "prone" }
        ));
        !exploded
    }

    // --- Archetype hooks ---------------------------------------------------

    fn attack_hook(&mut self, me: Entity, actor: &mut Actor, body: &Body, ctx: &mut BehaviorContext) {
        self.budget.spend();
        let Some(player) = ctx.player() else {
            return;
        };
        actor.face(body.position, player.position);
        let aim = actor.heading;
        let world = ctx.world();

        ctx.outbox.play(&format!("{}_attack", self.name), Some(body.position));
        match &self.strategy {
            AttackStrategy::Melee { strike } => {
                strike.run(aim, world, &mut *ctx.rng, ctx.outbox);
            }
            AttackStrategy::HitScan { pellets } => {
                for (pellet, offset) in pellets {
                    pellet.run(aim + offset, world, &mut *ctx.rng, ctx.outbox);
                }
            }
            AttackStrategy::Projectile { .. } => {
                let damage = self.attack.power * accuracy_roll(self.attack.accuracy, &mut *ctx.rng) as f32;
                ctx.outbox.launch(me, aim, damage);
            }
        }
    }

    fn on_attack_complete(&mut self, me: Entity, actor: &mut Actor, body: &Body, ctx: &mut BehaviorContext) {
        match self.strategy.kind() {
            ArchetypeKind::Melee | ArchetypeKind::Projectile => {
                self.set_chasing(me, body, ctx);
            }
            ArchetypeKind::HitScan => self.aim_or_chase(me, actor, body, ctx),
        }
    }

    fn on_hurt_complete(&mut self, me: Entity, actor: &mut Actor, body: &Body, ctx: &mut BehaviorContext) {
        match self.strategy.kind() {
            ArchetypeKind::Melee => {
                self.set_chasing(me, body, ctx);
            }
            ArchetypeKind::HitScan => self.aim_or_chase(me, actor, body, ctx),
            ArchetypeKind::Projectile => {
                self.set_evading(me, actor, body, ctx);
            }
        }
    }

    // --- Damage ------------------------------------------------------------

    /// Collapsed урон за tick. Трупы получают только толчок
    pub(crate) fn hurt(
        &mut self,
        me: Entity,
        actor: &mut Actor,
        health: &mut Health,
        body: &mut Body,
        hit: &CollapsedHit,
        ctx: &mut DeathContext,
    ) -> HurtOutcome {
        actor.push(hit.angle, hit.damage * ctx.config.knockback_scale);
        if !self.is_alive() {
            return HurtOutcome::default();
        }

        if hit.instant_kill {
            health.deplete();
        } else {
            health.take_damage(hit.damage);
        }

        if health.is_depleted() {
            let prone = self.set_dead(me, actor, body, ctx);
            HurtOutcome { died: true, prone }
        } else {
            self.set_hurting(body.position, ctx.outbox);
            HurtOutcome::default()
        }
    }

    // --- Collisions --------------------------------------------------------

    /// Столкнулся с другим врагом, который стоит (Idle) или целится (Aiming)
    pub(crate) fn on_enemy_collision(
        &mut self,
        me: Entity,
        peer_state: EnemyState,
        actor: &mut Actor,
        body: &Body,
        ctx: &mut BehaviorContext,
    ) {
        if !matches!(peer_state, EnemyState::Idle | EnemyState::Aiming) {
            return;
        }
        match self.state {
            EnemyState::Evading => {
                self.set_chasing(me, body, ctx);
            }
            EnemyState::Chasing => {
                self.set_retreating(me, body, ctx);
            }
            EnemyState::Retreating => {
                self.set_idle(actor);
            }
            _ => {}
        }
    }

    // --- Queries -----------------------------------------------------------

    fn in_range_and_visible(&self, body: &Body, ctx: &BehaviorContext) -> bool {
        self.attack.in_range(self.player_distance)
            && perception::sees_player(body.position, ctx.grid, ctx.bodies)
    }

    fn aim_or_chase(&mut self, me: Entity, actor: &mut Actor, body: &Body, ctx: &mut BehaviorContext) {
        if self.in_range_and_visible(body, ctx) {
            self.set_aiming(actor, body, ctx);
        } else {
            self.set_chasing(me, body, ctx);
        }
    }

    /// Турели атакуют всегда. Остальные: в range, видят игрока, а projectile
    /// атакующие ещё и стоят на узле пути
    pub(crate) fn can_attack(&self, actor: &Actor, body: &Body, ctx: &BehaviorContext) -> bool {
        if actor.is_turret() {
            return true;
        }
        if !self.in_range_and_visible(body, ctx) {
            return false;
        }
        !self.strategy.is_projectile() || self.at_path_node(body.position)
    }

    fn at_path_node(&self, position: Vec2) -> bool {
        let near = |cell: IVec2| position.distance(LevelGrid::cell_center(cell)) <= ARRIVE_EPSILON;
        match self.next_node() {
            None => true,
            Some(next) => {
                near(next)
                    || self
                        .path_index
                        .checked_sub(1)
                        .and_then(|previous| self.path.get(previous))
                        .is_some_and(|previous| near(*previous))
            }
        }
    }

    // --- Movement ----------------------------------------------------------

    fn path_to(&self, me: Entity, from: Vec2, to: IVec2, ctx: &BehaviorContext) -> Vec<IVec2> {
        let mut except = vec![me];
        if let Some(player) = ctx.player() {
            except.push(player.entity);
        }
        let overlay = PathOverlay::from_bodies(ctx.bodies, &except);
        ctx.nav.find_path(
            LevelGrid::cell_at(from),
            to,
            self.graph,
            self.surrounding_open,
            &overlay,
        )
    }

    /// Новый путь к игроку. false если пути нет
    fn request_player_path(&mut self, me: Entity, body: &Body, ctx: &BehaviorContext) -> bool {
        let Some(player) = ctx.player() else {
            self.path.clear();
            self.path_index = 0;
            return false;
        };
        self.path = self.path_to(me, body.position, LevelGrid::cell_at(player.position), ctx);
        self.path_index = 0;
        !self.path.is_empty()
    }

    /// Шаг по пути. false когда путь пройден (или актор не двигается)
    fn follow_path(&mut self, actor: &mut Actor, body: &Body, delta: f32) -> bool {
        if actor.is_turret() {
            self.path.clear();
            self.path_index = 0;
            return false;
        }

        while let Some(node) = self.next_node() {
            let to = LevelGrid::cell_center(node) - body.position;
            let distance = to.length();
            if distance <= ARRIVE_EPSILON {
                self.path_index += 1;
                continue;
            }

            actor.heading = body.angle_to(LevelGrid::cell_center(node));
            let speed = actor.accelerated_speed(delta);
            if delta > 0.0 && speed * delta >= distance {
                // Доходим ровно до узла
                actor.velocity = to / delta;
                self.path_index += 1;
            } else {
                actor.velocity = to / distance * speed;
            }
            return true;
        }

        actor.stop();
        false
    }

    // --- Dead --------------------------------------------------------------

    /// Затухание трупа + пятно. true когда тело остановилось
    fn settle(&mut self, actor: &mut Actor, body: &Body, ctx: &mut BehaviorContext) -> bool {
        let config = ctx.config;
        if actor.velocity.length() < config.dead_velocity_floor {
            actor.stop();
            if !self.gibbed {
                self.stain.radius = config.stain_max_radius;
                ctx.stains.stain_circle(body.position, self.stain.radius);
            }
            return true;
        }

        actor.velocity *= config.dead_velocity_decay;
        if !self.gibbed {
            self.stain.timer += ctx.delta;
            if self.stain.timer >= config.stain_interval {
                self.stain.timer -= config.stain_interval;
                self.stain.radius = (self.stain.radius + config.stain_growth).min(config.stain_max_radius);
                ctx.stains.stain_circle(body.position, self.stain.radius);
            }
        }
        false
    }
}
