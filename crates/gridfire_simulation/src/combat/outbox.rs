//! CombatOutbox: буфер side effects из чистого resolver кода
//!
//! HitScan / Explosion / FSM hooks не держат EventWriter'ы. Они пишут сюда,
//! а `flush_combat_outbox` (после каждой фазы в chain) превращает буфер в события.

use bevy::prelude::*;

use super::damage::HitRecord;
use super::events::*;
use crate::world::AudioLedger;

#[derive(Resource, Debug, Default)]
pub struct CombatOutbox {
    pub hits: Vec<HitLanded>,
    pub effects: Vec<EffectSpawned>,
    pub flashes: Vec<FlashRequested>,
    pub shakes: Vec<ShakeRequested>,
    pub sounds: Vec<SoundCommand>,
    pub launches: Vec<ProjectileLaunch>,
    pub drops: Vec<ItemDropped>,
    pub awakened: Vec<BodyAwakened>,
    pub deaths: Vec<EnemyDied>,
}

impl CombatOutbox {
    pub fn hit(&mut self, target: Entity, source: Option<Entity>, record: HitRecord) {
        self.hits.push(HitLanded { target, source, record });
    }

    pub fn effect(&mut self, kind: EffectKind, position: Vec2, source: Option<Entity>) {
        self.effects.push(EffectSpawned { kind, position, source });
    }

    pub fn flash(&mut self, position: Vec2, intensity: f32) {
        self.flashes.push(FlashRequested { position, intensity });
    }

    pub fn shake(&mut self, amount: f32) {
        self.shakes.push(ShakeRequested { amount });
    }

    pub fn play(&mut self, name: &str, position: Option<Vec2>) {
        self.sounds.push(SoundCommand::Play {
            name: name.to_string(),
            position,
            looped: false,
        });
    }

    pub fn play_looped(&mut self, name: &str, position: Option<Vec2>) {
        self.sounds.push(SoundCommand::Play {
            name: name.to_string(),
            position,
            looped: true,
        });
    }

    pub fn stop(&mut self, name: &str) {
        self.sounds.push(SoundCommand::Stop {
            name: name.to_string(),
        });
    }

    pub fn launch(&mut self, launcher: Entity, angle: f32, damage: f32) {
        self.launches.push(ProjectileLaunch { launcher, angle, damage });
    }

    pub fn drop_item(&mut self, item: &str, position: Vec2, angle: f32) {
        self.drops.push(ItemDropped {
            item: item.to_string(),
            position,
            angle,
        });
    }

    pub fn awaken(&mut self, entity: Entity) {
        self.awakened.push(BodyAwakened { entity });
    }

    pub fn died(&mut self, entity: Entity, exploded: bool) {
        self.deaths.push(EnemyDied { entity, exploded });
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
            && self.effects.is_empty()
            && self.flashes.is_empty()
            && self.shakes.is_empty()
            && self.sounds.is_empty()
            && self.launches.is_empty()
            && self.drops.is_empty()
            && self.awakened.is_empty()
            && self.deaths.is_empty()
    }
}

/// Система: outbox → events (+ audio ledger)
#[allow(clippy::too_many_arguments)]
pub fn flush_combat_outbox(
    mut outbox: ResMut<CombatOutbox>,
    mut ledger: ResMut<AudioLedger>,
    mut hits: EventWriter<HitLanded>,
    mut effects: EventWriter<EffectSpawned>,
    mut flashes: EventWriter<FlashRequested>,
    mut shakes: EventWriter<ShakeRequested>,
    mut sounds: EventWriter<SoundCommand>,
    mut launches: EventWriter<ProjectileLaunch>,
    mut drops: EventWriter<ItemDropped>,
    mut awakened: EventWriter<BodyAwakened>,
    mut deaths: EventWriter<EnemyDied>,
) {
    if outbox.is_empty() {
        return;
    }

    for event in outbox.hits.drain(..) {
        hits.write(event);
    }
    for event in outbox.effects.drain(..) {
        effects.write(event);
    }
    for event in outbox.flashes.drain(..) {
        flashes.write(event);
    }
    for event in outbox.shakes.drain(..) {
        shakes.write(event);
    }
    for event in outbox.sounds.drain(..) {
        ledger.apply(&event);
        sounds.write(event);
    }
    for event in outbox.launches.drain(..) {
        launches.write(event);
    }
    for event in outbox.drops.drain(..) {
        drops.write(event);
    }
    for event in outbox.awakened.drain(..) {
        awakened.write(event);
    }
    for event in outbox.deaths.drain(..) {
        deaths.write(event);
    }
}
