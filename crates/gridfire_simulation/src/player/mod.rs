//! Player: vitals и spawn

use bevy::prelude::*;

pub mod player;

pub use player::{spawn_player, tick_player_vitals, Player, PlayerVitals};

use crate::SimulationSet;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            tick_player_vitals
                .after(crate::combat::systems::resolve_damage_queues)
                .in_set(SimulationSet::Damage),
        );
    }
}
