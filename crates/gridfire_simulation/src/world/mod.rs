//! World domain: tile grid, ray-march, body index, stains, audio ledger
//!
//! Reference реализации коллабораторов, которыми пользуются AI и combat:
//! - `LevelGrid`: клетки уровня + DDA `cast_ray`
//! - `BodyIndex`: per-tick snapshot тел с per-cell списками
//! - `StainBuffer`: floor decals
//! - `AudioLedger`: логическое состояние звуков

pub mod audio;
pub mod body_index;
pub mod grid;
pub mod raycast;
pub mod stain;
pub mod systems;

pub use audio::AudioLedger;
pub use body_index::{BodyIndex, BodySnapshot, RayHit};
pub use grid::{CellKind, LevelError, LevelGrid, CELL_SIZE};
pub use raycast::{RayCast, RaySection};
pub use stain::{StainBuffer, STAIN_RESOLUTION};
pub use systems::{advance_audio_ledger, install_level, refresh_body_index, spawn_prop};
