//! Combat systems

pub mod damage;
pub mod projectile;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod damage_tests;
#[cfg(test)]
mod projectile_tests;

pub use damage::*;
pub use projectile::*;
