//! Combat and hostile-entity simulation shared by every client instance.

pub mod ai;
pub mod combat;
pub mod config;
pub mod debris;
pub mod error;
pub mod feedback;
pub mod geometry;
pub mod player;
pub mod projectile;
pub mod registry;
pub mod rng;
pub mod sync;
pub mod world;
pub mod zones;

pub use config::CombatConfig;
pub use error::{ConfigError, WireError};
pub use world::{AttackIntent, AttackOutcome, CombatWorld};
