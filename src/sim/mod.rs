//! Game simulation
//!
//! Everything gameplay lives here and runs on a fixed timestep with stable
//! iteration order, so a session replays identically from the same inputs:
//! - `projectile`, `world`: the entities
//! - `contact`: impulse thresholds to destruction and score
//! - `level`: layouts and progression
//! - `session`: input, tick and the level state machine
//! - `view`: per-frame snapshot for a renderer

pub mod autoplay;
pub mod contact;
pub mod entity;
pub mod level;
pub mod projectile;
pub mod session;
pub mod view;
pub mod world;

pub use autoplay::Autoplayer;
pub use contact::{ContactOutcome, ContactPolicy};
pub use entity::{EntityIds, Sprite};
pub use level::{LevelDefinition, LevelError, LevelRegistry};
pub use projectile::{Ability, BirdKind, Projectile, clamp_impulse};
pub use session::{GameEvent, GamePhase, LevelResult, Session, TurnEnd};
pub use view::{Frame, SpriteKind, SpriteView};
pub use world::{WorldKind, WorldObject};
