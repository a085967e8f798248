//! Slingshot - a 2D projectile-physics puzzle game core
//!
//! Core modules:
//! - `geometry`: drag gesture to launch impulse
//! - `physics`: rapier2d-backed rigid-body space with post-solve contact reports
//! - `sim`: birds, scenery, levels and the session state machine
//! - `settings`: data-driven tuning
//!
//! No rendering or windowing lives here. A presentation layer feeds input to
//! a [`Session`] and draws the [`Frame`] it hands back.

pub mod error;
pub mod geometry;
pub mod physics;
pub mod settings;
pub mod sim;

pub use error::{Error, Result};
pub use geometry::{ImpulseVector, Point2D, impulse_from_drag};
pub use settings::Settings;
pub use sim::{BirdKind, Frame, GameEvent, GamePhase, LevelRegistry, Session};
