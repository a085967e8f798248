//! 2D rigid-body physics, backed by rapier2d
//!
//! `Space` wraps the rapier world behind glam vectors and plain handles, and
//! turns contact-force reports into a post-solve `ContactEvent` queue.

pub mod error;
pub mod space;

pub use error::{PhysicsError, Result};
pub use space::{
    Body, BodyHandle, BodyType, ContactEvent, Shape, ShapeHandle, ShapeKind, Space, moment_for_box,
    moment_for_circle,
};
