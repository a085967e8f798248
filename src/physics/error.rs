//! Error types for the physics space

use thiserror::Error;

use super::space::{BodyHandle, ShapeKind};

/// Physics space errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Body handle does not refer to a live body
    #[error("body not found: {0:?}")]
    BodyNotFound(BodyHandle),

    /// Dynamic bodies need a finite, positive mass
    #[error("invalid body mass: {0}")]
    InvalidMass(f32),

    /// Dynamic bodies need a positive moment (infinite locks rotation)
    #[error("invalid body moment: {0}")]
    InvalidMoment(f32),

    /// Degenerate geometry the engine cannot build a collider from
    #[error("invalid shape: {0:?}")]
    InvalidShape(ShapeKind),
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
