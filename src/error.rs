//! Top-level error type

use thiserror::Error;

use crate::physics::PhysicsError;
use crate::settings::ConfigError;
use crate::sim::LevelError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Level(#[from] LevelError),

    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

pub type Result<T> = std::result::Result<T, Error>;
