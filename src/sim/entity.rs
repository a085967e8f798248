//! Shared entity plumbing: id allocation and the render projection
//!
//! A `Sprite` is derived state. It is overwritten from the physics body every
//! tick and nothing flows back from it into the simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::physics::{Body, BodyHandle, Result, Space};

/// Monotonic entity id source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityIds {
    next: u32,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntityIds {
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Render-facing pose of an entity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sprite {
    pub center: Vec2,
    /// Radians, counter-clockwise
    pub rotation: f32,
    /// Visual scale relative to the base texture
    pub scale: f32,
}

impl Sprite {
    pub fn at(body: &Body) -> Self {
        Self {
            center: body.position,
            rotation: body.angle,
            scale: 1.0,
        }
    }

    /// Copy pose from the body (physics -> presentation only)
    pub fn sync(&mut self, space: &Space, body: BodyHandle) -> Result<()> {
        let body = space.body(body)?;
        self.center = body.position;
        self.rotation = body.angle;
        Ok(())
    }
}
