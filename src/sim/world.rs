//! Scenery: pigs, columns and static blocks

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::Sprite;
use crate::physics::{Body, BodyHandle, Result, Shape, ShapeHandle, Space, moment_for_box, moment_for_circle};
use crate::settings::{PropParams, ScoreValues};

/// Scenery kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldKind {
    /// Target; clearing every pig clears the level
    Pig,
    /// Destructible obstacle
    Column,
    /// Indestructible structure
    Static,
}

impl WorldKind {
    pub fn is_destructible(&self) -> bool {
        !matches!(self, WorldKind::Static)
    }

    /// Points awarded on destruction
    pub fn points(&self, scores: &ScoreValues) -> Option<u64> {
        match self {
            WorldKind::Pig => Some(scores.pig),
            WorldKind::Column => Some(scores.column),
            WorldKind::Static => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorldKind::Pig => "pig",
            WorldKind::Column => "column",
            WorldKind::Static => "static",
        }
    }
}

/// A scenery entity
#[derive(Debug, Clone, PartialEq)]
pub struct WorldObject {
    pub id: u32,
    pub kind: WorldKind,
    pub body: BodyHandle,
    pub shape: ShapeHandle,
    /// Half extents for boxes, `(radius, radius)` for pigs
    pub half_extents: Vec2,
    pub destroyed: bool,
    pub sprite: Sprite,
}

impl WorldObject {
    /// Round, dynamic target
    pub fn pig(id: u32, position: Vec2, space: &mut Space, params: &PropParams) -> Result<Self> {
        let body = space.add_body(
            Body::dynamic(params.mass, moment_for_circle(params.mass, 0.0, params.radius))
                .with_position(position),
        )?;
        let shape = space.add_shape(
            Shape::circle(body, params.radius)
                .with_elasticity(params.elasticity)
                .with_friction(params.friction)
                .with_layer(params.collision_layer),
        )?;
        Self::new(id, WorldKind::Pig, body, shape, Vec2::splat(params.radius), space)
    }

    /// Upright box that can be knocked over
    pub fn column(id: u32, position: Vec2, space: &mut Space, params: &PropParams) -> Result<Self> {
        let body = space.add_body(
            Body::dynamic(params.mass, moment_for_box(params.mass, params.size)).with_position(position),
        )?;
        Self::boxed(id, WorldKind::Column, body, space, params)
    }

    /// Immovable box
    pub fn fixed(id: u32, position: Vec2, space: &mut Space, params: &PropParams) -> Result<Self> {
        let body = space.add_body(Body::fixed().with_position(position))?;
        Self::boxed(id, WorldKind::Static, body, space, params)
    }

    fn boxed(
        id: u32,
        kind: WorldKind,
        body: BodyHandle,
        space: &mut Space,
        params: &PropParams,
    ) -> Result<Self> {
        let half = params.size * 0.5;
        let shape = space.add_shape(
            Shape::cuboid(body, half)
                .with_elasticity(params.elasticity)
                .with_friction(params.friction)
                .with_layer(params.collision_layer),
        )?;
        Self::new(id, kind, body, shape, half, space)
    }

    fn new(
        id: u32,
        kind: WorldKind,
        body: BodyHandle,
        shape: ShapeHandle,
        half_extents: Vec2,
        space: &Space,
    ) -> Result<Self> {
        Ok(Self {
            id,
            kind,
            body,
            shape,
            half_extents,
            destroyed: false,
            sprite: Sprite::at(&space.body(body)?),
        })
    }

    /// Sync the sprite pose from the body
    pub fn update(&mut self, space: &Space) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.sprite.sync(space, self.body)
    }

    /// Remove from the simulation. Returns `false` if this object was already
    /// destroyed or cannot be destroyed.
    pub fn destroy(&mut self, space: &mut Space) -> bool {
        if self.destroyed || !self.kind.is_destructible() {
            return false;
        }
        space.remove(self.body, self.shape);
        self.destroyed = true;
        true
    }

    /// Remove from the simulation regardless of kind (level teardown)
    pub fn remove_from(&self, space: &mut Space) {
        space.remove(self.body, self.shape);
    }
}
