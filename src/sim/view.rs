//! Per-frame snapshot handed to the presentation layer
//!
//! Built after the update pass; the renderer only ever reads it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::projectile::{BirdKind, Projectile};
use super::session::GamePhase;
use super::world::{WorldKind, WorldObject};
use crate::geometry::Point2D;

/// What to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteKind {
    Bird(BirdKind),
    Pig,
    Column,
    Static,
}

/// One drawable entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteView {
    pub id: u32,
    pub kind: SpriteKind,
    pub center: Vec2,
    pub rotation: f32,
    pub scale: f32,
    /// Half extents of the collision footprint (radius for circles)
    pub half_extents: Vec2,
}

impl From<&Projectile> for SpriteView {
    fn from(bird: &Projectile) -> Self {
        Self {
            id: bird.id,
            kind: SpriteKind::Bird(bird.kind),
            center: bird.sprite.center,
            rotation: bird.sprite.rotation,
            scale: bird.sprite.scale,
            half_extents: Vec2::splat(bird.radius),
        }
    }
}

impl From<&WorldObject> for SpriteView {
    fn from(object: &WorldObject) -> Self {
        let kind = match object.kind {
            WorldKind::Pig => SpriteKind::Pig,
            WorldKind::Column => SpriteKind::Column,
            WorldKind::Static => SpriteKind::Static,
        };
        Self {
            id: object.id,
            kind,
            center: object.sprite.center,
            rotation: object.sprite.rotation,
            scale: object.sprite.scale,
            half_extents: object.half_extents,
        }
    }
}

/// Everything the HUD and scene need for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// 1-based level number
    pub level: usize,
    pub level_name: String,
    pub phase: GamePhase,
    pub score: u64,
    pub total_score: u64,
    pub birds_left: u32,
    pub selected: BirdKind,
    pub game_over: bool,
    pub message: Option<String>,
    /// Slingshot band while a drag is in progress
    pub drag_line: Option<(Point2D, Point2D)>,
    pub sprites: Vec<SpriteView>,
}
