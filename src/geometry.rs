//! Drag-gesture geometry
//!
//! Converts a slingshot pull (start point, end point) into a launch impulse.
//! Everything here is pure and total.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default scale applied to the drag distance when building an impulse
pub const DEFAULT_REDUCTION_FACTOR: f32 = 0.7;

/// A screen/world coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec2> for Point2D {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Launch impulse derived from a drag
///
/// `impulse` is signed: a pull-back produces a negative magnitude, which
/// sends the projectile opposite to the drag direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpulseVector {
    /// Direction of the drag (radians)
    pub angle: f32,
    /// Signed magnitude
    pub impulse: f32,
}

impl ImpulseVector {
    pub const ZERO: Self = Self {
        angle: 0.0,
        impulse: 0.0,
    };

    /// Unit-angle vector scaled by the signed magnitude
    pub fn to_vec2(self) -> Vec2 {
        Vec2::from_angle(self.angle) * self.impulse
    }
}

/// Angle of the vector from `a` to `b`
#[inline]
pub fn angle_between(a: Point2D, b: Point2D) -> f32 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Euclidean distance
#[inline]
pub fn distance(a: Point2D, b: Point2D) -> f32 {
    a.to_vec2().distance(b.to_vec2())
}

/// Build the launch impulse for a drag from `start` to `end`
pub fn impulse_from_drag(start: Point2D, end: Point2D, reduction_factor: f32) -> ImpulseVector {
    ImpulseVector {
        angle: angle_between(start, end),
        impulse: -distance(start, end) * reduction_factor,
    }
}
