//! Birds: launch construction and one-shot abilities
//!
//! A single `Projectile` type carries its variant as a tag. Abilities are
//! dispatched with a `match` on that tag and guarded by one trigger flag, so
//! each bird fires its ability at most once.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityIds, Sprite};
use crate::geometry::ImpulseVector;
use crate::physics::{Body, BodyHandle, Result, Shape, ShapeHandle, Space, moment_for_circle};
use crate::settings::BirdParams;

/// Bird variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BirdKind {
    /// Red bird, no ability
    #[default]
    Plain,
    /// Yellow bird, forward boost
    Boosting,
    /// Blue bird, splits in three
    Splitting,
    /// Scatters seven children around its heading
    Exploding,
    /// Inflates in place
    Growing,
}

impl BirdKind {
    pub const ALL: [BirdKind; 5] = [
        BirdKind::Plain,
        BirdKind::Boosting,
        BirdKind::Splitting,
        BirdKind::Exploding,
        BirdKind::Growing,
    ];

    /// Keyboard selection (R, Y, B, E, G; case-insensitive)
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'r' => Some(BirdKind::Plain),
            'b' => Some(BirdKind::Splitting),
            'y' => Some(BirdKind::Boosting),
            'e' => Some(BirdKind::Exploding),
            'g' => Some(BirdKind::Growing),
            _ => None,
        }
    }

    /// Key that selects this variant
    pub fn key(&self) -> char {
        match self {
            BirdKind::Plain => 'r',
            BirdKind::Boosting => 'y',
            BirdKind::Splitting => 'b',
            BirdKind::Exploding => 'e',
            BirdKind::Growing => 'g',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BirdKind::Plain => "plain",
            BirdKind::Boosting => "boosting",
            BirdKind::Splitting => "splitting",
            BirdKind::Exploding => "exploding",
            BirdKind::Growing => "growing",
        }
    }
}

/// What a trigger call did
#[derive(Debug, Clone, PartialEq)]
pub enum Ability {
    /// The variant has no ability
    None,
    /// The one-shot was already spent; nothing changed
    AlreadyUsed,
    /// World-space impulse that was applied
    Boosted(Vec2),
    /// Children to add to the live set (the parent stays alive)
    Spawned(Vec<Projectile>),
    Grew { radius: f32, mass: f32 },
}

/// Clamp the magnitude of a signed drag impulse, keeping its sign
#[inline]
pub fn clamp_impulse(impulse: f32, max_impulse: f32) -> f32 {
    impulse.clamp(-max_impulse, max_impulse)
}

/// A live bird
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: u32,
    pub kind: BirdKind,
    pub body: BodyHandle,
    pub shape: ShapeHandle,
    pub radius: f32,
    pub mass: f32,
    /// Collision group shared with every bird split off this one
    pub group: u32,
    triggered: bool,
    pub sprite: Sprite,
}

impl Projectile {
    /// Create a bird at `spawn` and kick it with the drag impulse
    pub fn launch(
        id: u32,
        kind: BirdKind,
        impulse: ImpulseVector,
        spawn: Vec2,
        space: &mut Space,
        params: &BirdParams,
    ) -> Result<Self> {
        let mut bird = Self::spawn(id, kind, spawn, Vec2::ZERO, id, space, params)?;

        let magnitude = clamp_impulse(impulse.impulse, params.max_impulse) * params.power_multiplier;
        space.apply_impulse_at_local_point(
            bird.body,
            Vec2::from_angle(impulse.angle) * magnitude,
            Vec2::ZERO,
        )?;

        bird.update(space)?;
        Ok(bird)
    }

    /// Create a bird with an explicit starting velocity
    fn spawn(
        id: u32,
        kind: BirdKind,
        position: Vec2,
        velocity: Vec2,
        group: u32,
        space: &mut Space,
        params: &BirdParams,
    ) -> Result<Self> {
        let (body, shape) = add_bird_body(
            space,
            params,
            params.radius,
            Body::dynamic(params.mass, moment_for_circle(params.mass, 0.0, params.radius))
                .with_position(position)
                .with_velocity(velocity),
            group,
        )?;

        Ok(Self {
            id,
            kind,
            body,
            shape,
            radius: params.radius,
            mass: params.mass,
            group,
            triggered: false,
            sprite: Sprite::at(&space.body(body)?),
        })
    }

    /// Whether the one-shot ability has been spent
    pub fn has_triggered(&self) -> bool {
        self.triggered
    }

    pub fn has_boosted(&self) -> bool {
        self.kind == BirdKind::Boosting && self.triggered
    }

    pub fn has_split(&self) -> bool {
        self.kind == BirdKind::Splitting && self.triggered
    }

    pub fn has_exploded(&self) -> bool {
        self.kind == BirdKind::Exploding && self.triggered
    }

    pub fn has_grown(&self) -> bool {
        self.kind == BirdKind::Growing && self.triggered
    }

    pub fn position(&self, space: &Space) -> Result<Vec2> {
        Ok(space.body(self.body)?.position)
    }

    pub fn velocity(&self, space: &Space) -> Result<Vec2> {
        Ok(space.body(self.body)?.velocity)
    }

    /// Sync the sprite pose from the body
    pub fn update(&mut self, space: &Space) -> Result<()> {
        self.sprite.sync(space, self.body)
    }

    /// Fire the variant's ability once
    pub fn trigger_ability(
        &mut self,
        space: &mut Space,
        ids: &mut EntityIds,
        params: &BirdParams,
    ) -> Result<Ability> {
        if self.kind == BirdKind::Plain {
            return Ok(Ability::None);
        }
        if self.triggered {
            return Ok(Ability::AlreadyUsed);
        }

        let ability = match self.kind {
            BirdKind::Plain => Ability::None,
            BirdKind::Boosting => self.boost(space, params)?,
            BirdKind::Splitting => {
                let spread = params.split_spread_deg;
                self.scatter(space, ids, params, &[-spread, spread])?
            }
            BirdKind::Exploding => self.scatter(space, ids, params, &params.explode_offsets_deg)?,
            BirdKind::Growing => self.grow(space, params)?,
        };
        self.triggered = true;
        Ok(ability)
    }

    fn boost(&mut self, space: &mut Space, params: &BirdParams) -> Result<Ability> {
        let local = Vec2::X * (params.boost_multiplier * self.mass * params.boost_scale);
        let world = space.apply_impulse_at_local_point(self.body, local, Vec2::ZERO)?;
        Ok(Ability::Boosted(world))
    }

    /// Spawn children at the current position, each moving at the parent's
    /// speed with its velocity rotated by one of `offsets_deg`
    fn scatter(
        &self,
        space: &mut Space,
        ids: &mut EntityIds,
        params: &BirdParams,
        offsets_deg: &[f32],
    ) -> Result<Ability> {
        let (position, velocity) = {
            let body = space.body(self.body)?;
            (body.position, body.velocity)
        };

        let mut children = Vec::with_capacity(offsets_deg.len());
        for offset in offsets_deg {
            let child_velocity = Vec2::from_angle(offset.to_radians()).rotate(velocity);
            children.push(Self::spawn(
                ids.next_id(),
                self.kind,
                position,
                child_velocity,
                self.group,
                space,
                params,
            )?);
        }
        Ok(Ability::Spawned(children))
    }

    /// Replace body and shape with a bigger, heavier pair. The replacement
    /// is inserted before the old pair is removed, so a failure leaves the
    /// bird untouched.
    fn grow(&mut self, space: &mut Space, params: &BirdParams) -> Result<Ability> {
        let old = space.body(self.body)?;
        let radius = self.radius * params.grow_radius_factor;
        let mass = self.mass * params.grow_mass_factor;

        let replacement = Body {
            mass,
            moment: moment_for_circle(mass, 0.0, radius),
            ..old
        };
        let (body, shape) = add_bird_body(space, params, radius, replacement, self.group)?;
        space.remove(self.body, self.shape);

        self.body = body;
        self.shape = shape;
        self.radius = radius;
        self.mass = mass;
        self.sprite.scale = radius / params.radius;
        self.update(space)?;
        Ok(Ability::Grew { radius, mass })
    }

    /// Take the bird out of the simulation
    pub fn remove_from(&self, space: &mut Space) {
        space.remove(self.body, self.shape);
    }
}

fn add_bird_body(
    space: &mut Space,
    params: &BirdParams,
    radius: f32,
    body: Body,
    group: u32,
) -> Result<(BodyHandle, ShapeHandle)> {
    let body = space.add_body(body)?;
    let shape = space.add_shape(
        Shape::circle(body, radius)
            .with_elasticity(params.elasticity)
            .with_friction(params.friction)
            .with_layer(params.collision_layer)
            .with_group(group),
    )?;
    Ok((body, shape))
}
