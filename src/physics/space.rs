//! Simulation space: a thin adapter over a rapier2d world
//!
//! Game code never touches rapier types. It holds `BodyHandle` /
//! `ShapeHandle` values, describes bodies and shapes with the plain `Body` /
//! `Shape` builders, and reads contact reports from a post-step queue.
//! Vectors cross the boundary as `glam::Vec2`.

use std::collections::HashMap;
use std::fmt;

use crossbeam_channel::{Receiver, Sender};
use glam::Vec2;
use rapier2d::prelude as rapier;
use rapier2d::prelude::{point, vector};
use rapier2d::na as nalgebra;
use serde::{Deserialize, Serialize};

use super::error::{PhysicsError, Result};

/// Scene scale handed to the engine's length-dependent tolerances
pub const PIXELS_PER_METER: f32 = 100.0;

/// Non-owning handle to a body in a `Space`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(rapier::RigidBodyHandle);

/// Non-owning handle to a shape in a `Space`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(rapier::ColliderHandle);

impl BodyHandle {
    /// A handle that never refers to a live body
    pub fn invalid() -> Self {
        Self(rapier::RigidBodyHandle::invalid())
    }
}

/// Moment of inertia of a (hollow) disc
pub fn moment_for_circle(mass: f32, inner_radius: f32, outer_radius: f32) -> f32 {
    mass * (inner_radius * inner_radius + outer_radius * outer_radius) / 2.0
}

/// Moment of inertia of a solid box
pub fn moment_for_box(mass: f32, size: Vec2) -> f32 {
    mass * size.length_squared() / 12.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    Dynamic,
    /// Never moves
    Static,
}

/// Body description on insert, pose snapshot on read
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub body_type: BodyType,
    pub mass: f32,
    /// `f32::INFINITY` locks rotation
    pub moment: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
}

impl Body {
    pub fn dynamic(mass: f32, moment: f32) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            mass,
            moment,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
        }
    }

    pub fn fixed() -> Self {
        Self {
            body_type: BodyType::Static,
            mass: f32::INFINITY,
            moment: f32::INFINITY,
            ..Self::dynamic(0.0, 0.0)
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Body-local vector expressed in world orientation
    #[inline]
    pub fn local_to_world_vector(&self, v: Vec2) -> Vec2 {
        Vec2::from_angle(self.angle).rotate(v)
    }

    fn to_rapier(self) -> rapier::RigidBody {
        let builder = match self.body_type {
            BodyType::Static => rapier::RigidBodyBuilder::fixed(),
            BodyType::Dynamic => {
                let builder = rapier::RigidBodyBuilder::dynamic()
                    .linvel(vector![self.velocity.x, self.velocity.y])
                    .angvel(self.angular_velocity)
                    .ccd_enabled(true);
                if self.moment.is_finite() {
                    builder.additional_mass_properties(rapier::MassProperties::new(
                        point![0.0, 0.0],
                        self.mass,
                        self.moment,
                    ))
                } else {
                    builder.additional_mass(self.mass).lock_rotations()
                }
            }
        };
        builder
            .translation(vector![self.position.x, self.position.y])
            .rotation(self.angle)
            .build()
    }
}

/// Shape geometry in body-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle { radius: f32 },
    /// Box centered on the body, turning with it
    Box { half_extents: Vec2 },
    Segment { a: Vec2, b: Vec2, radius: f32 },
}

impl ShapeKind {
    fn is_valid(&self) -> bool {
        match *self {
            ShapeKind::Circle { radius } => radius > 0.0,
            ShapeKind::Box { half_extents } => half_extents.x > 0.0 && half_extents.y > 0.0,
            ShapeKind::Segment { a, b, radius } => a != b && radius >= 0.0,
        }
    }
}

/// A collision shape bound to a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub body: BodyHandle,
    pub kind: ShapeKind,
    pub elasticity: f32,
    pub friction: f32,
    /// Free-form tag carried on the collider
    pub collision_layer: u32,
    /// Shapes sharing a non-zero group never collide with each other
    pub group: u32,
}

impl Shape {
    fn new(body: BodyHandle, kind: ShapeKind) -> Self {
        Self {
            body,
            kind,
            elasticity: 0.0,
            friction: 0.0,
            collision_layer: 0,
            group: 0,
        }
    }

    pub fn circle(body: BodyHandle, radius: f32) -> Self {
        Self::new(body, ShapeKind::Circle { radius })
    }

    pub fn cuboid(body: BodyHandle, half_extents: Vec2) -> Self {
        Self::new(body, ShapeKind::Box { half_extents })
    }

    pub fn segment(body: BodyHandle, a: Vec2, b: Vec2, radius: f32) -> Self {
        Self::new(body, ShapeKind::Segment { a, b, radius })
    }

    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.collision_layer = layer;
        self
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    fn to_rapier(self) -> rapier::Collider {
        let builder = match self.kind {
            ShapeKind::Circle { radius } => rapier::ColliderBuilder::ball(radius),
            ShapeKind::Box { half_extents } => {
                rapier::ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            }
            ShapeKind::Segment { a, b, radius } if radius > 0.0 => {
                rapier::ColliderBuilder::capsule_from_endpoints(
                    point![a.x, a.y],
                    point![b.x, b.y],
                    radius,
                )
            }
            ShapeKind::Segment { a, b, .. } => {
                rapier::ColliderBuilder::segment(point![a.x, a.y], point![b.x, b.y])
            }
        };

        // Mass lives on the body; elasticity and friction multiply per pair
        let mut builder = builder
            .density(0.0)
            .restitution(self.elasticity)
            .restitution_combine_rule(rapier::CoefficientCombineRule::Multiply)
            .friction(self.friction)
            .friction_combine_rule(rapier::CoefficientCombineRule::Multiply)
            .active_events(rapier::ActiveEvents::CONTACT_FORCE_EVENTS)
            .user_data(pack_user_data(self.group, self.collision_layer));
        if self.group != 0 {
            builder = builder.active_hooks(rapier::ActiveHooks::FILTER_CONTACT_PAIRS);
        }
        builder.build()
    }
}

#[inline]
fn pack_user_data(group: u32, layer: u32) -> u128 {
    u128::from(group) | (u128::from(layer) << 32)
}

#[inline]
fn group_of(user_data: u128) -> u32 {
    (user_data & 0xffff_ffff) as u32
}

/// Post-solve report for one touching shape pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub shapes: (ShapeHandle, ShapeHandle),
    /// Total contact impulse applied between the pair this step
    pub total_impulse: Vec2,
}

impl ContactEvent {
    pub fn impulse_magnitude(&self) -> f32 {
        self.total_impulse.length()
    }

    pub fn involves(&self, shape: ShapeHandle) -> bool {
        self.shapes.0 == shape || self.shapes.1 == shape
    }
}

/// Drops contacts between shapes of the same non-zero group
struct GroupFilter;

impl rapier::PhysicsHooks for GroupFilter {
    fn filter_contact_pair(&self, context: &rapier::PairFilterContext) -> Option<rapier::SolverFlags> {
        let g1 = group_of(context.colliders[context.collider1].user_data);
        let g2 = group_of(context.colliders[context.collider2].user_data);
        if g1 != 0 && g1 == g2 {
            None
        } else {
            Some(rapier::SolverFlags::COMPUTE_IMPULSES)
        }
    }
}

/// Forwards rapier contact-force reports into the space's queue
struct ContactCollector {
    contacts: Sender<ContactEvent>,
}

impl rapier::EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &rapier::RigidBodySet,
        _colliders: &rapier::ColliderSet,
        _event: rapier::CollisionEvent,
        _contact_pair: Option<&rapier::ContactPair>,
    ) {
    }

    fn handle_contact_force_event(
        &self,
        dt: f32,
        _bodies: &rapier::RigidBodySet,
        _colliders: &rapier::ColliderSet,
        contact_pair: &rapier::ContactPair,
        total_force_magnitude: f32,
    ) {
        let Some(normal) = contact_pair.manifolds.first().map(|m| m.data.normal) else {
            return;
        };
        let _ = self.contacts.send(ContactEvent {
            shapes: (
                ShapeHandle(contact_pair.collider1),
                ShapeHandle(contact_pair.collider2),
            ),
            total_impulse: Vec2::new(normal.x, normal.y) * (total_force_magnitude * dt),
        });
    }
}

/// The simulation space
pub struct Space {
    pub gravity: Vec2,
    pipeline: rapier::PhysicsPipeline,
    integration: rapier::IntegrationParameters,
    islands: rapier::IslandManager,
    broad_phase: rapier::DefaultBroadPhase,
    narrow_phase: rapier::NarrowPhase,
    bodies: rapier::RigidBodySet,
    colliders: rapier::ColliderSet,
    impulse_joints: rapier::ImpulseJointSet,
    multibody_joints: rapier::MultibodyJointSet,
    ccd_solver: rapier::CCDSolver,
    /// Mass and moment as given on insert
    inertia: HashMap<rapier::RigidBodyHandle, (f32, f32)>,
    collector: ContactCollector,
    received: Receiver<ContactEvent>,
    contacts: Vec<ContactEvent>,
}

impl fmt::Debug for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Space")
            .field("gravity", &self.gravity)
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .field("pending_contacts", &self.contacts.len())
            .finish()
    }
}

impl Space {
    pub fn new(gravity: Vec2) -> Self {
        let (sender, received) = crossbeam_channel::unbounded();
        Self {
            gravity,
            pipeline: rapier::PhysicsPipeline::new(),
            integration: rapier::IntegrationParameters {
                // Distances are pixels
                length_unit: PIXELS_PER_METER,
                ..rapier::IntegrationParameters::default()
            },
            islands: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            inertia: HashMap::new(),
            collector: ContactCollector { contacts: sender },
            received,
            contacts: Vec::new(),
        }
    }

    pub fn add_body(&mut self, body: Body) -> Result<BodyHandle> {
        if body.is_dynamic() {
            if !(body.mass.is_finite() && body.mass > 0.0) {
                return Err(PhysicsError::InvalidMass(body.mass));
            }
            if !(body.moment > 0.0) {
                return Err(PhysicsError::InvalidMoment(body.moment));
            }
        }
        let handle = self.bodies.insert(body.to_rapier());
        self.inertia.insert(handle, (body.mass, body.moment));
        Ok(BodyHandle(handle))
    }

    pub fn add_shape(&mut self, shape: Shape) -> Result<ShapeHandle> {
        if !self.bodies.contains(shape.body.0) {
            return Err(PhysicsError::BodyNotFound(shape.body));
        }
        if !shape.kind.is_valid() {
            return Err(PhysicsError::InvalidShape(shape.kind));
        }
        let handle = self
            .colliders
            .insert_with_parent(shape.to_rapier(), shape.body.0, &mut self.bodies);
        Ok(ShapeHandle(handle))
    }

    /// Remove a shape. Returns `false` for stale handles.
    pub fn remove_shape(&mut self, handle: ShapeHandle) -> bool {
        self.colliders
            .remove(handle.0, &mut self.islands, &mut self.bodies, true)
            .is_some()
    }

    /// Remove a body together with every shape bound to it. Returns `false`
    /// for stale handles.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.inertia.remove(&handle.0);
        self.bodies
            .remove(
                handle.0,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    pub fn remove(&mut self, body: BodyHandle, shape: ShapeHandle) {
        self.remove_shape(shape);
        self.remove_body(body);
    }

    /// Current pose and velocity of a body
    pub fn body(&self, handle: BodyHandle) -> Result<Body> {
        let rb = self
            .bodies
            .get(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))?;
        let (mass, moment) = self
            .inertia
            .get(&handle.0)
            .copied()
            .unwrap_or((f32::INFINITY, f32::INFINITY));
        let t = rb.translation();
        let v = rb.linvel();
        Ok(Body {
            body_type: if rb.is_dynamic() {
                BodyType::Dynamic
            } else {
                BodyType::Static
            },
            mass,
            moment,
            position: Vec2::new(t.x, t.y),
            velocity: Vec2::new(v.x, v.y),
            angle: rb.rotation().angle(),
            angular_velocity: rb.angvel(),
        })
    }

    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    pub fn contains_shape(&self, handle: ShapeHandle) -> bool {
        self.colliders.contains(handle.0)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Apply an impulse given in body-local coordinates at a body-local
    /// point. Returns the impulse in world coordinates.
    ///
    /// The velocity change is computed from the mass and moment given on
    /// insert, so it takes effect on a body created this same tick.
    pub fn apply_impulse_at_local_point(
        &mut self,
        handle: BodyHandle,
        impulse: Vec2,
        point: Vec2,
    ) -> Result<Vec2> {
        let body = self.body(handle)?;
        let world = body.local_to_world_vector(impulse);
        if !body.is_dynamic() {
            return Ok(world);
        }
        let r = body.local_to_world_vector(point);
        let velocity = body.velocity + world / body.mass;
        let angular_velocity = if body.moment.is_finite() {
            body.angular_velocity + r.perp_dot(world) / body.moment
        } else {
            body.angular_velocity
        };

        let rb = self
            .bodies
            .get_mut(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))?;
        rb.set_linvel(vector![velocity.x, velocity.y], true);
        rb.set_angvel(angular_velocity, true);
        Ok(world)
    }

    /// Queue a contact report by hand (scripted scenarios, replays)
    pub fn push_contact(&mut self, event: ContactEvent) {
        self.contacts.push(event);
    }

    /// Take every contact reported since the last drain
    pub fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.contacts)
    }

    /// Advance the simulation by `dt`
    pub fn step(&mut self, dt: f32) {
        self.integration.dt = dt;
        self.pipeline.step(
            &vector![self.gravity.x, self.gravity.y],
            &self.integration,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &GroupFilter,
            &self.collector,
        );
        self.contacts.extend(self.received.try_iter());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn floor(space: &mut Space) -> ShapeHandle {
        let body = space.add_body(Body::fixed()).unwrap();
        space
            .add_shape(
                Shape::segment(body, Vec2::new(0.0, 15.0), Vec2::new(1800.0, 15.0), 0.0)
                    .with_friction(1.0),
            )
            .unwrap()
    }

    fn ball(space: &mut Space, mass: f32, radius: f32, at: Vec2, velocity: Vec2) -> (BodyHandle, ShapeHandle) {
        let body = space
            .add_body(
                Body::dynamic(mass, moment_for_circle(mass, 0.0, radius))
                    .with_position(at)
                    .with_velocity(velocity),
            )
            .unwrap();
        let shape = space
            .add_shape(Shape::circle(body, radius).with_elasticity(0.8).with_friction(1.0))
            .unwrap();
        (body, shape)
    }

    #[test]
    fn test_gravity_integration() {
        let mut space = Space::new(Vec2::new(0.0, -900.0));
        let (ball, _) = ball(&mut space, 5.0, 12.0, Vec2::new(0.0, 500.0), Vec2::ZERO);
        space.step(DT);
        let body = space.body(ball).unwrap();
        assert!((body.velocity.y + 15.0).abs() < 1e-3);
        assert!(body.position.y < 500.0);
        assert_eq!(body.mass, 5.0);
    }

    #[test]
    fn test_local_impulse_follows_body_angle() {
        let mut space = Space::new(Vec2::ZERO);
        let body = space
            .add_body(Body::dynamic(2.0, f32::INFINITY).with_angle(std::f32::consts::FRAC_PI_2))
            .unwrap();
        let world = space
            .apply_impulse_at_local_point(body, Vec2::new(10.0, 0.0), Vec2::ZERO)
            .unwrap();
        assert!((world - Vec2::new(0.0, 10.0)).length() < 1e-4);

        let state = space.body(body).unwrap();
        assert!(state.velocity.x.abs() < 1e-4);
        assert!((state.velocity.y - 5.0).abs() < 1e-4);
        assert_eq!(state.angular_velocity, 0.0);
    }

    #[test]
    fn test_off_center_impulse_spins() {
        let mut space = Space::new(Vec2::ZERO);
        let body = space
            .add_body(Body::dynamic(2.0, moment_for_box(2.0, Vec2::new(20.0, 70.0))))
            .unwrap();
        space
            .apply_impulse_at_local_point(body, Vec2::new(100.0, 0.0), Vec2::new(0.0, 30.0))
            .unwrap();
        // r x J = 0 * 0 - 30 * 100
        assert!(space.body(body).unwrap().angular_velocity < 0.0);
    }

    #[test]
    fn test_ball_lands_and_reports_contact() {
        let mut space = Space::new(Vec2::new(0.0, -900.0));
        let floor_shape = floor(&mut space);
        let (ball, ball_shape) = ball(&mut space, 5.0, 12.0, Vec2::new(100.0, 60.0), Vec2::ZERO);

        let mut touched = false;
        for _ in 0..120 {
            space.step(DT);
            for event in space.drain_contacts() {
                assert!(event.involves(floor_shape));
                assert!(event.involves(ball_shape));
                touched = true;
            }
        }
        assert!(touched);
        let body = space.body(ball).unwrap();
        // Resting on the floor, roughly at radius height
        assert!(body.position.y > 15.0 && body.position.y < 40.0);
    }

    #[test]
    fn test_impact_reports_impulse() {
        let mut space = Space::new(Vec2::ZERO);
        let (_, a) = ball(&mut space, 5.0, 12.0, Vec2::ZERO, Vec2::new(600.0, 0.0));
        let (b_body, b) = ball(&mut space, 2.0, 20.0, Vec2::new(40.0, 0.0), Vec2::ZERO);

        let mut strongest = 0.0f32;
        for _ in 0..10 {
            space.step(DT);
            for event in space.drain_contacts() {
                assert!(event.involves(a) && event.involves(b));
                strongest = strongest.max(event.impulse_magnitude());
            }
        }
        assert!(strongest > 100.0);
        assert!(space.body(b_body).unwrap().velocity.x > 0.0);
    }

    #[test]
    fn test_group_filters_family() {
        let mut space = Space::new(Vec2::ZERO);
        let a = space.add_body(Body::dynamic(1.0, 1.0)).unwrap();
        let b = space
            .add_body(Body::dynamic(1.0, 1.0).with_position(Vec2::new(4.0, 0.0)))
            .unwrap();
        space.add_shape(Shape::circle(a, 5.0).with_group(7)).unwrap();
        space.add_shape(Shape::circle(b, 5.0).with_group(7)).unwrap();
        for _ in 0..5 {
            space.step(DT);
        }
        assert!(space.drain_contacts().is_empty());
        assert_eq!(space.body(a).unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn test_remove_body_drops_shapes() {
        let mut space = Space::new(Vec2::ZERO);
        let body = space.add_body(Body::dynamic(1.0, 1.0)).unwrap();
        let shape = space.add_shape(Shape::circle(body, 5.0)).unwrap();
        assert!(space.remove_body(body));
        assert!(!space.contains_shape(shape));
        assert_eq!(space.body(body), Err(PhysicsError::BodyNotFound(body)));
        // Removing twice is harmless
        assert!(!space.remove_body(body));
    }

    #[test]
    fn test_invalid_input_rejected() {
        let mut space = Space::new(Vec2::ZERO);
        assert_eq!(
            space.add_body(Body::dynamic(0.0, 1.0)),
            Err(PhysicsError::InvalidMass(0.0))
        );
        assert_eq!(
            space.add_body(Body::dynamic(1.0, 0.0)),
            Err(PhysicsError::InvalidMoment(0.0))
        );
        let orphan = Shape::circle(BodyHandle::invalid(), 1.0);
        assert_eq!(
            space.add_shape(orphan),
            Err(PhysicsError::BodyNotFound(BodyHandle::invalid()))
        );
        let body = space.add_body(Body::fixed()).unwrap();
        assert!(matches!(
            space.add_shape(Shape::circle(body, 0.0)),
            Err(PhysicsError::InvalidShape(_))
        ));
    }
}
