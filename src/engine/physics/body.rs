use glam::Vec2;
use rapier2d::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

use super::collision::{BodyCollision, CollisionFilter};
use super::world::WorldHandle;
use super::PhysicsError;
use crate::core::SubscriptionId;
use crate::engine::game_loop::{LoopHandle, TICKS_PER_SECOND};

pub use rapier2d::prelude::RigidBodyHandle;

/// Minimum distance the simulated position must drift before it is published
pub const POSITION_EPSILON: f32 = 0.1;

/// Damping rate that stands in for air friction as large as 1
const MAX_LINEAR_DAMPING: Real = 1.0e4;

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Vec2 {
        crate::core::math::rect_center(self.x, self.y, self.width, self.height)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width <= 0.0 || self.height <= 0.0 {
            return Err(PhysicsError::InvalidRect {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl From<[f32; 4]> for Rect {
    fn from([x, y, width, height]: [f32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

/// Physical properties of a rectangular body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyOptions {
    /// Reported to the other side of every collision
    pub label: String,
    pub is_static: bool,
    pub friction: Real,
    /// Fraction of velocity lost per nominal step
    pub friction_air: Real,
    pub restitution: Real,
    pub density: Real,
    /// Infinite inertia: the body never rotates
    pub fixed_rotation: bool,
    pub angle: Real,
    pub collision_filter: CollisionFilter,
    pub can_sleep: bool,
}

impl BodyOptions {
    /// Create options for a dynamic body (affected by forces and collisions)
    pub fn dynamic() -> Self {
        Self::default()
    }

    /// Create options for a fixed (static) body (completely immovable)
    pub fn fixed() -> Self {
        Self {
            is_static: true,
            ..Self::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set air friction (0.0 = none, 1.0 = stops within a step)
    pub fn friction_air(mut self, friction_air: Real) -> Self {
        self.friction_air = friction_air;
        self
    }

    /// Lock rotation (useful for player characters)
    pub fn lock_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }

    /// Set the initial rotation, in radians
    pub fn angle(mut self, angle: Real) -> Self {
        self.angle = angle;
        self
    }

    pub fn collision_filter(mut self, filter: CollisionFilter) -> Self {
        self.collision_filter = filter;
        self
    }

    /// Set whether the body can sleep when inactive
    pub fn can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    /// Build the rigid body centered on `center`
    pub fn build_rigid_body(&self, center: Vec2) -> RigidBody {
        let builder = if self.is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        };

        let damping = air_friction_to_damping(self.friction_air);
        let mut builder = builder
            .translation(vector![center.x, center.y])
            .rotation(self.angle)
            .linear_damping(damping)
            .angular_damping(damping)
            .can_sleep(self.can_sleep);

        if self.fixed_rotation {
            builder = builder.lock_rotations();
        }

        builder.build()
    }

    /// Build the box collider for this body
    pub fn build_collider(&self, half_width: Real, half_height: Real) -> Collider {
        ColliderBuilder::cuboid(half_width, half_height)
            .friction(self.friction)
            .restitution(self.restitution)
            .density(self.density)
            .collision_groups(self.collision_filter.to_interaction_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build()
    }
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            label: "body".to_owned(),
            is_static: false,
            friction: 0.1,
            friction_air: 0.01,
            restitution: 0.0,
            density: 1.0,
            fixed_rotation: false,
            angle: 0.0,
            collision_filter: CollisionFilter::default(),
            can_sleep: true,
        }
    }
}

/// Damping rate losing `friction_air` of the velocity over one nominal step
pub fn air_friction_to_damping(friction_air: Real) -> Real {
    let friction_air = friction_air.max(0.0);
    if friction_air >= 1.0 {
        return MAX_LINEAR_DAMPING;
    }
    TICKS_PER_SECOND * friction_air / (1.0 - friction_air)
}

/// Velocity in units per nominal step to units per second
pub fn velocity_to_simulation(velocity: Vec2) -> Vector<Real> {
    vector![velocity.x, velocity.y] * TICKS_PER_SECOND
}

/// Velocity in units per second to units per nominal step
pub fn velocity_from_simulation(velocity: &Vector<Real>) -> Vec2 {
    Vec2::new(velocity.x, velocity.y) / TICKS_PER_SECOND
}

/// Mutable view of a rigid body handed to update callbacks
pub struct BodyControl<'a> {
    body: &'a mut RigidBody,
}

impl<'a> BodyControl<'a> {
    pub fn new(body: &'a mut RigidBody) -> Self {
        Self { body }
    }

    /// Center of the body in the simulation
    pub fn position(&self) -> Vec2 {
        let t = self.body.translation();
        Vec2::new(t.x, t.y)
    }

    pub fn set_position(&mut self, center: Vec2) {
        self.body.set_translation(vector![center.x, center.y], true);
    }

    /// Velocity in units per step
    pub fn velocity(&self) -> Vec2 {
        velocity_from_simulation(self.body.linvel())
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.body.set_linvel(velocity_to_simulation(velocity), true);
    }

    pub fn angle(&self) -> Real {
        self.body.rotation().angle()
    }

    pub fn set_angle(&mut self, angle: Real) {
        self.body.set_rotation(Rotation::new(angle), true);
    }

    /// Current transform, before the publish threshold
    pub fn transform(&self) -> BodyTransform {
        BodyTransform {
            position: self.position(),
            angle: self.angle(),
        }
    }
}

/// Position and rotation exposed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyTransform {
    pub position: Vec2,
    pub angle: Real,
}

impl BodyTransform {
    /// Fold a freshly sampled transform into the published one
    ///
    /// Position follows only past [`POSITION_EPSILON`]; angle always follows.
    pub fn sync(self, sampled: BodyTransform) -> Self {
        let position = if self.position.distance(sampled.position) > POSITION_EPSILON {
            sampled.position
        } else {
            self.position
        };
        Self {
            position,
            angle: sampled.angle,
        }
    }
}

type UpdateCallback = Box<dyn FnMut(&mut BodyControl)>;
type CollisionCallback = Box<dyn FnMut(&BodyCollision)>;

/// Builder for mounting a [`Body`] into a world
pub struct BodyBuilder {
    rect: Rect,
    options: BodyOptions,
    on_update: Option<UpdateCallback>,
    on_collision: Option<CollisionCallback>,
}

impl BodyBuilder {
    pub fn options(mut self, options: BodyOptions) -> Self {
        self.options = options;
        self
    }

    /// Called every tick before the transform is resampled
    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut BodyControl) + 'static,
    {
        self.on_update = Some(Box::new(callback));
        self
    }

    /// Called with the collision pairs this body takes part in
    pub fn on_collision<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&BodyCollision) + 'static,
    {
        self.on_collision = Some(Box::new(callback));
        self
    }

    /// Add the body to `world` and wire its callbacks
    pub fn mount(self, world: &WorldHandle, game_loop: &LoopHandle) -> Result<Body, PhysicsError> {
        let handle = world.add_body(self.rect, &self.options)?;
        let transform = Rc::new(Cell::new(BodyTransform {
            position: self.rect.center(),
            angle: self.options.angle,
        }));

        let update_subscription = if self.on_update.is_some() || !self.options.is_static {
            let world = world.clone();
            let transform = Rc::clone(&transform);
            let mut on_update = self.on_update;
            Some(game_loop.subscribe(move || {
                let sampled = world.with_body_mut(handle, |body| {
                    let mut control = BodyControl::new(body);
                    if let Some(callback) = on_update.as_mut() {
                        callback(&mut control);
                    }
                    control.transform()
                });
                if let Ok(sampled) = sampled {
                    transform.set(transform.get().sync(sampled));
                }
            }))
        } else {
            None
        };

        let collision_subscription = self.on_collision.map(|mut callback| {
            world.subscribe_to_collision(move |event| {
                if let Some(collision) = event.for_body(handle) {
                    callback(&collision);
                }
            })
        });

        log::debug!("Mounted body '{}' ({:?})", self.options.label, handle);
        Ok(Body {
            handle,
            size: self.rect.size(),
            label: self.options.label,
            transform,
            world: world.clone(),
            game_loop: game_loop.clone(),
            update_subscription,
            collision_subscription,
        })
    }
}

/// A rigid body mounted in a world, kept in sync with the loop
///
/// Dropping it removes the body and both of its subscriptions.
pub struct Body {
    handle: RigidBodyHandle,
    size: Vec2,
    label: String,
    transform: Rc<Cell<BodyTransform>>,
    world: WorldHandle,
    game_loop: LoopHandle,
    update_subscription: Option<SubscriptionId>,
    collision_subscription: Option<SubscriptionId>,
}

impl Body {
    pub fn builder(rect: Rect) -> BodyBuilder {
        BodyBuilder {
            rect,
            options: BodyOptions::default(),
            on_update: None,
            on_collision: None,
        }
    }

    #[cfg(test)]
    pub fn handle(&self) -> RigidBodyHandle {
        self.handle
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Last published center
    pub fn position(&self) -> Vec2 {
        self.transform.get().position
    }

    pub fn angle(&self) -> Real {
        self.transform.get().angle
    }

    /// Top-left corner of the published rectangle
    pub fn top_left(&self) -> Vec2 {
        self.position() - self.size / 2.0
    }

    /// Current center in the simulation, published or not
    #[cfg(test)]
    pub fn simulated_position(&self) -> Result<Vec2, PhysicsError> {
        self.world
            .with_body_mut(self.handle, |body| BodyControl::new(body).position())
    }

    /// Velocity in units per step
    #[cfg(test)]
    pub fn velocity(&self) -> Result<Vec2, PhysicsError> {
        self.world
            .with_body_mut(self.handle, |body| BodyControl::new(body).velocity())
    }

    #[cfg(test)]
    pub fn set_velocity(&self, velocity: Vec2) -> Result<(), PhysicsError> {
        self.world
            .with_body_mut(self.handle, |body| BodyControl::new(body).set_velocity(velocity))
    }
}

impl Drop for Body {
    fn drop(&mut self) {
        if let Some(id) = self.update_subscription.take() {
            self.game_loop.unsubscribe(id);
        }
        if let Some(id) = self.collision_subscription.take() {
            self.world.unsubscribe_from_collision(id);
        }
        self.world.remove_body(self.handle);
        log::debug!("Removed body '{}' ({:?})", self.label, self.handle);
    }
}
