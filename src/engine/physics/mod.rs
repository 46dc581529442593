// Physics system using rapier2d

pub mod body;
pub mod collision;
pub mod world;

pub use body::{Body, BodyOptions, Rect, RigidBodyHandle};
pub use collision::CollisionFilter;
pub use world::{Gravity, World, WorldConfig, WorldHandle};

// Callback-facing types, reached through their modules by the entities
#[allow(unused_imports)]
pub use body::{BodyBuilder, BodyControl, BodyTransform};
#[allow(unused_imports)]
pub use collision::{BodyCollision, BodyContact, CollisionPair, CollisionStart};
#[allow(unused_imports)]
pub use world::Simulation;

/// Errors raised while building or addressing bodies
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("invalid body rectangle {width}x{height}: size must be finite and positive")]
    InvalidRect { width: f32, height: f32 },

    #[error("rigid body {0:?} is not in the simulation")]
    BodyNotFound(RigidBodyHandle),
}
