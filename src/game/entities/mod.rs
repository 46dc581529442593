// Game entities
//
// Each entity composes a physics body with a sprite and exposes a plain-data
// view pulled once per frame by the scene.

pub mod arrow;
pub mod orientation;
pub mod player;
pub mod rock;
pub mod state;

use glam::Vec2;

use crate::engine::physics::Body;
use crate::engine::sprite::SpriteFrame;

pub use player::{Player, PlayerView};
pub use rock::Rock;

// Player internals, re-exported for tests and future entities
#[allow(unused_imports)]
pub use arrow::{Arrow, ArrowSignal};
#[allow(unused_imports)]
pub use orientation::Orientation;
#[allow(unused_imports)]
pub use state::{ArrowOrder, PlayerInput, PlayerState, PlayerStateMachine};

/// Where and how to draw one entity, in stage units
#[derive(Debug, Clone, PartialEq)]
pub struct EntityView {
    pub label: String,
    /// Top-left corner of the body
    pub position: Vec2,
    pub size: Vec2,
    /// Rotation around the body center, in radians
    pub angle: f32,
    pub sprite: SpriteFrame,
}

impl EntityView {
    pub fn new(body: &Body, sprite: SpriteFrame) -> Self {
        Self {
            label: body.label().to_owned(),
            position: body.top_left(),
            size: body.size(),
            angle: body.angle(),
            sprite,
        }
    }
}
