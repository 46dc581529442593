// Errors raised while building game entities

use crate::engine::physics::PhysicsError;
use crate::engine::sprite::SpriteError;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("physics: {0}")]
    Physics(#[from] PhysicsError),

    #[error("sprite: {0}")]
    Sprite(#[from] SpriteError),
}
