// Static scenery

use super::EntityView;
use crate::engine::game_loop::LoopHandle;
use crate::engine::physics::{Body, BodyOptions, WorldHandle};
use crate::engine::sprite::{Sprite, SpriteAnimation, SpriteSheet};
use crate::game::config::RockTuning;
use crate::game::error::GameError;

/// Just a rock
pub struct Rock {
    body: Body,
    sprite: Sprite,
}

impl Rock {
    pub fn new(
        world: &WorldHandle,
        game_loop: &LoopHandle,
        tuning: &RockTuning,
    ) -> Result<Self, GameError> {
        let body = Body::builder(tuning.body)
            .options(BodyOptions::fixed().label("rock"))
            .mount(world, game_loop)?;

        let (offset_x, offset_y) = tuning.sprite_offset;
        let sheet = SpriteSheet::still(tuning.tile_width, tuning.tile_height)
            .with_offset(offset_x, offset_y);
        let sprite = Sprite::new(game_loop, sheet, SpriteAnimation::new(0))?;

        Ok(Self { body, sprite })
    }

    pub fn view(&self) -> EntityView {
        EntityView::new(&self.body, self.sprite.frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::engine::game_loop::GameLoop;
    use crate::engine::physics::{World, WorldConfig};
    use crate::game::config::ROCK_TUNING;
    use glam::Vec2;
    use std::rc::Rc;

    #[test]
    fn test_rock_takes_no_loop_slot() {
        let game_loop = GameLoop::new();
        let world = World::new(
            &game_loop.handle(),
            Rc::new(ManualClock::new()),
            WorldConfig::default(),
        );
        let rock = Rock::new(&world.handle(), &game_loop.handle(), &ROCK_TUNING).unwrap();

        // Only the world step is subscribed
        assert_eq!(game_loop.subscriber_count(), 1);

        for _ in 0..3 {
            game_loop.tick();
        }
        let view = rock.view();
        assert_eq!(view.position, Vec2::new(502.0, 130.0));
        assert_eq!(view.size, Vec2::new(140.0, 75.0));
        assert_eq!(view.sprite.source, Vec2::new(12.0, 20.0));
        assert_eq!(view.label, "rock");
    }
}
