// The forest scene: loop, world, borders, player and rock

use anyhow::{Context, Result};
use std::rc::Rc;

use super::config::{GameConfig, ARROW_TUNING, BORDER_LABEL, PLAYER_TUNING, ROCK_TUNING};
use super::entities::{EntityView, Player, PlayerView, Rock};
use crate::core::Clock;
use crate::engine::game_loop::GameLoop;
use crate::engine::input::Keyboard;
use crate::engine::physics::{BodyOptions, World, WorldConfig};
use crate::engine::stage::{Stage, StageDimensions};

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct SceneView {
    /// Ticks run so far
    pub frame: u64,
    pub stage: StageDimensions,
    pub player: PlayerView,
    pub rock: EntityView,
}

/// One play session
///
/// Fields drop in declaration order: entities leave the world before the
/// world leaves the loop.
pub struct Scene {
    player: Player,
    rock: Rock,
    world: World,
    game_loop: GameLoop,
    keyboard: Keyboard,
    stage: Stage,
}

impl Scene {
    pub fn new(config: GameConfig, clock: Rc<dyn Clock>) -> Result<Self> {
        let game_loop = GameLoop::new();
        let loop_handle = game_loop.handle();

        let borders = config.borders();
        let world = World::with_init(
            &loop_handle,
            clock.clone(),
            WorldConfig {
                gravity: config.gravity,
            },
            |simulation| {
                let options = BodyOptions::fixed().label(BORDER_LABEL);
                for rect in borders {
                    simulation.add_body(rect, &options)?;
                }
                Ok(())
            },
        )
        .context("failed to build the world borders")?;

        let keyboard = Keyboard::new(config.key_bindings.clone());
        let player = Player::new(
            &world.handle(),
            &loop_handle,
            keyboard.clone(),
            clock,
            PLAYER_TUNING,
            ARROW_TUNING,
        )
        .context("failed to spawn the player")?;
        let rock = Rock::new(&world.handle(), &loop_handle, &ROCK_TUNING)
            .context("failed to place the rock")?;

        log::info!("Scene ready ({}x{})", config.width, config.height);
        Ok(Self {
            player,
            rock,
            world,
            game_loop,
            keyboard,
            stage: Stage::new(config.width, config.height),
        })
    }

    /// Run one loop tick, then pull every entity's view
    pub fn frame(&mut self) -> Result<SceneView> {
        self.game_loop.tick();
        let player = self.player.update()?;

        Ok(SceneView {
            frame: self.game_loop.frame_count(),
            stage: self.stage.dimensions(),
            player,
            rock: self.rock.view(),
        })
    }

    /// Refit the stage to a new window size
    pub fn resize(&mut self, width: f32, height: f32) -> StageDimensions {
        self.stage.resize(width, height)
    }

    /// Stop the loop; no further tick runs
    pub fn shutdown(&self) {
        self.game_loop.stop();
    }

    pub fn is_running(&self) -> bool {
        self.game_loop.is_running()
    }

    pub fn toggle_pause(&self) {
        self.game_loop.toggle_pause();
    }

    pub fn fps(&self) -> f32 {
        self.game_loop.fps()
    }

    /// Keyboard state polled by the player; feed window events into it
    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    #[cfg(test)]
    pub fn world(&self) -> &World {
        &self.world
    }
}
