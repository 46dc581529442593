// The archer

use std::cell::RefCell;
use std::rc::Rc;

use super::arrow::{Arrow, ArrowSignal};
use super::orientation::Orientation;
use super::state::{PlayerInput, PlayerState, PlayerStateMachine};
use super::EntityView;
use crate::core::Clock;
use crate::engine::game_loop::LoopHandle;
use crate::engine::input::{Action, Keyboard};
use crate::engine::physics::{Body, BodyOptions, WorldHandle};
use crate::engine::sprite::{Sprite, SpriteSheet};
use crate::game::config::{ArrowTuning, PlayerTuning, PLAYER_FILTER};
use crate::game::error::GameError;

/// What the player looks like this frame
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub entity: EntityView,
    pub state: PlayerState,
    pub orientation: Orientation,
    pub can_roll: bool,
    pub can_shoot: bool,
    pub arrow: Option<EntityView>,
}

/// Keyboard-driven archer: runs, rolls, aims and shoots one arrow at a time
pub struct Player {
    body: Body,
    sprite: Sprite,
    /// Shared with the body update callback
    state: Rc<RefCell<PlayerStateMachine>>,
    arrow: Option<Arrow>,
    arrow_tuning: ArrowTuning,
    world: WorldHandle,
    game_loop: LoopHandle,
    clock: Rc<dyn Clock>,
}

impl Player {
    pub fn new(
        world: &WorldHandle,
        game_loop: &LoopHandle,
        keyboard: Keyboard,
        clock: Rc<dyn Clock>,
        tuning: PlayerTuning,
        arrow_tuning: ArrowTuning,
    ) -> Result<Self, GameError> {
        let state = Rc::new(RefCell::new(PlayerStateMachine::new(tuning.clone())));

        let machine = Rc::clone(&state);
        let body = Body::builder(tuning.body)
            .options(
                BodyOptions::dynamic()
                    .label("player")
                    .friction_air(tuning.friction_air)
                    .lock_rotation()
                    .collision_filter(PLAYER_FILTER),
            )
            .on_update(move |control| {
                let input = PlayerInput {
                    movement: keyboard.movement(),
                    roll: keyboard.is_down(Action::Roll),
                    aim: keyboard.is_down(Action::Aim),
                };
                let velocity = machine.borrow_mut().update(input, control.position());
                if let Some(velocity) = velocity {
                    control.set_velocity(velocity);
                }
            })
            .mount(world, game_loop)?;

        let sheet = SpriteSheet::uniform(
            tuning.tile_width,
            tuning.tile_height,
            tuning.sprite_rows,
            tuning.last_frame,
        );
        let animation = state.borrow().sprite_animation();
        let sprite = Sprite::new(game_loop, sheet, animation)?;

        log::info!("Player spawned at {:?}", body.position());
        Ok(Self {
            body,
            sprite,
            state,
            arrow: None,
            arrow_tuning,
            world: world.clone(),
            game_loop: game_loop.clone(),
            clock,
        })
    }

    /// Settle what happened during the last tick and report the result
    ///
    /// Runs outside the loop tick: handles animation events, cooldowns, the
    /// arrow's lifetime and the sprite row.
    pub fn update(&mut self) -> Result<PlayerView, GameError> {
        let now = self.clock.now();
        let mut state = self.state.borrow_mut();

        for event in self.sprite.poll_events() {
            state.on_animation(event, now);
        }
        state.release_cooldowns(now);

        if let Some(arrow) = &self.arrow {
            let signals = arrow.poll_signals();
            if let Some(signal) = signals.first() {
                match signal {
                    ArrowSignal::Border => log::debug!("Arrow hit the border"),
                    ArrowSignal::Obstacle(label) => log::debug!("Arrow hit '{}'", label),
                }
                self.arrow = None;
                state.on_arrow_gone();
            }
        }

        let order = state.arrow();
        if order.shot && self.arrow.is_none() {
            let arrow = Arrow::new(
                &self.world,
                &self.game_loop,
                &self.arrow_tuning,
                order.start,
                order.direction,
            )?;
            arrow.shoot();
            log::info!("Arrow shot toward {:?}", order.direction);
            self.arrow = Some(arrow);
        }

        self.sprite.configure(state.sprite_animation())?;

        Ok(PlayerView {
            entity: EntityView::new(&self.body, self.sprite.frame()),
            state: state.state(),
            orientation: state.orientation(),
            can_roll: state.can_roll(),
            can_shoot: state.can_shoot(),
            arrow: self.arrow.as_ref().map(Arrow::view),
        })
    }

    #[cfg(test)]
    pub fn arrow(&self) -> Option<&Arrow> {
        self.arrow.as_ref()
    }

    #[cfg(test)]
    pub fn state(&self) -> PlayerState {
        self.state.borrow().state()
    }
}
