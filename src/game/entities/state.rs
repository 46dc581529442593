// Player state machine

use glam::{IVec2, Vec2};
use std::time::Duration;

use super::orientation::Orientation;
use crate::core::math::unit_direction;
use crate::engine::sprite::{AnimationEvent, SpriteAnimation};
use crate::game::config::PlayerTuning;

/// Represents the current state of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayerState {
    /// Standing still
    #[default]
    Idle,
    Running,
    /// Dodge roll; lasts until its animation ends
    Rolling,
    /// Bow drawn, released on leaving this state
    Aiming,
}

impl PlayerState {
    /// Locomotion speed in units per step
    pub fn speed(&self, tuning: &PlayerTuning) -> f32 {
        match self {
            Self::Running => tuning.running_speed,
            Self::Rolling => tuning.rolling_speed,
            Self::Aiming => tuning.aiming_speed,
            Self::Idle => 0.0,
        }
    }

    /// Whether the animation of this state loops
    pub fn repeats(&self) -> bool {
        matches!(self, Self::Running | Self::Aiming)
    }
}

/// Keys polled at the start of a player tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerInput {
    pub movement: IVec2,
    pub roll: bool,
    pub aim: bool,
}

/// The arrow the player holds or has just released
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArrowOrder {
    pub direction: IVec2,
    /// Where the arrow appears
    pub start: Vec2,
    pub shot: bool,
}

/// State machine that handles player state transitions and action gating
#[derive(Debug, Clone)]
pub struct PlayerStateMachine {
    tuning: PlayerTuning,
    state: PlayerState,
    orientation: Orientation,
    can_roll: bool,
    can_shoot: bool,
    arrow: ArrowOrder,
    /// Time at which rolling is allowed again
    roll_ready_at: Option<Duration>,
}

impl PlayerStateMachine {
    pub fn new(tuning: PlayerTuning) -> Self {
        Self {
            tuning,
            state: PlayerState::Idle,
            orientation: Orientation::South,
            can_roll: true,
            can_shoot: true,
            arrow: ArrowOrder::default(),
            roll_ready_at: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn can_roll(&self) -> bool {
        self.can_roll
    }

    pub fn can_shoot(&self) -> bool {
        self.can_shoot
    }

    pub fn arrow(&self) -> ArrowOrder {
        self.arrow
    }

    /// Run one body update
    ///
    /// `position` is the body center, where an aimed arrow starts. Returns
    /// the velocity to give the body, if any.
    pub fn update(&mut self, input: PlayerInput, position: Vec2) -> Option<Vec2> {
        let previous_state = self.state;
        let previous_orientation = self.orientation;

        let moving = input.movement != IVec2::ZERO;
        let mut direction = input.movement;
        let mut orientation =
            Orientation::from_movement(input.movement).unwrap_or(previous_orientation);
        let mut state = if moving {
            PlayerState::Running
        } else {
            PlayerState::Idle
        };

        // Aiming wins over a roll, which then stays available
        if input.aim {
            state = PlayerState::Aiming;
        } else if input.roll && self.can_roll {
            state = PlayerState::Rolling;
            self.can_roll = false;
        }

        if state == PlayerState::Aiming {
            orientation = previous_orientation;
            if self.can_shoot && !self.arrow.shot {
                self.arrow = ArrowOrder {
                    direction: orientation.vector(),
                    start: position,
                    shot: false,
                };
            }
        } else if previous_state == PlayerState::Aiming {
            self.can_shoot = false;
            self.arrow.shot = true;
            log::debug!("Arrow released toward {:?}", self.arrow.direction);
        }

        // A roll runs until its animation ends
        if previous_state == PlayerState::Rolling {
            direction = previous_orientation.vector();
            orientation = previous_orientation;
            state = PlayerState::Rolling;
        }

        if state != previous_state {
            log::trace!("Player {:?} -> {:?}", previous_state, state);
        }
        self.state = state;
        self.orientation = orientation;

        let speed = if moving { state.speed(&self.tuning) } else { 0.0 };
        (speed != 0.0).then(|| unit_direction(direction) * speed)
    }

    /// React to the player sprite's animation events
    pub fn on_animation(&mut self, event: AnimationEvent, now: Duration) {
        if self.state == PlayerState::Rolling && event == AnimationEvent::End {
            self.state = PlayerState::Idle;
            self.roll_ready_at = Some(now + self.tuning.roll_cooldown);
        }
    }

    /// Release the roll once its cooldown has elapsed
    pub fn release_cooldowns(&mut self, now: Duration) {
        if self.roll_ready_at.is_some_and(|ready| now >= ready) {
            self.roll_ready_at = None;
            self.can_roll = true;
        }
    }

    /// The shot arrow is gone: forget it and allow the next one
    pub fn on_arrow_gone(&mut self) {
        self.arrow = ArrowOrder::default();
        self.can_shoot = true;
    }

    /// Sprite row and playback for the current state
    pub fn sprite_animation(&self) -> SpriteAnimation {
        let base = self.orientation.row();
        let row = match self.state {
            PlayerState::Rolling => base + 8,
            PlayerState::Aiming => base + 16 + if self.can_shoot { 0 } else { 8 },
            _ => base,
        };
        let ticks_per_frame = if self.state == PlayerState::Rolling {
            self.tuning.rolling_ticks_per_frame
        } else {
            self.tuning.ticks_per_frame
        };
        SpriteAnimation::new(row)
            .repeat(self.state.repeats())
            .ticks_per_frame(ticks_per_frame)
    }
}
