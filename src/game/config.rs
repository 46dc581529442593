// Game configuration and tuning tables

use crate::engine::input::KeyBindings;
use crate::engine::physics::{CollisionFilter, Gravity, Rect};
use crate::engine::stage::{STAGE_HEIGHT, STAGE_WIDTH};
use std::time::Duration;

/// Collision categories
pub mod colliders {
    /// Scenery: borders, rocks
    pub const DEFAULT: u32 = 0x0001;
    pub const PLAYER: u32 = 0x0002;
    pub const ARROW: u32 = 0x0004;
}

/// Label shared by the four bodies fencing the play area
pub const BORDER_LABEL: &str = "border";

/// Top-level settings for a play session
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Play area size, in stage units
    pub width: f32,
    pub height: f32,
    /// Thickness of the walls around the play area
    pub border_thickness: f32,
    pub gravity: Gravity,
    pub key_bindings: KeyBindings,
}

impl GameConfig {
    /// The four walls just outside the play area, top, right, bottom, left
    pub fn borders(&self) -> [Rect; 4] {
        let (w, h, b) = (self.width, self.height, self.border_thickness);
        [
            Rect::new(0.0, -b, w, b),
            Rect::new(w, 0.0, b, h),
            Rect::new(0.0, h, w, b),
            Rect::new(-b, 0.0, b, h),
        ]
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: STAGE_WIDTH,
            height: STAGE_HEIGHT,
            border_thickness: 20.0,
            // Top-down: nothing falls
            gravity: Gravity::zero(),
            key_bindings: KeyBindings::default(),
        }
    }
}

/// Player tuning values
#[derive(Debug, Clone)]
pub struct PlayerTuning {
    /// Spawn rectangle
    pub body: Rect,
    pub friction_air: f32,

    // Speeds in units per step
    pub running_speed: f32,
    pub rolling_speed: f32,
    pub aiming_speed: f32,

    /// Delay before another roll once one ends
    pub roll_cooldown: Duration,

    // Sprite sheet
    pub tile_width: u32,
    pub tile_height: u32,
    pub sprite_rows: usize,
    pub last_frame: usize,
    pub ticks_per_frame: u32,
    pub rolling_ticks_per_frame: u32,
}

pub const PLAYER_TUNING: PlayerTuning = PlayerTuning {
    body: Rect::new(250.0, 250.0, 32.0, 32.0),
    friction_air: 0.1,

    running_speed: 3.0,
    rolling_speed: 6.0,
    aiming_speed: 2.0,

    roll_cooldown: Duration::from_millis(1000),

    tile_width: 32,
    tile_height: 34,
    sprite_rows: 32,
    last_frame: 5,
    ticks_per_frame: 5,
    rolling_ticks_per_frame: 3,
};

/// Arrow tuning values
#[derive(Debug, Clone)]
pub struct ArrowTuning {
    pub width: f32,
    pub height: f32,
    /// Flight speed in units per step
    pub speed: f32,
}

pub const ARROW_TUNING: ArrowTuning = ArrowTuning {
    width: 16.0,
    height: 5.0,
    speed: 12.0,
};

/// Rock placement and artwork
#[derive(Debug, Clone)]
pub struct RockTuning {
    pub body: Rect,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Pixel offset of the rock in its image
    pub sprite_offset: (f32, f32),
}

pub const ROCK_TUNING: RockTuning = RockTuning {
    body: Rect::new(502.0, 130.0, 140.0, 75.0),
    tile_width: 164,
    tile_height: 115,
    sprite_offset: (12.0, 20.0),
};

/// Player collides with scenery only
pub const PLAYER_FILTER: CollisionFilter = CollisionFilter::new(colliders::PLAYER, colliders::DEFAULT);

/// Arrows collide with scenery only
pub const ARROW_FILTER: CollisionFilter = CollisionFilter::new(colliders::ARROW, colliders::DEFAULT);
