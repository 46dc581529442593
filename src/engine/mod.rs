// Engine modules: game loop, physics, sprites, stage, input

pub mod game_loop;
pub mod input;
pub mod physics;
pub mod sprite;
pub mod stage;
