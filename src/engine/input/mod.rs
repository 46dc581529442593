// Input handling system
//
// - `action`: game actions and default key bindings
// - `config`: key binding table and remapping
// - `keyboard`: held-key state fed by window events and polled per tick

pub mod action;
pub mod config;
pub mod keyboard;

// Re-export commonly used types
pub use action::Action;
pub use config::KeyBindings;
pub use keyboard::Keyboard;
