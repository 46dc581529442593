// Game action definitions and mappings

use winit::keyboard::KeyCode;

/// Represents all possible in-game actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Movement
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,

    // Abilities
    Roll,
    Aim,
}

impl Action {
    #[cfg(test)]
    pub const ALL: [Action; 6] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveUp,
        Action::MoveDown,
        Action::Roll,
        Action::Aim,
    ];
}

/// Default keyboard bindings
///
/// Physical key codes, so the WASD block sits under the same fingers on an
/// AZERTY layout (ZQSD).
pub fn default_bindings() -> Vec<(KeyCode, Action)> {
    vec![
        // Movement (WASD - standard gaming layout)
        (KeyCode::KeyA, Action::MoveLeft),
        (KeyCode::KeyD, Action::MoveRight),
        (KeyCode::KeyW, Action::MoveUp),
        (KeyCode::KeyS, Action::MoveDown),
        (KeyCode::Space, Action::Roll),
        (KeyCode::ShiftLeft, Action::Aim),
        (KeyCode::ShiftRight, Action::Aim),
    ]
}
