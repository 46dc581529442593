// Keyboard state polled by the simulation

use super::action::Action;
use super::config::KeyBindings;
use glam::IVec2;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug)]
struct KeyState {
    bindings: KeyBindings,
    held: HashSet<KeyCode>,
}

/// Shared view of which bound keys are held down
///
/// The window feeds key events in; entities poll it once per tick. Clones
/// share the same state.
#[derive(Debug, Clone)]
pub struct Keyboard {
    state: Rc<RefCell<KeyState>>,
}

impl Keyboard {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            state: Rc::new(RefCell::new(KeyState {
                bindings,
                held: HashSet::new(),
            })),
        }
    }

    /// Process a keyboard event from winit
    pub fn process_keyboard_event(&self, event: &KeyEvent) {
        // Only process physical key presses
        if let PhysicalKey::Code(key) = event.physical_key {
            match event.state {
                ElementState::Pressed => self.press(key),
                ElementState::Released => self.release(key),
            }
        }
    }

    /// Record a key going down; unbound keys are ignored
    pub fn press(&self, key: KeyCode) {
        let mut state = self.state.borrow_mut();
        if state.bindings.is_bound(key) {
            state.held.insert(key);
        }
    }

    pub fn release(&self, key: KeyCode) {
        self.state.borrow_mut().held.remove(&key);
    }

    /// Release every key (focus lost)
    pub fn clear(&self) {
        self.state.borrow_mut().held.clear();
    }

    /// Whether any key bound to `action` is held
    pub fn is_down(&self, action: Action) -> bool {
        let state = self.state.borrow();
        state
            .bindings
            .keys(action)
            .iter()
            .any(|key| state.held.contains(key))
    }

    /// Movement keys folded into a direction, y growing downward
    pub fn movement(&self) -> IVec2 {
        let mut movement = IVec2::ZERO;
        if self.is_down(Action::MoveLeft) {
            movement.x -= 1;
        }
        if self.is_down(Action::MoveRight) {
            movement.x += 1;
        }
        if self.is_down(Action::MoveUp) {
            movement.y -= 1;
        }
        if self.is_down(Action::MoveDown) {
            movement.y += 1;
        }
        movement
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let keyboard = Keyboard::default();
        assert!(!keyboard.is_down(Action::Roll));

        keyboard.press(KeyCode::Space);
        assert!(keyboard.is_down(Action::Roll));

        keyboard.release(KeyCode::Space);
        assert!(!keyboard.is_down(Action::Roll));
    }

    #[test]
    fn test_either_shift_aims() {
        let keyboard = Keyboard::default();
        keyboard.press(KeyCode::ShiftLeft);
        keyboard.press(KeyCode::ShiftRight);
        keyboard.release(KeyCode::ShiftLeft);
        assert!(keyboard.is_down(Action::Aim));

        keyboard.release(KeyCode::ShiftRight);
        assert!(!keyboard.is_down(Action::Aim));
    }

    #[test]
    fn test_movement_folds_opposites() {
        let keyboard = Keyboard::default();
        keyboard.press(KeyCode::KeyA);
        keyboard.press(KeyCode::KeyS);
        assert_eq!(keyboard.movement(), IVec2::new(-1, 1));

        keyboard.press(KeyCode::KeyD);
        assert_eq!(keyboard.movement(), IVec2::new(0, 1));

        keyboard.clear();
        assert_eq!(keyboard.movement(), IVec2::ZERO);
    }

    #[test]
    fn test_clones_share_state() {
        let keyboard = Keyboard::default();
        let polled = keyboard.clone();
        keyboard.press(KeyCode::KeyW);
        assert_eq!(polled.movement(), IVec2::new(0, -1));
    }

    #[test]
    fn test_unbound_keys_ignored() {
        let keyboard = Keyboard::default();
        keyboard.press(KeyCode::KeyP);
        assert!(Action::ALL.iter().all(|a| !keyboard.is_down(*a)));
    }
}
