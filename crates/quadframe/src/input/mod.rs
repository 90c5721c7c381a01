//! Input state shared between the host and the frame loop
//!
//! The host feeds raw key and mouse events into a [`SharedInput`] from any
//! thread. Once per frame the scheduler takes a snapshot: edge flags
//! (pressed/released) appear in exactly one snapshot and are then cleared,
//! held flags persist until the matching release.

use crate::foundation::math::Vec2;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Keyboard and mouse state as seen by one frame
#[derive(Debug, Clone, PartialEq)]
pub struct InputState {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    buttons_held: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,
    buttons_released: HashSet<MouseButton>,
    cursor: Vec2,
    focused: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            keys_held: HashSet::new(),
            keys_pressed: HashSet::new(),
            keys_released: HashSet::new(),
            buttons_held: HashSet::new(),
            buttons_pressed: HashSet::new(),
            buttons_released: HashSet::new(),
            cursor: Vec2::zeros(),
            focused: false,
        }
    }
}

impl InputState {
    /// Create an empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle key input
    ///
    /// A press only raises the edge flag when the key was not already held,
    /// so OS key repeat does not produce extra presses.
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            if self.keys_held.insert(key) {
                self.keys_pressed.insert(key);
            }
        } else {
            self.keys_held.remove(&key);
            self.keys_released.insert(key);
        }
    }

    /// Handle mouse button input
    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            if self.buttons_held.insert(button) {
                self.buttons_pressed.insert(button);
            }
        } else {
            self.buttons_held.remove(&button);
            self.buttons_released.insert(button);
        }
    }

    /// Handle mouse movement
    pub fn handle_mouse_move(&mut self, x: f64, y: f64) {
        self.cursor = Vec2::new(x, y);
    }

    /// Record window focus changes; losing focus releases everything held
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.keys_released.extend(self.keys_held.drain());
            self.buttons_released.extend(self.buttons_held.drain());
        }
    }

    /// Key went down since the previous frame
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Key is currently down
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Key went up since the previous frame
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Button went down since the previous frame
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    /// Button is currently down
    pub fn is_button_held(&self, button: MouseButton) -> bool {
        self.buttons_held.contains(&button)
    }

    /// Button went up since the previous frame
    pub fn is_button_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    /// Last reported cursor position
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Whether the host window has focus
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Drop edge flags, keeping held state and cursor
    pub fn clear_edges(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
    }
}

/// Thread-safe handle the host writes events into
#[derive(Debug, Clone, Default)]
pub struct SharedInput {
    state: Arc<Mutex<InputState>>,
}

impl SharedInput {
    /// Create an empty shared input state
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut InputState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Forward a key event
    pub fn handle_key_input(&self, key: KeyCode, pressed: bool) {
        self.with_state(|state| state.handle_key_input(key, pressed));
    }

    /// Forward a mouse button event
    pub fn handle_mouse_button(&self, button: MouseButton, pressed: bool) {
        self.with_state(|state| state.handle_mouse_button(button, pressed));
    }

    /// Forward a cursor move
    pub fn handle_mouse_move(&self, x: f64, y: f64) {
        self.with_state(|state| state.handle_mouse_move(x, y));
    }

    /// Forward a focus change
    pub fn set_focused(&self, focused: bool) {
        self.with_state(|state| state.set_focused(focused));
    }

    /// Copy the state for one frame and clear its edges atomically
    pub fn snapshot_frame(&self) -> InputState {
        self.with_state(|state| {
            let snapshot = state.clone();
            state.clear_edges();
            snapshot
        })
    }
}

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// Space key
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Tab key
    Tab,
    /// Shift key
    Shift,
    /// Control key
    Control,
    /// Alt key
    Alt,
    /// Backspace key
    Backspace,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_edges_appear_in_one_snapshot() {
        let input = SharedInput::new();
        input.handle_key_input(KeyCode::Space, true);

        let first = input.snapshot_frame();
        assert!(first.is_key_pressed(KeyCode::Space));
        assert!(first.is_key_held(KeyCode::Space));

        let second = input.snapshot_frame();
        assert!(!second.is_key_pressed(KeyCode::Space));
        assert!(second.is_key_held(KeyCode::Space));
    }

    #[test]
    fn test_repeat_does_not_retrigger_press() {
        let mut state = InputState::new();
        state.handle_key_input(KeyCode::A, true);
        state.clear_edges();
        state.handle_key_input(KeyCode::A, true);
        assert!(!state.is_key_pressed(KeyCode::A));
        assert!(state.is_key_held(KeyCode::A));
    }

    #[test]
    fn test_tap_between_frames_is_seen() {
        let input = SharedInput::new();
        input.handle_mouse_button(MouseButton::Left, true);
        input.handle_mouse_button(MouseButton::Left, false);
        input.handle_mouse_move(12.0, 34.0);

        let frame = input.snapshot_frame();
        assert!(frame.is_button_pressed(MouseButton::Left));
        assert!(frame.is_button_released(MouseButton::Left));
        assert!(!frame.is_button_held(MouseButton::Left));
        assert_eq!(frame.cursor(), Vec2::new(12.0, 34.0));
    }

    #[test]
    fn test_focus_loss_releases_held_keys() {
        let mut state = InputState::new();
        state.set_focused(true);
        state.handle_key_input(KeyCode::W, true);
        state.set_focused(false);
        assert!(!state.is_key_held(KeyCode::W));
        assert!(state.is_key_released(KeyCode::W));
        assert!(!state.is_focused());
    }
}
