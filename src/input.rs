//! Window input translated into viewer controls.
//!
//! [`Input`] folds raw winit events into per-frame state: keys pressed this
//! frame, whether the orbit button is held, and how far the cursor and wheel
//! moved. [`Input::actions`] turns the key presses into [`Action`]s.
//!
//! | Input | Effect |
//! |-------|--------|
//! | Left drag | Orbit camera |
//! | Wheel | Zoom |
//! | `Space` | Pause / resume |
//! | `N` | Single tick while paused |
//! | `R` | Reset to the seed state |
//! | `Escape` | Quit |

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Discrete viewer command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    TogglePause,
    StepOnce,
    Reset,
    Quit,
}

impl Action {
    fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Space => Some(Action::TogglePause),
            KeyCode::KeyN => Some(Action::StepOnce),
            KeyCode::KeyR => Some(Action::Reset),
            KeyCode::Escape => Some(Action::Quit),
            _ => None,
        }
    }
}

/// Per-frame input state.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    /// Pressed this frame, in arrival order, without auto-repeat.
    keys_pressed: Vec<KeyCode>,
    orbiting: bool,
    cursor: Option<Vec2>,
    /// Cursor travel while orbiting since the last frame.
    drag_delta: Vec2,
    /// Wheel travel in lines since the last frame.
    scroll_delta: f32,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions triggered this frame.
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.keys_pressed.iter().filter_map(|k| Action::from_key(*k))
    }

    pub fn is_orbiting(&self) -> bool {
        self.orbiting
    }

    pub fn drag_delta(&self) -> Vec2 {
        self.drag_delta
    }

    /// Positive values scroll up / zoom in.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Clear per-frame state. Call after the frame has consumed it.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.drag_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press_key(key),
                        ElementState::Released => self.release_key(key),
                    }
                }
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.set_orbiting(*state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => self.leave_cursor(),
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll(match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                });
            }
            WindowEvent::Focused(false) => {
                self.keys_held.clear();
                self.set_orbiting(false);
            }
            _ => {}
        }
    }

    fn press_key(&mut self, key: KeyCode) {
        // Held keys auto-repeat; only the first press counts
        if self.keys_held.insert(key) {
            self.keys_pressed.push(key);
        }
    }

    fn release_key(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    fn set_orbiting(&mut self, orbiting: bool) {
        self.orbiting = orbiting;
    }

    fn move_cursor(&mut self, position: Vec2) {
        if self.orbiting {
            if let Some(last) = self.cursor {
                self.drag_delta += position - last;
            }
        }
        self.cursor = Some(position);
    }

    /// The next position seen is a fresh start, not a continuation.
    fn leave_cursor(&mut self) {
        self.cursor = None;
    }

    fn scroll(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_is_edge_triggered() {
        let mut input = Input::new();
        input.press_key(KeyCode::Space);
        input.press_key(KeyCode::Space);
        assert_eq!(input.actions().collect::<Vec<_>>(), vec![Action::TogglePause]);

        input.end_frame();
        assert!(input.keys_held.contains(&KeyCode::Space));
        assert_eq!(input.actions().count(), 0);

        // Auto-repeat while held does not fire again
        input.press_key(KeyCode::Space);
        assert_eq!(input.actions().count(), 0);

        input.release_key(KeyCode::Space);
        input.press_key(KeyCode::Space);
        assert_eq!(input.actions().collect::<Vec<_>>(), vec![Action::TogglePause]);
    }

    #[test]
    fn test_actions_keep_order_and_skip_unbound_keys() {
        let mut input = Input::new();
        input.press_key(KeyCode::KeyR);
        input.press_key(KeyCode::KeyQ);
        input.press_key(KeyCode::KeyN);
        input.press_key(KeyCode::Escape);
        let actions: Vec<_> = input.actions().collect();
        assert_eq!(actions, vec![Action::Reset, Action::StepOnce, Action::Quit]);
    }

    #[test]
    fn test_drag_only_while_orbiting() {
        let mut input = Input::new();
        input.move_cursor(Vec2::new(10.0, 10.0));
        input.move_cursor(Vec2::new(20.0, 10.0));
        assert_eq!(input.drag_delta(), Vec2::ZERO);

        input.set_orbiting(true);
        input.move_cursor(Vec2::new(25.0, 12.0));
        input.move_cursor(Vec2::new(30.0, 8.0));
        assert_eq!(input.drag_delta(), Vec2::new(10.0, -2.0));

        input.end_frame();
        assert_eq!(input.drag_delta(), Vec2::ZERO);
        assert!(input.is_orbiting());
    }

    #[test]
    fn test_reentering_window_does_not_jump() {
        let mut input = Input::new();
        input.set_orbiting(true);
        input.move_cursor(Vec2::new(10.0, 10.0));
        input.move_cursor(Vec2::new(12.0, 10.0));
        input.leave_cursor();

        // Button still held, cursor comes back on the far side
        input.move_cursor(Vec2::new(900.0, 600.0));
        assert_eq!(input.drag_delta(), Vec2::new(2.0, 0.0));

        input.move_cursor(Vec2::new(905.0, 600.0));
        assert_eq!(input.drag_delta(), Vec2::new(7.0, 0.0));
    }

    #[test]
    fn test_scroll_accumulates_per_frame() {
        let mut input = Input::new();
        input.scroll(1.0);
        input.scroll(2.0);
        assert_eq!(input.scroll_delta(), 3.0);
        input.end_frame();
        assert_eq!(input.scroll_delta(), 0.0);
    }
}
