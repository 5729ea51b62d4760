use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use glam::Vec2;
use log::debug;
use winit::keyboard::KeyCode;

use crate::engine::input::event::{InputEvent, MouseButton};

/// Per-frame state of a key or mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Idle,
    /// Pressed this frame.
    Down,
    /// Held since an earlier frame.
    Repeat,
    /// Released this frame.
    Up,
}

impl KeyState {
    /// Next state given whether the key is held at the start of the frame.
    pub fn advance(self, held: bool) -> Self {
        match (self, held) {
            (KeyState::Idle | KeyState::Up, true) => KeyState::Down,
            (KeyState::Down | KeyState::Repeat, true) => KeyState::Repeat,
            (KeyState::Down | KeyState::Repeat, false) => KeyState::Up,
            (KeyState::Idle | KeyState::Up, false) => KeyState::Idle,
        }
    }

    pub fn is_pressed(self) -> bool {
        matches!(self, KeyState::Down | KeyState::Repeat)
    }
}

#[derive(Debug, Default)]
pub struct InputState {
    keys: HashMap<KeyCode, KeyState>,
    held_keys: HashSet<KeyCode>,
    buttons: [KeyState; 5],
    held_buttons: [bool; 5],
    mouse_position: Vec2,
    /// Cursor position before this frame's events were applied.
    frame_start_position: Vec2,
    mouse_motion: Vec2,
    wheel: f32,
    pending: Vec<InputEvent>,
    frame_events: Vec<InputEvent>,
    dropped_files: Vec<PathBuf>,
    resized: Option<(u32, u32)>,
    scale_factor: Option<f32>,
    quit_requested: bool,
    /// Set by the editor when the UI consumed the pointer last frame.
    pub ui_wants_pointer: bool,
    /// Set by the editor when a text field has keyboard focus.
    pub ui_wants_keyboard: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event for the next frame.
    pub fn push_event(&mut self, event: InputEvent) {
        self.pending.push(event);
    }

    /// Folds the queued events into this frame's state and advances every
    /// key and button one step.
    pub fn advance(&mut self) {
        self.frame_start_position = self.mouse_position;
        self.mouse_motion = Vec2::ZERO;
        self.wheel = 0.0;
        self.resized = None;
        self.scale_factor = None;
        self.frame_events = std::mem::take(&mut self.pending);

        for event in &self.frame_events {
            match event {
                InputEvent::Key { code, pressed, .. } => {
                    if *pressed {
                        self.held_keys.insert(*code);
                    } else {
                        self.held_keys.remove(code);
                    }
                }
                InputEvent::MouseButton { button, pressed } => {
                    self.held_buttons[button.index()] = *pressed;
                }
                InputEvent::CursorMoved { x, y } => {
                    self.mouse_position = Vec2::new(*x, *y);
                }
                InputEvent::MouseMotion { dx, dy } => {
                    self.mouse_motion += Vec2::new(*dx, *dy);
                }
                InputEvent::MouseWheel { delta } => self.wheel += delta,
                InputEvent::Resized { width, height } => self.resized = Some((*width, *height)),
                InputEvent::ScaleFactor(factor) => self.scale_factor = Some(*factor),
                InputEvent::FileDropped(path) => {
                    debug!("File dropped: {}", path.display());
                    self.dropped_files.push(path.clone());
                }
                InputEvent::Focused(false) => {
                    // Releases are lost while unfocused.
                    self.held_keys.clear();
                    self.held_buttons = [false; 5];
                }
                InputEvent::Quit => self.quit_requested = true,
                InputEvent::Focused(true) | InputEvent::Text(_) => {}
            }
        }

        let held = &self.held_keys;
        for code in held {
            self.keys.entry(*code).or_default();
        }
        self.keys.retain(|code, state| {
            *state = state.advance(held.contains(code));
            *state != KeyState::Idle
        });

        for (state, held) in self.buttons.iter_mut().zip(self.held_buttons) {
            *state = state.advance(held);
        }
    }

    pub fn key(&self, code: KeyCode) -> KeyState {
        self.keys.get(&code).copied().unwrap_or_default()
    }

    pub fn key_down(&self, code: KeyCode) -> bool {
        self.key(code) == KeyState::Down
    }

    pub fn key_up(&self, code: KeyCode) -> bool {
        self.key(code) == KeyState::Up
    }

    pub fn key_pressed(&self, code: KeyCode) -> bool {
        self.key(code).is_pressed()
    }

    pub fn shift(&self) -> bool {
        self.key_pressed(KeyCode::ShiftLeft) || self.key_pressed(KeyCode::ShiftRight)
    }

    pub fn ctrl(&self) -> bool {
        self.key_pressed(KeyCode::ControlLeft) || self.key_pressed(KeyCode::ControlRight)
    }

    pub fn alt(&self) -> bool {
        self.key_pressed(KeyCode::AltLeft) || self.key_pressed(KeyCode::AltRight)
    }

    pub fn mouse_button(&self, button: MouseButton) -> KeyState {
        self.buttons[button.index()]
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Where the cursor was before this frame's events, for replaying them
    /// in order.
    pub fn frame_start_position(&self) -> Vec2 {
        self.frame_start_position
    }

    pub fn mouse_motion(&self) -> Vec2 {
        self.mouse_motion
    }

    pub fn wheel(&self) -> f32 {
        self.wheel
    }

    /// Events folded in by the last `advance`, in arrival order.
    pub fn frame_events(&self) -> &[InputEvent] {
        &self.frame_events
    }

    pub fn resized(&self) -> Option<(u32, u32)> {
        self.resized
    }

    pub fn scale_factor_changed(&self) -> Option<f32> {
        self.scale_factor
    }

    pub fn take_dropped_files(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.dropped_files)
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, pressed: bool) -> InputEvent {
        InputEvent::Key {
            code,
            pressed,
            repeat: false,
        }
    }

    #[test]
    fn key_walks_idle_down_repeat_up_idle() {
        let mut input = InputState::new();
        assert_eq!(input.key(KeyCode::KeyW), KeyState::Idle);

        input.push_event(key(KeyCode::KeyW, true));
        input.advance();
        assert_eq!(input.key(KeyCode::KeyW), KeyState::Down);
        assert!(input.key_down(KeyCode::KeyW));

        input.advance();
        assert_eq!(input.key(KeyCode::KeyW), KeyState::Repeat);
        assert!(input.key_pressed(KeyCode::KeyW));

        input.push_event(key(KeyCode::KeyW, false));
        input.advance();
        assert_eq!(input.key(KeyCode::KeyW), KeyState::Up);

        input.advance();
        assert_eq!(input.key(KeyCode::KeyW), KeyState::Idle);
    }

    #[test]
    fn mouse_motion_and_wheel_reset_each_frame() {
        let mut input = InputState::new();
        input.push_event(InputEvent::MouseMotion { dx: 2.0, dy: 1.0 });
        input.push_event(InputEvent::MouseMotion { dx: 3.0, dy: -1.0 });
        input.push_event(InputEvent::MouseWheel { delta: 1.0 });
        input.push_event(InputEvent::CursorMoved { x: 10.0, y: 20.0 });
        input.advance();
        assert_eq!(input.mouse_motion(), Vec2::new(5.0, 0.0));
        assert_eq!(input.wheel(), 1.0);
        assert_eq!(input.mouse_position(), Vec2::new(10.0, 20.0));

        input.advance();
        assert_eq!(input.mouse_motion(), Vec2::ZERO);
        assert_eq!(input.wheel(), 0.0);
        assert_eq!(input.mouse_position(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn mouse_buttons_follow_the_same_state_machine() {
        let mut input = InputState::new();
        input.push_event(InputEvent::MouseButton {
            button: MouseButton::Right,
            pressed: true,
        });
        input.advance();
        assert_eq!(input.mouse_button(MouseButton::Right), KeyState::Down);
        input.advance();
        assert_eq!(input.mouse_button(MouseButton::Right), KeyState::Repeat);
        assert_eq!(input.mouse_button(MouseButton::Left), KeyState::Idle);
    }

    #[test]
    fn losing_focus_releases_everything() {
        let mut input = InputState::new();
        input.push_event(key(KeyCode::KeyA, true));
        input.advance();
        input.push_event(InputEvent::Focused(false));
        input.advance();
        assert_eq!(input.key(KeyCode::KeyA), KeyState::Up);
    }

    #[test]
    fn quit_and_dropped_files_are_reported() {
        let mut input = InputState::new();
        input.push_event(InputEvent::FileDropped(PathBuf::from("model.gltf")));
        input.push_event(InputEvent::Quit);
        input.advance();
        assert!(input.quit_requested());
        assert_eq!(input.take_dropped_files(), vec![PathBuf::from("model.gltf")]);
        assert!(input.take_dropped_files().is_empty());
        assert_eq!(input.frame_events().len(), 2);
    }
}
