//! Platform-independent input events and their translation from winit.

use std::path::PathBuf;

use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Back,
    Forward,
}

impl MouseButton {
    pub const ALL: [MouseButton; 5] = [
        MouseButton::Left,
        MouseButton::Middle,
        MouseButton::Right,
        MouseButton::Back,
        MouseButton::Forward,
    ];

    pub fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::Back => 3,
            MouseButton::Forward => 4,
        }
    }

    fn from_winit(button: winit::event::MouseButton) -> Option<Self> {
        match button {
            winit::event::MouseButton::Left => Some(MouseButton::Left),
            winit::event::MouseButton::Middle => Some(MouseButton::Middle),
            winit::event::MouseButton::Right => Some(MouseButton::Right),
            winit::event::MouseButton::Back => Some(MouseButton::Back),
            winit::event::MouseButton::Forward => Some(MouseButton::Forward),
            winit::event::MouseButton::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key { code: KeyCode, pressed: bool, repeat: bool },
    Text(String),
    /// Cursor position in physical pixels.
    CursorMoved { x: f32, y: f32 },
    /// Raw relative mouse motion.
    MouseMotion { dx: f32, dy: f32 },
    MouseButton { button: MouseButton, pressed: bool },
    /// Wheel delta in lines, positive away from the user.
    MouseWheel { delta: f32 },
    Resized { width: u32, height: u32 },
    ScaleFactor(f32),
    FileDropped(PathBuf),
    Focused(bool),
    Quit,
}

/// Pixels per wheel "line" when the platform reports pixel deltas.
const PIXELS_PER_LINE: f32 = 40.0;

impl InputEvent {
    /// Translates the window events the engine cares about. Returns every
    /// event produced, since a key press can also carry text.
    pub fn from_window_event(event: &WindowEvent) -> Vec<InputEvent> {
        match event {
            WindowEvent::CloseRequested => vec![InputEvent::Quit],
            WindowEvent::Resized(size) => vec![InputEvent::Resized {
                width: size.width,
                height: size.height,
            }],
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                vec![InputEvent::ScaleFactor(*scale_factor as f32)]
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let mut events = Vec::new();
                let pressed = event.state == ElementState::Pressed;
                if let PhysicalKey::Code(code) = event.physical_key {
                    events.push(InputEvent::Key {
                        code,
                        pressed,
                        repeat: event.repeat,
                    });
                }
                if pressed {
                    if let Some(text) = &event.text {
                        if text.chars().all(|c| !c.is_control()) {
                            events.push(InputEvent::Text(text.to_string()));
                        }
                    }
                }
                events
            }
            WindowEvent::CursorMoved { position, .. } => vec![InputEvent::CursorMoved {
                x: position.x as f32,
                y: position.y as f32,
            }],
            WindowEvent::MouseInput { state, button, .. } => MouseButton::from_winit(*button)
                .map(|button| InputEvent::MouseButton {
                    button,
                    pressed: *state == ElementState::Pressed,
                })
                .into_iter()
                .collect(),
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                vec![InputEvent::MouseWheel { delta }]
            }
            WindowEvent::DroppedFile(path) => vec![InputEvent::FileDropped(path.clone())],
            WindowEvent::Focused(focused) => vec![InputEvent::Focused(*focused)],
            _ => Vec::new(),
        }
    }

    pub fn from_device_event(event: &DeviceEvent) -> Option<InputEvent> {
        match event {
            DeviceEvent::MouseMotion { delta } => Some(InputEvent::MouseMotion {
                dx: delta.0 as f32,
                dy: delta.1 as f32,
            }),
            _ => None,
        }
    }
}
