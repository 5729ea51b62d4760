//! Translation between the engine's input and egui: frame events in, cursor
//! icons out.

use egui::{pos2, vec2, Event, Key, Modifiers, MouseWheelUnit, PointerButton, RawInput, Rect, ViewportId};
use winit::keyboard::KeyCode;

use crate::editor::clipboard::Clipboard;
use crate::engine::context::WindowState;
use crate::engine::input::{InputEvent, InputState, MouseButton};

pub fn pixels_per_point(window: &WindowState) -> f32 {
    if window.scale_factor > 0.0 {
        window.scale_factor
    } else {
        1.0
    }
}

/// Window size in physical pixels, falling back to the configured size
/// before the OS window reports one.
pub fn screen_size(window: &WindowState) -> (u32, u32) {
    if window.width > 0 && window.height > 0 {
        (window.width, window.height)
    } else {
        (window.settings.width, window.settings.height)
    }
}

fn modifiers(input: &InputState) -> Modifiers {
    Modifiers {
        alt: input.alt(),
        ctrl: input.ctrl(),
        shift: input.shift(),
        mac_cmd: false,
        command: input.ctrl(),
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Back => PointerButton::Extra1,
        MouseButton::Forward => PointerButton::Extra2,
    }
}

pub fn egui_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::Escape => Key::Escape,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Space => Key::Space,
        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Minus | KeyCode::NumpadSubtract => Key::Minus,
        KeyCode::Equal | KeyCode::NumpadAdd => Key::Plus,
        KeyCode::Digit0 | KeyCode::Numpad0 => Key::Num0,
        KeyCode::Digit1 | KeyCode::Numpad1 => Key::Num1,
        KeyCode::Digit2 | KeyCode::Numpad2 => Key::Num2,
        KeyCode::Digit3 | KeyCode::Numpad3 => Key::Num3,
        KeyCode::Digit4 | KeyCode::Numpad4 => Key::Num4,
        KeyCode::Digit5 | KeyCode::Numpad5 => Key::Num5,
        KeyCode::Digit6 | KeyCode::Numpad6 => Key::Num6,
        KeyCode::Digit7 | KeyCode::Numpad7 => Key::Num7,
        KeyCode::Digit8 | KeyCode::Numpad8 => Key::Num8,
        KeyCode::Digit9 | KeyCode::Numpad9 => Key::Num9,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,
        _ => return None,
    };
    Some(key)
}

/// The OS cursor for an egui cursor icon. `None` hides the cursor.
pub fn winit_cursor(icon: egui::CursorIcon) -> Option<winit::window::CursorIcon> {
    use egui::CursorIcon as E;
    use winit::window::CursorIcon as W;

    let cursor = match icon {
        E::None => return None,
        E::Default => W::Default,
        E::ContextMenu => W::ContextMenu,
        E::Help => W::Help,
        E::PointingHand => W::Pointer,
        E::Progress => W::Progress,
        E::Wait => W::Wait,
        E::Cell => W::Cell,
        E::Crosshair => W::Crosshair,
        E::Text => W::Text,
        E::VerticalText => W::VerticalText,
        E::Alias => W::Alias,
        E::Copy => W::Copy,
        E::Move => W::Move,
        E::NoDrop => W::NoDrop,
        E::NotAllowed => W::NotAllowed,
        E::Grab => W::Grab,
        E::Grabbing => W::Grabbing,
        E::AllScroll => W::AllScroll,
        E::ResizeHorizontal => W::EwResize,
        E::ResizeNeSw => W::NeswResize,
        E::ResizeNwSe => W::NwseResize,
        E::ResizeVertical => W::NsResize,
        E::ResizeEast => W::EResize,
        E::ResizeSouthEast => W::SeResize,
        E::ResizeSouth => W::SResize,
        E::ResizeSouthWest => W::SwResize,
        E::ResizeWest => W::WResize,
        E::ResizeNorthWest => W::NwResize,
        E::ResizeNorth => W::NResize,
        E::ResizeNorthEast => W::NeResize,
        E::ResizeColumn => W::ColResize,
        E::ResizeRow => W::RowResize,
        E::ZoomIn => W::ZoomIn,
        E::ZoomOut => W::ZoomOut,
    };
    Some(cursor)
}

/// Builds the egui input for one frame. `time` is seconds since the editor
/// started. Ctrl+V pastes from `clipboard`.
pub fn build(
    input: &InputState,
    window: &WindowState,
    clipboard: &mut Clipboard,
    time: f64,
    dt: f32,
) -> RawInput {
    let scale = pixels_per_point(window);
    let (width, height) = screen_size(window);
    let modifiers = modifiers(input);
    let mut pointer = input.frame_start_position() / scale;

    let mut raw = RawInput {
        screen_rect: Some(Rect::from_min_size(
            pos2(0.0, 0.0),
            vec2(width as f32 / scale, height as f32 / scale),
        )),
        time: Some(time),
        predicted_dt: dt.max(1.0 / 240.0),
        modifiers,
        focused: true,
        ..Default::default()
    };
    raw.viewports
        .entry(ViewportId::ROOT)
        .or_default()
        .native_pixels_per_point = Some(scale);

    for event in input.frame_events() {
        match event {
            InputEvent::CursorMoved { x, y } => {
                pointer = glam::Vec2::new(*x, *y) / scale;
                raw.events.push(Event::PointerMoved(pos2(pointer.x, pointer.y)));
            }
            InputEvent::MouseButton { button, pressed } => raw.events.push(Event::PointerButton {
                pos: pos2(pointer.x, pointer.y),
                button: pointer_button(*button),
                pressed: *pressed,
                modifiers,
            }),
            InputEvent::MouseWheel { delta } => raw.events.push(Event::MouseWheel {
                unit: MouseWheelUnit::Line,
                delta: vec2(0.0, *delta),
                modifiers,
            }),
            InputEvent::Key { code, pressed, repeat } => {
                if let Some(key) = egui_key(*code) {
                    raw.events.push(Event::Key {
                        key,
                        physical_key: Some(key),
                        pressed: *pressed,
                        repeat: *repeat,
                        modifiers,
                    });
                }
                if *pressed && modifiers.command {
                    match code {
                        KeyCode::KeyC => raw.events.push(Event::Copy),
                        KeyCode::KeyX => raw.events.push(Event::Cut),
                        KeyCode::KeyV => {
                            if let Some(text) = clipboard.get_text() {
                                raw.events.push(Event::Paste(text));
                            }
                        }
                        _ => {}
                    }
                }
            }
            InputEvent::Text(text) => {
                if !modifiers.command && text.chars().all(|c| !c.is_control()) {
                    raw.events.push(Event::Text(text.clone()));
                }
            }
            InputEvent::Focused(focused) => {
                raw.focused = *focused;
                raw.events.push(Event::WindowFocused(*focused));
            }
            InputEvent::MouseMotion { .. }
            | InputEvent::Resized { .. }
            | InputEvent::ScaleFactor(_)
            | InputEvent::FileDropped(_)
            | InputEvent::Quit => {}
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_falls_back_to_settings_and_scales() {
        let mut window = WindowState::default();
        assert_eq!(screen_size(&window), (1280, 1024));

        window.width = 800;
        window.height = 600;
        window.scale_factor = 2.0;
        let raw = build(&InputState::new(), &window, &mut Clipboard::detached(), 0.0, 0.016);
        let rect = raw.screen_rect.unwrap();
        assert_eq!(rect.size(), vec2(400.0, 300.0));
        assert_eq!(
            raw.viewports[&ViewportId::ROOT].native_pixels_per_point,
            Some(2.0)
        );
    }

    #[test]
    fn pointer_events_are_converted_to_points() {
        let mut window = WindowState::default();
        window.scale_factor = 2.0;
        let mut input = InputState::new();
        input.push_event(InputEvent::CursorMoved { x: 100.0, y: 50.0 });
        input.push_event(InputEvent::MouseButton {
            button: MouseButton::Left,
            pressed: true,
        });
        input.push_event(InputEvent::Text("a".to_string()));
        input.advance();

        let raw = build(&input, &window, &mut Clipboard::detached(), 1.0, 0.016);
        assert_eq!(raw.events[0], Event::PointerMoved(pos2(50.0, 25.0)));
        assert!(matches!(
            raw.events[1],
            Event::PointerButton {
                button: PointerButton::Primary,
                pressed: true,
                ..
            }
        ));
        assert_eq!(raw.events[2], Event::Text("a".to_string()));
    }

    #[test]
    fn buttons_use_the_cursor_position_at_the_time_they_happened() {
        let window = WindowState::default();
        let mut input = InputState::new();
        input.push_event(InputEvent::CursorMoved { x: 10.0, y: 20.0 });
        input.advance();

        input.push_event(InputEvent::MouseButton {
            button: MouseButton::Left,
            pressed: true,
        });
        input.push_event(InputEvent::CursorMoved { x: 300.0, y: 200.0 });
        input.push_event(InputEvent::MouseButton {
            button: MouseButton::Left,
            pressed: false,
        });
        input.advance();

        let raw = build(&input, &window, &mut Clipboard::detached(), 1.0, 0.016);
        let positions: Vec<_> = raw
            .events
            .iter()
            .filter_map(|event| match event {
                Event::PointerButton { pos, .. } => Some(*pos),
                _ => None,
            })
            .collect();
        assert_eq!(positions, vec![pos2(10.0, 20.0), pos2(300.0, 200.0)]);
    }

    #[test]
    fn wheel_scrolls_in_lines_and_ctrl_v_pastes() {
        let window = WindowState::default();
        let mut clipboard = Clipboard::detached();
        clipboard.set_text("Cube");
        let mut input = InputState::new();
        input.push_event(InputEvent::MouseWheel { delta: -2.0 });
        input.push_event(InputEvent::Key {
            code: KeyCode::ControlLeft,
            pressed: true,
            repeat: false,
        });
        input.push_event(InputEvent::Key {
            code: KeyCode::KeyV,
            pressed: true,
            repeat: false,
        });
        input.advance();

        let raw = build(&input, &window, &mut clipboard, 1.0, 0.016);
        assert!(raw.events.iter().any(|event| matches!(
            event,
            Event::MouseWheel { unit: MouseWheelUnit::Line, delta, .. } if *delta == vec2(0.0, -2.0)
        )));
        assert!(raw.events.contains(&Event::Paste("Cube".to_string())));
    }

    #[test]
    fn cursor_icons_map_to_os_cursors() {
        assert_eq!(winit_cursor(egui::CursorIcon::None), None);
        assert_eq!(
            winit_cursor(egui::CursorIcon::PointingHand),
            Some(winit::window::CursorIcon::Pointer)
        );
        assert_eq!(
            winit_cursor(egui::CursorIcon::ResizeHorizontal),
            Some(winit::window::CursorIcon::EwResize)
        );
    }

    #[test]
    fn unmapped_keys_are_dropped() {
        assert_eq!(egui_key(KeyCode::KeyQ), Some(Key::Q));
        assert_eq!(egui_key(KeyCode::F24), None);
    }
}
