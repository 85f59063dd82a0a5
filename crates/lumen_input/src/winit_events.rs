//! Translation from winit events to [`InputEvent`]s

use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::event::{EventFlag, InputEvent, MouseButtons};

/// Pixels of touchpad scroll that count as one wheel line
const PIXELS_PER_LINE: f64 = 20.0;

/// The flag tracking a physical key, if it is one the engine knows
pub fn key_flag(code: KeyCode) -> Option<EventFlag> {
    let flag = match code {
        KeyCode::ArrowUp => EventFlag::KeyUp,
        KeyCode::ArrowDown => EventFlag::KeyDown,
        KeyCode::ArrowRight => EventFlag::KeyRight,
        KeyCode::ArrowLeft => EventFlag::KeyLeft,
        KeyCode::Space => EventFlag::KeySpace,
        KeyCode::KeyA => EventFlag::KeyA,
        KeyCode::KeyB => EventFlag::KeyB,
        KeyCode::KeyC => EventFlag::KeyC,
        KeyCode::KeyD => EventFlag::KeyD,
        KeyCode::KeyE => EventFlag::KeyE,
        KeyCode::KeyF => EventFlag::KeyF,
        KeyCode::KeyG => EventFlag::KeyG,
        KeyCode::KeyH => EventFlag::KeyH,
        KeyCode::KeyI => EventFlag::KeyI,
        KeyCode::KeyJ => EventFlag::KeyJ,
        KeyCode::KeyK => EventFlag::KeyK,
        KeyCode::KeyL => EventFlag::KeyL,
        KeyCode::KeyM => EventFlag::KeyM,
        KeyCode::KeyN => EventFlag::KeyN,
        KeyCode::KeyO => EventFlag::KeyO,
        KeyCode::KeyP => EventFlag::KeyP,
        KeyCode::KeyQ => EventFlag::KeyQ,
        KeyCode::KeyR => EventFlag::KeyR,
        KeyCode::KeyS => EventFlag::KeyS,
        KeyCode::KeyT => EventFlag::KeyT,
        KeyCode::KeyU => EventFlag::KeyU,
        KeyCode::KeyV => EventFlag::KeyV,
        KeyCode::KeyW => EventFlag::KeyW,
        KeyCode::KeyX => EventFlag::KeyX,
        KeyCode::KeyY => EventFlag::KeyY,
        KeyCode::KeyZ => EventFlag::KeyZ,
        KeyCode::ShiftLeft => EventFlag::KeyLShift,
        KeyCode::ShiftRight => EventFlag::KeyRShift,
        KeyCode::ControlLeft => EventFlag::KeyLCtrl,
        KeyCode::ControlRight => EventFlag::KeyRCtrl,
        KeyCode::AltLeft => EventFlag::KeyLAlt,
        KeyCode::AltRight => EventFlag::KeyRAlt,
        KeyCode::Escape => EventFlag::KeyEscape,
        KeyCode::Comma => EventFlag::KeyComma,
        KeyCode::Period => EventFlag::KeyPeriod,
        KeyCode::Slash => EventFlag::KeyForwardSlash,
        KeyCode::Backslash => EventFlag::KeyBackslash,
        KeyCode::BracketLeft => EventFlag::KeyOpenBracket,
        KeyCode::BracketRight => EventFlag::KeyCloseBracket,
        KeyCode::Semicolon => EventFlag::KeySemicolon,
        KeyCode::Quote => EventFlag::KeyQuote,
        KeyCode::Enter | KeyCode::NumpadEnter => EventFlag::KeyEnter,
        KeyCode::Backspace => EventFlag::KeyBackspace,
        KeyCode::Tab => EventFlag::KeyTab,
        KeyCode::Backquote => EventFlag::KeyBacktick,
        KeyCode::Minus => EventFlag::KeyDash,
        KeyCode::Equal => EventFlag::KeyEquals,
        KeyCode::Digit1 => EventFlag::Key1,
        KeyCode::Digit2 => EventFlag::Key2,
        KeyCode::Digit3 => EventFlag::Key3,
        KeyCode::Digit4 => EventFlag::Key4,
        KeyCode::Digit5 => EventFlag::Key5,
        KeyCode::Digit6 => EventFlag::Key6,
        KeyCode::Digit7 => EventFlag::Key7,
        KeyCode::Digit8 => EventFlag::Key8,
        KeyCode::Digit9 => EventFlag::Key9,
        KeyCode::Digit0 => EventFlag::Key0,
        _ => return None,
    };
    Some(flag)
}

pub fn mouse_button(button: MouseButton) -> Option<MouseButtons> {
    match button {
        MouseButton::Left => Some(MouseButtons::LEFT),
        MouseButton::Right => Some(MouseButtons::RIGHT),
        MouseButton::Middle => Some(MouseButtons::MIDDLE),
        MouseButton::Back => Some(MouseButtons::BACK),
        MouseButton::Forward => Some(MouseButtons::FORWARD),
        MouseButton::Other(_) => None,
    }
}

/// Translate a key event; auto-repeats and unmapped keys give `None`
pub fn key_event(event: &KeyEvent) -> Option<InputEvent> {
    if event.repeat {
        return None;
    }
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    Some(InputEvent::Key {
        flag: key_flag(code)?,
        pressed: event.state == ElementState::Pressed,
    })
}

pub fn from_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CloseRequested => Some(InputEvent::CloseRequested),
        WindowEvent::Destroyed => Some(InputEvent::Quit),
        WindowEvent::Occluded(occluded) => Some(InputEvent::Minimized(*occluded)),
        WindowEvent::Resized(size) => Some(InputEvent::Resized {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::KeyboardInput { event, .. } => key_event(event),
        WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::MouseButton {
            button: mouse_button(*button)?,
            pressed: *state == ElementState::Pressed,
        }),
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::CursorMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::MouseWheel { delta, .. } => {
            let (x, y) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                MouseScrollDelta::PixelDelta(p) => ((p.x / PIXELS_PER_LINE) as f32, (p.y / PIXELS_PER_LINE) as f32),
            };
            Some(InputEvent::MouseWheel { x, y })
        }
        _ => None,
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
