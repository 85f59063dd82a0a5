//! Per-frame input snapshot
//!
//! Backends translate their native events into [`InputEvent`]s and feed them
//! to an [`EventSnapshot`]. Game code then asks the snapshot about keys and
//! the mouse with [`EventSnapshot::check_flag`] and [`EventSnapshot::get_flag`].
//!
//! Flag lifetimes:
//! - keys stay `Pressed` while held; a release reads `Released` for the
//!   frame it happened in, then `None`
//! - mouse and resize flags only describe the current frame
//! - quit and close requests stick until [`EventSnapshot::reset`]

use bitflags::bitflags;

use lumen_math::Vec2;

macro_rules! event_flags {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        /// Everything the snapshot tracks a state for
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum EventFlag {
            $($(#[$meta])* $name,)*
        }

        impl EventFlag {
            /// Every flag, in declaration order
            pub const ALL: &'static [EventFlag] = &[$(EventFlag::$name,)*];
            pub const COUNT: usize = Self::ALL.len();

            #[inline]
            fn index(self) -> usize {
                self as usize
            }
        }
    };
}

event_flags! {
    WindowMinimize,
    WindowClose,
    /// The window changed size this frame
    WindowResize,
    Quit,
    KeyUp,
    KeyDown,
    KeyRight,
    KeyLeft,
    KeySpace,
    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM,
    KeyN, KeyO, KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
    KeyLShift,
    KeyRShift,
    KeyLCtrl,
    KeyLAlt,
    KeyEscape,
    KeyComma,
    KeyPeriod,
    KeyForwardSlash,
    KeyBackslash,
    KeyOpenBracket,
    KeyCloseBracket,
    KeySemicolon,
    KeyQuote,
    KeyEnter,
    KeyBackspace,
    KeyTab,
    KeyBacktick,
    KeyDash,
    KeyEquals,
    Key1, Key2, Key3, Key4, Key5, Key6, Key7, Key8, Key9, Key0,
    KeyRCtrl,
    KeyRAlt,
    MouseButtonUp,
    MouseButtonDown,
    MouseMotion,
    MouseWheel,
}

impl EventFlag {
    /// Flags that describe a single frame and are cleared before the next poll
    pub fn is_per_frame(self) -> bool {
        matches!(
            self,
            EventFlag::MouseButtonUp | EventFlag::MouseButtonDown | EventFlag::MouseMotion | EventFlag::MouseWheel
                | EventFlag::WindowResize
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EventState {
    #[default]
    None,
    Pressed,
    Released,
}

bitflags! {
    /// Mouse buttons, as a set
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MouseButtons: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const MIDDLE = 1 << 2;
        const BACK = 1 << 3;
        const FORWARD = 1 << 4;
    }
}

/// Mouse state as of the last poll
///
/// Positions are window pixels from the top-left. `rel_x`/`rel_y` and
/// `wheel` are totals for the current frame only.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Mouse {
    pub x: f32,
    pub y: f32,
    pub rel_x: f32,
    pub rel_y: f32,
    pub wheel: Vec2,
    /// Button of the most recent press or release
    pub button: MouseButtons,
    /// Buttons currently held
    pub held: MouseButtons,
    /// Whether `button` was pressed or released
    pub state: EventState,
}

/// A backend event in engine terms
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Quit,
    CloseRequested,
    Minimized(bool),
    Resized { width: u32, height: u32 },
    Key { flag: EventFlag, pressed: bool },
    MouseButton { button: MouseButtons, pressed: bool },
    /// Absolute cursor position in window pixels
    CursorMoved { x: f32, y: f32 },
    /// Raw relative motion, reported even while the cursor is locked
    MouseMotion { dx: f32, dy: f32 },
    /// Scroll in lines; +y is away from the user
    MouseWheel { x: f32, y: f32 },
}

/// Normalized input state for one frame
#[derive(Clone, Debug)]
pub struct EventSnapshot {
    flags: [EventState; EventFlag::COUNT],
    pub mouse: Mouse,
    size: Option<(u32, u32)>,
}

impl Default for EventSnapshot {
    fn default() -> Self {
        Self {
            flags: [EventState::None; EventFlag::COUNT],
            mouse: Mouse::default(),
            size: None,
        }
    }
}

impl EventSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything that only describes the previous frame
    pub fn begin_frame(&mut self) {
        for flag in EventFlag::ALL {
            let state = &mut self.flags[flag.index()];
            if flag.is_per_frame() || *state == EventState::Released {
                *state = EventState::None;
            }
        }
        self.mouse.rel_x = 0.0;
        self.mouse.rel_y = 0.0;
        self.mouse.wheel = Vec2::ZERO;
        self.size = None;
    }

    /// Fold one backend event into the snapshot
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Quit => self.set_flag(EventFlag::Quit, EventState::Pressed),
            InputEvent::CloseRequested => self.set_flag(EventFlag::WindowClose, EventState::Pressed),
            InputEvent::Minimized(minimized) => {
                let state = if minimized { EventState::Pressed } else { EventState::Released };
                self.set_flag(EventFlag::WindowMinimize, state);
            }
            InputEvent::Resized { width, height } => {
                self.set_flag(EventFlag::WindowResize, EventState::Pressed);
                self.size = Some((width, height));
            }
            InputEvent::Key { flag, pressed } => {
                let state = if pressed { EventState::Pressed } else { EventState::Released };
                self.set_flag(flag, state);
            }
            InputEvent::MouseButton { button, pressed } => {
                if pressed {
                    self.set_flag(EventFlag::MouseButtonDown, EventState::Pressed);
                    self.mouse.held.insert(button);
                    self.mouse.state = EventState::Pressed;
                } else {
                    self.set_flag(EventFlag::MouseButtonUp, EventState::Released);
                    self.mouse.held.remove(button);
                    self.mouse.state = EventState::Released;
                }
                self.mouse.button = button;
            }
            InputEvent::CursorMoved { x, y } => {
                self.set_flag(EventFlag::MouseMotion, EventState::Pressed);
                self.mouse.x = x;
                self.mouse.y = y;
            }
            InputEvent::MouseMotion { dx, dy } => {
                self.set_flag(EventFlag::MouseMotion, EventState::Pressed);
                self.mouse.rel_x += dx;
                self.mouse.rel_y += dy;
            }
            InputEvent::MouseWheel { x, y } => {
                self.set_flag(EventFlag::MouseWheel, EventState::Pressed);
                self.mouse.wheel += Vec2::new(x, y);
            }
        }
    }

    /// True for any state other than `None`
    #[inline]
    pub fn check_flag(&self, flag: EventFlag) -> bool {
        self.flags[flag.index()] != EventState::None
    }

    #[inline]
    pub fn get_flag(&self, flag: EventFlag) -> EventState {
        self.flags[flag.index()]
    }

    /// True only while held
    #[inline]
    pub fn is_pressed(&self, flag: EventFlag) -> bool {
        self.flags[flag.index()] == EventState::Pressed
    }

    pub fn set_flag(&mut self, flag: EventFlag, state: EventState) {
        self.flags[flag.index()] = state;
    }

    pub fn remove_flag(&mut self, flag: EventFlag) {
        self.flags[flag.index()] = EventState::None;
    }

    /// Clear every flag, including quit requests
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The user asked to quit or closed the window
    pub fn quit_requested(&self) -> bool {
        self.check_flag(EventFlag::Quit) || self.check_flag(EventFlag::WindowClose)
    }

    /// New window size, if it changed this frame
    pub fn resized(&self) -> Option<(u32, u32)> {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    #[test]
    fn test_flags_start_clear() {
        let events = EventSnapshot::new();
        assert!(EventFlag::ALL.iter().all(|f| !events.check_flag(*f)));
        assert_eq!(events.get_flag(EventFlag::KeyA), EventState::None);
    }

    #[test]
    fn test_flag_indices_are_dense() {
        for (i, flag) in EventFlag::ALL.iter().enumerate() {
            assert_eq!(flag.index(), i, "Expected {:?} at {}", flag, i);
        }
        assert_eq!(EventFlag::COUNT, EventFlag::ALL.len());
    }

    #[test]
    fn test_key_press_persists_until_release() {
        let mut events = EventSnapshot::new();
        events.apply(InputEvent::Key { flag: EventFlag::KeyW, pressed: true });
        events.begin_frame();
        assert_eq!(events.get_flag(EventFlag::KeyW), EventState::Pressed);

        events.apply(InputEvent::Key { flag: EventFlag::KeyW, pressed: false });
        assert_eq!(events.get_flag(EventFlag::KeyW), EventState::Released);
        assert!(events.check_flag(EventFlag::KeyW));
        assert!(!events.is_pressed(EventFlag::KeyW));

        events.begin_frame();
        assert!(!events.check_flag(EventFlag::KeyW));
    }

    #[test]
    fn test_mouse_flags_reset_each_frame() {
        let mut events = EventSnapshot::new();
        events.apply(InputEvent::MouseMotion { dx: 3.0, dy: -2.0 });
        events.apply(InputEvent::MouseMotion { dx: 1.0, dy: 0.5 });
        events.apply(InputEvent::MouseWheel { x: 0.0, y: 1.0 });
        assert!(events.check_flag(EventFlag::MouseMotion));
        assert!((events.mouse.rel_x - 4.0).abs() < EPSILON, "Expected 4, got {}", events.mouse.rel_x);
        assert!((events.mouse.rel_y + 1.5).abs() < EPSILON);

        events.begin_frame();
        assert!(!events.check_flag(EventFlag::MouseMotion));
        assert!(!events.check_flag(EventFlag::MouseWheel));
        assert_eq!(events.mouse.rel_x, 0.0);
        assert_eq!(events.mouse.wheel, Vec2::ZERO);
    }

    #[test]
    fn test_cursor_position_survives_frames() {
        let mut events = EventSnapshot::new();
        events.apply(InputEvent::CursorMoved { x: 120.0, y: 40.0 });
        events.begin_frame();
        assert_eq!((events.mouse.x, events.mouse.y), (120.0, 40.0));
    }

    #[test]
    fn test_mouse_buttons() {
        let mut events = EventSnapshot::new();
        events.apply(InputEvent::MouseButton { button: MouseButtons::LEFT, pressed: true });
        events.apply(InputEvent::MouseButton { button: MouseButtons::RIGHT, pressed: true });
        assert_eq!(events.get_flag(EventFlag::MouseButtonDown), EventState::Pressed);
        assert_eq!(events.mouse.held, MouseButtons::LEFT | MouseButtons::RIGHT);

        events.begin_frame();
        events.apply(InputEvent::MouseButton { button: MouseButtons::LEFT, pressed: false });
        assert_eq!(events.get_flag(EventFlag::MouseButtonUp), EventState::Released);
        assert!(!events.check_flag(EventFlag::MouseButtonDown));
        assert_eq!(events.mouse.held, MouseButtons::RIGHT);
        assert_eq!(events.mouse.button, MouseButtons::LEFT);
        assert_eq!(events.mouse.state, EventState::Released);
    }

    #[test]
    fn test_quit_sticks() {
        let mut events = EventSnapshot::new();
        events.apply(InputEvent::CloseRequested);
        events.begin_frame();
        events.begin_frame();
        assert!(events.quit_requested());

        events.reset();
        assert!(!events.quit_requested());
    }

    #[test]
    fn test_resize_is_per_frame() {
        let mut events = EventSnapshot::new();
        events.apply(InputEvent::Resized { width: 800, height: 600 });
        assert_eq!(events.resized(), Some((800, 600)));
        assert!(events.check_flag(EventFlag::WindowResize));
        events.begin_frame();
        assert_eq!(events.resized(), None);
        assert!(!events.check_flag(EventFlag::WindowResize));
    }

    #[test]
    fn test_remove_flag() {
        let mut events = EventSnapshot::new();
        events.set_flag(EventFlag::KeyEscape, EventState::Pressed);
        events.remove_flag(EventFlag::KeyEscape);
        assert!(!events.check_flag(EventFlag::KeyEscape));
    }
}
