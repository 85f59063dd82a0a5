//! Platform with no window, for tests and offline runs
//!
//! Events are queued by the caller and delivered on the next pump. Frames go
//! to a [`RecordingBackend`] and sounds to a [`SilentMixer`].

use lumen_core::{AudioMixer, SilentMixer};
use lumen_input::{EventSnapshot, InputEvent};
use lumen_render::{RecordingBackend, RenderBackend};

use super::Platform;

#[derive(Debug)]
pub struct HeadlessPlatform {
    backend: RecordingBackend,
    mixer: SilentMixer,
    queued: Vec<InputEvent>,
    cursor_locked: bool,
    fullscreen: bool,
}

impl HeadlessPlatform {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            backend: RecordingBackend::new(width, height),
            mixer: SilentMixer::new(),
            queued: Vec::new(),
            cursor_locked: false,
            fullscreen: false,
        }
    }

    /// Deliver `event` on the next pump
    pub fn push_event(&mut self, event: InputEvent) {
        self.queued.push(event);
    }

    pub fn recorder(&self) -> &RecordingBackend {
        &self.backend
    }

    pub fn recorder_mut(&mut self) -> &mut RecordingBackend {
        &mut self.backend
    }

    pub fn silent_mixer(&self) -> &SilentMixer {
        &self.mixer
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

impl Platform for HeadlessPlatform {
    fn pump_events(&mut self, events: &mut EventSnapshot) {
        for event in self.queued.drain(..) {
            events.apply(event);
        }
    }

    fn backend(&mut self) -> Option<&mut dyn RenderBackend> {
        Some(&mut self.backend)
    }

    fn size(&self) -> (u32, u32) {
        self.backend.size()
    }

    fn set_cursor_locked(&mut self, locked: bool) -> bool {
        self.cursor_locked = locked;
        locked
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }

    fn mixer(&mut self) -> &mut dyn AudioMixer {
        &mut self.mixer
    }
}
