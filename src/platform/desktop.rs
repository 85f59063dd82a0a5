//! Desktop platform: winit window, wgpu renderer, rodio audio
//!
//! The event loop is pumped once per frame instead of owning the thread, so
//! the caller keeps control of the loop and calls `update()` at its own pace.

use std::sync::Arc;
use std::time::Duration;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{CursorGrabMode, Fullscreen, Window, WindowAttributes, WindowId},
};

use lumen_core::{AudioMixer, SilentMixer};
use lumen_input::{winit_events, EventSnapshot, InputEvent};
use lumen_render::{RenderBackend, Renderer};

use super::{Platform, PlatformError, RodioMixer};
use crate::config::{AudioConfig, WindowConfig};

/// Pumps allowed for the OS to hand us the window at startup
const STARTUP_PUMPS: usize = 8;

/// State touched from inside the winit callbacks
struct DesktopState {
    attributes: WindowAttributes,
    vsync: bool,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    startup_error: Option<PlatformError>,
    pending: Vec<InputEvent>,
}

impl ApplicationHandler for DesktopState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.startup_error = Some(PlatformError::WindowCreation(e.to_string()));
                return;
            }
        };
        match Renderer::from_window(Arc::clone(&window), self.vsync) {
            Ok(renderer) => {
                log::info!("Window created ({}x{})", window.inner_size().width, window.inner_size().height);
                self.renderer = Some(renderer);
                self.window = Some(window);
            }
            Err(e) => self.startup_error = Some(PlatformError::Render(e)),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let Some(input) = winit_events::from_window_event(&event) {
            self.pending.push(input);
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let Some(input) = winit_events::from_device_event(&event) {
            self.pending.push(input);
        }
    }
}

pub struct DesktopPlatform {
    event_loop: EventLoop<()>,
    state: DesktopState,
    mixer: Box<dyn AudioMixer>,
    cursor_locked: bool,
}

impl DesktopPlatform {
    /// Open a window and bring up the renderer and audio output
    pub fn new(window: &WindowConfig, audio: &AudioConfig) -> Result<Self, PlatformError> {
        let event_loop = EventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))?;

        let mut attributes = Window::default_attributes()
            .with_title(&window.title)
            .with_inner_size(PhysicalSize::new(window.width.max(1), window.height.max(1)));
        if window.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let mut platform = Self {
            event_loop,
            state: DesktopState {
                attributes,
                vsync: window.vsync,
                window: None,
                renderer: None,
                startup_error: None,
                pending: Vec::new(),
            },
            mixer: open_mixer(audio),
            cursor_locked: false,
        };

        for _ in 0..STARTUP_PUMPS {
            if let PumpStatus::Exit(code) = platform
                .event_loop
                .pump_app_events(Some(Duration::from_millis(10)), &mut platform.state)
            {
                return Err(PlatformError::EventLoop(format!("event loop exited during startup ({})", code)));
            }
            if let Some(error) = platform.state.startup_error.take() {
                return Err(error);
            }
            if platform.state.window.is_some() {
                return Ok(platform);
            }
        }
        Err(PlatformError::WindowCreation("the OS never delivered a window".to_string()))
    }

    /// The underlying winit window
    pub fn window(&self) -> Option<&Arc<Window>> {
        self.state.window.as_ref()
    }

    pub fn set_title(&self, title: &str) {
        if let Some(window) = &self.state.window {
            window.set_title(title);
        }
    }
}

fn open_mixer(audio: &AudioConfig) -> Box<dyn AudioMixer> {
    if !audio.enabled {
        return Box::new(SilentMixer::new());
    }
    match RodioMixer::open(audio.volume) {
        Ok(mixer) => Box::new(mixer),
        Err(e) => {
            log::warn!("No audio output ({}), sounds will be silent", e);
            Box::new(SilentMixer::new())
        }
    }
}

impl Platform for DesktopPlatform {
    fn pump_events(&mut self, events: &mut EventSnapshot) {
        if let PumpStatus::Exit(_) = self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.state) {
            events.apply(InputEvent::Quit);
        }
        for input in self.state.pending.drain(..) {
            events.apply(input);
        }
    }

    fn backend(&mut self) -> Option<&mut dyn RenderBackend> {
        self.state.renderer.as_mut().map(|r| r as &mut dyn RenderBackend)
    }

    fn size(&self) -> (u32, u32) {
        match &self.state.renderer {
            Some(renderer) => renderer.size(),
            None => (0, 0),
        }
    }

    fn set_cursor_locked(&mut self, locked: bool) -> bool {
        let Some(window) = &self.state.window else {
            return false;
        };
        if locked {
            let grab_result = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if grab_result.is_ok() {
                window.set_cursor_visible(false);
                self.cursor_locked = true;
                log::info!("Cursor captured");
            } else {
                log::warn!("Failed to capture cursor");
            }
        } else {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
            self.cursor_locked = false;
            log::info!("Cursor released");
        }
        self.cursor_locked
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        if let Some(window) = &self.state.window {
            window.set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
        }
    }

    fn mixer(&mut self) -> &mut dyn AudioMixer {
        self.mixer.as_mut()
    }
}
