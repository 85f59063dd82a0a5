//! Where a [`Window`](crate::Window) gets its events, pixels and sound
//!
//! - [`DesktopPlatform`] - a winit window drawn with wgpu, audio through rodio
//! - [`HeadlessPlatform`] - scripted input, frames recorded in memory

mod audio;
mod desktop;
mod headless;

use lumen_core::AudioMixer;
use lumen_input::EventSnapshot;
use lumen_render::{RenderBackend, RenderError};

pub use audio::RodioMixer;
pub use desktop::DesktopPlatform;
pub use headless::HeadlessPlatform;

/// Services a window needs from the host
pub trait Platform {
    /// Apply every event that arrived since the last call to `events`
    fn pump_events(&mut self, events: &mut EventSnapshot);

    /// The backend frames are submitted to, once one exists
    fn backend(&mut self) -> Option<&mut dyn RenderBackend>;

    /// Drawable size in pixels
    fn size(&self) -> (u32, u32);

    /// Grab and hide the cursor, or release it. Returns whether it is now locked.
    fn set_cursor_locked(&mut self, locked: bool) -> bool;

    fn set_fullscreen(&mut self, fullscreen: bool);

    fn mixer(&mut self) -> &mut dyn AudioMixer;
}

/// Failure to bring up a platform
#[derive(Debug)]
pub enum PlatformError {
    EventLoop(String),
    WindowCreation(String),
    Render(RenderError),
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::EventLoop(msg) => write!(f, "Event loop error: {}", msg),
            PlatformError::WindowCreation(msg) => write!(f, "Window creation failed: {}", msg),
            PlatformError::Render(e) => write!(f, "Renderer initialization failed: {}", e),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlatformError::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderError> for PlatformError {
    fn from(e: RenderError) -> Self {
        PlatformError::Render(e)
    }
}
