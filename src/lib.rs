//! Lumen - a real-time 3D rendering and scene engine
//!
//! The [`Window`] ties the workspace crates together: it polls input through
//! a [`Platform`], advances the [`Scene`](lumen_core::Scene) and submits a
//! planned frame to the platform's render backend.
//!
//! ```no_run
//! use lumen::{config::AppConfig, Window};
//!
//! let config = AppConfig::load().unwrap_or_default();
//! let mut window = Window::from_config(&config).expect("no window");
//! while window.update() {}
//! ```

pub mod config;
pub mod platform;
pub mod timer;
pub mod window;

pub use platform::{DesktopPlatform, HeadlessPlatform, Platform, PlatformError};
pub use timer::FrameTimer;
pub use window::{Frame, Window, WindowError, WindowState};

pub use lumen_core as core;
pub use lumen_input as input;
pub use lumen_math as math;
pub use lumen_render as render;
