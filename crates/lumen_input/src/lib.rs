//! Input handling for Lumen
//!
//! Window backends report what happened as [`InputEvent`]s; an
//! [`EventSnapshot`] folds them into per-flag press states and mouse data
//! that game code reads once per frame. [`winit_events`] does the
//! translation for winit windows.

mod camera_controller;
mod event;
pub mod winit_events;

pub use camera_controller::{CameraControl, CameraController};
pub use event::{EventFlag, EventSnapshot, EventState, InputEvent, Mouse, MouseButtons};
