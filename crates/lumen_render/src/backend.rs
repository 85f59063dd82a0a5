//! Where finished frame plans go
//!
//! [`crate::Renderer`] draws a plan with wgpu. [`RecordingBackend`] keeps the
//! plans instead, so frame loops can run without a GPU.

use crate::error::RenderError;
use crate::frame::{DrawPass, FramePlan, FrameStats};

/// Something that can draw a [`FramePlan`]
pub trait RenderBackend {
    /// Track a new surface size in pixels
    fn resize(&mut self, width: u32, height: u32);

    /// Draw and present one frame
    fn submit(&mut self, plan: &FramePlan) -> Result<(), RenderError>;

    /// Current surface size in pixels
    fn size(&self) -> (u32, u32);
}

/// Summary of a submitted frame
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedFrame {
    pub passes: Vec<DrawPass>,
    pub stats: FrameStats,
    pub light_counts: [u32; 4],
    pub viewport: [f32; 4],
}

/// Headless backend that remembers every frame it is given
#[derive(Debug)]
pub struct RecordingBackend {
    width: u32,
    height: u32,
    frames: Vec<RecordedFrame>,
    fail_next: Option<fn() -> RenderError>,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: Vec::new(),
            fail_next: None,
        }
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Make the next submit fail with the given error
    pub fn fail_next_submit(&mut self, error: fn() -> RenderError) {
        self.fail_next = Some(error);
    }
}

impl RenderBackend for RecordingBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
        }
    }

    fn submit(&mut self, plan: &FramePlan) -> Result<(), RenderError> {
        if let Some(error) = self.fail_next.take() {
            return Err(error());
        }
        self.frames.push(RecordedFrame {
            passes: plan.passes().collect(),
            stats: plan.stats,
            light_counts: plan.uniforms.light_counts,
            viewport: plan.uniforms.viewport,
        });
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use lumen_core::{Material, Scene, Vec4};

    fn empty_plan() -> FramePlan {
        let material = Material::default_lit().unwrap();
        FramePlan::build(&Scene::new(), &Camera::default(), &material, 0.0, Vec4::ZERO)
    }

    #[test]
    fn test_records_frames() {
        let mut backend = RecordingBackend::new(640, 480);
        backend.submit(&empty_plan()).unwrap();
        backend.submit(&empty_plan()).unwrap();
        assert_eq!(backend.frame_count(), 2);
        assert!(backend.last_frame().unwrap().passes.is_empty());
    }

    #[test]
    fn test_resize_ignores_zero() {
        let mut backend = RecordingBackend::new(640, 480);
        backend.resize(0, 100);
        assert_eq!(backend.size(), (640, 480));
        backend.resize(800, 600);
        assert_eq!(backend.size(), (800, 600));
    }

    #[test]
    fn test_injected_failure_is_one_shot() {
        let mut backend = RecordingBackend::new(1, 1);
        backend.fail_next_submit(|| RenderError::SurfaceLost);
        assert!(matches!(backend.submit(&empty_plan()), Err(RenderError::SurfaceLost)));
        assert!(backend.submit(&empty_plan()).is_ok());
        assert_eq!(backend.frame_count(), 1);
    }
}
