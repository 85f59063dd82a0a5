//! Perspective camera
//!
//! The camera is an ordinary [`Transform`]: it looks along its forward axis
//! (`+Z`) with `+Y` up. `focal_length` is the distance to the far clip
//! plane; anything further away is not drawn.

use lumen_core::Transform;
use lumen_math::{mat4, Mat4, Quat, Vec3};

/// Near clip plane distance used by every camera
pub const NEAR_PLANE: f32 = 0.1;

/// Camera for viewing the 3D scene
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub transform: Transform,
    /// Far clip distance in world units
    pub focal_length: f32,
    /// Vertical field of view in radians
    pub fov: f32,
    pub view_width: u32,
    pub view_height: u32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY, 1280, 720, 1000.0, 60f32.to_radians())
    }
}

impl Camera {
    pub fn new(
        position: Vec3,
        rotation: Quat,
        view_width: u32,
        view_height: u32,
        focal_length: f32,
        fov: f32,
    ) -> Self {
        Self {
            transform: Transform::from_position_rotation(position, rotation),
            focal_length,
            fov,
            view_width,
            view_height,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Width over height; 1 while the viewport is degenerate
    pub fn aspect_ratio(&self) -> f32 {
        if self.view_width == 0 || self.view_height == 0 {
            1.0
        } else {
            self.view_width as f32 / self.view_height as f32
        }
    }

    /// Track a new surface size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.view_width = width;
        self.view_height = height;
    }

    /// World-to-camera matrix
    ///
    /// Scale on the camera transform is ignored.
    pub fn view_matrix(&self) -> Mat4 {
        let inverse_rotation = mat4::from_quat(self.transform.rotation.inverse());
        mat4::mul(inverse_rotation, mat4::from_translation(-self.transform.position))
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let far = self.focal_length.max(NEAR_PLANE * 2.0);
        mat4::perspective(self.fov, self.aspect_ratio(), NEAR_PLANE, far)
    }

    pub fn view_projection(&self) -> Mat4 {
        mat4::mul(self.projection_matrix(), self.view_matrix())
    }

    pub fn forward(&self) -> Vec3 {
        self.transform.forward()
    }

    pub fn right(&self) -> Vec3 {
        self.transform.right()
    }

    pub fn up(&self) -> Vec3 {
        self.transform.up()
    }
}
