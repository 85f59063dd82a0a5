//! Position, rotation and scale for scene entities
//!
//! [`Transform`] places 3D entities in world space and [`Transform2D`] places
//! sprites and text in screen space. There is no parenting: every transform
//! is independent.
//!
//! Rotation helpers compose in local space (see [`lumen_math::quat`]), so
//! `rotate_pitch` tilts about the entity's own right axis even after a yaw.

use lumen_math::{mat4, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A 3D transform with position, rotation, and non-uniform scale
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Orientation
    pub rotation: Quat,
    /// Per-axis scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Create an identity transform (no translation, rotation, or scale change)
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Builder-style scale setter
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Direction the transform faces (+Z after rotation)
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation.forward()
    }

    /// +X after rotation
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation.right()
    }

    /// +Y after rotation
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation.up()
    }

    /// Rotate `angle` radians about a local axis
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        self.rotation.rotate(axis, angle);
    }

    /// Rotate `angle` radians about a world axis
    pub fn rotate_world(&mut self, axis: Vec3, angle: f32) {
        self.rotation.rotate_world(axis, angle);
    }

    /// Turn about the local up axis
    pub fn rotate_yaw(&mut self, angle: f32) {
        self.rotate(Vec3::Y, angle);
    }

    /// Tilt about the local right axis
    pub fn rotate_pitch(&mut self, angle: f32) {
        self.rotate(Vec3::X, angle);
    }

    /// Bank about the local forward axis
    pub fn rotate_roll(&mut self, angle: f32) {
        self.rotate(Vec3::Z, angle);
    }

    /// Translate the transform by an offset
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Point the forward axis at a world-space target
    ///
    /// Does nothing when the target coincides with the position.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.length_squared() > f32::EPSILON {
            self.rotation = Quat::from_unit(dir);
        }
    }

    /// Model matrix: translation * rotation * scale
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        mat4::from_trs(self.position, self.rotation, self.scale)
    }

    /// Transform a point from local space to world space
    ///
    /// Applies scale, then rotation, then translation.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.rotate_vector(p.component_mul(self.scale)) + self.position
    }

    /// Transform a direction from local space to world space
    ///
    /// Applies scale and rotation, but not translation.
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        self.rotation.rotate_vector(d.component_mul(self.scale))
    }

    /// Map a world-space point back into local space
    ///
    /// Zero scale components are treated as 1 rather than dividing by zero.
    pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 {
        let local = self.rotation.inverse().rotate_vector(p - self.position);
        let safe = |s: f32| if s.abs() > 1e-10 { s } else { 1.0 };
        Vec3::new(
            local.x / safe(self.scale.x),
            local.y / safe(self.scale.y),
            local.z / safe(self.scale.z),
        )
    }

    /// Compose two transforms: result = self * other
    ///
    /// The composed transform applies `other` first, then `self`. Exact for
    /// uniform scale; with non-uniform scale and rotation the shear is lost.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(other.position),
            rotation: (self.rotation * other.rotation).normalized(),
            scale: self.scale.component_mul(other.scale),
        }
    }
}

/// Screen-space placement for sprites and text
///
/// Position is in pixels from the top-left corner of the window with `+Y`
/// pointing down. Rotation is clockwise on screen, in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl Transform2D {
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Translation * rotation * scale in pixel space
    pub fn matrix(&self) -> Mat4 {
        let t = mat4::from_translation(Vec3::new(self.position.x, self.position.y, 0.0));
        let r = mat4::from_rotation_z(self.rotation);
        let s = mat4::from_scale(Vec3::new(self.scale.x, self.scale.y, 1.0));
        mat4::mul(t, mat4::mul(r, s))
    }

    /// Map a local pixel offset to window pixels
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        p.component_mul(self.scale).rotated(self.rotation) + self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(vec_approx_eq(p, t.transform_point(p)));
    }

    #[test]
    fn test_translation() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(vec_approx_eq(t.transform_point(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_transform_order() {
        // scale, then rotate, then translate
        let mut t = Transform::identity();
        t.scale = Vec3::splat(2.0);
        t.rotation = Quat::from_axis_angle(Vec3::Z, PI / 2.0);
        t.position = Vec3::new(10.0, 0.0, 0.0);

        let transformed = t.transform_point(Vec3::X);
        assert!(vec_approx_eq(transformed, Vec3::new(10.0, 2.0, 0.0)),
            "Expected (10, 2, 0), got {:?}", transformed);
    }

    #[test]
    fn test_matrix_agrees_with_transform_point() {
        let mut t = Transform::from_position(Vec3::new(-3.0, 4.0, 1.0));
        t.rotate_yaw(0.7);
        t.rotate_pitch(-0.3);
        t.scale = Vec3::new(1.0, 2.0, 3.0);
        let p = Vec3::new(0.5, -1.0, 2.0);
        let via_matrix = mat4::transform_point(t.matrix(), p);
        assert!(vec_approx_eq(via_matrix, t.transform_point(p)));
    }

    #[test]
    fn test_inverse_transform_point() {
        let mut t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        t.rotate_roll(0.5);
        t.scale = Vec3::new(2.0, 0.5, 4.0);
        let p = Vec3::new(-2.0, 7.0, 0.25);
        let back = t.inverse_transform_point(t.transform_point(p));
        assert!(vec_approx_eq(p, back), "Expected {:?}, got {:?}", p, back);
    }

    #[test]
    fn test_yaw_then_negative_yaw_restores() {
        let mut t = Transform::identity();
        t.rotate_pitch(0.3);
        let start = t.rotation;
        t.rotate_yaw(1.3);
        t.rotate_yaw(-1.3);
        assert!(t.rotation.dot(start).abs() > 1.0 - EPSILON);
    }

    #[test]
    fn test_basis_follows_latest_rotation() {
        let mut t = Transform::identity();
        assert!(vec_approx_eq(t.forward(), Vec3::Z));
        t.rotate_yaw(PI / 2.0);
        assert!(vec_approx_eq(t.forward(), Vec3::X));
        assert!(vec_approx_eq(t.right(), -Vec3::Z));
        assert!(vec_approx_eq(t.up(), Vec3::Y));
    }

    #[test]
    fn test_look_at() {
        let mut t = Transform::from_position(Vec3::new(0.0, 0.0, -5.0));
        t.look_at(Vec3::new(5.0, 0.0, -5.0));
        assert!(vec_approx_eq(t.forward(), Vec3::X));

        let before = t.rotation;
        t.look_at(t.position);
        assert_eq!(t.rotation, before);
    }

    #[test]
    fn test_compose() {
        let t1 = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let t2 = Transform::from_position(Vec3::new(0.0, 2.0, 0.0));
        let composed = t1.compose(&t2);
        assert!(vec_approx_eq(composed.transform_point(Vec3::ZERO), Vec3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_transform_2d() {
        let t = Transform2D {
            position: Vec2::new(100.0, 50.0),
            rotation: PI / 2.0,
            scale: Vec2::new(2.0, 2.0),
        };
        let p = t.transform_point(Vec2::new(1.0, 0.0));
        assert!(approx_eq(p.x, 100.0) && approx_eq(p.y, 52.0), "Expected (100, 52), got {:?}", p);

        let m = t.matrix();
        let q = mat4::transform_point(m, Vec3::new(1.0, 0.0, 0.0));
        assert!(approx_eq(q.x, p.x) && approx_eq(q.y, p.y));
    }
}
