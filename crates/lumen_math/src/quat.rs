//! Unit quaternion rotations
//!
//! ## Conventions
//!
//! - Hamilton product, column vectors: `(a * b) * v == a * (b * v)`, so `b`
//!   is applied first.
//! - Basis: `+X` is right, `+Y` is up, `+Z` is forward. [`Quat::forward`],
//!   [`Quat::right`] and [`Quat::up`] return those axes after rotation.
//! - [`Quat::rotate`] composes in local space (right-multiplication) and
//!   [`Quat::rotate_world`] composes in world space (left-multiplication).
//! - Euler angles are a [`Vec3`] of (pitch about X, yaw about Y, roll about Z)
//!   applied intrinsically in Y, X, Z order: `q = yaw * pitch * roll`.
//!   Pitch of exactly ±90° is gimbal lock: [`Quat::to_euler`] then reports
//!   roll as zero and folds it into yaw, so the rotation is preserved but
//!   the individual angles are not.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::mat4::Mat4;
use crate::Vec3;

/// A rotation quaternion with vector part (x, y, z) and scalar part w
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Create a quaternion from raw components (not normalized)
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about `axis`
    ///
    /// The axis is normalized first. A zero axis yields the identity.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalized();
        if axis == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Build from (pitch, yaw, roll) radians, see the module docs for order
    pub fn from_euler(euler: Vec3) -> Self {
        let yaw = Self::from_axis_angle(Vec3::Y, euler.y);
        let pitch = Self::from_axis_angle(Vec3::X, euler.x);
        let roll = Self::from_axis_angle(Vec3::Z, euler.z);
        (yaw * pitch * roll).normalized()
    }

    /// Shortest-arc rotation taking `from` onto `to`
    ///
    /// Both inputs are normalized. Opposite vectors rotate half a turn about
    /// an axis perpendicular to `from`; a zero input gives the identity.
    pub fn from_to(from: Vec3, to: Vec3) -> Self {
        let a = from.normalized();
        let b = to.normalized();
        if a == Vec3::ZERO || b == Vec3::ZERO {
            return Self::IDENTITY;
        }

        let d = a.dot(b);
        if d > 1.0 - 1e-6 {
            return Self::IDENTITY;
        }
        if d < -1.0 + 1e-6 {
            let mut axis = a.cross(Vec3::X);
            if axis.length_squared() < 1e-6 {
                axis = a.cross(Vec3::Y);
            }
            return Self::from_axis_angle(axis, std::f32::consts::PI);
        }

        let c = a.cross(b);
        Self::new(c.x, c.y, c.z, 1.0 + d).normalized()
    }

    /// Rotation that turns the forward axis (+Z) to face `direction`
    #[inline]
    pub fn from_unit(direction: Vec3) -> Self {
        Self::from_to(Vec3::Z, direction)
    }

    /// Extract the rotation from the upper 3x3 of a pure rotation matrix
    pub fn from_rotation_matrix(m: Mat4) -> Self {
        // m[col][row]
        let (m00, m01, m02) = (m[0][0], m[1][0], m[2][0]);
        let (m10, m11, m12) = (m[0][1], m[1][1], m[2][1]);
        let (m20, m21, m22) = (m[0][2], m[1][2], m[2][2]);

        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalized()
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Normalize to unit magnitude, degenerate input gives the identity
    #[inline]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > f32::EPSILON && len.is_finite() {
            let inv = 1.0 / len;
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    #[inline]
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Inverse rotation (conjugate for unit quaternions)
    #[inline]
    pub fn inverse(self) -> Self {
        let len_sq = self.dot(self);
        if len_sq <= f32::EPSILON {
            return Self::IDENTITY;
        }
        let c = self.conjugate();
        Self::new(c.x / len_sq, c.y / len_sq, c.z / len_sq, c.w / len_sq)
    }

    /// Rotate a vector
    #[inline]
    pub fn rotate_vector(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// Compose a local-space rotation of `angle` radians about `axis`
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        *self = (*self * Self::from_axis_angle(axis, angle)).normalized();
    }

    /// Compose a world-space rotation of `angle` radians about `axis`
    pub fn rotate_world(&mut self, axis: Vec3, angle: f32) {
        *self = (Self::from_axis_angle(axis, angle) * *self).normalized();
    }

    /// Rotated +Z axis
    #[inline]
    pub fn forward(self) -> Vec3 {
        self.rotate_vector(Vec3::Z)
    }

    /// Rotated +X axis
    #[inline]
    pub fn right(self) -> Vec3 {
        self.rotate_vector(Vec3::X)
    }

    /// Rotated +Y axis
    #[inline]
    pub fn up(self) -> Vec3 {
        self.rotate_vector(Vec3::Y)
    }

    /// Normalized linear interpolation along the shorter arc
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let other = if self.dot(other) < 0.0 { -other } else { other };
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
            self.w + (other.w - self.w) * t,
        )
        .normalized()
    }

    /// Spherical linear interpolation along the shorter arc
    pub fn slerp(self, other: Self, t: f32) -> Self {
        let mut cos_theta = self.dot(other);
        let other = if cos_theta < 0.0 {
            cos_theta = -cos_theta;
            -other
        } else {
            other
        };

        if cos_theta > 0.9995 {
            return self.lerp(other, t);
        }

        let theta = cos_theta.acos();
        let sin_theta = theta.sin();
        let a = ((1.0 - t) * theta).sin() / sin_theta;
        let b = (t * theta).sin() / sin_theta;
        Self::new(
            self.x * a + other.x * b,
            self.y * a + other.y * b,
            self.z * a + other.z * b,
            self.w * a + other.w * b,
        )
        .normalized()
    }

    /// 4x4 rotation matrix (column-major)
    pub fn to_matrix(self) -> Mat4 {
        let Self { x, y, z, w } = self;
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        [
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy + wz), 2.0 * (xz - wy), 0.0],
            [2.0 * (xy - wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz + wx), 0.0],
            [2.0 * (xz + wy), 2.0 * (yz - wx), 1.0 - 2.0 * (xx + yy), 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }

    /// Decompose into (pitch, yaw, roll) radians, see the module docs
    pub fn to_euler(self) -> Vec3 {
        let m = self.normalized().to_matrix();
        // m[col][row]
        let m12 = m[2][1];
        let sin_pitch = (-m12).clamp(-1.0, 1.0);

        if sin_pitch.abs() < 0.99999 {
            let yaw = m[2][0].atan2(m[2][2]);
            let roll = m[0][1].atan2(m[1][1]);
            Vec3::new(sin_pitch.asin(), yaw, roll)
        } else {
            // gimbal lock
            let yaw = (-m[0][2]).atan2(m[0][0]);
            Vec3::new(std::f32::consts::FRAC_PI_2.copysign(sin_pitch), yaw, 0.0)
        }
    }
}

impl std::ops::Mul for Quat {
    type Output = Self;
    #[inline]
    fn mul(self, b: Self) -> Self {
        let a = self;
        Self::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }
}

impl std::ops::MulAssign for Quat {
    #[inline]
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl std::ops::Mul<Vec3> for Quat {
    type Output = Vec3;
    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        self.rotate_vector(v)
    }
}

impl std::ops::Neg for Quat {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}
