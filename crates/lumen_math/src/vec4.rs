//! Four-component vector
//!
//! Lumen only needs a `Vec4` in two places: homogeneous clip-space
//! coordinates coming out of [`mat4::transform`](crate::mat4::transform),
//! and RGBA colors in materials, particles and clear colors. Geometry lives
//! in [`Vec3`].

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::Vec3;

/// Homogeneous point or RGBA color
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const WHITE: Self = Self::ONE;
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Same as [`Vec4::new`], named for color call sites
    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::new(r, g, b, a)
    }

    /// Color from 8-bit channels
    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        let [r, g, b, a] = rgba.map(|c| c as f32 / 255.0);
        Self::rgba(r, g, b, a)
    }

    /// Replace the alpha (w) channel
    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self { w: a, ..self }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit-length copy; zero or non-finite length gives [`Vec4::ZERO`]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > f32::EPSILON && len.is_finite() {
            self / len
        } else {
            Self::ZERO
        }
    }

    /// The xyz part, w discarded
    #[inline]
    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Perspective divide of a homogeneous point
    ///
    /// Returns `None` when w is zero, i.e. the point is at infinity.
    pub fn project(self) -> Option<Vec3> {
        if self.w.abs() <= f32::EPSILON {
            None
        } else {
            Some(self.xyz() / self.w)
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

macro_rules! componentwise {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign:ident, $op:tt) => {
        impl std::ops::$trait for Vec4 {
            type Output = Self;
            #[inline]
            fn $method(self, rhs: Self) -> Self {
                Self::new(self.x $op rhs.x, self.y $op rhs.y, self.z $op rhs.z, self.w $op rhs.w)
            }
        }

        impl std::ops::$trait<f32> for Vec4 {
            type Output = Self;
            #[inline]
            fn $method(self, rhs: f32) -> Self {
                Self::new(self.x $op rhs, self.y $op rhs, self.z $op rhs, self.w $op rhs)
            }
        }

        impl std::ops::$assign_trait for Vec4 {
            #[inline]
            fn $assign(&mut self, rhs: Self) {
                *self = *self $op rhs;
            }
        }
    };
}

componentwise!(Add, add, AddAssign, add_assign, +);
componentwise!(Sub, sub, SubAssign, sub_assign, -);
// Vec4 * Vec4 is the channel-wise product used for tinting colors
componentwise!(Mul, mul, MulAssign, mul_assign, *);
componentwise!(Div, div, DivAssign, div_assign, /);

impl std::ops::MulAssign<f32> for Vec4 {
    #[inline]
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl std::ops::Neg for Vec4 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self * -1.0
    }
}

impl From<[f32; 4]> for Vec4 {
    #[inline]
    fn from([x, y, z, w]: [f32; 4]) -> Self {
        Self::new(x, y, z, w)
    }
}

impl From<Vec4> for [f32; 4] {
    #[inline]
    fn from(v: Vec4) -> Self {
        v.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_dot_and_length() {
        let a = Vec4::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(a.dot(Vec4::new(5.0, 6.0, 7.0, 8.0)), 70.0);
        assert!((Vec4::ONE.length() - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_normalized() {
        let n = Vec4::new(0.0, 3.0, 0.0, 4.0).normalized();
        assert!((n.length() - 1.0).abs() < EPSILON, "Expected unit length, got {:?}", n);
        assert!((n.w - 0.8).abs() < EPSILON);
    }

    #[test]
    fn test_normalized_zero_is_zero() {
        assert_eq!(Vec4::ZERO.normalized(), Vec4::ZERO);
        assert_eq!(Vec4::new(f32::NAN, 0.0, 0.0, 0.0).normalized(), Vec4::ZERO);
    }

    #[test]
    fn test_project() {
        let p = Vec4::new(2.0, 4.0, 6.0, 2.0).project();
        assert_eq!(p, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(Vec4::new(1.0, 1.0, 1.0, 0.0).project(), None);
    }

    #[test]
    fn test_colors() {
        let c = Vec4::from_rgba8([255, 0, 51, 255]);
        assert!((c.x - 1.0).abs() < EPSILON);
        assert!((c.z - 0.2).abs() < EPSILON, "Expected 0.2 blue, got {:?}", c);
        assert_eq!(c.with_alpha(0.5).w, 0.5);

        let tinted = Vec4::rgba(0.5, 1.0, 1.0, 1.0) * Vec4::rgba(1.0, 0.5, 0.0, 1.0);
        assert_eq!(tinted, Vec4::rgba(0.5, 0.5, 0.0, 1.0));
    }

    #[test]
    fn test_operators() {
        let a = Vec4::new(1.0, 2.0, 3.0, 4.0);
        let b = Vec4::new(4.0, 3.0, 2.0, 1.0);
        assert_eq!(a + b, Vec4::new(5.0, 5.0, 5.0, 5.0));
        assert_eq!(a - b, Vec4::new(-3.0, -1.0, 1.0, 3.0));
        assert_eq!(-a * 2.0, Vec4::new(-2.0, -4.0, -6.0, -8.0));
        assert_eq!(a / 2.0, Vec4::new(0.5, 1.0, 1.5, 2.0));

        let mut acc = Vec4::ZERO;
        acc += a;
        acc *= 3.0;
        assert_eq!(acc, Vec4::new(3.0, 6.0, 9.0, 12.0));
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Vec4::BLACK;
        let b = Vec4::WHITE;
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Vec4::new(0.5, 0.5, 0.5, 1.0));
    }
}
