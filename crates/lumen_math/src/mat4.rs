//! 4x4 Matrix utilities
//!
//! Matrices are plain column-major arrays (`m[col][row]`) so they can be
//! copied straight into GPU uniform buffers. All helpers are free functions.
//!
//! Projections are left-handed: view space looks down `+Z` and clip-space
//! depth runs from 0 at the near plane to 1 at the far plane.

use crate::{Quat, Vec3, Vec4};

/// 4x4 matrix type (column-major)
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Multiply two 4x4 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Transform a Vec4 by a 4x4 matrix (column-major)
///
/// result = M * v
pub fn transform(m: Mat4, v: Vec4) -> Vec4 {
    Vec4::new(
        m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z + m[3][0] * v.w,
        m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z + m[3][1] * v.w,
        m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z + m[3][2] * v.w,
        m[0][3] * v.x + m[1][3] * v.y + m[2][3] * v.z + m[3][3] * v.w,
    )
}

/// Transform a point (w = 1), ignoring any projective component
#[inline]
pub fn transform_point(m: Mat4, p: Vec3) -> Vec3 {
    transform(m, p.extend(1.0)).xyz()
}

/// Transform a direction (w = 0), translation has no effect
#[inline]
pub fn transform_vector(m: Mat4, v: Vec3) -> Vec3 {
    transform(m, v.extend(0.0)).xyz()
}

/// Get a column vector from a matrix
pub fn get_column(m: Mat4, col: usize) -> Vec4 {
    Vec4::new(m[col][0], m[col][1], m[col][2], m[col][3])
}

/// Transpose a matrix
pub fn transpose(m: Mat4) -> Mat4 {
    [
        [m[0][0], m[1][0], m[2][0], m[3][0]],
        [m[0][1], m[1][1], m[2][1], m[3][1]],
        [m[0][2], m[1][2], m[2][2], m[3][2]],
        [m[0][3], m[1][3], m[2][3], m[3][3]],
    ]
}

/// Translation matrix
pub fn from_translation(t: Vec3) -> Mat4 {
    let mut m = IDENTITY;
    m[3][0] = t.x;
    m[3][1] = t.y;
    m[3][2] = t.z;
    m
}

/// Non-uniform scale matrix
pub fn from_scale(s: Vec3) -> Mat4 {
    let mut m = IDENTITY;
    m[0][0] = s.x;
    m[1][1] = s.y;
    m[2][2] = s.z;
    m
}

/// Rotation matrix from a quaternion
#[inline]
pub fn from_quat(q: Quat) -> Mat4 {
    q.to_matrix()
}

/// Rotation about the Z axis, used for 2D placement
pub fn from_rotation_z(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    let mut m = IDENTITY;
    m[0][0] = c;
    m[0][1] = s;
    m[1][0] = -s;
    m[1][1] = c;
    m
}

/// Translation * Rotation * Scale, the usual model matrix
pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    let mut m = rotation.to_matrix();
    for (col, s) in [scale.x, scale.y, scale.z].into_iter().enumerate() {
        for row in 0..3 {
            m[col][row] *= s;
        }
    }
    m[3][0] = translation.x;
    m[3][1] = translation.y;
    m[3][2] = translation.z;
    m
}

/// General inverse by Gauss-Jordan elimination with partial pivoting
///
/// Returns `None` for a singular matrix.
#[allow(clippy::needless_range_loop)]
pub fn try_inverse(m: Mat4) -> Option<Mat4> {
    // Work in row-major: a[row][col]
    let mut a = transpose(m);
    let mut inv = IDENTITY;

    for col in 0..4 {
        let mut pivot = col;
        for row in (col + 1)..4 {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < 1e-10 {
            return None;
        }
        a.swap(col, pivot);
        inv.swap(col, pivot);

        let scale = 1.0 / a[col][col];
        for k in 0..4 {
            a[col][k] *= scale;
            inv[col][k] *= scale;
        }

        for row in 0..4 {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..4 {
                a[row][k] -= factor * a[col][k];
                inv[row][k] -= factor * inv[col][k];
            }
        }
    }

    Some(transpose(inv))
}

/// Inverse, falling back to identity for a singular matrix
///
/// Degenerate transforms (zero scale) must not poison a frame with NaNs.
pub fn inverse(m: Mat4) -> Mat4 {
    try_inverse(m).unwrap_or(IDENTITY)
}

/// Matrix for transforming normals: inverse-transpose of the model matrix
pub fn normal_matrix(model: Mat4) -> Mat4 {
    let mut m = transpose(inverse(model));
    m[3] = [0.0, 0.0, 0.0, 1.0];
    m[0][3] = 0.0;
    m[1][3] = 0.0;
    m[2][3] = 0.0;
    m
}

/// Left-handed perspective projection with 0..1 depth
///
/// # Arguments
/// * `fov_y` - Vertical field of view in radians
/// * `aspect` - Width / height
/// * `near`, `far` - Clip plane distances (positive)
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y * 0.5).tan();
    let range = far / (far - near);
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, range, 1.0],
        [0.0, 0.0, -near * range, 0.0],
    ]
}

/// Orthographic projection mapping the given box to clip space (0..1 depth)
pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let rl = 1.0 / (right - left);
    let tb = 1.0 / (top - bottom);
    let fn_ = 1.0 / (far - near);
    [
        [2.0 * rl, 0.0, 0.0, 0.0],
        [0.0, 2.0 * tb, 0.0, 0.0],
        [0.0, 0.0, fn_, 0.0],
        [-(right + left) * rl, -(top + bottom) * tb, -near * fn_, 1.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    fn mat_approx_eq(a: Mat4, b: Mat4) -> bool {
        for i in 0..4 {
            for j in 0..4 {
                if !approx_eq(a[i][j], b[i][j]) {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn test_identity() {
        let v = Vec4::new(1.0, 2.0, 3.0, 4.0);
        let result = transform(IDENTITY, v);
        assert_eq!(v, result);
    }

    #[test]
    fn test_mul_identity() {
        let a = from_rotation_z(0.5);
        assert!(mat_approx_eq(a, mul(IDENTITY, a)));
        assert!(mat_approx_eq(a, mul(a, IDENTITY)));
    }

    #[test]
    fn test_mul_applies_right_first() {
        let t = from_translation(Vec3::new(10.0, 0.0, 0.0));
        let s = from_scale(Vec3::splat(2.0));
        let p = Vec3::new(1.0, 0.0, 0.0);
        // scale then translate
        assert!(vec_approx_eq(transform_point(mul(t, s), p), Vec3::new(12.0, 0.0, 0.0)));
        // translate then scale
        assert!(vec_approx_eq(transform_point(mul(s, t), p), Vec3::new(22.0, 0.0, 0.0)));
    }

    #[test]
    fn test_trs_matches_composition() {
        let t = Vec3::new(1.0, -2.0, 3.0);
        let r = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 1.0), 0.8);
        let s = Vec3::new(2.0, 0.5, 1.5);
        let composed = mul(from_translation(t), mul(from_quat(r), from_scale(s)));
        assert!(mat_approx_eq(from_trs(t, r, s), composed));
    }

    #[test]
    fn test_transform_vector_ignores_translation() {
        let m = from_translation(Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(transform_vector(m, Vec3::X), Vec3::X);
    }

    #[test]
    fn test_inverse() {
        let m = from_trs(
            Vec3::new(3.0, 1.0, -4.0),
            Quat::from_euler(Vec3::new(0.3, 1.2, -0.5)),
            Vec3::new(2.0, 3.0, 0.5),
        );
        let inv = inverse(m);
        assert!(mat_approx_eq(mul(m, inv), IDENTITY), "Expected identity, got {:?}", mul(m, inv));
        assert!(mat_approx_eq(mul(inv, m), IDENTITY));
    }

    #[test]
    fn test_inverse_singular_falls_back() {
        let m = from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(try_inverse(m).is_none());
        assert_eq!(inverse(m), IDENTITY);
    }

    #[test]
    fn test_normal_matrix_keeps_normals_perpendicular() {
        let model = from_scale(Vec3::new(4.0, 1.0, 1.0));
        // surface along the (1,1) diagonal has normal (1,-1)
        let tangent = transform_vector(model, Vec3::new(1.0, 1.0, 0.0));
        let normal = transform_vector(normal_matrix(model), Vec3::new(1.0, -1.0, 0.0));
        assert!(approx_eq(tangent.dot(normal), 0.0));
    }

    #[test]
    fn test_rotation_z() {
        let m = from_rotation_z(FRAC_PI_2);
        assert!(vec_approx_eq(transform_point(m, Vec3::X), Vec3::Y));
    }

    #[test]
    fn test_perspective_depth_range() {
        let p = perspective(FRAC_PI_2, 1.0, 0.1, 100.0);
        let near = transform(p, Vec4::new(0.0, 0.0, 0.1, 1.0));
        let far = transform(p, Vec4::new(0.0, 0.0, 100.0, 1.0));
        assert!(approx_eq(near.z / near.w, 0.0));
        assert!(approx_eq(far.z / far.w, 1.0));
    }

    #[test]
    fn test_orthographic_corners() {
        let o = orthographic(0.0, 800.0, 600.0, 0.0, 0.0, 1.0);
        let top_left = transform(o, Vec4::new(0.0, 0.0, 0.0, 1.0));
        let bottom_right = transform(o, Vec4::new(800.0, 600.0, 0.0, 1.0));
        assert!(approx_eq(top_left.x, -1.0) && approx_eq(top_left.y, 1.0));
        assert!(approx_eq(bottom_right.x, 1.0) && approx_eq(bottom_right.y, -1.0));
    }

    #[test]
    fn test_get_column() {
        let m = from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(get_column(m, 3), Vec4::new(1.0, 2.0, 3.0, 1.0));
    }
}
