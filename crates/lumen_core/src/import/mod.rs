//! File importers for models
//!
//! Both supported formats are authored right-handed with -Z forward. The
//! engine is left-handed with +Z forward, so importers mirror the Z axis of
//! every position, normal, rotation and matrix they read. Mirroring keeps
//! the on-screen winding of front faces intact.

pub(crate) mod gltf_loader;
pub(crate) mod wavefront;

use lumen_math::{Mat4, Quat, Vec3};

#[inline]
pub(crate) fn mirror_point(p: [f32; 3]) -> Vec3 {
    Vec3::new(p[0], p[1], -p[2])
}

/// Reflect a rotation through the XY plane
#[inline]
pub(crate) fn mirror_rotation(q: [f32; 4]) -> Quat {
    Quat::new(-q[0], -q[1], q[2], q[3])
}

/// `S * m * S` with `S = diag(1, 1, -1, 1)`
pub(crate) fn mirror_matrix(m: Mat4) -> Mat4 {
    let sign = |i: usize| if i == 2 { -1.0 } else { 1.0 };
    let mut out = m;
    for (c, column) in out.iter_mut().enumerate() {
        for (r, value) in column.iter_mut().enumerate() {
            *value *= sign(c) * sign(r);
        }
    }
    out
}
