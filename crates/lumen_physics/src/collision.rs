//! Intersection queries between collision shapes
//!
//! Everything here is a pure function of its inputs. Contact normals point
//! from the second shape toward the first.

use crate::shapes::{Aabb, Obb, Ray, SupportMap};
use lumen_math::Vec3;

/// Contact information from an overlap test
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Point of contact (on or inside the second shape)
    pub point: Vec3,
    /// Normal pointing from the second shape toward the first
    pub normal: Vec3,
    /// Penetration depth (positive means overlapping)
    pub penetration: f32,
}

impl Contact {
    /// Create a new contact
    pub fn new(point: Vec3, normal: Vec3, penetration: f32) -> Self {
        Self {
            point,
            normal,
            penetration,
        }
    }
}

/// Where a ray first meets a shape
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Distance along the ray
    pub distance: f32,
    pub point: Vec3,
    /// Outward surface normal at the hit
    pub normal: Vec3,
}

/// Result of a collider query
///
/// `position` and `normal` are only meaningful when `hit` is true; a miss
/// reports zero vectors.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Collision {
    pub hit: bool,
    pub position: Vec3,
    pub normal: Vec3,
}

impl Collision {
    /// The not-hit sentinel
    pub const MISS: Self = Self {
        hit: false,
        position: Vec3::ZERO,
        normal: Vec3::ZERO,
    };

    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            hit: true,
            position,
            normal,
        }
    }
}

impl From<Option<Contact>> for Collision {
    fn from(contact: Option<Contact>) -> Self {
        contact.map_or(Self::MISS, |c| Self::new(c.point, c.normal))
    }
}

impl From<Option<RayHit>> for Collision {
    fn from(hit: Option<RayHit>) -> Self {
        hit.map_or(Self::MISS, |h| Self::new(h.point, h.normal))
    }
}

/// A face crossed by a ray: distance along the ray, axis index and the sign
/// of the face's outward normal along that axis
type FaceCrossing = (f32, usize, f32);

/// Slab test against a box given in its own frame
///
/// Returns the entry and exit crossings. The entry distance is negative when
/// the origin is inside the box.
fn ray_vs_local_box(origin: Vec3, direction: Vec3, half: Vec3) -> Option<(FaceCrossing, FaceCrossing)> {
    let o = [origin.x, origin.y, origin.z];
    let d = [direction.x, direction.y, direction.z];
    let h = [half.x, half.y, half.z];

    let mut enter = (f32::NEG_INFINITY, 0, 0.0);
    let mut exit = (f32::INFINITY, 0, 0.0);

    for i in 0..3 {
        if d[i].abs() < 1e-8 {
            // Parallel to this slab: must already be inside it
            if o[i] < -h[i] || o[i] > h[i] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d[i];
        let mut t0 = (-h[i] - o[i]) * inv;
        let mut t1 = (h[i] - o[i]) * inv;
        // Entering through the -h face when travelling in +d
        let mut sign = -1.0;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            sign = 1.0;
        }
        if t0 > enter.0 {
            enter = (t0, i, sign);
        }
        if t1 < exit.0 {
            exit = (t1, i, -sign);
        }
        if enter.0 > exit.0 {
            return None;
        }
    }

    if exit.0 < 0.0 {
        return None;
    }
    Some((enter, exit))
}

/// Ray vs oriented box
///
/// A ray starting inside the box hits the face it leaves through, with that
/// face's outward normal.
pub fn ray_vs_obb(ray: &Ray, obb: &Obb) -> Option<RayHit> {
    let local_origin = obb.to_local(ray.origin);
    let d = ray.direction;
    let local_dir = Vec3::new(d.dot(obb.axes[0]), d.dot(obb.axes[1]), d.dot(obb.axes[2]));

    let (enter, exit) = ray_vs_local_box(local_origin, local_dir, obb.half_extents)?;
    let (t, axis, sign) = if enter.0 < 0.0 { exit } else { enter };

    Some(RayHit {
        distance: t,
        point: ray.at(t),
        normal: obb.axes[axis] * sign,
    })
}

/// Ray vs axis-aligned box
pub fn ray_vs_aabb(ray: &Ray, aabb: &Aabb) -> Option<RayHit> {
    let obb = Obb {
        center: aabb.center(),
        axes: [Vec3::X, Vec3::Y, Vec3::Z],
        half_extents: aabb.half_extents(),
    };
    ray_vs_obb(ray, &obb)
}

/// Test OBB vs OBB collision with the separating axis theorem
///
/// Tries the 3 face axes of each box and the 9 edge cross products. The
/// axis of least overlap becomes the contact normal.
pub fn obb_vs_obb(a: &Obb, b: &Obb) -> Option<Contact> {
    let between = a.center - b.center;

    let mut axes: Vec<Vec3> = Vec::with_capacity(15);
    axes.extend_from_slice(&a.axes);
    axes.extend_from_slice(&b.axes);
    for ea in a.axes {
        for eb in b.axes {
            let c = ea.cross(eb);
            // Parallel edges give no new axis
            if c.length_squared() > 1e-6 {
                axes.push(c.normalized());
            }
        }
    }

    let mut min_overlap = f32::INFINITY;
    let mut normal = Vec3::Y;

    for axis in axes {
        let ra = a.projected_radius(axis);
        let rb = b.projected_radius(axis);
        let dist = between.dot(axis);
        let overlap = ra + rb - dist.abs();
        if overlap < 0.0 {
            return None;
        }
        if overlap < min_overlap {
            min_overlap = overlap;
            normal = if dist < 0.0 { -axis } else { axis };
        }
    }

    // Deepest feature of `a` toward `b`, pulled onto `b`
    let deepest = support_centroid(a, -normal);
    let point = b.closest_point(deepest);
    Some(Contact::new(point, normal, min_overlap))
}

/// Average of the box corners that are extreme along `direction`
///
/// Gives a face or edge midpoint instead of an arbitrary corner when the
/// box meets something flat on.
fn support_centroid(obb: &Obb, direction: Vec3) -> Vec3 {
    let corners = obb.corners();
    let best = corners
        .iter()
        .map(|c| c.dot(direction))
        .fold(f32::NEG_INFINITY, f32::max);
    let tolerance = 1e-4 * (1.0 + obb.half_extents.max_element());

    let (sum, count) = corners
        .iter()
        .filter(|c| best - c.dot(direction) <= tolerance)
        .fold((Vec3::ZERO, 0), |(sum, n), c| (sum + *c, n + 1));
    if count == 0 {
        obb.support(direction)
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::{mat4, Quat};

    const EPSILON: f32 = 0.001;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    fn unit_box_at(center: Vec3) -> Obb {
        Obb::from_aabb(&Aabb::unit(), mat4::from_translation(center))
    }

    #[test]
    fn test_ray_hits_unit_box_front_face() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let hit = ray_vs_obb(&ray, &unit_box_at(Vec3::new(0.0, 0.0, 5.0))).unwrap();
        assert!((hit.distance - 4.5).abs() < EPSILON, "Expected 4.5, got {}", hit.distance);
        assert!(vec_approx_eq(hit.point, Vec3::new(0.0, 0.0, 4.5)));
        assert!(vec_approx_eq(hit.normal, -Vec3::Z));
    }

    #[test]
    fn test_ray_misses_box_behind() {
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        assert!(ray_vs_obb(&ray, &unit_box_at(Vec3::new(0.0, 0.0, 5.0))).is_none());
    }

    #[test]
    fn test_ray_misses_box_to_the_side() {
        let ray = Ray::new(Vec3::new(2.0, 0.0, 0.0), Vec3::Z);
        assert!(ray_vs_obb(&ray, &unit_box_at(Vec3::new(0.0, 0.0, 5.0))).is_none());
    }

    #[test]
    fn test_ray_from_inside_hits_exit_face() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        let hit = ray_vs_obb(&ray, &unit_box_at(Vec3::new(0.0, 0.0, 5.0))).unwrap();
        assert!((hit.distance - 0.5).abs() < EPSILON, "Expected 0.5, got {}", hit.distance);
        assert!(vec_approx_eq(hit.point, Vec3::new(0.0, 0.0, 5.5)), "Expected exit at z=5.5, got {:?}", hit.point);
        assert!(vec_approx_eq(hit.normal, Vec3::Z), "Expected +Z, got {:?}", hit.normal);

        let back = Ray::new(Vec3::new(0.2, 0.0, 5.0), -Vec3::X);
        let hit = ray_vs_obb(&back, &unit_box_at(Vec3::new(0.0, 0.0, 5.0))).unwrap();
        assert!((hit.distance - 0.7).abs() < EPSILON, "Expected 0.7, got {}", hit.distance);
        assert!(vec_approx_eq(hit.normal, -Vec3::X), "Expected -X, got {:?}", hit.normal);
    }

    #[test]
    fn test_ray_vs_rotated_box() {
        // 45° about Y: the nearest feature along +Z is a vertical edge
        let world = mat4::from_trs(
            Vec3::new(0.0, 0.0, 5.0),
            Quat::from_axis_angle(Vec3::Y, std::f32::consts::FRAC_PI_4),
            Vec3::ONE,
        );
        let obb = Obb::from_aabb(&Aabb::unit(), world);
        let hit = ray_vs_obb(&Ray::new(Vec3::ZERO, Vec3::Z), &obb).unwrap();
        let expected = 5.0 - 0.5 * std::f32::consts::SQRT_2;
        assert!((hit.distance - expected).abs() < EPSILON, "Expected {}, got {}", expected, hit.distance);
    }

    #[test]
    fn test_ray_vs_aabb() {
        let aabb = Aabb::from_center_half_extents(Vec3::new(0.0, 10.0, 0.0), Vec3::splat(1.0));
        let hit = ray_vs_aabb(&Ray::new(Vec3::ZERO, Vec3::Y), &aabb).unwrap();
        assert!((hit.distance - 9.0).abs() < EPSILON);
        assert!(vec_approx_eq(hit.normal, -Vec3::Y));
    }

    #[test]
    fn test_obb_vs_obb_separated() {
        let a = unit_box_at(Vec3::ZERO);
        let b = unit_box_at(Vec3::new(1.5, 0.0, 0.0));
        assert!(obb_vs_obb(&a, &b).is_none());
    }

    #[test]
    fn test_obb_vs_obb_overlapping() {
        let a = unit_box_at(Vec3::ZERO);
        let b = unit_box_at(Vec3::new(0.8, 0.0, 0.0));
        let contact = obb_vs_obb(&a, &b).unwrap();
        assert!((contact.penetration - 0.2).abs() < EPSILON);
        // from b toward a
        assert!(vec_approx_eq(contact.normal, -Vec3::X), "Expected -X, got {:?}", contact.normal);
        assert!(vec_approx_eq(contact.point, Vec3::new(0.5, 0.0, 0.0)), "got {:?}", contact.point);
    }

    #[test]
    fn test_obb_vs_obb_rotated_edge_case() {
        // A diamond-oriented box just out of reach: face axes overlap,
        // the rotated box's own axes separate.
        let a = unit_box_at(Vec3::ZERO);
        let world = mat4::from_trs(
            Vec3::new(1.25, 1.25, 0.0),
            Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_4),
            Vec3::ONE,
        );
        let b = Obb::from_aabb(&Aabb::unit(), world);
        assert!(obb_vs_obb(&a, &b).is_none());
    }

    #[test]
    fn test_collision_from_contact() {
        let miss: Collision = None::<Contact>.into();
        assert_eq!(miss, Collision::MISS);
        let hit: Collision = Some(Contact::new(Vec3::X, Vec3::Y, 0.1)).into();
        assert!(hit.hit);
        assert_eq!(hit.position, Vec3::X);
        assert_eq!(hit.normal, Vec3::Y);
    }
}
