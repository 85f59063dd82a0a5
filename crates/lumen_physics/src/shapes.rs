//! Collision shapes
//!
//! These are lightweight world-space primitives used for intersection
//! queries. They carry no simulation state.

use lumen_math::{mat4, Mat4, Vec3};

/// Shapes that can report their furthest point along a direction
///
/// This is all GJK needs to test two convex shapes against each other.
pub trait SupportMap {
    /// Furthest point of the shape in `direction` (need not be normalized)
    fn support(&self, direction: Vec3) -> Vec3;

    /// Any point inside the shape, used to seed searches
    fn center(&self) -> Vec3;
}

/// An axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner (all components are minimums)
    pub min: Vec3,
    /// Maximum corner (all components are maximums)
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::unit()
    }
}

impl Aabb {
    /// Create a new AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a position with given half-extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Create a unit cube centered at the origin
    pub fn unit() -> Self {
        Self::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5))
    }

    /// Smallest box enclosing every point, or `None` for an empty slice
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points.iter().fold((first, first), |(min, max), p| {
            (min.min_components(*p), max.max_components(*p))
        });
        Some(Self { min, max })
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half-extents (half the size in each dimension)
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Get the full size in each dimension
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Radius of the bounding sphere around the center
    pub fn radius(&self) -> f32 {
        self.half_extents().length()
    }

    /// Check if a point is inside or on the AABB
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Smallest box enclosing both
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min_components(other.min),
            max: self.max.max_components(other.max),
        }
    }

    /// The eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }
}

/// An oriented bounding box in world space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb {
    pub center: Vec3,
    /// Orthonormal local axes
    pub axes: [Vec3; 3],
    /// Extent along each local axis
    pub half_extents: Vec3,
}

impl Obb {
    /// Place a local-space box in the world with an affine matrix
    ///
    /// Scale is folded into the half extents. Shear is not representable and
    /// is dropped.
    pub fn from_aabb(aabb: &Aabb, world: Mat4) -> Self {
        let center = mat4::transform_point(world, aabb.center());
        let half = aabb.half_extents();
        let mut axes = [Vec3::X, Vec3::Y, Vec3::Z];
        let mut extents = [half.x, half.y, half.z];

        for (i, axis) in axes.iter_mut().enumerate() {
            let column = Vec3::new(world[i][0], world[i][1], world[i][2]);
            let len = column.length();
            if len > f32::EPSILON {
                *axis = column / len;
                extents[i] *= len;
            } else {
                extents[i] = 0.0;
            }
        }

        Self {
            center,
            axes,
            half_extents: Vec3::new(extents[0], extents[1], extents[2]),
        }
    }

    #[inline]
    fn extent(&self, i: usize) -> f32 {
        match i {
            0 => self.half_extents.x,
            1 => self.half_extents.y,
            _ => self.half_extents.z,
        }
    }

    /// Point expressed in the box's local frame (relative to the center)
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        let d = point - self.center;
        Vec3::new(d.dot(self.axes[0]), d.dot(self.axes[1]), d.dot(self.axes[2]))
    }

    /// Local-frame point back to world space
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.center + self.axes[0] * local.x + self.axes[1] * local.y + self.axes[2] * local.z
    }

    /// Check if a point is inside or on the box
    pub fn contains(&self, point: Vec3) -> bool {
        let local = self.to_local(point);
        (0..3).all(|i| {
            let v = match i {
                0 => local.x,
                1 => local.y,
                _ => local.z,
            };
            v.abs() <= self.extent(i) + 1e-6
        })
    }

    /// Closest point inside or on the box
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let local = self.to_local(point);
        let h = self.half_extents;
        self.to_world(Vec3::new(
            local.x.clamp(-h.x, h.x),
            local.y.clamp(-h.y, h.y),
            local.z.clamp(-h.z, h.z),
        ))
    }

    /// Half-length of the box's shadow on a unit axis
    pub fn projected_radius(&self, axis: Vec3) -> f32 {
        (0..3).map(|i| self.axes[i].dot(axis).abs() * self.extent(i)).sum()
    }

    /// The eight corners in world space
    pub fn corners(&self) -> [Vec3; 8] {
        let h = self.half_extents;
        let mut out = [Vec3::ZERO; 8];
        for (i, corner) in out.iter_mut().enumerate() {
            let sx = if i & 1 == 0 { -h.x } else { h.x };
            let sy = if i & 2 == 0 { -h.y } else { h.y };
            let sz = if i & 4 == 0 { -h.z } else { h.z };
            *corner = self.to_world(Vec3::new(sx, sy, sz));
        }
        out
    }
}

impl SupportMap for Obb {
    fn support(&self, direction: Vec3) -> Vec3 {
        let mut p = self.center;
        for i in 0..3 {
            let sign = if self.axes[i].dot(direction) >= 0.0 { 1.0 } else { -1.0 };
            p += self.axes[i] * (self.extent(i) * sign);
        }
        p
    }

    fn center(&self) -> Vec3 {
        self.center
    }
}

/// A convex shape given by its vertex cloud
///
/// Interior points are harmless: the support function only ever picks
/// extreme vertices, so no explicit hull construction is needed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvexHull {
    pub points: Vec<Vec3>,
}

impl ConvexHull {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    /// Transform every vertex into world space
    pub fn transformed(&self, world: Mat4) -> Self {
        Self {
            points: self.points.iter().map(|p| mat4::transform_point(world, *p)).collect(),
        }
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.points)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl SupportMap for ConvexHull {
    fn support(&self, direction: Vec3) -> Vec3 {
        self.points
            .iter()
            .copied()
            .max_by(|a, b| a.dot(direction).total_cmp(&b.dot(direction)))
            .unwrap_or(Vec3::ZERO)
    }

    fn center(&self) -> Vec3 {
        if self.points.is_empty() {
            return Vec3::ZERO;
        }
        let sum = self.points.iter().fold(Vec3::ZERO, |acc, p| acc + *p);
        sum / self.points.len() as f32
    }
}

/// A half-line from `origin` along a unit `direction`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalized(),
        }
    }

    /// Point at parameter `t` along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
