//! Colliders attached to 3D objects, and rays cast against them
//!
//! A collider stores only its shape and an offset from the object that owns
//! it. Every query places it in the world from the owner's current
//! transform, so results always reflect the latest positions and nothing is
//! cached between calls.

use lumen_math::{mat4, Mat4, Quat, Vec3};
use lumen_physics::{
    convex_vs_convex, gjk_intersects, obb_vs_obb, ray_vs_obb, Aabb, Collision, Contact, ConvexHull, Obb, Ray,
    RayHit, SupportMap,
};

use crate::mesh::Mesh;
use crate::model::Model;
use crate::object3d::Object3D;
use crate::transform::Transform;

/// An oriented box, given in the owner's local space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxCollider {
    pub offset: Transform,
    pub bounds: Aabb,
}

impl BoxCollider {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            offset: Transform::identity(),
            bounds,
        }
    }

    pub fn with_offset(mut self, offset: Transform) -> Self {
        self.offset = offset;
        self
    }
}

/// A convex point cloud, given in the owner's local space
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexCollider {
    pub offset: Transform,
    pub hull: ConvexHull,
}

impl ConvexCollider {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            offset: Transform::identity(),
            hull: ConvexHull::new(points),
        }
    }

    /// Hull of a mesh's vertices
    pub fn from_mesh(mesh: &Mesh) -> Self {
        Self::new(mesh.vertices().iter().map(|v| v.position()).collect())
    }

    /// Hull of every vertex in a model
    pub fn from_model(model: &Model) -> Self {
        Self::new(
            model
                .meshes()
                .iter()
                .flat_map(|(_, mesh)| mesh.vertices().iter().map(|v| v.position()))
                .collect(),
        )
    }

    pub fn with_offset(mut self, offset: Transform) -> Self {
        self.offset = offset;
        self
    }
}

/// A collider shape owned by an [`Object3D`]
#[derive(Clone, Debug, PartialEq)]
pub enum Collider {
    Box(BoxCollider),
    Convex(ConvexCollider),
}

/// A collider placed in world space for one query
#[derive(Clone, Debug)]
pub enum WorldShape {
    Box(Obb),
    /// The hull and its oriented bounds
    Convex(ConvexHull, Obb),
}

impl WorldShape {
    fn support_map(&self) -> &dyn SupportMap {
        match self {
            Self::Box(obb) => obb,
            Self::Convex(hull, _) => hull,
        }
    }

    /// Overlap test; the contact normal points from `other` toward `self`
    pub fn intersect(&self, other: &WorldShape) -> Option<Contact> {
        match (self, other) {
            (Self::Box(a), Self::Box(b)) => obb_vs_obb(a, b),
            (Self::Convex(hull, _), _) if hull.is_empty() => None,
            (_, Self::Convex(hull, _)) if hull.is_empty() => None,
            _ => convex_vs_convex(self.support_map(), other.support_map()),
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        match self {
            Self::Box(obb) => obb.contains(point),
            Self::Convex(hull, _) if hull.is_empty() => false,
            Self::Convex(hull, _) => gjk_intersects(hull, &ConvexHull::new(vec![point])),
        }
    }

    /// Ray test against the box, or against a convex hull's oriented bounds
    pub fn raycast(&self, ray: &Ray) -> Option<RayHit> {
        match self {
            Self::Box(obb) | Self::Convex(_, obb) => ray_vs_obb(ray, obb),
        }
    }
}

impl Collider {
    /// Box collider covering a model's bind-pose bounds
    pub fn bounding_box(model: &Model) -> Self {
        Self::Box(BoxCollider::new(model.bounds()))
    }

    fn world_matrix(&self, owner: &Transform) -> Mat4 {
        let offset = match self {
            Self::Box(b) => &b.offset,
            Self::Convex(c) => &c.offset,
        };
        mat4::mul(owner.matrix(), offset.matrix())
    }

    /// Place the collider in the world using its owner's transform
    pub fn world_shape(&self, owner: &Transform) -> WorldShape {
        let world = self.world_matrix(owner);
        match self {
            Self::Box(b) => WorldShape::Box(Obb::from_aabb(&b.bounds, world)),
            Self::Convex(c) => {
                let local_bounds = c.hull.bounds().unwrap_or(Aabb::new(Vec3::ZERO, Vec3::ZERO));
                WorldShape::Convex(c.hull.transformed(world), Obb::from_aabb(&local_bounds, world))
            }
        }
    }

    /// Test against every collision shape of `target`; the first overlap wins
    ///
    /// The normal points from the target toward this collider.
    pub fn get_collision(&self, owner: &Transform, target: &Object3D) -> Collision {
        let shape = self.world_shape(owner);
        target
            .collision_shapes()
            .iter()
            .find_map(|other| shape.intersect(other))
            .into()
    }

    pub fn contains_point(&self, owner: &Transform, point: Vec3) -> bool {
        self.world_shape(owner).contains(point)
    }
}

/// A ray in world space
///
/// The direction is stored as a rotation whose forward axis (`+Z`) is the
/// ray direction, so rays can be aimed like any other entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayCollider {
    pub origin: Vec3,
    pub direction: Quat,
    /// Hits further than this are ignored
    pub max_distance: f32,
}

impl RayCollider {
    pub fn new(origin: Vec3, direction: Quat) -> Self {
        Self {
            origin,
            direction,
            max_distance: f32::INFINITY,
        }
    }

    /// A ray along a direction vector
    pub fn towards(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, Quat::from_unit(direction))
    }

    pub fn ray(&self) -> Ray {
        Ray::new(self.origin, self.direction.forward())
    }

    /// Nearest hit against any of `target`'s collision shapes
    pub fn raycast(&self, target: &Object3D) -> Option<RayHit> {
        let ray = self.ray();
        target
            .collision_shapes()
            .iter()
            .filter_map(|shape| shape.raycast(&ray))
            .filter(|hit| hit.distance <= self.max_distance)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    pub fn get_collision(&self, target: &Object3D) -> Collision {
        self.raycast(target).into()
    }

    /// Closest object hit among `targets`, with its index
    pub fn nearest<'a>(&self, targets: impl IntoIterator<Item = &'a Object3D>) -> Option<(usize, RayHit)> {
        targets
            .into_iter()
            .enumerate()
            .filter_map(|(i, target)| self.raycast(target).map(|hit| (i, hit)))
            .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))
    }
}
