//! Collision queries for Lumen
//!
//! This crate answers "do these overlap, and where?" for world-space shapes:
//! - Collision shapes (AABBs, oriented boxes, convex point clouds, rays)
//! - Ray casts and box vs box tests using the separating axis theorem
//! - Convex vs convex tests using GJK and EPA
//!
//! There is no dynamics or collision response; callers decide what a hit means.

pub mod collision;
pub mod gjk;
pub mod shapes;

// Re-export commonly used types
pub use collision::{obb_vs_obb, ray_vs_aabb, ray_vs_obb, Collision, Contact, RayHit};
pub use gjk::{convex_vs_convex, gjk_intersects};
pub use shapes::{Aabb, ConvexHull, Obb, Ray, SupportMap};
