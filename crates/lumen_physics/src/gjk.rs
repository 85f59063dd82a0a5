//! Convex vs convex intersection (GJK) with penetration recovery (EPA)
//!
//! GJK walks the Minkowski difference `A - B` looking for a simplex that
//! encloses the origin. When it finds one, EPA grows that simplex into a
//! polytope until its closest face to the origin stops moving; that face
//! gives the contact normal and depth.

use crate::collision::Contact;
use crate::shapes::SupportMap;
use lumen_math::Vec3;

const MAX_GJK_ITERATIONS: usize = 64;
const MAX_EPA_ITERATIONS: usize = 64;
const EPA_TOLERANCE: f32 = 1e-4;

/// A vertex of the Minkowski difference, remembering which point of `A`
/// produced it so the contact can be mapped back onto the shape
#[derive(Clone, Copy, Debug)]
struct SupportPoint {
    point: Vec3,
    on_a: Vec3,
}

fn support<A: SupportMap + ?Sized, B: SupportMap + ?Sized>(a: &A, b: &B, direction: Vec3) -> SupportPoint {
    let on_a = a.support(direction);
    let on_b = b.support(-direction);
    SupportPoint {
        point: on_a - on_b,
        on_a,
    }
}

/// True when `a` and `b` overlap (touching counts)
pub fn gjk_intersects<A: SupportMap + ?Sized, B: SupportMap + ?Sized>(a: &A, b: &B) -> bool {
    gjk(a, b).is_some()
}

/// Full test returning a contact for overlapping shapes
pub fn convex_vs_convex<A: SupportMap + ?Sized, B: SupportMap + ?Sized>(a: &A, b: &B) -> Option<Contact> {
    let simplex = gjk(a, b)?;
    Some(epa(a, b, simplex).unwrap_or_else(|| fallback_contact(a, b)))
}

fn gjk<A: SupportMap + ?Sized, B: SupportMap + ?Sized>(a: &A, b: &B) -> Option<Vec<SupportPoint>> {
    let mut direction = a.center() - b.center();
    if direction.length_squared() < 1e-12 {
        direction = Vec3::X;
    }

    let mut simplex = Vec::with_capacity(4);
    let first = support(a, b, direction);
    simplex.push(first);
    direction = -first.point;

    for _ in 0..MAX_GJK_ITERATIONS {
        if direction.length_squared() < 1e-12 {
            // Origin lies on the current simplex
            return Some(simplex);
        }
        let p = support(a, b, direction);
        if p.point.dot(direction) < 0.0 {
            return None;
        }
        simplex.push(p);
        if next_simplex(&mut simplex, &mut direction) {
            return Some(simplex);
        }
    }
    None
}

/// Reduce the simplex to the feature nearest the origin and pick the next
/// search direction. Returns true once the origin is enclosed.
fn next_simplex(simplex: &mut Vec<SupportPoint>, direction: &mut Vec3) -> bool {
    match simplex.len() {
        2 => line_case(simplex, direction),
        3 => triangle_case(simplex, direction),
        4 => tetrahedron_case(simplex, direction),
        _ => false,
    }
}

fn line_case(simplex: &mut Vec<SupportPoint>, direction: &mut Vec3) -> bool {
    let a = simplex[1];
    let b = simplex[0];
    let ab = b.point - a.point;
    let ao = -a.point;

    if ab.dot(ao) > 0.0 {
        let perp = ab.cross(ao).cross(ab);
        if perp.length_squared() < 1e-12 {
            // Origin sits on the segment
            return true;
        }
        *direction = perp;
    } else {
        simplex.clear();
        simplex.push(a);
        *direction = ao;
    }
    false
}

fn triangle_case(simplex: &mut Vec<SupportPoint>, direction: &mut Vec3) -> bool {
    let a = simplex[2];
    let b = simplex[1];
    let c = simplex[0];
    let ab = b.point - a.point;
    let ac = c.point - a.point;
    let ao = -a.point;
    let abc = ab.cross(ac);

    if abc.cross(ac).dot(ao) > 0.0 {
        if ac.dot(ao) > 0.0 {
            *simplex = vec![c, a];
            *direction = ac.cross(ao).cross(ac);
            return direction.length_squared() < 1e-12;
        }
        *simplex = vec![b, a];
        return line_case(simplex, direction);
    }
    if ab.cross(abc).dot(ao) > 0.0 {
        *simplex = vec![b, a];
        return line_case(simplex, direction);
    }

    let side = abc.dot(ao);
    if side.abs() < 1e-10 {
        // Origin is inside the triangle
        return true;
    }
    if side > 0.0 {
        *direction = abc;
    } else {
        *simplex = vec![b, c, a];
        *direction = -abc;
    }
    false
}

fn tetrahedron_case(simplex: &mut Vec<SupportPoint>, direction: &mut Vec3) -> bool {
    let a = simplex[3];
    let b = simplex[2];
    let c = simplex[1];
    let d = simplex[0];
    let ao = -a.point;

    // Faces touching the newest vertex, each with the vertex left out
    let faces = [(b, c, d), (c, d, b), (d, b, c)];
    for (p, q, opposite) in faces {
        let mut n = (p.point - a.point).cross(q.point - a.point);
        if n.dot(opposite.point - a.point) > 0.0 {
            n = -n;
        }
        if n.dot(ao) > 0.0 {
            *simplex = vec![q, p, a];
            return triangle_case(simplex, direction);
        }
    }
    true
}

/// Face of the EPA polytope, indices into the vertex list
#[derive(Clone, Copy)]
struct Face {
    indices: [usize; 3],
    normal: Vec3,
    distance: f32,
}

fn make_face(vertices: &[SupportPoint], i: usize, j: usize, k: usize) -> Option<Face> {
    let (a, b, c) = (vertices[i].point, vertices[j].point, vertices[k].point);
    let n = (b - a).cross(c - a);
    let len = n.length();
    if len < 1e-10 {
        return None;
    }
    let normal = n / len;
    Some(Face {
        indices: [i, j, k],
        normal,
        distance: normal.dot(a),
    })
}

/// Grow a degenerate GJK simplex into a tetrahedron around the origin
fn complete_simplex<A: SupportMap + ?Sized, B: SupportMap + ?Sized>(
    a: &A,
    b: &B,
    mut simplex: Vec<SupportPoint>,
) -> Option<Vec<SupportPoint>> {
    const SEARCH: [Vec3; 6] = [
        Vec3::X,
        Vec3::Y,
        Vec3::Z,
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(0.0, 0.0, -1.0),
    ];

    while simplex.len() < 4 {
        let candidate = match simplex.len() {
            3 => {
                let n = (simplex[1].point - simplex[0].point).cross(simplex[2].point - simplex[0].point);
                let p = support(a, b, n);
                if (p.point - simplex[0].point).dot(n).abs() > 1e-6 {
                    Some(p)
                } else {
                    let q = support(a, b, -n);
                    ((q.point - simplex[0].point).dot(n).abs() > 1e-6).then_some(q)
                }
            }
            _ => SEARCH.iter().map(|d| support(a, b, *d)).find(|p| {
                match simplex.len() {
                    1 => (p.point - simplex[0].point).length_squared() > 1e-10,
                    _ => {
                        let ab = simplex[1].point - simplex[0].point;
                        ab.cross(p.point - simplex[0].point).length_squared() > 1e-10
                    }
                }
            }),
        };
        simplex.push(candidate?);
    }
    Some(simplex)
}

fn epa<A: SupportMap + ?Sized, B: SupportMap + ?Sized>(a: &A, b: &B, simplex: Vec<SupportPoint>) -> Option<Contact> {
    let mut vertices = complete_simplex(a, b, simplex)?;

    let centroid = vertices.iter().fold(Vec3::ZERO, |acc, v| acc + v.point) / 4.0;
    let mut faces = Vec::with_capacity(16);
    for (i, j, k) in [(0, 1, 2), (0, 3, 1), (0, 2, 3), (1, 3, 2)] {
        let mut face = make_face(&vertices, i, j, k)?;
        // Wind every face so its normal points away from the interior
        if face.normal.dot(vertices[i].point - centroid) < 0.0 {
            face = make_face(&vertices, i, k, j)?;
        }
        faces.push(face);
    }

    for _ in 0..MAX_EPA_ITERATIONS {
        let closest = *faces
            .iter()
            .min_by(|x, y| x.distance.total_cmp(&y.distance))?;

        let p = support(a, b, closest.normal);
        let gain = p.point.dot(closest.normal) - closest.distance;
        if gain < EPA_TOLERANCE {
            return Some(contact_from_face(&vertices, &closest));
        }

        // Remove every face the new point can see, keeping the horizon
        let mut horizon: Vec<(usize, usize)> = Vec::new();
        faces.retain(|face| {
            let origin = vertices[face.indices[0]].point;
            if face.normal.dot(p.point - origin) > 0.0 {
                for (s, e) in [
                    (face.indices[0], face.indices[1]),
                    (face.indices[1], face.indices[2]),
                    (face.indices[2], face.indices[0]),
                ] {
                    if let Some(pos) = horizon.iter().position(|&(hs, he)| hs == e && he == s) {
                        horizon.swap_remove(pos);
                    } else {
                        horizon.push((s, e));
                    }
                }
                false
            } else {
                true
            }
        });

        let new_index = vertices.len();
        vertices.push(p);
        for (s, e) in horizon {
            if let Some(face) = make_face(&vertices, s, e, new_index) {
                faces.push(face);
            }
        }
        if faces.is_empty() {
            return None;
        }
    }

    // Out of iterations: report the best face found so far
    let closest = faces.iter().min_by(|x, y| x.distance.total_cmp(&y.distance))?;
    Some(contact_from_face(&vertices, closest))
}

fn contact_from_face(vertices: &[SupportPoint], face: &Face) -> Contact {
    let [i, j, k] = face.indices;
    let projected = face.normal * face.distance;
    let (u, v, w) = barycentric(projected, vertices[i].point, vertices[j].point, vertices[k].point);
    let point = vertices[i].on_a * u + vertices[j].on_a * v + vertices[k].on_a * w;
    // A moves along -normal to separate, so B pushes A toward -normal
    Contact::new(point, -face.normal, face.distance.max(0.0))
}

fn barycentric(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> (f32, f32, f32) {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-12 {
        return (1.0, 0.0, 0.0);
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    (1.0 - v - w, v, w)
}

/// Contact for touching or flat shapes where EPA has no volume to work with
fn fallback_contact<A: SupportMap + ?Sized, B: SupportMap + ?Sized>(a: &A, b: &B) -> Contact {
    let normal = (a.center() - b.center()).normalized();
    let normal = if normal == Vec3::ZERO { Vec3::Y } else { normal };
    Contact::new(a.support(-normal), normal, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Aabb, ConvexHull, Obb};
    use lumen_math::mat4;

    const EPSILON: f32 = 0.01;

    fn cube(center: Vec3, half: f32) -> ConvexHull {
        let aabb = Aabb::from_center_half_extents(center, Vec3::splat(half));
        ConvexHull::new(aabb.corners().to_vec())
    }

    fn tetrahedron(offset: Vec3) -> ConvexHull {
        ConvexHull::new(vec![
            offset,
            offset + Vec3::X,
            offset + Vec3::Y,
            offset + Vec3::Z,
        ])
    }

    #[test]
    fn test_separated_cubes() {
        let a = cube(Vec3::ZERO, 0.5);
        let b = cube(Vec3::new(3.0, 0.0, 0.0), 0.5);
        assert!(!gjk_intersects(&a, &b));
        assert!(convex_vs_convex(&a, &b).is_none());
    }

    #[test]
    fn test_overlapping_cubes_depth_and_normal() {
        let a = cube(Vec3::ZERO, 0.5);
        let b = cube(Vec3::new(0.7, 0.0, 0.0), 0.5);
        let contact = convex_vs_convex(&a, &b).unwrap();
        assert!((contact.penetration - 0.3).abs() < EPSILON, "Expected 0.3, got {}", contact.penetration);
        assert!((contact.normal - (-Vec3::X)).length() < EPSILON, "Expected -X, got {:?}", contact.normal);
    }

    #[test]
    fn test_contained_shape_intersects() {
        let outer = cube(Vec3::ZERO, 2.0);
        let inner = cube(Vec3::new(0.1, 0.2, -0.1), 0.25);
        assert!(gjk_intersects(&outer, &inner));
        assert!(convex_vs_convex(&outer, &inner).is_some());
    }

    #[test]
    fn test_tetrahedra() {
        let a = tetrahedron(Vec3::ZERO);
        let near = tetrahedron(Vec3::splat(0.2));
        let far = tetrahedron(Vec3::splat(0.5));
        assert!(gjk_intersects(&a, &near));
        // (0.5,0.5,0.5) lies beyond the x+y+z=1 face
        assert!(!gjk_intersects(&a, &far));
    }

    #[test]
    fn test_hull_vs_obb_agree_with_sat() {
        let hull = cube(Vec3::new(0.0, 0.9, 0.0), 0.5);
        let obb = Obb::from_aabb(&Aabb::unit(), mat4::IDENTITY);
        let contact = convex_vs_convex(&hull, &obb).unwrap();
        assert!((contact.penetration - 0.1).abs() < EPSILON);
        assert!((contact.normal - Vec3::Y).length() < EPSILON, "Expected +Y, got {:?}", contact.normal);
    }

    #[test]
    fn test_flat_hulls_do_not_panic() {
        let a = ConvexHull::new(vec![Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::new(1.0, 0.0, 1.0)]);
        let b = ConvexHull::new(vec![Vec3::new(0.5, 0.0, 0.5), Vec3::new(1.5, 0.0, 0.5), Vec3::new(0.5, 0.0, 1.5)]);
        // Coplanar overlap: reported as a hit, contact may be zero-depth
        if let Some(contact) = convex_vs_convex(&a, &b) {
            assert!(contact.penetration >= 0.0);
            assert!(!contact.normal.x.is_nan());
        }
    }
}
