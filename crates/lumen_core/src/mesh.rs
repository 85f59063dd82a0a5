//! Triangle meshes
//!
//! A [`Mesh`] is immutable once built: vertex data, indices, local bounds and
//! an optional diffuse texture. Meshes are shared between models through
//! `Arc<Mesh>`.

use std::path::Path;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use lumen_math::Vec3;
use lumen_physics::Aabb;

use crate::error::ResourceLoadError;
use crate::model::Model;
use crate::resource_cache::{Resource, ResourceId};
use crate::texture::Texture;

/// GPU vertex layout shared by every mesh
///
/// `joints` and `weights` are zero for unskinned geometry.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub joints: [u32; 4],
    pub weights: [f32; 4],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
            ..Default::default()
        }
    }

    /// Attach skinning influences
    pub fn with_skin(mut self, joints: [u32; 4], weights: [f32; 4]) -> Self {
        self.joints = joints;
        self.weights = weights;
        self
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}

/// An indexed triangle mesh
#[derive(Clone, Debug)]
pub struct Mesh {
    id: ResourceId,
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounds: Aabb,
    skinned: bool,
    texture: Option<Arc<Texture>>,
}

impl Mesh {
    /// Build a mesh from raw vertex and index data
    ///
    /// Triangles referencing vertices out of range are dropped, as is a
    /// trailing partial triangle.
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let name = name.into();
        let count = vertices.len() as u32;
        let mut clean = Vec::with_capacity(indices.len());
        let mut dropped = 0;
        for tri in indices.chunks_exact(3) {
            if tri.iter().all(|&i| i < count) {
                clean.extend_from_slice(tri);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 || indices.len() % 3 != 0 {
            log::warn!("Mesh '{}': dropped {} malformed triangles", name, dropped);
        }

        let points: Vec<Vec3> = vertices.iter().map(Vertex::position).collect();
        let bounds = Aabb::from_points(&points).unwrap_or(Aabb::new(Vec3::ZERO, Vec3::ZERO));
        let skinned = vertices.iter().any(|v| v.weights.iter().any(|w| *w > 0.0));

        Self {
            id: ResourceId::next(),
            name,
            vertices,
            indices: clean,
            bounds,
            skinned,
            texture: None,
        }
    }

    /// Builder-style diffuse texture
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Load a model file and merge all of its meshes into one
    ///
    /// The diffuse texture of the first textured sub-mesh is kept.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ResourceLoadError> {
        let path = path.as_ref();
        let model = Model::from_file(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mesh")
            .to_string();
        Ok(Self::merge(name, model.meshes().iter().map(|(_, m)| m.as_ref())))
    }

    /// Concatenate meshes, offsetting indices
    pub fn merge<'a>(name: impl Into<String>, meshes: impl IntoIterator<Item = &'a Mesh>) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let mut texture = None;
        for mesh in meshes {
            let base = vertices.len() as u32;
            vertices.extend_from_slice(&mesh.vertices);
            indices.extend(mesh.indices.iter().map(|i| i + base));
            if texture.is_none() {
                texture = mesh.texture.clone();
            }
        }
        let mut merged = Self::new(name, vertices, indices);
        merged.texture = texture;
        merged
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Local-space bounding box
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// True if any vertex carries joint weights
    pub fn is_skinned(&self) -> bool {
        self.skinned
    }

    pub fn texture(&self) -> Option<&Arc<Texture>> {
        self.texture.as_ref()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned cube centered at the origin
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        // (normal, tangent u, tangent v) per face
        let faces = [
            (Vec3::X, -Vec3::Z, Vec3::Y),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, -Vec3::Z),
            (-Vec3::Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, -Vec3::X, Vec3::Y),
        ];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (normal + u * su + v * sv) * h;
                vertices.push(Vertex::new(p, normal, [(su + 1.0) * 0.5, (1.0 - sv) * 0.5]));
            }
            indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
        }
        Self::new("cube", vertices, indices)
    }

    /// Quad in the XY plane facing -Z (toward a default camera)
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let n = -Vec3::Z;
        let vertices = vec![
            Vertex::new(Vec3::new(-hw, -hh, 0.0), n, [0.0, 1.0]),
            Vertex::new(Vec3::new(hw, -hh, 0.0), n, [1.0, 1.0]),
            Vertex::new(Vec3::new(hw, hh, 0.0), n, [1.0, 0.0]),
            Vertex::new(Vec3::new(-hw, hh, 0.0), n, [0.0, 0.0]),
        ];
        Self::new("quad", vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// UV sphere
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        for r in 0..=rings {
            let v = r as f32 / rings as f32;
            let theta = v * std::f32::consts::PI;
            for s in 0..=segments {
                let u = s as f32 / segments as f32;
                let phi = u * std::f32::consts::TAU;
                let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                vertices.push(Vertex::new(normal * radius, normal, [u, v]));
            }
        }
        let stride = segments + 1;
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
        for r in 0..rings {
            for s in 0..segments {
                let a = r * stride + s;
                let b = a + stride;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        Self::new("sphere", vertices, indices)
    }
}

impl Resource for Mesh {
    fn load_from_file(path: &Path) -> Result<Self, ResourceLoadError> {
        Self::from_file(path)
    }
}

/// Fill in smooth normals by accumulating face normals
///
/// Used by importers when a file carries no normals.
pub(crate) fn generate_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let mut sums = vec![Vec3::ZERO; vertices.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= vertices.len() || b >= vertices.len() || c >= vertices.len() {
            continue;
        }
        let (pa, pb, pc) = (vertices[a].position(), vertices[b].position(), vertices[c].position());
        // Area-weighted. Front faces wind so that the right-hand cross
        // product points into the mesh, hence the swapped operands.
        let face = (pc - pa).cross(pb - pa);
        sums[a] += face;
        sums[b] += face;
        sums[c] += face;
    }
    for (vertex, sum) in vertices.iter_mut().zip(sums) {
        vertex.normal = sum.normalized().to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    #[test]
    fn test_vertex_layout_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 64);
    }

    #[test]
    fn test_cube_counts_and_bounds() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.bounds().min, Vec3::splat(-1.0));
        assert_eq!(cube.bounds().max, Vec3::splat(1.0));
        assert!(!cube.is_skinned());
    }

    /// Front faces: cross(b - a, c - a) points against the vertex normal
    fn assert_front_faces_outward(mesh: &Mesh) {
        for tri in mesh.indices().chunks_exact(3) {
            let v: Vec<_> = tri.iter().map(|&i| mesh.vertices()[i as usize]).collect();
            let face = (v[1].position() - v[0].position()).cross(v[2].position() - v[0].position());
            let normal = Vec3::from(v[0].normal);
            assert!(face.dot(normal) <= 0.0, "Triangle {:?} is wound the other way", tri);
        }
    }

    #[test]
    fn test_primitive_winding() {
        assert_front_faces_outward(&Mesh::cube(1.0));
        assert_front_faces_outward(&Mesh::quad(2.0, 1.0));
        assert_front_faces_outward(&Mesh::sphere(1.0, 8, 6));
    }

    #[test]
    fn test_malformed_triangles_dropped() {
        let vertices = vec![Vertex::default(); 3];
        let mesh = Mesh::new("bad", vertices, vec![0, 1, 2, 0, 1, 7, 2]);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
    }

    #[test]
    fn test_empty_mesh_bounds() {
        let mesh = Mesh::new("empty", Vec::new(), Vec::new());
        assert_eq!(mesh.bounds().size(), Vec3::ZERO);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let a = Mesh::quad(1.0, 1.0);
        let b = Mesh::quad(1.0, 1.0);
        let merged = Mesh::merge("pair", [&a, &b]);
        assert_eq!(merged.vertices().len(), 8);
        assert_eq!(merged.indices()[6], 4);
        assert_ne!(merged.id(), a.id());
    }

    #[test]
    fn test_skinned_flag() {
        let v = Vertex::new(Vec3::ZERO, Vec3::Y, [0.0; 2]).with_skin([1, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]);
        let mesh = Mesh::new("skinned", vec![v; 3], vec![0, 1, 2]);
        assert!(mesh.is_skinned());
    }

    #[test]
    fn test_sphere_radius() {
        let sphere = Mesh::sphere(2.0, 16, 8);
        for v in sphere.vertices() {
            assert!((v.position().length() - 2.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_generate_normals() {
        let mut vertices = vec![
            Vertex::new(Vec3::ZERO, Vec3::ZERO, [0.0; 2]),
            Vertex::new(Vec3::X, Vec3::ZERO, [0.0; 2]),
            Vertex::new(Vec3::Y, Vec3::ZERO, [0.0; 2]),
        ];
        generate_normals(&mut vertices, &[0, 1, 2]);
        for v in &vertices {
            assert!((Vec3::from(v.normal) + Vec3::Z).length() < EPSILON, "got {:?}", v.normal);
        }
    }
}
