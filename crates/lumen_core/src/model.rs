//! Models: named meshes plus optional skeleton and animations

use std::path::Path;
use std::sync::Arc;

use lumen_math::Vec3;
use lumen_physics::Aabb;

use crate::animation::{AnimationClip, Skeleton};
use crate::error::{extension, ResourceLoadError};
use crate::import::{gltf_loader, wavefront};
use crate::mesh::Mesh;
use crate::resource_cache::{Resource, ResourceId};

/// A drawable asset made of one or more meshes
#[derive(Clone, Debug)]
pub struct Model {
    id: ResourceId,
    name: String,
    meshes: Vec<(String, Arc<Mesh>)>,
    skeleton: Option<Skeleton>,
    animations: Vec<AnimationClip>,
    bounds: Aabb,
}

impl Model {
    pub fn new(
        name: impl Into<String>,
        meshes: Vec<Mesh>,
        skeleton: Option<Skeleton>,
        animations: Vec<AnimationClip>,
    ) -> Self {
        let meshes: Vec<(String, Arc<Mesh>)> = meshes
            .into_iter()
            .map(|m| (m.name().to_string(), Arc::new(m)))
            .collect();
        let bounds = meshes
            .iter()
            .map(|(_, m)| m.bounds())
            .reduce(|a, b| a.union(&b))
            .unwrap_or(Aabb::new(Vec3::ZERO, Vec3::ZERO));
        Self {
            id: ResourceId::next(),
            name: name.into(),
            meshes,
            skeleton,
            animations,
            bounds,
        }
    }

    /// A model wrapping a single mesh
    pub fn from_mesh(mesh: Mesh) -> Self {
        let name = mesh.name().to_string();
        Self::new(name, vec![mesh], None, Vec::new())
    }

    /// Import a model, picking the importer from the file extension
    ///
    /// Supports `.obj`, `.gltf` and `.glb`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ResourceLoadError> {
        let path = path.as_ref();
        match extension(path).as_deref() {
            Some("obj") => wavefront::load(path),
            Some("gltf") | Some("glb") => gltf_loader::load(path),
            _ => Err(ResourceLoadError::unsupported(path)),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meshes(&self) -> &[(String, Arc<Mesh>)] {
        &self.meshes
    }

    pub fn mesh(&self, name: &str) -> Option<&Arc<Mesh>> {
        self.meshes.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.skeleton.as_ref()
    }

    pub fn animations(&self) -> &[AnimationClip] {
        &self.animations
    }

    pub fn animation(&self, name: &str) -> Option<&AnimationClip> {
        self.animations.iter().find(|a| a.name() == name)
    }

    /// Union of mesh bounds in model space, at the bind pose
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }
}

impl Resource for Model {
    fn load_from_file(path: &Path) -> Result<Self, ResourceLoadError> {
        Self::from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mesh() {
        let model = Model::from_mesh(Mesh::cube(2.0));
        assert_eq!(model.name(), "cube");
        assert!(model.mesh("cube").is_some());
        assert_eq!(model.bounds().max, Vec3::splat(1.0));
        assert!(model.animation("walk").is_none());
    }

    #[test]
    fn test_bounds_union() {
        let model = Model::new("pair", vec![Mesh::cube(2.0), Mesh::sphere(3.0, 8, 4)], None, Vec::new());
        assert_eq!(model.meshes().len(), 2);
        assert!((model.bounds().max.x - 3.0).abs() < 0.001);
        assert!((model.bounds().min.y + 3.0).abs() < 0.001);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Model::from_file("scene.fbx").unwrap_err();
        assert!(matches!(err, ResourceLoadError::UnsupportedFormat(_)), "got {:?}", err);
    }
}
