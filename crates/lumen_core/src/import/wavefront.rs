//! Wavefront OBJ import through `tobj`

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use lumen_math::Vec3;

use super::mirror_point;
use crate::error::ResourceLoadError;
use crate::mesh::{generate_normals, Mesh, Vertex};
use crate::model::Model;
use crate::texture::Texture;

/// Load every object in an OBJ file as one mesh each
///
/// Diffuse textures named by the companion MTL file are loaded relative to
/// the OBJ. A missing MTL or texture only logs a warning.
pub(crate) fn load(path: &Path) -> Result<Model, ResourceLoadError> {
    // tobj reports open failures without the io::Error; check first
    std::fs::metadata(path).map_err(|e| ResourceLoadError::io(path, e))?;

    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (objects, materials) =
        tobj::load_obj(path, &options).map_err(|e| ResourceLoadError::decode(path, e))?;
    let materials = materials.unwrap_or_else(|e| {
        log::warn!("No materials for {}: {}", path.display(), e);
        Vec::new()
    });

    let base_dir = path.parent().unwrap_or(Path::new("."));
    let mut textures: HashMap<usize, Option<Arc<Texture>>> = HashMap::new();
    let mut meshes = Vec::with_capacity(objects.len());

    for object in objects {
        let data = &object.mesh;
        let vertex_count = data.positions.len() / 3;
        let has_normals = data.normals.len() == data.positions.len();
        let has_uvs = data.texcoords.len() == vertex_count * 2;

        let mut vertices: Vec<Vertex> = (0..vertex_count)
            .map(|i| {
                let p = [data.positions[i * 3], data.positions[i * 3 + 1], data.positions[i * 3 + 2]];
                let normal = if has_normals {
                    mirror_point([data.normals[i * 3], data.normals[i * 3 + 1], data.normals[i * 3 + 2]])
                } else {
                    Vec3::ZERO
                };
                // OBJ puts v = 0 at the bottom of the image
                let uv = if has_uvs {
                    [data.texcoords[i * 2], 1.0 - data.texcoords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                };
                Vertex::new(mirror_point(p), normal, uv)
            })
            .collect();
        if !has_normals {
            generate_normals(&mut vertices, &data.indices);
        }

        let mut mesh = Mesh::new(object.name.clone(), vertices, data.indices.clone());
        if let Some(material_id) = data.material_id {
            let texture = textures
                .entry(material_id)
                .or_insert_with(|| load_diffuse(base_dir, materials.get(material_id)?))
                .clone();
            if let Some(texture) = texture {
                mesh = mesh.with_texture(texture);
            }
        }
        meshes.push(mesh);
    }

    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("model");
    Ok(Model::new(name, meshes, None, Vec::new()))
}

fn load_diffuse(base_dir: &Path, material: &tobj::Material) -> Option<Arc<Texture>> {
    let file = material.diffuse_texture.as_ref()?;
    match Texture::from_file(base_dir.join(file)) {
        Ok(texture) => Some(Arc::new(texture)),
        Err(e) => {
            log::warn!("Material '{}': {}", material.name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const EPSILON: f32 = 0.0001;

    fn write_obj(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("lumen_obj_tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    const TRIANGLE: &str = "\
o tri
v 0.0 0.0 1.0
v 1.0 0.0 1.0
v 0.0 1.0 1.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
f 1/1 2/2 3/3
";

    #[test]
    fn test_load_triangle() {
        let path = write_obj("tri.obj", TRIANGLE);
        let model = load(&path).unwrap();
        assert_eq!(model.meshes().len(), 1);

        let (name, mesh) = &model.meshes()[0];
        assert_eq!(name, "tri");
        assert_eq!(mesh.triangle_count(), 1);
        // Z mirrored, V flipped
        assert_eq!(mesh.vertices()[0].position, [0.0, 0.0, -1.0]);
        assert_eq!(mesh.vertices()[0].uv, [0.0, 1.0]);
        assert!(mesh.texture().is_none());
    }

    #[test]
    fn test_missing_normals_generated() {
        let path = write_obj("tri_normals.obj", TRIANGLE);
        let model = load(&path).unwrap();
        let normal = Vec3::from(model.meshes()[0].1.vertices()[0].normal);
        assert!((normal.length() - 1.0).abs() < EPSILON, "got {:?}", normal);
        // A CCW triangle facing +Z in the file faces -Z once mirrored
        assert!((normal - (-Vec3::Z)).length() < EPSILON, "got {:?}", normal);
    }

    #[test]
    fn test_quads_triangulated() {
        let path = write_obj(
            "quad.obj",
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n",
        );
        let model = load(&path).unwrap();
        assert_eq!(model.meshes()[0].1.triangle_count(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = load(Path::new("/nowhere/model.obj")).unwrap_err();
        assert!(matches!(err, ResourceLoadError::Io { .. }), "Expected Io, got {:?}", err);
    }
}
