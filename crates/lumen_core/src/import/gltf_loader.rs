//! glTF 2.0 import (`.gltf` with external or embedded buffers, and `.glb`)
//!
//! Static meshes are baked into model space using their node transforms.
//! Skinned meshes stay in bind space and bring the first skin of the file
//! along as the model's [`Skeleton`]; animation channels that target joints
//! become [`AnimationClip`]s.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use gltf::animation::util::ReadOutputs;
use lumen_math::{mat4, Mat4, Vec3};

use super::{mirror_matrix, mirror_point, mirror_rotation};
use crate::animation::{AnimationClip, Interpolation, Joint, JointTrack, Keyframes, Skeleton};
use crate::error::ResourceLoadError;
use crate::mesh::{generate_normals, Mesh, Vertex};
use crate::model::Model;
use crate::texture::Texture;
use crate::transform::Transform;

pub(crate) fn load(path: &Path) -> Result<Model, ResourceLoadError> {
    let (document, buffers, images) = gltf::import(path).map_err(|e| match e {
        gltf::Error::Io(io) => ResourceLoadError::io(path, io),
        other => ResourceLoadError::decode(path, other),
    })?;

    let nodes = NodeGraph::new(&document);
    let skin = document.skins().next();
    if document.skins().len() > 1 {
        log::warn!("{}: only the first of {} skins is used", path.display(), document.skins().len());
    }

    let mut textures: HashMap<usize, Option<Arc<Texture>>> = HashMap::new();
    let mut meshes = Vec::new();

    for node in document.nodes() {
        let Some(gltf_mesh) = node.mesh() else {
            continue;
        };
        let skinned = node.skin().is_some();
        let world = nodes.global(node.index());
        let base_name = node
            .name()
            .or_else(|| gltf_mesh.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh{}", gltf_mesh.index()));
        let primitive_count = gltf_mesh.primitives().len();

        for primitive in gltf_mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("{}: skipping non-triangle primitive in '{}'", path.display(), base_name);
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };

            let mut vertices: Vec<Vertex> = positions
                .map(|p| Vertex::new(mirror_point(p), Vec3::ZERO, [0.0, 0.0]))
                .collect();
            let has_normals = if let Some(normals) = reader.read_normals() {
                for (v, n) in vertices.iter_mut().zip(normals) {
                    v.normal = mirror_point(n).to_array();
                }
                true
            } else {
                false
            };
            if let Some(uvs) = reader.read_tex_coords(0) {
                for (v, uv) in vertices.iter_mut().zip(uvs.into_f32()) {
                    v.uv = uv;
                }
            }
            if skinned {
                if let (Some(joints), Some(weights)) = (reader.read_joints(0), reader.read_weights(0)) {
                    for ((v, j), w) in vertices.iter_mut().zip(joints.into_u16()).zip(weights.into_f32()) {
                        v.joints = j.map(u32::from);
                        v.weights = w;
                    }
                }
            } else if world != mat4::IDENTITY {
                let normal_matrix = mat4::normal_matrix(world);
                for v in vertices.iter_mut() {
                    v.position = mat4::transform_point(world, v.position()).to_array();
                    v.normal = mat4::transform_vector(normal_matrix, Vec3::from(v.normal))
                        .normalized()
                        .to_array();
                }
            }

            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };
            if !has_normals {
                generate_normals(&mut vertices, &indices);
            }

            let name = if primitive_count > 1 {
                format!("{}.{}", base_name, primitive.index())
            } else {
                base_name.clone()
            };
            let mut mesh = Mesh::new(name, vertices, indices);

            let image_index = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_texture()
                .map(|info| info.texture().source().index());
            if let Some(index) = image_index {
                let texture = textures
                    .entry(index)
                    .or_insert_with(|| images.get(index).and_then(convert_image))
                    .clone();
                if let Some(texture) = texture {
                    mesh = mesh.with_texture(texture);
                }
            }
            meshes.push(mesh);
        }
    }

    let (skeleton, animations) = match skin {
        Some(skin) => {
            let (skeleton, joint_of_node) = build_skeleton(&skin, &nodes, &buffers);
            let clips = document
                .animations()
                .map(|animation| build_clip(&animation, &joint_of_node, &buffers))
                .collect();
            (Some(skeleton), clips)
        }
        None => (None, Vec::new()),
    };

    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("model");
    Ok(Model::new(name, meshes, skeleton, animations))
}

/// Parent links and mirrored local transforms of every node
struct NodeGraph {
    parents: Vec<Option<usize>>,
    locals: Vec<Transform>,
}

impl NodeGraph {
    fn new(document: &gltf::Document) -> Self {
        let count = document.nodes().len();
        let mut parents = vec![None; count];
        let mut locals = vec![Transform::identity(); count];
        for node in document.nodes() {
            for child in node.children() {
                parents[child.index()] = Some(node.index());
            }
            let (translation, rotation, scale) = node.transform().decomposed();
            locals[node.index()] = Transform {
                position: mirror_point(translation),
                rotation: mirror_rotation(rotation),
                scale: Vec3::from(scale),
            };
        }
        Self { parents, locals }
    }

    fn global(&self, index: usize) -> Mat4 {
        let mut m = self.locals[index].matrix();
        let mut current = self.parents[index];
        // glTF node graphs are trees; the bound guards malformed files
        for _ in 0..self.parents.len() {
            let Some(parent) = current else {
                break;
            };
            m = mat4::mul(self.locals[parent].matrix(), m);
            current = self.parents[parent];
        }
        m
    }
}

fn build_skeleton(
    skin: &gltf::Skin,
    nodes: &NodeGraph,
    buffers: &[gltf::buffer::Data],
) -> (Skeleton, HashMap<usize, usize>) {
    let joint_nodes: Vec<usize> = skin.joints().map(|n| n.index()).collect();
    let joint_of_node: HashMap<usize, usize> = joint_nodes
        .iter()
        .enumerate()
        .map(|(joint, &node)| (node, joint))
        .collect();

    let reader = skin.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
    let inverse_binds: Vec<Mat4> = reader
        .read_inverse_bind_matrices()
        .map(|it| it.map(mirror_matrix).collect())
        .unwrap_or_default();

    // Nearest ancestor that is itself a joint
    let joint_parent = |node: usize| {
        let mut current = nodes.parents[node];
        while let Some(n) = current {
            if let Some(&joint) = joint_of_node.get(&n) {
                return Some(joint);
            }
            current = nodes.parents[n];
        }
        None
    };

    let joints: Vec<Joint> = skin
        .joints()
        .enumerate()
        .map(|(i, node)| Joint {
            name: node.name().map(str::to_string).unwrap_or_else(|| format!("joint{}", i)),
            parent: joint_parent(node.index()),
            rest: nodes.locals[node.index()],
            inverse_bind: inverse_binds.get(i).copied().unwrap_or(mat4::IDENTITY),
        })
        .collect();

    // Non-joint ancestors above the first root joint
    let root = joint_nodes
        .iter()
        .find(|&&node| joint_parent(node).is_none())
        .and_then(|&node| nodes.parents[node])
        .map_or(mat4::IDENTITY, |parent| nodes.global(parent));

    (Skeleton::new(joints, root), joint_of_node)
}

fn build_clip(
    animation: &gltf::Animation,
    joint_of_node: &HashMap<usize, usize>,
    buffers: &[gltf::buffer::Data],
) -> AnimationClip {
    let mut tracks: HashMap<usize, JointTrack> = HashMap::new();

    for channel in animation.channels() {
        let Some(&joint) = joint_of_node.get(&channel.target().node().index()) else {
            continue;
        };
        let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
        let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs()) else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();
        let (interpolation, cubic) = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Step => (Interpolation::Step, false),
            gltf::animation::Interpolation::Linear => (Interpolation::Linear, false),
            gltf::animation::Interpolation::CubicSpline => (Interpolation::Linear, true),
        };

        let track = tracks.entry(joint).or_default();
        match outputs {
            ReadOutputs::Translations(values) => {
                let values = spline_values(values.map(mirror_point).collect(), cubic);
                track.translations = Keyframes::new(times, values, interpolation);
            }
            ReadOutputs::Rotations(values) => {
                let values = spline_values(values.into_f32().map(mirror_rotation).collect(), cubic);
                track.rotations = Keyframes::new(times, values, interpolation);
            }
            ReadOutputs::Scales(values) => {
                let values = spline_values(values.map(Vec3::from).collect(), cubic);
                track.scales = Keyframes::new(times, values, interpolation);
            }
            ReadOutputs::MorphTargetWeights(_) => {}
        }
    }

    let name = animation
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("animation{}", animation.index()));
    AnimationClip::new(name, tracks)
}

/// Cubic spline samplers store (in-tangent, value, out-tangent) triples;
/// keep the values and play them back linearly.
fn spline_values<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.chunks_exact(3).map(|triple| triple[1]).collect()
    } else {
        values
    }
}

fn convert_image(image: &gltf::image::Data) -> Option<Arc<Texture>> {
    use gltf::image::Format;

    let pixels: Vec<u8> = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => image
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => image.pixels.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        other => {
            log::warn!("Unsupported glTF image format {:?}", other);
            return None;
        }
    };
    Some(Arc::new(Texture::from_rgba8(image.width, image.height, pixels)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const EPSILON: f32 = 0.0001;

    /// A single triangle, placed by its node 2 units along the file's +Z
    fn write_triangle_gltf() -> PathBuf {
        let dir = std::env::temp_dir().join("lumen_gltf_tests");
        std::fs::create_dir_all(&dir).unwrap();

        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        std::fs::write(dir.join("tri.bin"), bytemuck::cast_slice(&positions)).unwrap();

        let json = r#"{
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [ { "nodes": [0] } ],
            "nodes": [ { "name": "tri", "mesh": 0, "translation": [0.0, 0.0, 2.0] } ],
            "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 } } ] } ],
            "accessors": [ {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            } ],
            "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
            "buffers": [ { "byteLength": 36, "uri": "tri.bin" } ]
        }"#;
        let path = dir.join("tri.gltf");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_static_mesh_baked_and_mirrored() {
        let model = load(&write_triangle_gltf()).unwrap();
        assert_eq!(model.meshes().len(), 1);
        let (name, mesh) = &model.meshes()[0];
        assert_eq!(name, "tri");
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        for v in mesh.vertices() {
            assert!((v.position[2] + 2.0).abs() < EPSILON, "Expected z = -2, got {:?}", v.position);
        }
        assert!(model.skeleton().is_none());
    }

    #[test]
    fn test_missing_gltf_file() {
        let err = load(Path::new("/nowhere/scene.gltf")).unwrap_err();
        assert!(matches!(err, ResourceLoadError::Io { .. }), "Expected Io, got {:?}", err);
    }

    #[test]
    fn test_spline_values_keep_middle() {
        assert_eq!(spline_values(vec![1, 2, 3, 4, 5, 6], true), vec![2, 5]);
        assert_eq!(spline_values(vec![1, 2], false), vec![1, 2]);
    }

    #[test]
    fn test_convert_rgb_image() {
        let data = gltf::image::Data {
            pixels: vec![1, 2, 3, 4, 5, 6],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let texture = convert_image(&data).unwrap();
        assert_eq!(texture.pixels(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    }
}
