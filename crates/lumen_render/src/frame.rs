//! Per-frame draw planning
//!
//! A [`FramePlan`] is everything the GPU needs for one frame, worked out on
//! the CPU from a [`Scene`] and a [`Camera`]:
//!
//! - the frame uniform block, with light lists cut down to what the shaders
//!   hold (the earliest registered lights win)
//! - draw commands in a fixed order: skybox, lit meshes, particle billboards,
//!   sprites sorted by depth, then text
//!
//! Building a plan never fails. An object whose uniforms do not fit its
//! material is left out of the plan and counted in [`FrameStats`].

use std::sync::Arc;

use lumen_core::{
    Aabb, CubeMap, Material, Mesh, ObjectKey, Scene, ShaderProgram, Texture, MAX_DIRECTIONAL_LIGHTS,
    MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS,
};
use lumen_core::{Emitter, ScreenQuad};
use lumen_math::{mat4, Mat4, Vec2, Vec3, Vec4};

use crate::camera::Camera;
use crate::types::{FrameUniforms, GpuDirectionalLight, GpuPointLight, GpuSpotLight, ObjectUniforms, QuadVertex};

/// Draw stages, in the order they are submitted
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawPass {
    Sky,
    Opaque,
    Particles,
    Sprites,
    Text,
}

/// One sub-mesh of an [`Object3D`](lumen_core::Object3D)
#[derive(Clone, Debug)]
pub struct MeshDraw {
    pub object: ObjectKey,
    pub mesh: Arc<Mesh>,
    pub shader: Arc<ShaderProgram>,
    /// Material block with per-object overrides applied
    pub material_bytes: Vec<u8>,
    /// Material texture, else the mesh's own; white when neither exists
    pub texture: Option<Arc<Texture>>,
    pub uniforms: ObjectUniforms,
}

/// Textured quads that share one texture
#[derive(Clone, Debug)]
pub struct QuadBatch {
    /// `None` draws untextured, using only the vertex color
    pub texture: Option<Arc<Texture>>,
    /// Six vertices per quad
    pub vertices: Vec<QuadVertex>,
}

impl QuadBatch {
    fn new(texture: Option<Arc<Texture>>) -> Self {
        Self {
            texture,
            vertices: Vec::new(),
        }
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 6
    }

    fn same_texture(&self, texture: &Option<Arc<Texture>>) -> bool {
        match (&self.texture, texture) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Append a quad given its corners clockwise on screen from the top-left
    fn push(&mut self, corners: [Vec3; 4], uv_min: Vec2, uv_max: Vec2, color: Vec4) {
        let uvs = [
            [uv_min.x, uv_min.y],
            [uv_max.x, uv_min.y],
            [uv_max.x, uv_max.y],
            [uv_min.x, uv_max.y],
        ];
        let color = color.to_array();
        for i in [0, 1, 2, 0, 2, 3] {
            self.vertices.push(QuadVertex {
                position: corners[i].to_array(),
                uv: uvs[i],
                color,
            });
        }
    }

    fn push_screen(&mut self, quad: &ScreenQuad) {
        let corners = quad.corners().map(|c| Vec3::new(c.x, c.y, 0.0));
        self.push(corners, quad.uv_min, quad.uv_max, quad.color);
    }
}

#[derive(Clone, Debug)]
pub struct SkyDraw {
    pub cubemap: Arc<CubeMap>,
    pub tint: Vec4,
}

#[derive(Clone, Debug)]
pub enum DrawCommand {
    Sky(SkyDraw),
    Mesh(Box<MeshDraw>),
    Particles(QuadBatch),
    Sprites(QuadBatch),
    Text(QuadBatch),
}

impl DrawCommand {
    pub fn pass(&self) -> DrawPass {
        match self {
            Self::Sky(_) => DrawPass::Sky,
            Self::Mesh(_) => DrawPass::Opaque,
            Self::Particles(_) => DrawPass::Particles,
            Self::Sprites(_) => DrawPass::Sprites,
            Self::Text(_) => DrawPass::Text,
        }
    }
}

/// Counters gathered while planning a frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub mesh_draws: usize,
    /// Objects left out because a uniform did not fit their material
    pub skipped_draws: usize,
    /// Objects entirely outside the view frustum
    pub culled: usize,
    /// Registered lights beyond what the shaders hold
    pub dropped_lights: usize,
    pub particles: usize,
    pub sprites: usize,
    pub glyphs: usize,
}

/// Everything needed to draw one frame
#[derive(Clone, Debug)]
pub struct FramePlan {
    pub uniforms: FrameUniforms,
    pub clear_color: Vec4,
    pub commands: Vec<DrawCommand>,
    pub stats: FrameStats,
}

impl FramePlan {
    /// Plan a frame of `scene` seen through `camera`
    ///
    /// Objects without a material override use `default_material`. `time` is
    /// seconds since startup, exposed to shaders.
    pub fn build(scene: &Scene, camera: &Camera, default_material: &Material, time: f32, clear_color: Vec4) -> Self {
        let mut stats = FrameStats::default();
        let uniforms = frame_uniforms(scene, camera, time, &mut stats);
        let mut commands = Vec::new();

        if let Some(sky) = &scene.skybox {
            commands.push(DrawCommand::Sky(SkyDraw {
                cubemap: Arc::clone(&sky.cubemap),
                tint: sky.tint,
            }));
        }

        let view_projection = mat4::mul(uniforms.projection, uniforms.view);
        plan_meshes(scene, view_projection, default_material, &mut commands, &mut stats);
        plan_particles(scene, camera, &mut commands, &mut stats);
        plan_sprites(scene, &mut commands, &mut stats);
        plan_text(scene, &mut commands, &mut stats);

        Self {
            uniforms,
            clear_color,
            commands,
            stats,
        }
    }

    /// The pass of each command, in submission order
    pub fn passes(&self) -> impl Iterator<Item = DrawPass> + '_ {
        self.commands.iter().map(DrawCommand::pass)
    }

    pub fn meshes(&self) -> impl Iterator<Item = &MeshDraw> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Mesh(draw) => Some(draw.as_ref()),
            _ => None,
        })
    }
}

/// Pack up to `N` lights in order; returns the array, the count used, and how many were left out
fn pack_lights<'a, T: 'a, G, const N: usize>(lights: impl Iterator<Item = &'a T>) -> ([G; N], u32, usize)
where
    G: Copy + Default + From<&'a T>,
{
    let mut packed = [G::default(); N];
    let mut used = 0;
    let mut dropped = 0;
    for light in lights {
        if used < N {
            packed[used] = G::from(light);
            used += 1;
        } else {
            dropped += 1;
        }
    }
    (packed, used as u32, dropped)
}

fn frame_uniforms(scene: &Scene, camera: &Camera, time: f32, stats: &mut FrameStats) -> FrameUniforms {
    let (point_lights, point_count, point_dropped) =
        pack_lights::<_, GpuPointLight, MAX_POINT_LIGHTS>(scene.point_lights.values());
    let (directional_lights, directional_count, directional_dropped) =
        pack_lights::<_, GpuDirectionalLight, MAX_DIRECTIONAL_LIGHTS>(scene.directional_lights.values());
    let (spot_lights, spot_count, spot_dropped) =
        pack_lights::<_, GpuSpotLight, MAX_SPOT_LIGHTS>(scene.spot_lights.values());
    stats.dropped_lights = point_dropped + directional_dropped + spot_dropped;

    FrameUniforms {
        view: camera.view_matrix(),
        projection: camera.projection_matrix(),
        camera_position: camera.position().extend(time).to_array(),
        ambient: scene.ambient.extend(1.0).to_array(),
        light_counts: [point_count, directional_count, spot_count, 0],
        viewport: [camera.view_width as f32, camera.view_height as f32, 0.0, 0.0],
        point_lights,
        directional_lights,
        spot_lights,
    }
}

/// Whether any part of `bounds` can be inside the clip volume
///
/// Conservative: a box is rejected only when all eight corners lie outside
/// the same clip plane.
pub fn in_frustum(view_projection: Mat4, bounds: &Aabb) -> bool {
    let clip = bounds.corners().map(|c| mat4::transform(view_projection, c.extend(1.0)));
    let planes: [fn(&Vec4) -> bool; 6] = [
        |c| c.x < -c.w,
        |c| c.x > c.w,
        |c| c.y < -c.w,
        |c| c.y > c.w,
        |c| c.z < 0.0,
        |c| c.z > c.w,
    ];
    !planes.iter().any(|outside| clip.iter().all(outside))
}

fn plan_meshes(
    scene: &Scene,
    view_projection: Mat4,
    default_material: &Material,
    commands: &mut Vec<DrawCommand>,
    stats: &mut FrameStats,
) {
    for (key, object) in scene.objects.iter() {
        if !object.visible {
            continue;
        }
        // Skinned poses can leave the bind-pose bounds, so only rigid objects are culled
        if object.pose().is_empty() && !in_frustum(view_projection, &object.world_bounds()) {
            stats.culled += 1;
            continue;
        }

        let material = object.material.as_ref().unwrap_or(default_material);
        let material_bytes = match material.uniform_bytes_with(object.uniforms()) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Skipping draw of '{}': {}", object.model().name(), e);
                stats.skipped_draws += 1;
                continue;
            }
        };

        let model = object.model_matrix();
        for (_, mesh) in object.model().meshes() {
            let bones = if mesh.is_skinned() { object.pose() } else { &[] };
            let texture = material.texture().or(mesh.texture()).cloned();
            commands.push(DrawCommand::Mesh(Box::new(MeshDraw {
                object: key,
                mesh: Arc::clone(mesh),
                shader: Arc::clone(material.shader()),
                material_bytes: material_bytes.clone(),
                texture,
                uniforms: ObjectUniforms::new(model, bones),
            })));
            stats.mesh_draws += 1;
        }
    }
}

fn plan_particles(scene: &Scene, camera: &Camera, commands: &mut Vec<DrawCommand>, stats: &mut FrameStats) {
    let eye = camera.position();
    let right = camera.right();
    let up = camera.up();
    for emitter in scene.emitters.values() {
        if let Some(batch) = billboards(emitter, eye, right, up) {
            stats.particles += batch.quad_count();
            commands.push(DrawCommand::Particles(batch));
        }
    }
}

/// Camera-facing quads for an emitter's live particles, farthest first
fn billboards(emitter: &Emitter, eye: Vec3, right: Vec3, up: Vec3) -> Option<QuadBatch> {
    let mut live: Vec<_> = emitter.particles().collect();
    if live.is_empty() {
        return None;
    }
    live.sort_by(|a, b| eye.distance_squared(b.position).total_cmp(&eye.distance_squared(a.position)));

    let mut batch = QuadBatch::new(emitter.texture.clone());
    for particle in live {
        let r = right * (particle.size.x * 0.5);
        let u = up * (particle.size.y * 0.5);
        let p = particle.position;
        let corners = [p - r + u, p + r + u, p + r - u, p - r - u];
        batch.push(corners, Vec2::ZERO, Vec2::ONE, particle.color);
    }
    Some(batch)
}

/// Sprites from back to front, merging neighbours that share a texture
fn plan_sprites(scene: &Scene, commands: &mut Vec<DrawCommand>, stats: &mut FrameStats) {
    let mut quads: Vec<(ScreenQuad, &Arc<Texture>)> = scene
        .sprites
        .values()
        .filter(|s| s.visible)
        .map(|s| (s.quad(), s.sprite.texture()))
        .collect();
    quads.sort_by(|a, b| a.0.depth.total_cmp(&b.0.depth));
    stats.sprites = quads.len();

    let mut current: Option<QuadBatch> = None;
    for (quad, texture) in quads {
        let texture = Some(Arc::clone(texture));
        match current.as_mut() {
            Some(batch) if batch.same_texture(&texture) => batch.push_screen(&quad),
            _ => {
                if let Some(done) = current.take() {
                    commands.push(DrawCommand::Sprites(done));
                }
                let mut batch = QuadBatch::new(texture);
                batch.push_screen(&quad);
                current = Some(batch);
            }
        }
    }
    if let Some(done) = current {
        commands.push(DrawCommand::Sprites(done));
    }
}

fn plan_text(scene: &Scene, commands: &mut Vec<DrawCommand>, stats: &mut FrameStats) {
    let mut texts: Vec<_> = scene.texts.values().filter(|t| t.visible).collect();
    texts.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    for text in texts {
        let mut batch = QuadBatch::new(Some(Arc::clone(text.font.atlas())));
        for quad in text.layout() {
            batch.push_screen(&quad);
        }
        if !batch.vertices.is_empty() {
            stats.glyphs += batch.quad_count();
            commands.push(DrawCommand::Text(batch));
        }
    }
}
