//! wgpu backend
//!
//! Draws a [`FramePlan`] in a single render pass. Before the pass opens,
//! every resource the plan references is uploaded and every per-draw
//! uniform block is staged into a dynamic-offset ring.

use std::sync::Arc;

use winit::window::Window;

use crate::backend::RenderBackend;
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::frame::{DrawCommand, FramePlan};
use crate::gpu_cache::GpuCache;
use crate::pipeline::{
    BindLayouts, MeshPipelines, QuadPipelines, SkyPipeline, UniformRing, DEPTH_FORMAT, SKY_VERTEX_COUNT,
};
use crate::types::{FrameUniforms, ObjectUniforms, QuadVertex, SkyUniforms};
use lumen_core::MAX_MATERIAL_BLOCK;

const INITIAL_DRAW_SLOTS: usize = 64;
const INITIAL_QUAD_VERTICES: u64 = 6 * 1024;

/// Where each command's data landed in the shared buffers
enum Slot {
    Sky,
    Mesh { object_offset: u32, material_offset: u32 },
    Quads { first_vertex: u32, vertex_count: u32 },
}

pub struct Renderer {
    context: RenderContext,
    layouts: BindLayouts,
    mesh_pipelines: MeshPipelines,
    quad_pipelines: QuadPipelines,
    sky_pipeline: SkyPipeline,
    cache: GpuCache,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    objects: UniformRing,
    materials: UniformRing,
    quad_buffer: wgpu::Buffer,
    quad_capacity: u64,
    quad_staging: Vec<QuadVertex>,
    depth_texture: Option<wgpu::TextureView>,
    depth_size: (u32, u32),
}

impl Renderer {
    /// Open a GPU context on `window` and build every pipeline
    pub fn from_window(window: Arc<Window>, vsync: bool) -> Result<Self, RenderError> {
        let context = pollster::block_on(RenderContext::with_vsync(window, vsync))?;
        Ok(Self::new(context))
    }

    pub fn new(context: RenderContext) -> Self {
        let device = &context.device;
        let format = context.config.format;

        let layouts = BindLayouts::new(device);
        let mesh_pipelines = MeshPipelines::new(device, &layouts, format);
        let quad_pipelines = QuadPipelines::new(device, &layouts, format);
        let sky_pipeline = SkyPipeline::new(device, &layouts, format);
        let cache = GpuCache::new(
            device,
            &context.queue,
            &layouts.texture,
            SkyPipeline::create_uniform_buffer(device),
        );

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let objects = UniformRing::new(
            device,
            &layouts.object,
            "Object Uniform Ring",
            std::mem::size_of::<ObjectUniforms>() as u64,
            INITIAL_DRAW_SLOTS,
        );
        let materials = UniformRing::new(
            device,
            &layouts.material,
            "Material Uniform Ring",
            u64::from(MAX_MATERIAL_BLOCK),
            INITIAL_DRAW_SLOTS,
        );

        let quad_buffer = create_quad_buffer(device, INITIAL_QUAD_VERTICES);

        let mut renderer = Self {
            context,
            layouts,
            mesh_pipelines,
            quad_pipelines,
            sky_pipeline,
            cache,
            frame_buffer,
            frame_bind_group,
            objects,
            materials,
            quad_buffer,
            quad_capacity: INITIAL_QUAD_VERTICES,
            quad_staging: Vec::new(),
            depth_texture: None,
            depth_size: (0, 0),
        };
        let (width, height) = renderer.size();
        renderer.ensure_depth_texture(width, height);
        renderer
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Ensure depth texture exists and is the right size
    fn ensure_depth_texture(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.depth_texture.is_none() || self.depth_size != (width, height) {
            let depth_texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Depth Texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            self.depth_texture = Some(depth_texture.create_view(&wgpu::TextureViewDescriptor::default()));
            self.depth_size = (width, height);
        }
    }

    /// Upload resources and stage uniforms for every command in `plan`
    fn prepare(&mut self, plan: &FramePlan) -> Vec<Slot> {
        let device = &self.context.device;
        let queue = &self.context.queue;

        self.cache.begin_frame();
        self.objects.begin();
        self.materials.begin();
        self.quad_staging.clear();
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&plan.uniforms));

        let mut slots = Vec::with_capacity(plan.commands.len());
        for command in &plan.commands {
            let slot = match command {
                DrawCommand::Sky(sky) => {
                    self.cache.prepare_cubemap(device, queue, &self.layouts.sky, &sky.cubemap);
                    let tint = SkyUniforms {
                        tint: sky.tint.to_array(),
                    };
                    queue.write_buffer(self.cache.sky_uniforms(), 0, bytemuck::bytes_of(&tint));
                    Slot::Sky
                }
                DrawCommand::Mesh(draw) => {
                    self.cache.prepare_mesh(device, &draw.mesh);
                    if let Some(texture) = &draw.texture {
                        self.cache.prepare_texture(device, queue, &self.layouts.texture, texture);
                    }
                    self.mesh_pipelines.prepare(device, &draw.shader);
                    Slot::Mesh {
                        object_offset: self.objects.push(bytemuck::bytes_of(&draw.uniforms)),
                        material_offset: self.materials.push(&draw.material_bytes),
                    }
                }
                DrawCommand::Particles(batch) | DrawCommand::Sprites(batch) | DrawCommand::Text(batch) => {
                    if let Some(texture) = &batch.texture {
                        self.cache.prepare_texture(device, queue, &self.layouts.texture, texture);
                    }
                    let first_vertex = self.quad_staging.len() as u32;
                    self.quad_staging.extend_from_slice(&batch.vertices);
                    Slot::Quads {
                        first_vertex,
                        vertex_count: batch.vertices.len() as u32,
                    }
                }
            };
            slots.push(slot);
        }

        self.objects.upload(device, queue, &self.layouts.object);
        self.materials.upload(device, queue, &self.layouts.material);
        self.upload_quads();
        slots
    }

    fn upload_quads(&mut self) {
        let needed = self.quad_staging.len() as u64;
        if needed > self.quad_capacity {
            self.quad_capacity = needed.next_power_of_two();
            log::debug!("Growing quad buffer to {} vertices", self.quad_capacity);
            self.quad_buffer = create_quad_buffer(&self.context.device, self.quad_capacity);
        }
        if needed > 0 {
            self.context
                .queue
                .write_buffer(&self.quad_buffer, 0, bytemuck::cast_slice(&self.quad_staging));
        }
    }

    /// Draw one frame and present it
    pub fn render(&mut self, plan: &FramePlan) -> Result<(), RenderError> {
        let output = match self.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                return Err(RenderError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for the surface, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(RenderError::Other(format!("{:?}", e))),
        };

        let slots = self.prepare(plan);

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.context.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let Some(depth_view) = self.depth_texture.as_ref() else {
                return Err(RenderError::Other("depth texture missing".into()));
            };
            let clear = plan.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.x as f64,
                            g: clear.y as f64,
                            b: clear.z as f64,
                            a: clear.w as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

            for (command, slot) in plan.commands.iter().zip(&slots) {
                match (command, slot) {
                    (DrawCommand::Sky(sky), Slot::Sky) => {
                        let Some(bind_group) = self.cache.cubemap(sky.cubemap.id()) else {
                            continue;
                        };
                        render_pass.set_pipeline(&self.sky_pipeline.pipeline);
                        render_pass.set_bind_group(1, bind_group, &[]);
                        render_pass.draw(0..SKY_VERTEX_COUNT, 0..1);
                    }
                    (
                        DrawCommand::Mesh(draw),
                        Slot::Mesh {
                            object_offset,
                            material_offset,
                        },
                    ) => {
                        let (Some(pipeline), Some(mesh)) =
                            (self.mesh_pipelines.get(&draw.shader), self.cache.mesh(draw.mesh.id()))
                        else {
                            continue;
                        };
                        if mesh.index_count == 0 {
                            continue;
                        }
                        render_pass.set_pipeline(pipeline);
                        render_pass.set_bind_group(1, self.objects.bind_group(), &[*object_offset]);
                        render_pass.set_bind_group(2, self.materials.bind_group(), &[*material_offset]);
                        render_pass.set_bind_group(3, self.cache.texture(draw.texture.as_deref()), &[]);
                        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                    }
                    (
                        DrawCommand::Particles(batch) | DrawCommand::Sprites(batch) | DrawCommand::Text(batch),
                        Slot::Quads {
                            first_vertex,
                            vertex_count,
                        },
                    ) => {
                        if *vertex_count == 0 {
                            continue;
                        }
                        let pipeline = match command {
                            DrawCommand::Particles(_) => &self.quad_pipelines.world,
                            _ => &self.quad_pipelines.screen,
                        };
                        render_pass.set_pipeline(pipeline);
                        render_pass.set_bind_group(1, self.cache.texture(batch.texture.as_deref()), &[]);
                        render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                        render_pass.draw(*first_vertex..first_vertex + vertex_count, 0..1);
                    }
                    _ => {}
                }
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.cache.evict_unused();

        Ok(())
    }
}

impl RenderBackend for Renderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(winit::dpi::PhysicalSize::new(width, height));
        self.ensure_depth_texture(self.context.config.width, self.context.config.height);
    }

    fn submit(&mut self, plan: &FramePlan) -> Result<(), RenderError> {
        self.render(plan)
    }

    fn size(&self) -> (u32, u32) {
        (self.context.config.width, self.context.config.height)
    }
}

fn create_quad_buffer(device: &wgpu::Device, vertices: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Quad Vertex Buffer"),
        size: vertices * std::mem::size_of::<QuadVertex>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
