//! GPU copies of CPU resources
//!
//! Meshes, textures and cube maps are uploaded the first time a frame uses
//! them and keyed on their [`ResourceId`]. Entries no frame has touched for
//! [`EVICT_AFTER_FRAMES`] frames are released.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use lumen_core::{CubeMap, Mesh, ResourceId, Texture};

/// Frames an unused upload survives before it is dropped
pub const EVICT_AFTER_FRAMES: u64 = 600;

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

struct Entry<T> {
    value: T,
    last_used: u64,
}

/// Uploaded resources and the samplers they are drawn with
pub struct GpuCache {
    meshes: HashMap<ResourceId, Entry<GpuMesh>>,
    textures: HashMap<ResourceId, Entry<wgpu::BindGroup>>,
    cubemaps: HashMap<ResourceId, Entry<wgpu::BindGroup>>,
    white: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    sky_uniforms: wgpu::Buffer,
    frame: u64,
}

impl GpuCache {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture_layout: &wgpu::BindGroupLayout,
        sky_uniforms: wgpu::Buffer,
    ) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let white = texture_bind_group(device, queue, texture_layout, &sampler, &Texture::white());

        Self {
            meshes: HashMap::new(),
            textures: HashMap::new(),
            cubemaps: HashMap::new(),
            white,
            sampler,
            sky_uniforms,
            frame: 0,
        }
    }

    /// Mark the start of a frame; entries used from now on are kept alive
    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    /// Upload `mesh` if needed
    pub fn prepare_mesh(&mut self, device: &wgpu::Device, mesh: &Mesh) {
        let frame = self.frame;
        self.meshes
            .entry(mesh.id())
            .and_modify(|e| e.last_used = frame)
            .or_insert_with(|| {
                log::debug!("Uploading mesh '{}' ({} triangles)", mesh.name(), mesh.triangle_count());
                Entry {
                    value: upload_mesh(device, mesh),
                    last_used: frame,
                }
            });
    }

    /// Upload `texture` if needed
    pub fn prepare_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        texture: &Texture,
    ) {
        let frame = self.frame;
        let sampler = &self.sampler;
        self.textures
            .entry(texture.id())
            .and_modify(|e| e.last_used = frame)
            .or_insert_with(|| Entry {
                value: texture_bind_group(device, queue, layout, sampler, texture),
                last_used: frame,
            });
    }

    /// Upload `cubemap` if needed
    pub fn prepare_cubemap(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        cubemap: &CubeMap,
    ) {
        let frame = self.frame;
        let sampler = &self.sampler;
        let sky_uniforms = &self.sky_uniforms;
        self.cubemaps
            .entry(cubemap.id())
            .and_modify(|e| e.last_used = frame)
            .or_insert_with(|| Entry {
                value: cubemap_bind_group(device, queue, layout, sampler, sky_uniforms, cubemap),
                last_used: frame,
            });
    }

    pub fn mesh(&self, id: ResourceId) -> Option<&GpuMesh> {
        self.meshes.get(&id).map(|e| &e.value)
    }

    /// Bind group for `texture`, or the white texture
    pub fn texture(&self, texture: Option<&Texture>) -> &wgpu::BindGroup {
        texture
            .and_then(|t| self.textures.get(&t.id()))
            .map_or(&self.white, |e| &e.value)
    }

    pub fn cubemap(&self, id: ResourceId) -> Option<&wgpu::BindGroup> {
        self.cubemaps.get(&id).map(|e| &e.value)
    }

    pub fn sky_uniforms(&self) -> &wgpu::Buffer {
        &self.sky_uniforms
    }

    /// Drop uploads that have not been drawn for a while
    pub fn evict_unused(&mut self) {
        let frame = self.frame;
        let stale = |e: &u64| frame.saturating_sub(*e) > EVICT_AFTER_FRAMES;
        let before = self.meshes.len() + self.textures.len() + self.cubemaps.len();
        self.meshes.retain(|_, e| !stale(&e.last_used));
        self.textures.retain(|_, e| !stale(&e.last_used));
        self.cubemaps.retain(|_, e| !stale(&e.last_used));
        let evicted = before - (self.meshes.len() + self.textures.len() + self.cubemaps.len());
        if evicted > 0 {
            log::debug!("Released {} unused GPU resources", evicted);
        }
    }
}

fn upload_mesh(device: &wgpu::Device, mesh: &Mesh) -> GpuMesh {
    let label = mesh.name();
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(mesh.vertices()),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(mesh.indices()),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices().len() as u32,
    }
}

fn texture_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    texture: &Texture,
) -> wgpu::BindGroup {
    // Zero-sized images upload as a single transparent texel
    let (width, height, pixels) = if texture.width() == 0 || texture.height() == 0 {
        (1, 1, &[0u8; 4][..])
    } else {
        (texture.width(), texture.height(), texture.pixels())
    };
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_layer(queue, &gpu_texture, 0, width, height, pixels);

    let view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Texture Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn cubemap_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    sky_uniforms: &wgpu::Buffer,
    cubemap: &CubeMap,
) -> wgpu::BindGroup {
    let edge = cubemap.size().max(1);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Cube Map"),
        size: wgpu::Extent3d {
            width: edge,
            height: edge,
            depth_or_array_layers: 6,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let blank = vec![0u8; 4];
    for (layer, face) in cubemap.faces().iter().enumerate() {
        let pixels = if cubemap.size() == 0 { &blank } else { face };
        write_layer(queue, &texture, layer as u32, edge, edge, pixels);
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Cube Map View"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Sky Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: sky_uniforms.as_entire_binding(),
            },
        ],
    })
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, layer: u32, width: u32, height: u32, pixels: &[u8]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}
