//! Lit mesh pipelines, one per shader program
//!
//! Programs are compiled lazily the first time a frame draws with them. A
//! program the driver rejects is remembered as failed and its draws are
//! skipped, so one bad shader cannot stop the frame.

use std::collections::HashMap;

use lumen_core::{ResourceId, ShaderProgram, Vertex};

use super::layouts::BindLayouts;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

enum CompiledShader {
    Ready(wgpu::RenderPipeline),
    Failed,
}

pub struct MeshPipelines {
    layout: wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    compiled: HashMap<ResourceId, CompiledShader>,
}

impl MeshPipelines {
    pub fn new(device: &wgpu::Device, layouts: &BindLayouts, surface_format: wgpu::TextureFormat) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.object, &layouts.material, &layouts.texture],
            push_constant_ranges: &[],
        });
        Self {
            layout,
            surface_format,
            compiled: HashMap::new(),
        }
    }

    /// Compile `shader` if this is its first use
    pub fn prepare(&mut self, device: &wgpu::Device, shader: &ShaderProgram) {
        if self.compiled.contains_key(&shader.id()) {
            return;
        }
        let compiled = match self.compile(device, shader) {
            Ok(pipeline) => {
                log::debug!("Compiled pipeline for shader '{}'", shader.name());
                CompiledShader::Ready(pipeline)
            }
            Err(message) => {
                log::error!("Shader '{}' was rejected by the GPU, skipping its draws: {}", shader.name(), message);
                CompiledShader::Failed
            }
        };
        self.compiled.insert(shader.id(), compiled);
    }

    /// The pipeline for `shader`, if it compiled
    pub fn get(&self, shader: &ShaderProgram) -> Option<&wgpu::RenderPipeline> {
        match self.compiled.get(&shader.id()) {
            Some(CompiledShader::Ready(pipeline)) => Some(pipeline),
            _ => None,
        }
    }

    fn compile(&self, device: &wgpu::Device, shader: &ShaderProgram) -> Result<wgpu::RenderPipeline, String> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(shader.name()),
            source: wgpu::ShaderSource::Wgsl(shader.source().into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(shader.name()),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[vertex_buffer_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => Err(error.to_string()),
            None => Ok(pipeline),
        }
    }
}

/// Vertex buffer layout for [`Vertex`]
pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position: vec3<f32>
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            // normal: vec3<f32>
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: 1,
            },
            // uv: vec2<f32>
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 24,
                shader_location: 2,
            },
            // joints: vec4<u32>
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Uint32x4,
                offset: 32,
                shader_location: 3,
            },
            // weights: vec4<f32>
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 48,
                shader_location: 4,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn test_vertex_buffer_layout_stride() {
        let layout = vertex_buffer_layout();
        assert_eq!(layout.array_stride, std::mem::size_of::<Vertex>() as u64);
        assert_eq!(layout.array_stride, 64);
    }

    #[test]
    fn test_attribute_offsets_match_vertex() {
        let layout = vertex_buffer_layout();
        let expected = [
            offset_of!(Vertex, position),
            offset_of!(Vertex, normal),
            offset_of!(Vertex, uv),
            offset_of!(Vertex, joints),
            offset_of!(Vertex, weights),
        ];
        for (attribute, offset) in layout.attributes.iter().zip(expected) {
            assert_eq!(attribute.offset, offset as u64, "location {}", attribute.shader_location);
        }
    }
}
