//! Pipelines for textured quads
//!
//! Particles are depth tested against the scene but never write depth.
//! Sprites and text are drawn over everything in submission order.

use super::layouts::BindLayouts;
use super::mesh_pipeline::DEPTH_FORMAT;
use crate::types::QuadVertex;

pub struct QuadPipelines {
    /// World-space billboards
    pub world: wgpu::RenderPipeline,
    /// Window-pixel overlay
    pub screen: wgpu::RenderPipeline,
}

impl QuadPipelines {
    pub fn new(device: &wgpu::Device, layouts: &BindLayouts, surface_format: wgpu::TextureFormat) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Quad Pipeline Layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.texture],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/quad.wgsl").into()),
        });

        let world = create(
            device,
            &layout,
            &shader,
            surface_format,
            "Particle Pipeline",
            "vs_world",
            wgpu::CompareFunction::Less,
        );
        let screen = create(
            device,
            &layout,
            &shader,
            surface_format,
            "Overlay Pipeline",
            "vs_screen",
            wgpu::CompareFunction::Always,
        );

        Self { world, screen }
    }
}

fn create(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    label: &str,
    vertex_entry: &str,
    depth_compare: wgpu::CompareFunction,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vertex_entry),
            buffers: &[vertex_buffer_layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Billboards and mirrored sprites are both visible from behind
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare,
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
    })
}

/// Vertex buffer layout for [`QuadVertex`]
pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x4];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn test_quad_layout_matches_vertex() {
        let layout = vertex_buffer_layout();
        assert_eq!(layout.array_stride, 36);
        assert_eq!(layout.attributes[1].offset, offset_of!(QuadVertex, uv) as u64);
        assert_eq!(layout.attributes[2].offset, offset_of!(QuadVertex, color) as u64);
    }
}
