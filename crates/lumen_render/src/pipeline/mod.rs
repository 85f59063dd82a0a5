//! Render pipelines and the buffers they draw from

pub mod layouts;
pub mod mesh_pipeline;
pub mod quad_pipeline;
pub mod sky_pipeline;
pub mod uniform_ring;

pub use layouts::{align_to, BindLayouts};
pub use mesh_pipeline::{MeshPipelines, DEPTH_FORMAT};
pub use quad_pipeline::QuadPipelines;
pub use sky_pipeline::{SkyPipeline, SKY_VERTEX_COUNT};
pub use uniform_ring::UniformRing;
