//! Rendering for the Lumen engine
//!
//! Rendering happens in two steps. [`FramePlan::build`] turns a
//! [`Scene`](lumen_core::Scene) and a [`Camera`] into GPU-ready uniform
//! blocks and an ordered list of draw commands; this part is plain CPU code.
//! A [`RenderBackend`] then draws the plan:
//!
//! - [`Renderer`] - wgpu device, pipelines and resource uploads
//! - [`RecordingBackend`] - keeps plans in memory for headless runs
//!
//! ## Bindings
//!
//! Mesh shaders see the frame block at group 0, the object block at group 1,
//! their own material block at group 2 and the diffuse texture at group 3.
//! See [`lumen_core::PRELUDE`].

pub mod backend;
pub mod camera;
pub mod context;
pub mod error;
pub mod frame;
pub mod gpu_cache;
pub mod pipeline;
pub mod renderer;
pub mod types;

pub use backend::{RecordedFrame, RecordingBackend, RenderBackend};
pub use camera::{Camera, NEAR_PLANE};
pub use context::RenderContext;
pub use error::RenderError;
pub use frame::{in_frustum, DrawCommand, DrawPass, FramePlan, FrameStats, MeshDraw, QuadBatch, SkyDraw};
pub use renderer::Renderer;
pub use types::{FrameUniforms, GpuDirectionalLight, GpuPointLight, GpuSpotLight, ObjectUniforms, QuadVertex};
