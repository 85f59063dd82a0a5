//! Lumen Mathematics Library
//!
//! Value types shared by every other Lumen crate.
//!
//! ## Core Types
//!
//! - [`Vec2`], [`Vec3`], [`Vec4`] - float vectors with value semantics
//! - [`Quat`] - unit quaternion rotations (see [`quat`] for the conventions)
//! - [`Mat4`] - column-major 4x4 matrix with free-function helpers in [`mat4`]

mod vec2;
mod vec3;
mod vec4;
pub mod quat;
pub mod mat4;

pub use vec2::Vec2;
pub use vec3::Vec3;
pub use vec4::Vec4;
pub use quat::Quat;
pub use mat4::Mat4;
