//! Core types for the Lumen engine
//!
//! This crate holds everything a scene is made of, independent of any GPU
//! or window:
//!
//! - [`Transform`] / [`Transform2D`] - placement in world and screen space
//! - Resources: [`Mesh`], [`Model`], [`Texture`], [`Sprite`], [`CubeMap`],
//!   [`ShaderProgram`], [`Material`], [`Font`], [`Sound`], shared through
//!   `Arc` and deduplicated by [`ResourceCache`]
//! - Entities: [`Object3D`], [`Object2D`], [`Text`], the three light kinds,
//!   [`Emitter`] and [`SkyBox`]
//! - Collision queries: [`Collider`] and [`RayCollider`]
//! - [`Scene`] - the keyed entity lists a window draws each frame

mod animation;
mod collider;
mod emitter;
mod error;
mod font;
mod import;
mod light;
mod material;
mod mesh;
mod model;
mod object2d;
mod object3d;
mod resource_cache;
mod scene;
mod shader;
mod skybox;
mod sound;
mod text;
mod texture;
mod transform;

pub use animation::{
    AnimationClip, AnimationState, Interpolation, Joint, JointTrack, Keyframes, Skeleton, MAX_BONES,
};
pub use collider::{BoxCollider, Collider, ConvexCollider, RayCollider, WorldShape};
pub use emitter::{Emitter, EmitterConfig, Particle};
pub use error::ResourceLoadError;
pub use font::{Font, Glyph, DEFAULT_PIXEL_SIZE};
pub use light::{
    Attenuation, DirectionalLight, PointLight, SpotLight, MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS,
    MAX_SPOT_LIGHTS,
};
pub use material::{Material, UniformError, UniformValue};
pub use mesh::{Mesh, Vertex};
pub use model::Model;
pub use object2d::{Object2D, ScreenQuad};
pub use object3d::Object3D;
pub use resource_cache::{Resource, ResourceCache, ResourceId};
pub use scene::{
    DirectionalLightKey, EmitterKey, EntityList, ObjectKey, PointLightKey, Scene, SpotLightKey, SpriteKey,
    TextKey,
};
pub use shader::{
    ShaderError, ShaderProgram, UniformField, UniformKind, UniformLayout, DEFAULT_LIT_SOURCE, MATERIAL_GROUP,
    MAX_MATERIAL_BLOCK, PRELUDE,
};
pub use skybox::SkyBox;
pub use sound::{AudioMixer, PlaybackId, SilentMixer, Sound};
pub use text::Text;
pub use texture::{CubeMap, Sprite, Texture};
pub use transform::{Transform, Transform2D};

// Re-export the math and collision types entities are built from
pub use lumen_math::{mat4, Mat4, Quat, Vec2, Vec3, Vec4};
pub use lumen_physics::{Aabb, Collision, Ray, RayHit};
