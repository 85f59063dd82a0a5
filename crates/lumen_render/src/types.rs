//! GPU-compatible data types
//!
//! These types match the structs in the shader prelude exactly. All of them
//! derive Pod and Zeroable so they can be written to buffers directly.

use bytemuck::{Pod, Zeroable};

use lumen_core::{
    DirectionalLight, PointLight, SpotLight, MAX_BONES, MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS,
};
use lumen_math::{mat4, Mat4};

/// Point light as laid out in the frame uniform block (48 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    /// xyz position, w radius
    pub position_radius: [f32; 4],
    /// rgb color, a intensity
    pub color_intensity: [f32; 4],
    /// x constant, y linear, z quadratic
    pub attenuation: [f32; 4],
}

impl From<&PointLight> for GpuPointLight {
    fn from(light: &PointLight) -> Self {
        let [c, l, q] = light.attenuation.coefficients(light.radius);
        let p = light.position;
        Self {
            position_radius: [p.x, p.y, p.z, light.radius],
            color_intensity: light.color.extend(light.intensity).to_array(),
            attenuation: [c, l, q, 0.0],
        }
    }
}

/// Directional light (64 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuDirectionalLight {
    /// Direction the light travels
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

impl From<&DirectionalLight> for GpuDirectionalLight {
    fn from(light: &DirectionalLight) -> Self {
        Self {
            direction: light.direction().extend(0.0).to_array(),
            ambient: light.ambient.component_mul(light.color).extend(1.0).to_array(),
            diffuse: light.diffuse.component_mul(light.color).extend(1.0).to_array(),
            specular: light.specular.component_mul(light.color).extend(1.0).to_array(),
        }
    }
}

/// Spot light (80 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuSpotLight {
    /// xyz position, w intensity
    pub position_intensity: [f32; 4],
    /// xyz direction, w reach
    pub direction_reach: [f32; 4],
    pub color: [f32; 4],
    /// x cos(inner), y cos(outer)
    pub cone: [f32; 4],
    pub attenuation: [f32; 4],
}

impl From<&SpotLight> for GpuSpotLight {
    fn from(light: &SpotLight) -> Self {
        let [c, l, q] = light.attenuation.coefficients(light.reach);
        let (inner, outer) = light.cone_cosines();
        Self {
            position_intensity: light.position.extend(light.intensity).to_array(),
            direction_reach: light.direction().extend(light.reach).to_array(),
            color: light.color.extend(1.0).to_array(),
            cone: [inner, outer, 0.0, 0.0],
            attenuation: [c, l, q, 0.0],
        }
    }
}

/// Per-frame camera and light data, bound at group 0
/// Layout: 832 bytes total (must match prelude.wgsl FrameUniforms)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    /// xyz camera position, w seconds since start
    pub camera_position: [f32; 4],
    pub ambient: [f32; 4],
    /// x point, y directional, z spot
    pub light_counts: [u32; 4],
    /// xy viewport size in pixels
    pub viewport: [f32; 4],
    pub point_lights: [GpuPointLight; MAX_POINT_LIGHTS],
    pub directional_lights: [GpuDirectionalLight; MAX_DIRECTIONAL_LIGHTS],
    pub spot_lights: [GpuSpotLight; MAX_SPOT_LIGHTS],
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view: mat4::IDENTITY,
            projection: mat4::IDENTITY,
            ..<Self as Zeroable>::zeroed()
        }
    }
}

/// Per-draw transforms and skinning palette, bound at group 1
/// Layout: 4240 bytes total (must match prelude.wgsl ObjectUniforms)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: Mat4,
    pub normal_matrix: Mat4,
    /// x is 1 when the bone palette is used
    pub flags: [u32; 4],
    pub bones: [Mat4; MAX_BONES],
}

impl ObjectUniforms {
    /// Uniforms for a model matrix and an optional bone palette
    ///
    /// Bones beyond the palette size are dropped.
    pub fn new(model: Mat4, bones: &[Mat4]) -> Self {
        let mut uniforms = Self {
            model,
            normal_matrix: mat4::normal_matrix(model),
            flags: [u32::from(!bones.is_empty()), 0, 0, 0],
            bones: [mat4::IDENTITY; MAX_BONES],
        };
        let count = bones.len().min(MAX_BONES);
        uniforms.bones[..count].copy_from_slice(&bones[..count]);
        uniforms
    }

    #[inline]
    pub fn is_skinned(&self) -> bool {
        self.flags[0] != 0
    }
}

/// Vertex of a textured quad: particles, sprites and glyphs
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    /// World position for particles, window pixels (z = 0) for the overlay
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

/// Skybox tint, bound next to the cube texture
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SkyUniforms {
    pub tint: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::{Quat, Vec3};
    use std::mem::size_of;

    const EPSILON: f32 = 0.0001;

    #[test]
    fn test_light_sizes() {
        // Three, four and five vec4s
        assert_eq!(size_of::<GpuPointLight>(), 48);
        assert_eq!(size_of::<GpuDirectionalLight>(), 64);
        assert_eq!(size_of::<GpuSpotLight>(), 80);
    }

    #[test]
    fn test_frame_uniforms_size() {
        // 2 matrices (128) + 4 vec4s (64) + 4 point (192) + 2 directional (128) + 4 spot (320)
        assert_eq!(size_of::<FrameUniforms>(), 832);
        assert_eq!(size_of::<FrameUniforms>() % 16, 0);
    }

    #[test]
    fn test_object_uniforms_size() {
        // 2 matrices (128) + flags (16) + 64 bones (4096)
        assert_eq!(size_of::<ObjectUniforms>(), 4240);
    }

    #[test]
    fn test_quad_vertex_size() {
        // 3 + 2 + 4 floats
        assert_eq!(size_of::<QuadVertex>(), 36);
    }

    #[test]
    fn test_alignment() {
        assert_eq!(std::mem::align_of::<FrameUniforms>(), 4);
        assert_eq!(std::mem::align_of::<ObjectUniforms>(), 4);
        assert_eq!(std::mem::align_of::<QuadVertex>(), 4);
    }

    #[test]
    fn test_point_light_packing() {
        let light = PointLight::new(Vec3::new(1.0, 2.0, 3.0), 10.0, Vec3::new(1.0, 0.5, 0.25), 2.0);
        let gpu = GpuPointLight::from(&light);
        assert_eq!(gpu.position_radius, [1.0, 2.0, 3.0, 10.0]);
        assert_eq!(gpu.color_intensity, [1.0, 0.5, 0.25, 2.0]);
        assert!((gpu.attenuation[2] - 0.01).abs() < EPSILON, "Expected 1/r^2, got {:?}", gpu.attenuation);
    }

    #[test]
    fn test_spot_light_cone() {
        let mut light = SpotLight::new(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
        light.cut_off = 0.0;
        light.outer_cut_off = std::f32::consts::FRAC_PI_2;
        let gpu = GpuSpotLight::from(&light);
        assert!((gpu.cone[0] - 1.0).abs() < EPSILON);
        assert!(gpu.cone[1].abs() < EPSILON);
        assert!((gpu.direction_reach[2] - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_object_uniforms_skinning_flag() {
        let plain = ObjectUniforms::new(mat4::IDENTITY, &[]);
        assert!(!plain.is_skinned());

        let bones = vec![mat4::from_translation(Vec3::X); MAX_BONES + 3];
        let skinned = ObjectUniforms::new(mat4::IDENTITY, &bones);
        assert!(skinned.is_skinned());
        assert_eq!(skinned.bones[MAX_BONES - 1], bones[0]);
    }
}
