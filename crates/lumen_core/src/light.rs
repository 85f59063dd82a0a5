//! Point, directional and spot lights
//!
//! Lights are plain data. The renderer packs the first few of each kind into
//! the per-frame uniform block; anything past the limits below is ignored
//! for that frame.

use lumen_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Point lights the lit shaders read per frame
pub const MAX_POINT_LIGHTS: usize = 4;
/// Directional lights the lit shaders read per frame
pub const MAX_DIRECTIONAL_LIGHTS: usize = 2;
/// Spot lights the lit shaders read per frame
pub const MAX_SPOT_LIGHTS: usize = 4;

/// Distance falloff: `1 / (constant + linear * d + quadratic * d^2)`
///
/// The quadratic term is derived from the light's range so that a light
/// fades out near the edge of its radius.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.09,
        }
    }
}

impl Attenuation {
    /// `[constant, linear, quadratic]` for a light reaching `range` units
    pub fn coefficients(&self, range: f32) -> [f32; 3] {
        let quadratic = if range > f32::EPSILON { 1.0 / (range * range) } else { 0.0 };
        [self.constant, self.linear, quadratic]
    }
}

/// A light radiating in every direction from a point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    /// Distance at which the light has no effect
    pub radius: f32,
    pub color: Vec3,
    pub intensity: f32,
    pub attenuation: Attenuation,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 10.0,
            color: Vec3::ONE,
            intensity: 1.0,
            attenuation: Attenuation::default(),
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, radius: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            position,
            radius,
            color,
            intensity,
            attenuation: Attenuation::default(),
        }
    }
}

/// Parallel light such as the sun
///
/// The light travels along the rotation's forward axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub rotation: Quat,
    pub color: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            // Straight down
            rotation: Quat::from_unit(-Vec3::Y),
            color: Vec3::ONE,
            ambient: Vec3::splat(0.05),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::splat(0.5),
        }
    }
}

impl DirectionalLight {
    pub fn new(rotation: Quat, color: Vec3) -> Self {
        Self {
            rotation,
            color,
            ..Self::default()
        }
    }

    /// Direction the light travels in world space
    pub fn direction(&self) -> Vec3 {
        self.rotation.forward()
    }
}

/// A cone of light
///
/// Full brightness inside `cut_off`, fading to nothing at `outer_cut_off`.
/// Both are half-angles in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    pub rotation: Quat,
    pub color: Vec3,
    pub cut_off: f32,
    pub outer_cut_off: f32,
    pub intensity: f32,
    /// Distance at which the light has no effect
    pub reach: f32,
    pub attenuation: Attenuation,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            color: Vec3::ONE,
            cut_off: 12.5f32.to_radians(),
            outer_cut_off: 17.5f32.to_radians(),
            intensity: 1.0,
            reach: 20.0,
            attenuation: Attenuation::default(),
        }
    }
}

impl SpotLight {
    pub fn new(position: Vec3, rotation: Quat, color: Vec3) -> Self {
        Self {
            position,
            rotation,
            color,
            ..Self::default()
        }
    }

    pub fn direction(&self) -> Vec3 {
        self.rotation.forward()
    }

    /// Cosines of the inner and outer cone
    ///
    /// An outer angle smaller than the inner one is treated as a hard edge.
    pub fn cone_cosines(&self) -> (f32, f32) {
        let inner = self.cut_off.cos();
        let outer = self.outer_cut_off.max(self.cut_off).cos();
        (inner, outer)
    }
}
