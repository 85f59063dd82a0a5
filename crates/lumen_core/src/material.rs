//! Materials: a shader plus typed uniform values
//!
//! Uniform values are a closed set of kinds checked against the shader's
//! reflected material block. Setting a name the block lacks, or a value of
//! the wrong kind, is rejected with a [`UniformError`] instead of being
//! written.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lumen_math::{Mat4, Vec2, Vec3, Vec4};

use crate::shader::{ShaderError, ShaderProgram, UniformKind, UniformLayout};
use crate::texture::Texture;

/// A value for one uniform
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            Self::Int(_) => UniformKind::Int,
            Self::UInt(_) => UniformKind::UInt,
            Self::Float(_) => UniformKind::Float,
            Self::Vec2(_) => UniformKind::Vec2,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
            Self::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Write the value's bytes at the start of `out`
    fn write(&self, out: &mut [u8]) {
        let bytes: &[u8] = match self {
            Self::Int(v) => bytemuck::bytes_of(v),
            Self::UInt(v) => bytemuck::bytes_of(v),
            Self::Float(v) => bytemuck::bytes_of(v),
            Self::Vec2(v) => bytemuck::bytes_of(v),
            Self::Vec3(v) => bytemuck::bytes_of(v),
            Self::Vec4(v) => bytemuck::bytes_of(v),
            Self::Mat4(v) => bytemuck::bytes_of(v),
        };
        out[..bytes.len()].copy_from_slice(bytes);
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        Self::UInt(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

/// Rejected uniform assignment
#[derive(Clone, Debug, PartialEq)]
pub enum UniformError {
    /// The material block has no member with this name
    NotFound { shader: String, name: String },
    /// The member exists with a different type
    TypeMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },
}

impl fmt::Display for UniformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { shader, name } => {
                write!(f, "Shader '{}' has no uniform named '{}'", shader, name)
            }
            Self::TypeMismatch { name, expected, found } => {
                write!(f, "Uniform '{}' is {}, got {}", name, expected, found)
            }
        }
    }
}

impl std::error::Error for UniformError {}

/// Check one assignment against a layout
fn check(shader: &ShaderProgram, name: &str, value: &UniformValue) -> Result<(), UniformError> {
    let field = shader.layout().field(name).ok_or_else(|| UniformError::NotFound {
        shader: shader.name().to_string(),
        name: name.to_string(),
    })?;
    if field.kind != value.kind() {
        return Err(UniformError::TypeMismatch {
            name: name.to_string(),
            expected: field.kind,
            found: value.kind(),
        });
    }
    Ok(())
}

fn write_values<'a>(
    layout: &UniformLayout,
    out: &mut [u8],
    values: impl IntoIterator<Item = (&'a String, &'a UniformValue)>,
) {
    for (name, value) in values {
        if let Some(field) = layout.field(name) {
            value.write(&mut out[field.offset as usize..]);
        }
    }
}

/// A shader with its uniform values and optional texture override
#[derive(Clone, Debug)]
pub struct Material {
    shader: Arc<ShaderProgram>,
    values: HashMap<String, UniformValue>,
    texture: Option<Arc<Texture>>,
}

impl Material {
    /// A material with all uniforms zeroed
    pub fn new(shader: Arc<ShaderProgram>) -> Self {
        Self {
            shader,
            values: HashMap::new(),
            texture: None,
        }
    }

    /// The built-in lit material: white, moderately shiny
    pub fn default_lit() -> Result<Self, ShaderError> {
        let mut material = Self::new(Arc::new(ShaderProgram::default_lit()?));
        material.values.insert("color".into(), UniformValue::Vec4(Vec4::rgba(1.0, 1.0, 1.0, 1.0)));
        material.values.insert("specular".into(), UniformValue::Vec3(Vec3::splat(0.5)));
        material.values.insert("shininess".into(), UniformValue::Float(32.0));
        Ok(material)
    }

    /// Set a uniform after checking it against the shader's material block
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<(), UniformError> {
        let value = value.into();
        check(&self.shader, name, &value)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Whether `value` could be assigned to `name` without storing it
    pub fn check_uniform(&self, name: &str, value: &UniformValue) -> Result<(), UniformError> {
        check(&self.shader, name, value)
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    /// Builder-style texture override
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn set_texture(&mut self, texture: Option<Arc<Texture>>) {
        self.texture = texture;
    }

    /// Texture used instead of the mesh's own, if set
    pub fn texture(&self) -> Option<&Arc<Texture>> {
        self.texture.as_ref()
    }

    pub fn shader(&self) -> &Arc<ShaderProgram> {
        &self.shader
    }

    /// Material block bytes with the material's own values
    pub fn uniform_bytes(&self) -> Vec<u8> {
        let layout = self.shader.layout();
        let mut out = vec![0u8; layout.size() as usize];
        write_values(layout, &mut out, &self.values);
        out
    }

    /// Material block bytes with per-object `overrides` applied on top
    ///
    /// Every override is checked; the first bad one fails the whole block.
    pub fn uniform_bytes_with(&self, overrides: &HashMap<String, UniformValue>) -> Result<Vec<u8>, UniformError> {
        for (name, value) in overrides {
            check(&self.shader, name, value)?;
        }
        let mut out = self.uniform_bytes();
        write_values(self.shader.layout(), &mut out, overrides);
        Ok(out)
    }
}
