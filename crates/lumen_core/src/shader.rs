//! Shader programs and uniform reflection
//!
//! A [`ShaderProgram`] is WGSL source with the engine prelude prepended. The
//! prelude declares the per-frame, per-object and texture bindings; the
//! program itself supplies `vs_main`, `fs_main` and optionally a material
//! block at `@group(2) @binding(0)`.
//!
//! Programs are parsed and validated with `naga` when they are created, so
//! a bad shader fails at load time instead of at draw time. The material
//! block's members are reflected into a [`UniformLayout`] that
//! [`Material`](crate::material::Material) checks values against.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::resource_cache::ResourceId;

/// Bindings and helpers shared by all mesh shaders
pub const PRELUDE: &str = include_str!("shaders/prelude.wgsl");

/// Source of the built-in lit material
pub const DEFAULT_LIT_SOURCE: &str = include_str!("shaders/default_lit.wgsl");

/// Bind group holding the material block
pub const MATERIAL_GROUP: u32 = 2;

/// Largest material block in bytes
pub const MAX_MATERIAL_BLOCK: u32 = 256;

/// Type of a reflected uniform member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Int,
    UInt,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    /// Bytes written for a value of this kind
    pub fn size(self) -> usize {
        match self {
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "i32",
            Self::UInt => "u32",
            Self::Float => "f32",
            Self::Vec2 => "vec2<f32>",
            Self::Vec3 => "vec3<f32>",
            Self::Vec4 => "vec4<f32>",
            Self::Mat4 => "mat4x4<f32>",
        };
        f.write_str(name)
    }
}

/// One member of the material block
#[derive(Clone, Debug, PartialEq)]
pub struct UniformField {
    pub name: String,
    pub kind: UniformKind,
    /// Byte offset inside the block
    pub offset: u32,
}

/// Reflected material block
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    size: u32,
}

impl UniformLayout {
    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Block size in bytes, 0 if the program declares no material block
    pub fn size(&self) -> u32 {
        self.size
    }
}

/// Shader creation errors
#[derive(Debug)]
pub enum ShaderError {
    Io { path: PathBuf, source: std::io::Error },
    /// WGSL syntax error, with the rendered diagnostic
    Parse { name: String, message: String },
    /// Type or binding error found by validation
    Validation { name: String, message: String },
    MissingEntryPoint { name: String, entry_point: &'static str },
    /// The material block is not a struct or is too large
    MaterialBlock { name: String, message: String },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "Failed to read shader {}: {}", path.display(), source),
            Self::Parse { name, message } => write!(f, "Shader '{}' failed to parse:\n{}", name, message),
            Self::Validation { name, message } => write!(f, "Shader '{}' is invalid:\n{}", name, message),
            Self::MissingEntryPoint { name, entry_point } => {
                write!(f, "Shader '{}' has no '{}' entry point", name, entry_point)
            }
            Self::MaterialBlock { name, message } => {
                write!(f, "Shader '{}' material block: {}", name, message)
            }
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A validated WGSL program
#[derive(Clone, Debug)]
pub struct ShaderProgram {
    id: ResourceId,
    name: String,
    source: String,
    layout: UniformLayout,
}

impl ShaderProgram {
    /// Prepend the prelude to `body`, then parse, validate and reflect it
    pub fn from_wgsl(name: impl Into<String>, body: &str) -> Result<Self, ShaderError> {
        let name = name.into();
        let source = format!("{}\n{}", PRELUDE, body);

        let module = naga::front::wgsl::parse_str(&source).map_err(|e| ShaderError::Parse {
            name: name.clone(),
            message: e.emit_to_string(&source),
        })?;

        naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::empty())
            .validate(&module)
            .map_err(|e| ShaderError::Validation {
                name: name.clone(),
                message: e.emit_to_string(&source),
            })?;

        for (entry_point, stage) in [("vs_main", naga::ShaderStage::Vertex), ("fs_main", naga::ShaderStage::Fragment)] {
            if !module.entry_points.iter().any(|e| e.name == entry_point && e.stage == stage) {
                return Err(ShaderError::MissingEntryPoint { name, entry_point });
            }
        }

        let layout = reflect_material_block(&module).map_err(|message| ShaderError::MaterialBlock {
            name: name.clone(),
            message,
        })?;
        log::debug!("Shader '{}' material block: {} fields, {} bytes", name, layout.fields.len(), layout.size);

        Ok(Self {
            id: ResourceId::next(),
            name,
            source,
            layout,
        })
    }

    /// Load a WGSL file; the program is named after the file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_wgsl(path.display().to_string(), &body)
    }

    /// The built-in Blinn-Phong program
    pub fn default_lit() -> Result<Self, ShaderError> {
        Self::from_wgsl("default_lit", DEFAULT_LIT_SOURCE)
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full source including the prelude
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }
}

fn reflect_material_block(module: &naga::Module) -> Result<UniformLayout, String> {
    let block = module.global_variables.iter().find(|(_, var)| {
        var.space == naga::AddressSpace::Uniform
            && var
                .binding
                .as_ref()
                .is_some_and(|b| b.group == MATERIAL_GROUP && b.binding == 0)
    });
    let Some((_, var)) = block else {
        return Ok(UniformLayout::default());
    };

    let naga::TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
        return Err("must be a struct".to_string());
    };
    if *span > MAX_MATERIAL_BLOCK {
        return Err(format!("{} bytes exceeds the {} byte limit", span, MAX_MATERIAL_BLOCK));
    }

    let mut fields = Vec::with_capacity(members.len());
    for member in members {
        let Some(name) = &member.name else {
            continue;
        };
        let Some(kind) = uniform_kind(&module.types[member.ty].inner) else {
            return Err(format!("member '{}' has an unsupported type", name));
        };
        fields.push(UniformField {
            name: name.clone(),
            kind,
            offset: member.offset,
        });
    }
    Ok(UniformLayout { fields, size: *span })
}

fn uniform_kind(inner: &naga::TypeInner) -> Option<UniformKind> {
    use naga::{ScalarKind, TypeInner, VectorSize};

    match inner {
        TypeInner::Scalar(scalar) => match scalar.kind {
            ScalarKind::Sint => Some(UniformKind::Int),
            ScalarKind::Uint => Some(UniformKind::UInt),
            ScalarKind::Float => Some(UniformKind::Float),
            _ => None,
        },
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float => match size {
            VectorSize::Bi => Some(UniformKind::Vec2),
            VectorSize::Tri => Some(UniformKind::Vec3),
            VectorSize::Quad => Some(UniformKind::Vec4),
        },
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            ..
        } => Some(UniformKind::Mat4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSTHROUGH: &str = r#"
struct Tint {
    strength: f32,
    levels: i32,
    color: vec4<f32>,
}
@group(2) @binding(0) var<uniform> tint: Tint;

@vertex
fn vs_main(input: VertexInput) -> @builtin(position) vec4<f32> {
    let surface = surface_point(input);
    return clip_position(surface.world_position);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return tint.color * tint.strength * f32(tint.levels);
}
"#;

    #[test]
    fn test_default_lit_reflects_block() {
        let shader = ShaderProgram::default_lit().unwrap();
        let layout = shader.layout();
        assert_eq!(layout.size(), 32);

        let color = layout.field("color").unwrap();
        assert_eq!((color.kind, color.offset), (UniformKind::Vec4, 0));
        let specular = layout.field("specular").unwrap();
        assert_eq!((specular.kind, specular.offset), (UniformKind::Vec3, 16));
        let shininess = layout.field("shininess").unwrap();
        assert_eq!((shininess.kind, shininess.offset), (UniformKind::Float, 28));
    }

    #[test]
    fn test_custom_block_offsets() {
        let shader = ShaderProgram::from_wgsl("tint", PASSTHROUGH).unwrap();
        let layout = shader.layout();
        assert_eq!(layout.field("strength").unwrap().kind, UniformKind::Float);
        assert_eq!(layout.field("levels").unwrap().kind, UniformKind::Int);
        // vec4 aligns to 16
        assert_eq!(layout.field("color").unwrap().offset, 16);
        assert_eq!(layout.size(), 32);
        assert!(shader.source().starts_with(PRELUDE));
    }

    #[test]
    fn test_no_material_block() {
        let body = r#"
@vertex
fn vs_main(input: VertexInput) -> @builtin(position) vec4<f32> {
    return vec4<f32>(input.position, 1.0);
}
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;
        let shader = ShaderProgram::from_wgsl("plain", body).unwrap();
        assert_eq!(shader.layout().size(), 0);
        assert!(shader.layout().fields().is_empty());
    }

    #[test]
    fn test_syntax_error() {
        let err = ShaderProgram::from_wgsl("broken", "fn vs_main( {").unwrap_err();
        assert!(matches!(err, ShaderError::Parse { .. }), "Expected Parse, got {:?}", err);
    }

    #[test]
    fn test_type_error_caught_by_validation() {
        let body = r#"
@vertex
fn vs_main(input: VertexInput) -> @builtin(position) vec4<f32> {
    return vec4<f32>(input.position, 1.0);
}
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let x: f32 = 1u;
    return vec4<f32>(x);
}
"#;
        let err = ShaderProgram::from_wgsl("mistyped", body).unwrap_err();
        assert!(
            matches!(err, ShaderError::Parse { .. } | ShaderError::Validation { .. }),
            "got {:?}",
            err
        );
    }

    #[test]
    fn test_missing_entry_point() {
        let body = "@vertex\nfn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }\n";
        let err = ShaderProgram::from_wgsl("half", body).unwrap_err();
        assert!(matches!(err, ShaderError::MissingEntryPoint { entry_point: "fs_main", .. }), "got {:?}", err);
    }

    #[test]
    fn test_oversized_block_rejected() {
        let body = r#"
struct Big { a: mat4x4<f32>, b: mat4x4<f32>, c: mat4x4<f32>, d: mat4x4<f32>, e: vec4<f32> }
@group(2) @binding(0) var<uniform> big: Big;
@vertex
fn vs_main() -> @builtin(position) vec4<f32> { return big.e; }
@fragment
fn fs_main() -> @location(0) vec4<f32> { return big.a[0]; }
"#;
        let err = ShaderProgram::from_wgsl("big", body).unwrap_err();
        assert!(matches!(err, ShaderError::MaterialBlock { .. }), "got {:?}", err);
    }
}
