//! RGBA textures, sprites and cube maps
//!
//! Pixel data always lives in CPU memory as tightly packed RGBA8; the
//! renderer uploads it on first use and keys the upload on the resource id.

use std::path::Path;
use std::sync::Arc;

use lumen_math::Vec2;

use crate::error::ResourceLoadError;
use crate::resource_cache::{Resource, ResourceId};

/// A 2D RGBA8 image
#[derive(Clone, Debug)]
pub struct Texture {
    id: ResourceId,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    /// Wrap raw RGBA8 pixels
    ///
    /// A buffer of the wrong length is padded with transparent black or
    /// truncated to `width * height * 4` bytes.
    pub fn from_rgba8(width: u32, height: u32, mut pixels: Vec<u8>) -> Self {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            log::warn!(
                "Texture data is {} bytes, expected {} for {}x{}",
                pixels.len(),
                expected,
                width,
                height
            );
            pixels.resize(expected, 0);
        }
        Self {
            id: ResourceId::next(),
            width,
            height,
            pixels,
        }
    }

    /// A 1x1 texture of a single color
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::from_rgba8(1, 1, rgba.to_vec())
    }

    /// The texture sampled by untextured meshes
    pub fn white() -> Self {
        Self::solid([255; 4])
    }

    /// Decode an image file (PNG, JPEG, BMP or TGA)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ResourceLoadError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| image_error(path, e))?.to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self::from_rgba8(width, height, image.into_raw()))
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA at `(x, y)`, or `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.pixels[i..i + 4];
        Some([p[0], p[1], p[2], p[3]])
    }
}

impl Resource for Texture {
    fn load_from_file(path: &Path) -> Result<Self, ResourceLoadError> {
        Self::from_file(path)
    }
}

pub(crate) fn image_error(path: &Path, err: image::ImageError) -> ResourceLoadError {
    match err {
        image::ImageError::IoError(e) => ResourceLoadError::io(path, e),
        image::ImageError::Unsupported(_) => ResourceLoadError::unsupported(path),
        other => ResourceLoadError::decode(path, other),
    }
}

/// A textured rectangle for screen-space drawing
///
/// By default the sprite covers the whole texture; [`Sprite::region`] cuts
/// out a sub-rectangle of a sheet.
#[derive(Clone, Debug)]
pub struct Sprite {
    texture: Arc<Texture>,
    uv_min: Vec2,
    uv_max: Vec2,
}

impl Sprite {
    pub fn new(texture: Arc<Texture>) -> Self {
        Self {
            texture,
            uv_min: Vec2::ZERO,
            uv_max: Vec2::ONE,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ResourceLoadError> {
        Ok(Self::new(Arc::new(Texture::from_file(path)?)))
    }

    /// A sprite showing the pixel rectangle `(x, y, width, height)`
    ///
    /// The rectangle is clamped to the texture.
    pub fn region(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let size = self.texture.size();
        let x0 = (x as f32).min(size.x);
        let y0 = (y as f32).min(size.y);
        let x1 = (x.saturating_add(width) as f32).min(size.x);
        let y1 = (y.saturating_add(height) as f32).min(size.y);
        let (sx, sy) = (size.x.max(1.0), size.y.max(1.0));
        Self {
            texture: self.texture.clone(),
            uv_min: Vec2::new(x0 / sx, y0 / sy),
            uv_max: Vec2::new(x1 / sx, y1 / sy),
        }
    }

    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    /// Texture coordinates of the top-left and bottom-right corners
    pub fn uv_rect(&self) -> (Vec2, Vec2) {
        (self.uv_min, self.uv_max)
    }

    /// Size in pixels at scale 1
    pub fn size(&self) -> Vec2 {
        (self.uv_max - self.uv_min).component_mul(self.texture.size())
    }
}

/// Six square faces for environment mapping
///
/// Faces are stored in the order +X, -X, +Y, -Y, +Z, -Z, which matches the
/// file order right, left, top, bottom, back, front.
#[derive(Clone, Debug)]
pub struct CubeMap {
    id: ResourceId,
    size: u32,
    faces: [Vec<u8>; 6],
}

impl CubeMap {
    /// Load six face images: right, left, top, bottom, back, front
    ///
    /// Every face must be square and all faces must share one size.
    pub fn from_files<P: AsRef<Path>>(paths: [P; 6]) -> Result<Self, ResourceLoadError> {
        let mut faces: [Vec<u8>; 6] = Default::default();
        let mut size = None;
        for (slot, path) in faces.iter_mut().zip(paths.iter()) {
            let texture = Texture::from_file(path)?;
            let path = path.as_ref();
            if texture.width() != texture.height() {
                return Err(ResourceLoadError::decode(
                    path,
                    format!("cube map face is {}x{}, not square", texture.width(), texture.height()),
                ));
            }
            match size {
                None => size = Some(texture.width()),
                Some(s) if s != texture.width() => {
                    return Err(ResourceLoadError::decode(
                        path,
                        format!("cube map face is {} pixels, other faces are {}", texture.width(), s),
                    ));
                }
                Some(_) => {}
            }
            *slot = texture.pixels;
        }
        Ok(Self::from_faces(size.unwrap_or(0), faces))
    }

    /// Build from raw RGBA8 faces of `size * size` pixels each
    pub fn from_faces(size: u32, mut faces: [Vec<u8>; 6]) -> Self {
        let expected = size as usize * size as usize * 4;
        for face in faces.iter_mut() {
            face.resize(expected, 0);
        }
        Self {
            id: ResourceId::next(),
            size,
            faces,
        }
    }

    /// Every face one flat color
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::from_faces(1, std::array::from_fn(|_| rgba.to_vec()))
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Edge length of each face in pixels
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn faces(&self) -> &[Vec<u8>; 6] {
        &self.faces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_png(name: &str, width: u32, height: u32) -> PathBuf {
        let dir = std::env::temp_dir().join("lumen_texture_tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_from_rgba8_fixes_length() {
        let tex = Texture::from_rgba8(2, 2, vec![255; 3]);
        assert_eq!(tex.pixels().len(), 16);
        assert_eq!(tex.pixel(0, 0), Some([255, 255, 255, 0]));
        assert_eq!(tex.pixel(2, 0), None);
    }

    #[test]
    fn test_load_png() {
        let path = write_png("load.png", 4, 2);
        let tex = Texture::from_file(&path).unwrap();
        assert_eq!((tex.width(), tex.height()), (4, 2));
        assert_eq!(tex.pixel(3, 1), Some([10, 20, 30, 255]));
    }

    #[test]
    fn test_missing_image_is_io_error() {
        let err = Texture::from_file("/no/such/image.png").unwrap_err();
        assert!(matches!(err, ResourceLoadError::Io { .. }), "Expected Io, got {:?}", err);
    }

    #[test]
    fn test_sprite_region() {
        let sprite = Sprite::new(Arc::new(Texture::from_rgba8(64, 32, vec![0; 64 * 32 * 4])));
        assert_eq!(sprite.size(), Vec2::new(64.0, 32.0));

        let frame = sprite.region(16, 0, 16, 16);
        let (min, max) = frame.uv_rect();
        assert_eq!(min, Vec2::new(0.25, 0.0));
        assert_eq!(max, Vec2::new(0.5, 0.5));
        assert_eq!(frame.size(), Vec2::new(16.0, 16.0));
        assert!(Arc::ptr_eq(frame.texture(), sprite.texture()));
    }

    #[test]
    fn test_cubemap_rejects_non_square() {
        let square = write_png("square.png", 4, 4);
        let wide = write_png("wide.png", 8, 4);
        let paths = [&square, &square, &square, &square, &square, &wide];
        let err = CubeMap::from_files(paths).unwrap_err();
        assert!(matches!(err, ResourceLoadError::Decode { .. }));
    }

    #[test]
    fn test_cubemap_rejects_mismatched_faces() {
        let small = write_png("small.png", 4, 4);
        let big = write_png("big.png", 8, 8);
        let err = CubeMap::from_files([&small, &big, &small, &small, &small, &small]).unwrap_err();
        assert_eq!(err.path(), big.as_path());
    }

    #[test]
    fn test_cubemap_loads() {
        let face = write_png("face.png", 4, 4);
        let cube = CubeMap::from_files([&face, &face, &face, &face, &face, &face]).unwrap();
        assert_eq!(cube.size(), 4);
        assert!(cube.faces().iter().all(|f| f.len() == 64));
    }
}
