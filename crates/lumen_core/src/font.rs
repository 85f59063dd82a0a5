//! Bitmap fonts rasterized from TrueType/OpenType files
//!
//! The 128 ASCII glyphs are rasterized once at a fixed pixel size with
//! `swash` and packed into a single atlas texture. Coverage is stored in the
//! alpha channel over white, so text color is a plain multiply.

use std::path::Path;
use std::sync::Arc;

use lumen_math::Vec2;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;

use crate::error::ResourceLoadError;
use crate::resource_cache::{Resource, ResourceId};
use crate::texture::Texture;

/// Pixel size used when a font is loaded through the resource cache
pub const DEFAULT_PIXEL_SIZE: f32 = 48.0;

const GLYPH_COUNT: usize = 128;
const ATLAS_WIDTH: u32 = 512;
const PADDING: u32 = 1;

/// Placement and atlas location of one glyph, in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Glyph {
    /// Bitmap width and height
    pub size: Vec2,
    /// Offset from the pen position to the bitmap's left edge and from the
    /// baseline up to its top edge
    pub bearing: Vec2,
    /// Horizontal pen advance
    pub advance: f32,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
}

/// A rasterized glyph bitmap before packing
pub(crate) struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: i32,
    pub advance: f32,
    /// One coverage byte per pixel
    pub coverage: Vec<u8>,
}

/// An ASCII font at a fixed pixel size
#[derive(Clone, Debug)]
pub struct Font {
    id: ResourceId,
    pixel_size: f32,
    ascent: f32,
    line_height: f32,
    glyphs: Vec<Glyph>,
    atlas: Arc<Texture>,
}

impl Font {
    /// Load and rasterize a font file
    pub fn from_file(path: impl AsRef<Path>, pixel_size: f32) -> Result<Self, ResourceLoadError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| ResourceLoadError::io(path, e))?;
        Self::from_bytes(&data, pixel_size)
            .ok_or_else(|| ResourceLoadError::decode(path, "not a TrueType or OpenType font"))
    }

    /// Rasterize a font from memory; `None` if the data isn't a font
    pub fn from_bytes(data: &[u8], pixel_size: f32) -> Option<Self> {
        let font = swash::FontRef::from_index(data, 0)?;
        let pixel_size = pixel_size.max(1.0);

        let metrics = font.metrics(&[]);
        let scale = pixel_size / metrics.units_per_em.max(1) as f32;
        let glyph_metrics = font.glyph_metrics(&[]);
        let charmap = font.charmap();

        let mut context = ScaleContext::new();
        let mut scaler = context.builder(font).size(pixel_size).build();
        let mut render = Render::new(&[
            Source::ColorOutline(0),
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::Outline,
        ]);
        render.format(Format::Alpha);

        let bitmaps: Vec<GlyphBitmap> = (0..GLYPH_COUNT as u32)
            .map(|code| {
                let gid = char::from_u32(code).map_or(0, |ch| charmap.map(ch));
                let advance = glyph_metrics.advance_width(gid) * scale;
                match render.render(&mut scaler, gid) {
                    Some(image) => {
                        let (w, h) = (image.placement.width, image.placement.height);
                        let pixels = (w * h) as usize;
                        // Color glyphs come back as RGBA; keep their alpha
                        let coverage = if image.data.len() == pixels * 4 {
                            image.data.chunks_exact(4).map(|p| p[3]).collect()
                        } else {
                            image.data
                        };
                        GlyphBitmap {
                            width: w,
                            height: h,
                            left: image.placement.left,
                            top: image.placement.top,
                            advance,
                            coverage,
                        }
                    }
                    None => GlyphBitmap {
                        width: 0,
                        height: 0,
                        left: 0,
                        top: 0,
                        advance,
                        coverage: Vec::new(),
                    },
                }
            })
            .collect();

        let ascent = metrics.ascent * scale;
        let line_height = (metrics.ascent + metrics.descent + metrics.leading) * scale;
        Some(Self::from_bitmaps(pixel_size, ascent, line_height, &bitmaps))
    }

    /// A font whose visible glyphs are all solid `width` x `height` boxes
    ///
    /// Needs no font file, so it serves as a placeholder and for layout checks.
    pub fn blocks(width: u32, height: u32) -> Self {
        let bitmaps: Vec<GlyphBitmap> = (0..GLYPH_COUNT)
            .map(|i| {
                let blank = i <= ' ' as usize;
                let (w, h) = if blank { (0, 0) } else { (width, height) };
                GlyphBitmap {
                    width: w,
                    height: h,
                    left: 0,
                    top: height as i32,
                    advance: (width + 1) as f32,
                    coverage: vec![255; (w * h) as usize],
                }
            })
            .collect();
        Self::from_bitmaps(height as f32, height as f32, height as f32 * 1.5, &bitmaps)
    }

    /// Pack pre-rasterized glyphs into an atlas
    pub(crate) fn from_bitmaps(pixel_size: f32, ascent: f32, line_height: f32, bitmaps: &[GlyphBitmap]) -> Self {
        let sizes: Vec<(u32, u32)> = bitmaps.iter().map(|b| (b.width, b.height)).collect();
        let (positions, atlas_width, atlas_height) = pack_shelves(&sizes, ATLAS_WIDTH);

        let mut pixels = [255u8, 255, 255, 0].repeat(atlas_width as usize * atlas_height as usize);

        let (aw, ah) = (atlas_width as f32, atlas_height as f32);
        let mut glyphs = vec![Glyph::default(); GLYPH_COUNT];
        for (i, (bitmap, &(x, y))) in bitmaps.iter().zip(&positions).take(GLYPH_COUNT).enumerate() {
            for row in 0..bitmap.height {
                for col in 0..bitmap.width {
                    let src = (row * bitmap.width + col) as usize;
                    let dst = ((y + row) as usize * atlas_width as usize + (x + col) as usize) * 4;
                    pixels[dst + 3] = bitmap.coverage.get(src).copied().unwrap_or(0);
                }
            }
            glyphs[i] = Glyph {
                size: Vec2::new(bitmap.width as f32, bitmap.height as f32),
                bearing: Vec2::new(bitmap.left as f32, bitmap.top as f32),
                advance: bitmap.advance,
                uv_min: Vec2::new(x as f32 / aw, y as f32 / ah),
                uv_max: Vec2::new((x + bitmap.width) as f32 / aw, (y + bitmap.height) as f32 / ah),
            };
        }

        Self {
            id: ResourceId::next(),
            pixel_size,
            ascent,
            line_height: line_height.max(1.0),
            glyphs,
            atlas: Arc::new(Texture::from_rgba8(atlas_width, atlas_height, pixels)),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    /// Distance from the baseline to the top of the tallest glyphs
    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    /// Baseline-to-baseline distance
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Glyph for `ch`; characters outside ASCII fall back to `?`
    pub fn glyph(&self, ch: char) -> &Glyph {
        let index = if ch.is_ascii() { ch as usize } else { '?' as usize };
        &self.glyphs[index]
    }

    pub fn atlas(&self) -> &Arc<Texture> {
        &self.atlas
    }
}

impl Resource for Font {
    fn load_from_file(path: &Path) -> Result<Self, ResourceLoadError> {
        Self::from_file(path, DEFAULT_PIXEL_SIZE)
    }
}

/// Place rectangles left to right in rows
///
/// Returns each rectangle's top-left corner and the atlas size. The height
/// is rounded up to a power of two.
fn pack_shelves(sizes: &[(u32, u32)], max_width: u32) -> (Vec<(u32, u32)>, u32, u32) {
    let widest = sizes.iter().map(|s| s.0 + PADDING).max().unwrap_or(0);
    let width = max_width.max(widest).next_power_of_two();

    let mut positions = Vec::with_capacity(sizes.len());
    let (mut x, mut y, mut row_height) = (PADDING, PADDING, 0);
    for &(w, h) in sizes {
        if x + w + PADDING > width {
            x = PADDING;
            y += row_height + PADDING;
            row_height = 0;
        }
        positions.push((x, y));
        x += w + PADDING;
        row_height = row_height.max(h);
    }
    let height = (y + row_height + PADDING).next_power_of_two();
    (positions, width, height)
}
