//! Screen-space sprites
//!
//! Sprites, text glyphs and the rest of the 2D overlay all reduce to
//! [`ScreenQuad`]s: a textured rectangle placed in window pixels.

use lumen_math::{Vec2, Vec4};

use crate::texture::Sprite;
use crate::transform::Transform2D;

/// A textured rectangle in window pixels
///
/// Uses the [`Transform2D`] convention: origin at the top-left corner and
/// `+Y` pointing down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenQuad {
    pub center: Vec2,
    pub size: Vec2,
    /// Clockwise on screen, in radians
    pub rotation: f32,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
    /// Multiplied with the texture
    pub color: Vec4,
    /// Larger depth draws on top
    pub depth: f32,
}

impl ScreenQuad {
    /// The four corners, clockwise on screen from the top-left
    pub fn corners(&self) -> [Vec2; 4] {
        let h = self.size * 0.5;
        [
            Vec2::new(-h.x, -h.y),
            Vec2::new(h.x, -h.y),
            Vec2::new(h.x, h.y),
            Vec2::new(-h.x, h.y),
        ]
        .map(|c| c.rotated(self.rotation) + self.center)
    }
}

/// A sprite placed on screen
#[derive(Clone, Debug)]
pub struct Object2D {
    pub sprite: Sprite,
    /// Position is the sprite's center
    pub transform: Transform2D,
    pub depth: f32,
    pub tint: Vec4,
    pub visible: bool,
}

impl Object2D {
    pub fn new(sprite: Sprite, transform: Transform2D, depth: f32) -> Self {
        Self {
            sprite,
            transform,
            depth,
            tint: Vec4::rgba(1.0, 1.0, 1.0, 1.0),
            visible: true,
        }
    }

    /// On-screen size in pixels after scaling
    pub fn scaled_size(&self) -> Vec2 {
        self.sprite.size().component_mul(self.transform.scale)
    }

    pub fn quad(&self) -> ScreenQuad {
        let (uv_min, uv_max) = self.sprite.uv_rect();
        ScreenQuad {
            center: self.transform.position,
            size: self.scaled_size(),
            rotation: self.transform.rotation,
            uv_min,
            uv_max,
            color: self.tint,
            depth: self.depth,
        }
    }
}
