//! Screen-space text
//!
//! A [`Text`] lays its string out with the font's glyph metrics and hands
//! the renderer one [`ScreenQuad`] per visible glyph, all sampling the
//! font atlas.

use std::sync::Arc;

use lumen_math::{Vec2, Vec4};

use crate::font::Font;
use crate::object2d::ScreenQuad;
use crate::transform::Transform2D;

/// A string drawn on screen
///
/// The transform's position is the top-left corner of the first line.
/// `\n` starts a new line.
#[derive(Clone, Debug)]
pub struct Text {
    pub text: String,
    pub font: Arc<Font>,
    pub color: Vec4,
    pub transform: Transform2D,
    pub depth: f32,
    pub visible: bool,
}

impl Text {
    pub fn new(text: impl Into<String>, font: Arc<Font>, transform: Transform2D) -> Self {
        Self {
            text: text.into(),
            font,
            color: Vec4::rgba(1.0, 1.0, 1.0, 1.0),
            transform,
            depth: 0.0,
            visible: true,
        }
    }

    /// One quad per glyph with a non-empty bitmap
    pub fn layout(&self) -> Vec<ScreenQuad> {
        let font = &self.font;
        let mut quads = Vec::with_capacity(self.text.len());
        let mut pen = Vec2::ZERO;
        let mut baseline = font.ascent();

        for ch in self.text.chars() {
            if ch == '\n' {
                pen.x = 0.0;
                baseline += font.line_height();
                continue;
            }
            let glyph = font.glyph(ch);
            if glyph.size.x > 0.0 && glyph.size.y > 0.0 {
                let top_left = Vec2::new(pen.x + glyph.bearing.x, baseline - glyph.bearing.y);
                let local_center = top_left + glyph.size * 0.5;
                quads.push(ScreenQuad {
                    center: self.transform.transform_point(local_center),
                    size: glyph.size.component_mul(self.transform.scale),
                    rotation: self.transform.rotation,
                    uv_min: glyph.uv_min,
                    uv_max: glyph.uv_max,
                    color: self.color,
                    depth: self.depth,
                });
            }
            pen.x += glyph.advance;
        }
        quads
    }

    /// Unscaled width of the widest line and total height, in pixels
    pub fn measure(&self) -> Vec2 {
        let font = &self.font;
        let mut widest: f32 = 0.0;
        let mut lines = 0;
        for line in self.text.split('\n') {
            let width: f32 = line.chars().map(|ch| font.glyph(ch).advance).sum();
            widest = widest.max(width);
            lines += 1;
        }
        Vec2::new(widest, lines as f32 * font.line_height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::block_font;

    #[test]
    fn test_layout_advances_pen() {
        let text = Text::new("AB", Arc::new(block_font(8, 12)), Transform2D::from_position(Vec2::new(100.0, 50.0)));
        let quads = text.layout();
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].center, Vec2::new(104.0, 56.0));
        assert_eq!(quads[1].center, Vec2::new(113.0, 56.0));
        assert_eq!(quads[0].size, Vec2::new(8.0, 12.0));
    }

    #[test]
    fn test_spaces_take_room_without_quads() {
        let text = Text::new("A B", Arc::new(block_font(8, 12)), Transform2D::default());
        let quads = text.layout();
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[1].center.x, 2.0 * 9.0 + 4.0);
    }

    #[test]
    fn test_newline_moves_down() {
        let text = Text::new("A\nA", Arc::new(block_font(8, 12)), Transform2D::default());
        let quads = text.layout();
        assert_eq!(quads[0].center.x, quads[1].center.x);
        assert_eq!(quads[1].center.y - quads[0].center.y, 18.0);
    }

    #[test]
    fn test_scale_applies_to_layout() {
        let mut transform = Transform2D::default();
        transform.scale = Vec2::new(2.0, 2.0);
        let text = Text::new("AA", Arc::new(block_font(8, 12)), transform);
        let quads = text.layout();
        assert_eq!(quads[0].size, Vec2::new(16.0, 24.0));
        assert_eq!(quads[1].center.x - quads[0].center.x, 18.0);
    }

    #[test]
    fn test_measure() {
        let text = Text::new("AB\nA", Arc::new(block_font(8, 12)), Transform2D::default());
        assert_eq!(text.measure(), Vec2::new(18.0, 36.0));
    }
}
