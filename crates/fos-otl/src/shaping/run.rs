//! Shaped glyph run

use std::ops::AddAssign;

use crate::font::GlyphId;
use super::Cluster;

/// Positioning adjustment for one glyph, in font design units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PositionAdjustment {
    /// Horizontal offset of the glyph from the pen position
    pub placement_x: i32,
    /// Vertical offset of the glyph from the pen position
    pub placement_y: i32,
    /// Horizontal change to the glyph's advance
    pub advance_x: i32,
    /// Vertical change to the glyph's advance
    pub advance_y: i32,
}

impl PositionAdjustment {
    pub fn new(placement_x: i32, placement_y: i32, advance_x: i32, advance_y: i32) -> Self {
        Self { placement_x, placement_y, advance_x, advance_y }
    }

    /// Check if the record carries no adjustment
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for PositionAdjustment {
    fn add_assign(&mut self, rhs: Self) {
        self.placement_x += rhs.placement_x;
        self.placement_y += rhs.placement_y;
        self.advance_x += rhs.advance_x;
        self.advance_y += rhs.advance_y;
    }
}

/// Result of shaping: final glyphs, their adjustments and the run width
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapedGlyphRun {
    /// Final glyph IDs in logical order
    pub glyphs: Vec<GlyphId>,
    /// Source character indices per glyph, `None` when a stage dropped the cluster map
    pub clusters: Option<Vec<Cluster>>,
    /// Raw advance width per glyph (font units)
    pub advances: Vec<u16>,
    /// Per-glyph adjustments, `None` when no positioning was applied
    pub adjustments: Option<Vec<PositionAdjustment>>,
    /// Total advance normalized to 1000 units per em
    pub width: f32,
}

impl ShapedGlyphRun {
    /// Run with no glyphs and zero width
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of glyphs
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Whether a positioning stage produced adjustments
    pub fn is_positioned(&self) -> bool {
        self.adjustments.is_some()
    }

    /// Adjustment for glyph `index`, zero when unpositioned
    pub fn adjustment(&self, index: usize) -> PositionAdjustment {
        self.adjustments
            .as_ref()
            .and_then(|adjustments| adjustments.get(index).copied())
            .unwrap_or_default()
    }

    /// Index of the glyph whose cluster contains character `char_index`
    pub fn glyph_for_char(&self, char_index: usize) -> Option<usize> {
        self.clusters.as_ref()?.iter().position(|cluster| cluster.contains(&char_index))
    }

    /// Source characters of glyph `index`
    pub fn cluster(&self, index: usize) -> Option<&[usize]> {
        self.clusters.as_ref()?.get(index).map(Vec::as_slice)
    }

    /// Iterate over glyphs with pen positions, font units multiplied by `scale`
    pub fn positioned_glyphs(&self, scale: f32) -> impl Iterator<Item = PositionedGlyph> + '_ {
        let mut x = 0.0;
        let mut y = 0.0;

        self.glyphs.iter().enumerate().map(move |(i, &glyph_id)| {
            let adjust = self.adjustment(i);
            let pos = PositionedGlyph {
                glyph_id,
                x: x + adjust.placement_x as f32 * scale,
                y: y + adjust.placement_y as f32 * scale,
                cluster: self.cluster(i).and_then(|c| c.first().copied()),
            };
            let advance = self.advances.get(i).copied().unwrap_or(0) as i32 + adjust.advance_x;
            x += advance as f32 * scale;
            y += adjust.advance_y as f32 * scale;
            pos
        })
    }
}

/// A glyph with a scaled pen position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    /// Glyph ID in the font
    pub glyph_id: GlyphId,
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// First source character of the glyph's cluster
    pub cluster: Option<usize>,
}
