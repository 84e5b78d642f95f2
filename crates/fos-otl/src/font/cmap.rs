//! Character to glyph mapping

use std::collections::HashMap;

use super::GlyphId;

/// Maps Unicode code points to glyph IDs
///
/// Implementations never fail: a code point the font does not cover maps
/// to `.notdef` (glyph 0), so shaping continues past unsupported characters.
pub trait CharacterToGlyphMapper: Send + Sync {
    /// Glyph for `code_point`, or [`GlyphId::NOTDEF`] when unmapped
    fn glyph_id(&self, code_point: char) -> GlyphId;
}

/// In-memory cmap built from explicit mappings
#[derive(Debug, Clone, Default)]
pub struct CharMap {
    mappings: HashMap<char, GlyphId>,
}

impl CharMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a single character
    pub fn insert(&mut self, c: char, glyph_id: GlyphId) {
        self.mappings.insert(c, glyph_id);
    }

    /// Map a contiguous character range onto consecutive glyphs starting at `start_glyph`
    pub fn insert_range(&mut self, start: char, end: char, start_glyph: GlyphId) {
        for (offset, c) in (start..=end).enumerate() {
            let glyph = start_glyph.0 as usize + offset;
            if glyph > u16::MAX as usize {
                break;
            }
            self.mappings.insert(c, GlyphId(glyph as u16));
        }
    }

    /// Explicit lookup without the `.notdef` fallback
    pub fn get(&self, c: char) -> Option<GlyphId> {
        self.mappings.get(&c).copied()
    }

    /// Number of mapped characters
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl CharacterToGlyphMapper for CharMap {
    fn glyph_id(&self, code_point: char) -> GlyphId {
        match self.get(code_point) {
            Some(glyph) => glyph,
            None => {
                tracing::trace!(code_point = code_point as u32, "unmapped character, using .notdef");
                GlyphId::NOTDEF
            }
        }
    }
}

impl FromIterator<(char, GlyphId)> for CharMap {
    fn from_iter<I: IntoIterator<Item = (char, GlyphId)>>(iter: I) -> Self {
        Self { mappings: iter.into_iter().collect() }
    }
}
