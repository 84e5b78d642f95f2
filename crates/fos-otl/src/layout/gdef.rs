//! OpenType GDEF (Glyph Definition) Table
//!
//! Glyph classes and mark attachment classes, consulted by lookup flags
//! and by the optional combining-mark reordering stage.

use crate::font::GlyphId;
use crate::shaping::GlyphSequence;
use crate::Result;
use super::ClassDef;

/// GDEF glyph class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum GlyphClass {
    /// Single character, spacing glyph
    Base = 1,
    /// Multiple character, spacing glyph
    Ligature = 2,
    /// Non-spacing combining glyph
    Mark = 3,
    /// Part of a single character, spacing glyph
    Component = 4,
}

impl TryFrom<u16> for GlyphClass {
    type Error = ();

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Base),
            2 => Ok(Self::Ligature),
            3 => Ok(Self::Mark),
            4 => Ok(Self::Component),
            _ => Err(()),
        }
    }
}

/// Glyph definition data
#[derive(Debug, Clone, Default)]
pub struct GdefTable {
    glyph_classes: Option<ClassDef>,
    mark_attach_classes: Option<ClassDef>,
}

impl GdefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the glyph class definition
    pub fn glyph_classes(mut self, classes: ClassDef) -> Self {
        self.glyph_classes = Some(classes);
        self
    }

    /// Set the mark attachment class definition
    pub fn mark_attach_classes(mut self, classes: ClassDef) -> Self {
        self.mark_attach_classes = Some(classes);
        self
    }

    /// Class of `glyph`, `None` when unassigned
    pub fn glyph_class(&self, glyph: GlyphId) -> Option<GlyphClass> {
        let classes = self.glyph_classes.as_ref()?;
        GlyphClass::try_from(classes.get(glyph)).ok()
    }

    pub fn is_mark(&self, glyph: GlyphId) -> bool {
        self.glyph_class(glyph) == Some(GlyphClass::Mark)
    }

    /// Mark attachment class (0 when unassigned)
    pub fn mark_attach_class(&self, glyph: GlyphId) -> u16 {
        self.mark_attach_classes.as_ref().map_or(0, |classes| classes.get(glyph))
    }

    /// Move each run of marks in front of the glyph it follows
    ///
    /// Marks keep their clusters, so the character correspondence travels
    /// with them; a sequence without a cluster map stays without one. Marks
    /// at the start of the sequence have no base and stay in place.
    pub fn reorder_combining_marks(&self, sequence: &GlyphSequence) -> Result<GlyphSequence> {
        let glyphs = sequence.glyphs();
        let clusters = sequence.cluster_slots();

        let mut out_glyphs = Vec::with_capacity(glyphs.len());
        let mut out_clusters = Vec::with_capacity(glyphs.len());

        let mut i = 0;
        while i < glyphs.len() {
            let mut end = i + 1;
            while end < glyphs.len() && self.is_mark(glyphs[end]) {
                end += 1;
            }

            if end > i + 1 && !self.is_mark(glyphs[i]) {
                out_glyphs.extend_from_slice(&glyphs[i + 1..end]);
                out_clusters.extend_from_slice(&clusters[i + 1..end]);
                out_glyphs.push(glyphs[i]);
                out_clusters.push(clusters[i].clone());
            } else {
                out_glyphs.extend_from_slice(&glyphs[i..end]);
                out_clusters.extend_from_slice(&clusters[i..end]);
            }

            i = end;
        }

        sequence.derive(out_glyphs, sequence.clusters().map(|_| out_clusters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gdef() -> GdefTable {
        GdefTable::new()
            .glyph_classes(ClassDef::glyphs([
                (GlyphId(1), 1),
                (GlyphId(2), 1),
                (GlyphId(10), 3),
                (GlyphId(11), 3),
                (GlyphId(20), 2),
            ]))
            .mark_attach_classes(ClassDef::glyphs([(GlyphId(10), 1), (GlyphId(11), 2)]))
    }

    #[test]
    fn test_glyph_classes() {
        let gdef = gdef();
        assert_eq!(gdef.glyph_class(GlyphId(1)), Some(GlyphClass::Base));
        assert_eq!(gdef.glyph_class(GlyphId(20)), Some(GlyphClass::Ligature));
        assert!(gdef.is_mark(GlyphId(10)));
        assert_eq!(gdef.glyph_class(GlyphId(99)), None);
        assert_eq!(gdef.mark_attach_class(GlyphId(11)), 2);
        assert_eq!(gdef.mark_attach_class(GlyphId(1)), 0);
    }

    #[test]
    fn test_reorder_marks_before_base() {
        let seq = GlyphSequence::new(
            vec!['a', '\u{301}', '\u{302}', 'b'],
            vec![GlyphId(1), GlyphId(10), GlyphId(11), GlyphId(2)],
            None,
        )
        .unwrap();

        let reordered = gdef().reorder_combining_marks(&seq).unwrap();
        assert_eq!(reordered.glyphs(), &[GlyphId(10), GlyphId(11), GlyphId(1), GlyphId(2)]);
        assert_eq!(reordered.clusters().unwrap(), &[vec![1], vec![2], vec![0], vec![3]]);
    }

    #[test]
    fn test_reorder_without_cluster_map() {
        // one character expanded to three glyphs by an earlier stage
        let seq = GlyphSequence::new(vec!['a'], vec![GlyphId(1), GlyphId(10), GlyphId(2)], None).unwrap();

        let reordered = gdef().reorder_combining_marks(&seq).unwrap();
        assert_eq!(reordered.glyphs(), &[GlyphId(10), GlyphId(1), GlyphId(2)]);
        assert!(reordered.clusters().is_none());
    }

    #[test]
    fn test_leading_marks_stay() {
        let seq = GlyphSequence::new(vec!['\u{301}', 'a'], vec![GlyphId(10), GlyphId(1)], None).unwrap();
        let reordered = gdef().reorder_combining_marks(&seq).unwrap();
        assert_eq!(reordered.glyphs(), &[GlyphId(10), GlyphId(1)]);
    }
}
