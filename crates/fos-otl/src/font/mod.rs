//! Font object and its external collaborators
//!
//! [`AdvancedFont`] owns the read-only tables a shaping call consults: the
//! cmap, the horizontal metrics, the optional GSUB/GPOS stages and GDEF
//! data, and the table directory used to detect advanced layout support.

mod cmap;
mod metrics;
mod tag;
pub mod ttf;

use std::collections::BTreeSet;
use std::fmt;

pub use cmap::{CharMap, CharacterToGlyphMapper};
pub use metrics::{HorizontalMetrics, MetricsProvider};
pub use tag::Tag;

use crate::layout::{GdefTable, PositioningStage, SubstitutionStage};
use crate::shaping::{self, ShapedGlyphRun, ShapingOptions};
use crate::{OtlError, Result};

/// Glyph identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GlyphId(pub u16);

impl GlyphId {
    /// The reserved missing-glyph
    pub const NOTDEF: GlyphId = GlyphId(0);
}

/// A font with OpenType advanced layout support
///
/// Tables are loaded once and never mutated, so one font may be shaped
/// against from many threads at once.
pub struct AdvancedFont {
    units_per_em: u16,
    tables: BTreeSet<Tag>,
    cmap: Box<dyn CharacterToGlyphMapper>,
    metrics: Box<dyn MetricsProvider>,
    gsub: Option<Box<dyn SubstitutionStage>>,
    gpos: Option<Box<dyn PositioningStage>>,
    gdef: Option<GdefTable>,
}

impl AdvancedFont {
    /// Start building a font with the given design resolution
    pub fn builder(units_per_em: u16) -> AdvancedFontBuilder {
        AdvancedFontBuilder::new(units_per_em)
    }

    /// True iff the table directory contains BASE, GDEF, GPOS, GSUB or JSTF
    pub fn has_layout_tables(&self) -> bool {
        Tag::LAYOUT_TABLES.iter().any(|tag| self.tables.contains(tag))
    }

    /// Whether the table directory lists `tag`
    pub fn has_table(&self, tag: Tag) -> bool {
        self.tables.contains(&tag)
    }

    /// Shape `text` with the default options (`latn`/`dflt`, no overrides)
    pub fn create_shaped_run(&self, text: &str) -> Result<ShapedGlyphRun> {
        shaping::shape_run(self, text, &ShapingOptions::default())
    }

    /// Shape `text` with caller-supplied script, language and features
    pub fn create_shaped_run_with(&self, text: &str, options: &ShapingOptions) -> Result<ShapedGlyphRun> {
        shaping::shape_run(self, text, options)
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Table directory
    pub fn tables(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tables.iter().copied()
    }

    pub fn cmap(&self) -> &dyn CharacterToGlyphMapper {
        self.cmap.as_ref()
    }

    pub fn metrics(&self) -> &dyn MetricsProvider {
        self.metrics.as_ref()
    }

    pub fn gsub(&self) -> Option<&dyn SubstitutionStage> {
        self.gsub.as_deref()
    }

    pub fn gpos(&self) -> Option<&dyn PositioningStage> {
        self.gpos.as_deref()
    }

    pub fn gdef(&self) -> Option<&GdefTable> {
        self.gdef.as_ref()
    }
}

impl fmt::Debug for AdvancedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvancedFont")
            .field("units_per_em", &self.units_per_em)
            .field("tables", &self.tables)
            .field("gsub", &self.gsub.is_some())
            .field("gpos", &self.gpos.is_some())
            .field("gdef", &self.gdef.is_some())
            .finish()
    }
}

/// Builder for [`AdvancedFont`]
pub struct AdvancedFontBuilder {
    units_per_em: u16,
    tables: BTreeSet<Tag>,
    cmap: Box<dyn CharacterToGlyphMapper>,
    metrics: Box<dyn MetricsProvider>,
    gsub: Option<Box<dyn SubstitutionStage>>,
    gpos: Option<Box<dyn PositioningStage>>,
    gdef: Option<GdefTable>,
}

impl AdvancedFontBuilder {
    /// Empty font: no mapped characters, zero advances, no layout tables
    pub fn new(units_per_em: u16) -> Self {
        Self {
            units_per_em,
            tables: BTreeSet::new(),
            cmap: Box::new(CharMap::new()),
            metrics: Box::new(HorizontalMetrics::default()),
            gsub: None,
            gpos: None,
            gdef: None,
        }
    }

    /// Set the character to glyph mapper
    pub fn cmap(mut self, cmap: impl CharacterToGlyphMapper + 'static) -> Self {
        self.cmap = Box::new(cmap);
        self
    }

    /// Set the advance width provider
    pub fn metrics(mut self, metrics: impl MetricsProvider + 'static) -> Self {
        self.metrics = Box::new(metrics);
        self
    }

    /// Attach a substitution stage and list GSUB in the directory
    pub fn gsub(mut self, stage: impl SubstitutionStage + 'static) -> Self {
        self.gsub = Some(Box::new(stage));
        self.tables.insert(Tag::GSUB);
        self
    }

    /// Attach a positioning stage and list GPOS in the directory
    pub fn gpos(mut self, stage: impl PositioningStage + 'static) -> Self {
        self.gpos = Some(Box::new(stage));
        self.tables.insert(Tag::GPOS);
        self
    }

    /// Attach glyph definition data and list GDEF in the directory
    pub fn gdef(mut self, gdef: GdefTable) -> Self {
        self.gdef = Some(gdef);
        self.tables.insert(Tag::GDEF);
        self
    }

    /// Record a table in the directory without attaching behavior to it
    pub fn table(mut self, tag: Tag) -> Self {
        self.tables.insert(tag);
        self
    }

    pub fn build(self) -> Result<AdvancedFont> {
        if self.units_per_em == 0 {
            return Err(OtlError::malformed(Tag::new(b"head"), "unitsPerEm is zero"));
        }

        Ok(AdvancedFont {
            units_per_em: self.units_per_em,
            tables: self.tables,
            cmap: self.cmap,
            metrics: self.metrics,
            gsub: self.gsub,
            gpos: self.gpos,
            gdef: self.gdef,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_id_default() {
        assert_eq!(GlyphId::default(), GlyphId::NOTDEF);
    }

    #[test]
    fn test_layout_table_detection() {
        let plain = AdvancedFont::builder(1000).table(Tag::new(b"cmap")).build().unwrap();
        assert!(!plain.has_layout_tables());

        for tag in Tag::LAYOUT_TABLES {
            let font = AdvancedFont::builder(1000).table(tag).build().unwrap();
            assert!(font.has_layout_tables(), "{tag} should count as a layout table");
        }
    }

    #[test]
    fn test_zero_units_per_em_rejected() {
        assert!(AdvancedFont::builder(0).build().is_err());
    }

    #[test]
    fn test_font_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AdvancedFont>();
    }
}
