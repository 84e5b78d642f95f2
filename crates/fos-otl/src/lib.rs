//! fOS OTL - OpenType Advanced Typography
//!
//! This crate shapes a string into a positioned glyph run for fonts that
//! carry OpenType layout tables:
//! - Character to glyph mapping (cmap)
//! - Glyph substitution (GSUB: single, multiple, alternate, ligature)
//! - Glyph positioning (GPOS: single, pair kerning, mark-to-base)
//! - Glyph definition data (GDEF: glyph classes, mark reordering)
//! - Cluster tracking from final glyphs back to source characters
//!
//! Table byte layouts other than cmap/hmtx are not parsed here; the layout
//! stages are in-memory structures the caller assembles.

pub mod font;
pub mod layout;
pub mod shaping;

pub use font::{
    AdvancedFont, AdvancedFontBuilder, CharMap, CharacterToGlyphMapper, GlyphId, HorizontalMetrics, MetricsProvider,
    Tag,
};
pub use layout::{GdefTable, GposTable, GsubTable, LayoutContext, PositioningStage, SubstitutionStage};
pub use shaping::{
    Cluster, Feature, GlyphSequence, PositionAdjustment, PositionedGlyph, ShapedGlyphRun, Shaper, ShapingOptions,
    VerticalAdvance,
};

/// Shaping error types
#[derive(Debug, thiserror::Error)]
pub enum OtlError {
    #[error("Malformed {tag} table: {reason}")]
    MalformedTable { tag: Tag, reason: String },

    #[error("Cluster map has {clusters} entries but sequence has {glyphs} glyphs")]
    ClusterMismatch { glyphs: usize, clusters: usize },

    #[error("Glyph {glyph} has no valid source characters")]
    InvalidCluster { glyph: usize },

    #[error("Positioning buffers hold {advances} advances and {adjustments} adjustments for {glyphs} glyphs")]
    BufferMismatch { glyphs: usize, advances: usize, adjustments: usize },

    #[error("Coverage range {start_glyph}..={end_glyph} starting at index {start_coverage_index} is invalid")]
    InvalidCoverage { start_glyph: u16, end_glyph: u16, start_coverage_index: u16 },

    #[error("Invalid tag: {0:?}")]
    InvalidTag(String),

    #[error("Failed to parse font: {0}")]
    FontParsing(String),
}

impl OtlError {
    /// Build a malformed-table error for `tag`
    pub fn malformed(tag: Tag, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::warn!(table = %tag, %reason, "malformed layout table");
        Self::MalformedTable { tag, reason }
    }
}

pub type Result<T> = std::result::Result<T, OtlError>;
