//! OpenType layout tables
//!
//! In-memory GSUB, GPOS and GDEF structures and the stage traits the
//! shaping pipeline drives them through.

mod common;
mod gdef;
pub mod gpos;
pub mod gsub;

pub use common::{
    resolve_feature_values, ActiveLookup, ClassDef, ClassRangeRecord, Coverage, FeatureRecord, LangSys, LayoutHeader,
    LookupFlag, RangeRecord, Script, ScriptList,
};
pub use gdef::{GdefTable, GlyphClass};
pub use gpos::{GposLookup, GposSubtable, GposTable, PositioningStage};
pub use gsub::{GsubLookup, GsubSubtable, GsubTable, SubstitutionStage};

use crate::font::Tag;
use crate::shaping::{Feature, ShapingOptions};

/// What a layout stage needs to know about the current shaping call
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    /// OpenType script tag
    pub script: Tag,
    /// OpenType language system tag
    pub language: Tag,
    /// Caller feature overrides, in order
    pub features: &'a [Feature],
    /// Font size for device-dependent positioning
    pub font_size: f32,
    /// Glyph classes for lookup flags
    pub gdef: Option<&'a GdefTable>,
    /// Marks were moved in front of their base before this stage ran
    pub marks_reordered: bool,
}

impl<'a> LayoutContext<'a> {
    pub fn new(options: &'a ShapingOptions, gdef: Option<&'a GdefTable>) -> Self {
        Self {
            script: options.script,
            language: options.language,
            features: &options.features,
            font_size: options.font_size,
            gdef,
            marks_reordered: false,
        }
    }
}
