//! Structures shared by GSUB and GPOS
//!
//! Coverage and class definition tables, the script/language/feature
//! lists, lookup flags, and the resolution of a script/language pair plus
//! feature overrides into an ordered list of lookups to apply.

use std::collections::{BTreeMap, HashMap};

use crate::font::{GlyphId, Tag};
use crate::shaping::Feature;
use crate::{OtlError, Result};
use super::GdefTable;
use super::gdef::GlyphClass;

/// Coverage table (maps glyph IDs to coverage indices)
#[derive(Debug, Clone)]
pub struct Coverage {
    data: CoverageData,
}

#[derive(Debug, Clone)]
enum CoverageData {
    /// Format 1: Sorted list of glyph IDs
    GlyphArray(Vec<GlyphId>),
    /// Format 2: Sorted ranges of glyph IDs
    RangeArray(Vec<RangeRecord>),
}

/// Glyph range with the coverage index of its first glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRecord {
    pub start_glyph: GlyphId,
    pub end_glyph: GlyphId,
    pub start_coverage_index: u16,
}

impl RangeRecord {
    /// Coverage index of `end_glyph`, `None` for a reversed or overflowing range
    fn last_coverage_index(&self) -> Option<u16> {
        let span = self.end_glyph.0.checked_sub(self.start_glyph.0)?;
        self.start_coverage_index.checked_add(span)
    }
}

impl Coverage {
    /// Coverage over a set of glyphs
    ///
    /// The list is stored sorted, so indices are assigned in ascending
    /// glyph order as the OpenType format requires.
    pub fn glyphs(glyphs: impl IntoIterator<Item = GlyphId>) -> Self {
        let mut glyphs: Vec<GlyphId> = glyphs.into_iter().collect();
        glyphs.sort_unstable();
        glyphs.dedup();
        Self { data: CoverageData::GlyphArray(glyphs) }
    }

    /// Coverage over glyph ranges
    ///
    /// Each range must run forward and its last coverage index must fit
    /// in 16 bits.
    pub fn ranges(ranges: impl IntoIterator<Item = RangeRecord>) -> Result<Self> {
        let mut ranges: Vec<RangeRecord> = ranges.into_iter().collect();

        if let Some(bad) = ranges.iter().find(|r| r.last_coverage_index().is_none()) {
            tracing::warn!(?bad, "invalid coverage range");
            return Err(OtlError::InvalidCoverage {
                start_glyph: bad.start_glyph.0,
                end_glyph: bad.end_glyph.0,
                start_coverage_index: bad.start_coverage_index,
            });
        }

        ranges.sort_unstable_by_key(|r| r.start_glyph);
        Ok(Self { data: CoverageData::RangeArray(ranges) })
    }

    /// Get coverage index for a glyph ID
    pub fn get(&self, glyph_id: GlyphId) -> Option<u16> {
        match &self.data {
            CoverageData::GlyphArray(glyphs) => glyphs.binary_search(&glyph_id).ok().map(|i| i as u16),
            CoverageData::RangeArray(ranges) => {
                let idx = ranges.partition_point(|r| r.end_glyph < glyph_id);
                let range = ranges.get(idx)?;
                if glyph_id >= range.start_glyph {
                    range.start_coverage_index.checked_add(glyph_id.0 - range.start_glyph.0)
                } else {
                    None
                }
            }
        }
    }

    pub fn contains(&self, glyph_id: GlyphId) -> bool {
        self.get(glyph_id).is_some()
    }
}

/// Class definition table
#[derive(Debug, Clone, Default)]
pub struct ClassDef {
    ranges: Vec<ClassRangeRecord>,
}

/// Glyph range sharing one class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRangeRecord {
    pub start_glyph: GlyphId,
    pub end_glyph: GlyphId,
    pub class: u16,
}

impl ClassDef {
    /// Class definition from range records
    pub fn ranges(ranges: impl IntoIterator<Item = ClassRangeRecord>) -> Self {
        let mut ranges: Vec<ClassRangeRecord> = ranges.into_iter().collect();
        ranges.sort_unstable_by_key(|r| r.start_glyph);
        Self { ranges }
    }

    /// Class definition assigning one class per listed glyph
    pub fn glyphs(classes: impl IntoIterator<Item = (GlyphId, u16)>) -> Self {
        Self::ranges(classes.into_iter().map(|(glyph, class)| ClassRangeRecord {
            start_glyph: glyph,
            end_glyph: glyph,
            class,
        }))
    }

    /// Get class for a glyph ID (returns 0 for unassigned)
    pub fn get(&self, glyph_id: GlyphId) -> u16 {
        let idx = self.ranges.partition_point(|r| r.end_glyph < glyph_id);
        match self.ranges.get(idx) {
            Some(range) if glyph_id >= range.start_glyph => range.class,
            _ => 0,
        }
    }
}

/// Lookup flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupFlag(pub u16);

impl LookupFlag {
    pub const RIGHT_TO_LEFT: u16 = 0x0001;
    pub const IGNORE_BASE_GLYPHS: u16 = 0x0002;
    pub const IGNORE_LIGATURES: u16 = 0x0004;
    pub const IGNORE_MARKS: u16 = 0x0008;
    pub const MARK_ATTACHMENT_TYPE: u16 = 0xFF00;

    /// Check whether a lookup with this flag steps over `glyph`
    ///
    /// Glyph classes come from GDEF; without it nothing is skipped.
    pub fn skips(self, glyph: GlyphId, gdef: Option<&GdefTable>) -> bool {
        let Some(gdef) = gdef else { return false };

        match gdef.glyph_class(glyph) {
            Some(GlyphClass::Base) => self.0 & Self::IGNORE_BASE_GLYPHS != 0,
            Some(GlyphClass::Ligature) => self.0 & Self::IGNORE_LIGATURES != 0,
            Some(GlyphClass::Mark) => {
                if self.0 & Self::IGNORE_MARKS != 0 {
                    return true;
                }
                let attach_type = (self.0 & Self::MARK_ATTACHMENT_TYPE) >> 8;
                attach_type != 0 && gdef.mark_attach_class(glyph) != attach_type
            }
            _ => false,
        }
    }
}

/// Language system: the features active for one script/language pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LangSys {
    pub required_feature: Option<u16>,
    pub feature_indices: Vec<u16>,
}

impl LangSys {
    pub fn new(feature_indices: impl IntoIterator<Item = u16>) -> Self {
        Self {
            required_feature: None,
            feature_indices: feature_indices.into_iter().collect(),
        }
    }

    /// Set the feature applied regardless of overrides
    pub fn required_feature(mut self, index: u16) -> Self {
        self.required_feature = Some(index);
        self
    }
}

/// Script table: a default language system plus language-specific ones
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub default_lang_sys: Option<LangSys>,
    pub lang_sys: BTreeMap<Tag, LangSys>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default language system
    pub fn default_lang_sys(mut self, lang_sys: LangSys) -> Self {
        self.default_lang_sys = Some(lang_sys);
        self
    }

    /// Add a language-specific system
    pub fn lang_sys(mut self, language: Tag, lang_sys: LangSys) -> Self {
        self.lang_sys.insert(language, lang_sys);
        self
    }
}

/// Script list keyed by script tag
#[derive(Debug, Clone, Default)]
pub struct ScriptList {
    scripts: BTreeMap<Tag, Script>,
}

impl ScriptList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a script
    pub fn script(mut self, tag: Tag, script: Script) -> Self {
        self.scripts.insert(tag, script);
        self
    }

    /// Find the language system for a script/language pair
    ///
    /// Tries the exact script and language, then the script's default
    /// language system, then the `DFLT` script's default language system.
    pub fn resolve(&self, script: Tag, language: Tag) -> Option<&LangSys> {
        if let Some(table) = self.scripts.get(&script) {
            if language != Tag::DFLT_LANGUAGE {
                if let Some(lang_sys) = table.lang_sys.get(&language) {
                    return Some(lang_sys);
                }
            }
            if let Some(lang_sys) = &table.default_lang_sys {
                return Some(lang_sys);
            }
        }

        self.scripts
            .get(&Tag::DFLT_SCRIPT)
            .and_then(|table| table.default_lang_sys.as_ref())
    }
}

/// Feature record: tag and the lookups it enables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    pub tag: Tag,
    pub lookup_indices: Vec<u16>,
}

impl FeatureRecord {
    pub fn new(tag: Tag, lookup_indices: impl IntoIterator<Item = u16>) -> Self {
        Self { tag, lookup_indices: lookup_indices.into_iter().collect() }
    }
}

/// A lookup selected for application, with the value of the feature that enabled it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveLookup {
    pub index: u16,
    pub value: u32,
}

/// Effective feature values: defaults switched on, then overrides in order
///
/// A caller override always beats a default, and among duplicate
/// overrides the last one wins.
pub fn resolve_feature_values(defaults: &[Tag], overrides: &[Feature]) -> HashMap<Tag, u32> {
    let mut values: HashMap<Tag, u32> = defaults.iter().map(|&tag| (tag, 1)).collect();
    for feature in overrides {
        values.insert(feature.tag, feature.value);
    }
    values
}

/// Script list and feature list of a GSUB or GPOS table
#[derive(Debug, Clone, Default)]
pub struct LayoutHeader {
    pub scripts: ScriptList,
    pub features: Vec<FeatureRecord>,
}

impl LayoutHeader {
    pub fn new(scripts: ScriptList, features: Vec<FeatureRecord>) -> Self {
        Self { scripts, features }
    }

    /// Lookups to apply for a script/language pair, in lookup list order
    ///
    /// `table` names the owning table in malformed-table errors and
    /// `lookup_count` bounds the lookup indices features may reference.
    pub fn lookups_for(
        &self,
        table: Tag,
        lookup_count: usize,
        script: Tag,
        language: Tag,
        defaults: &[Tag],
        overrides: &[Feature],
    ) -> Result<Vec<ActiveLookup>> {
        let Some(lang_sys) = self.scripts.resolve(script, language) else {
            tracing::trace!(%table, %script, %language, "no language system");
            return Ok(Vec::new());
        };

        let values = resolve_feature_values(defaults, overrides);
        let mut selected: BTreeMap<u16, u32> = BTreeMap::new();

        let required = lang_sys.required_feature.into_iter().map(|index| (index, true));
        let optional = lang_sys.feature_indices.iter().map(|&index| (index, false));

        for (feature_index, required) in required.chain(optional) {
            let record = self.features.get(feature_index as usize).ok_or_else(|| {
                OtlError::malformed(table, format!("feature index {feature_index} out of range"))
            })?;

            let value = values.get(&record.tag).copied().unwrap_or(0);
            let value = if required { value.max(1) } else { value };
            if value == 0 {
                continue;
            }

            for &lookup_index in &record.lookup_indices {
                if lookup_index as usize >= lookup_count {
                    return Err(OtlError::malformed(
                        table,
                        format!("feature '{}' references missing lookup {lookup_index}", record.tag),
                    ));
                }
                selected.entry(lookup_index).or_insert(value);
            }
        }

        Ok(selected.into_iter().map(|(index, value)| ActiveLookup { index, value }).collect())
    }
}
