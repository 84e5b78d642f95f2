//! OpenType GPOS (Glyph Positioning)
//!
//! Single adjustment, pair adjustment (kerning) and mark-to-base
//! attachment. Adjustments from every applied lookup accumulate into the
//! caller's per-glyph buffer.

use crate::font::{GlyphId, Tag};
use crate::shaping::{GlyphSequence, PositionAdjustment};
use crate::{OtlError, Result};
use super::common::{ActiveLookup, ClassDef, Coverage, FeatureRecord, LayoutHeader, LookupFlag, ScriptList};
use super::{GdefTable, LayoutContext};

/// Features applied unless the caller turns them off
pub const DEFAULT_FEATURES: [Tag; 7] = [
    Tag::new(b"kern"),
    Tag::new(b"mark"),
    Tag::new(b"mkmk"),
    Tag::new(b"curs"),
    Tag::new(b"dist"),
    Tag::new(b"abvm"),
    Tag::new(b"blwm"),
];

/// Computes per-glyph positioning adjustments
///
/// `adjustments` has one slot per glyph of `sequence`, zeroed by the
/// caller. Implementations add into it and return `true` iff any slot was
/// given a non-zero adjustment.
pub trait PositioningStage: Send + Sync {
    fn position(
        &self,
        sequence: &GlyphSequence,
        context: &LayoutContext<'_>,
        advances: &[u16],
        adjustments: &mut [PositionAdjustment],
    ) -> Result<bool>;
}

/// GPOS lookup type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum LookupType {
    /// Type 1: Single adjustment
    SingleAdjustment = 1,
    /// Type 2: Pair adjustment (kerning)
    PairAdjustment = 2,
    /// Type 4: Mark-to-base attachment
    MarkToBase = 4,
}

/// Value record for positioning adjustments
///
/// Device table corrections are not applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueRecord {
    /// Horizontal adjustment for placement
    pub x_placement: i16,
    /// Vertical adjustment for placement
    pub y_placement: i16,
    /// Horizontal adjustment for advance
    pub x_advance: i16,
    /// Vertical adjustment for advance
    pub y_advance: i16,
}

impl ValueRecord {
    pub fn new(x_placement: i16, y_placement: i16, x_advance: i16, y_advance: i16) -> Self {
        Self { x_placement, y_placement, x_advance, y_advance }
    }

    /// Record that only changes the horizontal advance
    pub fn advance(x_advance: i16) -> Self {
        Self { x_advance, ..Self::default() }
    }

    /// Check if record has any positioning
    pub fn is_empty(&self) -> bool {
        self.x_placement == 0 && self.y_placement == 0 && self.x_advance == 0 && self.y_advance == 0
    }

    pub fn to_adjustment(self) -> PositionAdjustment {
        PositionAdjustment::new(
            self.x_placement.into(),
            self.y_placement.into(),
            self.x_advance.into(),
            self.y_advance.into(),
        )
    }
}

/// Anchor point for mark attachment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Anchor {
    pub x: i16,
    pub y: i16,
}

impl Anchor {
    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Single adjustment subtable
#[derive(Debug, Clone)]
pub struct SinglePos {
    coverage: Coverage,
    data: SinglePosData,
}

#[derive(Debug, Clone)]
enum SinglePosData {
    /// Format 1: Same value for all covered glyphs
    Format1(ValueRecord),
    /// Format 2: Different value per glyph
    Format2(Vec<ValueRecord>),
}

impl SinglePos {
    /// Format 1: one value record for every covered glyph
    pub fn shared(coverage: Coverage, value: ValueRecord) -> Self {
        Self { coverage, data: SinglePosData::Format1(value) }
    }

    /// Format 2: value records indexed by coverage index
    pub fn per_glyph(coverage: Coverage, values: Vec<ValueRecord>) -> Self {
        Self { coverage, data: SinglePosData::Format2(values) }
    }

    /// Apply to a glyph
    pub fn apply(&self, glyph_id: GlyphId) -> Result<Option<ValueRecord>> {
        let Some(coverage_idx) = self.coverage.get(glyph_id) else {
            return Ok(None);
        };

        match &self.data {
            SinglePosData::Format1(value) => Ok(Some(*value)),
            SinglePosData::Format2(values) => values
                .get(coverage_idx as usize)
                .map(|value| Some(*value))
                .ok_or_else(|| OtlError::malformed(Tag::GPOS, format!("single value {coverage_idx} missing"))),
        }
    }
}

/// Pair adjustment subtable
#[derive(Debug, Clone)]
pub struct PairPos {
    coverage: Coverage,
    data: PairPosData,
}

#[derive(Debug, Clone)]
enum PairPosData {
    /// Format 1: Individual glyph pairs
    Format1 { pair_sets: Vec<Vec<PairValueRecord>> },
    /// Format 2: Class pairs
    Format2 {
        class_def1: ClassDef,
        class_def2: ClassDef,
        class1_records: Vec<Vec<Class2Record>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairValueRecord {
    pub second_glyph: GlyphId,
    pub value1: ValueRecord,
    pub value2: ValueRecord,
}

impl PairValueRecord {
    pub fn new(second_glyph: GlyphId, value1: ValueRecord, value2: ValueRecord) -> Self {
        Self { second_glyph, value1, value2 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Class2Record {
    pub value1: ValueRecord,
    pub value2: ValueRecord,
}

impl Class2Record {
    pub fn new(value1: ValueRecord, value2: ValueRecord) -> Self {
        Self { value1, value2 }
    }
}

impl PairPos {
    /// Format 1: pair sets indexed by the first glyph's coverage index
    pub fn pairs(coverage: Coverage, pair_sets: Vec<Vec<PairValueRecord>>) -> Self {
        Self { coverage, data: PairPosData::Format1 { pair_sets } }
    }

    /// Format 2: records indexed by `[class1][class2]`
    pub fn classes(
        coverage: Coverage,
        class_def1: ClassDef,
        class_def2: ClassDef,
        class1_records: Vec<Vec<Class2Record>>,
    ) -> Self {
        Self { coverage, data: PairPosData::Format2 { class_def1, class_def2, class1_records } }
    }

    /// Apply to a glyph pair
    pub fn apply(&self, first: GlyphId, second: GlyphId) -> Result<Option<(ValueRecord, ValueRecord)>> {
        let Some(coverage_idx) = self.coverage.get(first) else {
            return Ok(None);
        };

        match &self.data {
            PairPosData::Format1 { pair_sets } => {
                let pair_set = pair_sets
                    .get(coverage_idx as usize)
                    .ok_or_else(|| OtlError::malformed(Tag::GPOS, format!("pair set {coverage_idx} missing")))?;

                Ok(pair_set
                    .iter()
                    .find(|record| record.second_glyph == second)
                    .map(|record| (record.value1, record.value2)))
            }
            PairPosData::Format2 { class_def1, class_def2, class1_records } => {
                let class1 = class_def1.get(first);
                let class2 = class_def2.get(second);

                class1_records
                    .get(class1 as usize)
                    .and_then(|row| row.get(class2 as usize))
                    .map(|record| Some((record.value1, record.value2)))
                    .ok_or_else(|| {
                        OtlError::malformed(Tag::GPOS, format!("class pair ({class1}, {class2}) out of range"))
                    })
            }
        }
    }
}

/// Mark attachment record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkRecord {
    pub mark_class: u16,
    pub mark_anchor: Anchor,
}

impl MarkRecord {
    pub fn new(mark_class: u16, mark_anchor: Anchor) -> Self {
        Self { mark_class, mark_anchor }
    }
}

/// Mark-to-base attachment subtable
#[derive(Debug, Clone)]
pub struct MarkToBasePos {
    mark_coverage: Coverage,
    base_coverage: Coverage,
    mark_array: Vec<MarkRecord>,
    /// Anchors per base glyph, one slot per mark class
    base_array: Vec<Vec<Option<Anchor>>>,
}

impl MarkToBasePos {
    pub fn new(
        mark_coverage: Coverage,
        base_coverage: Coverage,
        mark_array: Vec<MarkRecord>,
        base_array: Vec<Vec<Option<Anchor>>>,
    ) -> Self {
        Self { mark_coverage, base_coverage, mark_array, base_array }
    }

    /// Whether `glyph` is one of this subtable's marks
    pub fn covers_mark(&self, glyph: GlyphId) -> bool {
        self.mark_coverage.contains(glyph)
    }

    /// Get the mark and base anchors for attaching `mark` to `base`
    pub fn apply(&self, mark: GlyphId, base: GlyphId) -> Result<Option<(Anchor, Anchor)>> {
        let Some(mark_idx) = self.mark_coverage.get(mark) else {
            return Ok(None);
        };
        let Some(base_idx) = self.base_coverage.get(base) else {
            return Ok(None);
        };

        let mark_record = self
            .mark_array
            .get(mark_idx as usize)
            .ok_or_else(|| OtlError::malformed(Tag::GPOS, format!("mark record {mark_idx} missing")))?;
        let base_anchors = self
            .base_array
            .get(base_idx as usize)
            .ok_or_else(|| OtlError::malformed(Tag::GPOS, format!("base record {base_idx} missing")))?;
        let base_anchor = base_anchors.get(mark_record.mark_class as usize).ok_or_else(|| {
            OtlError::malformed(Tag::GPOS, format!("mark class {} has no base anchor slot", mark_record.mark_class))
        })?;

        Ok(base_anchor.map(|base_anchor| (mark_record.mark_anchor, base_anchor)))
    }
}

/// GPOS subtable
#[derive(Debug, Clone)]
pub enum GposSubtable {
    Single(SinglePos),
    Pair(PairPos),
    MarkToBase(MarkToBasePos),
}

impl GposSubtable {
    pub fn lookup_type(&self) -> LookupType {
        match self {
            Self::Single(_) => LookupType::SingleAdjustment,
            Self::Pair(_) => LookupType::PairAdjustment,
            Self::MarkToBase(_) => LookupType::MarkToBase,
        }
    }
}

/// GPOS lookup
#[derive(Debug, Clone)]
pub struct GposLookup {
    pub lookup_flag: LookupFlag,
    pub subtables: Vec<GposSubtable>,
}

/// Per-call state for one lookup pass
struct PositionBuffer<'a> {
    glyphs: &'a [GlyphId],
    advances: &'a [u16],
    adjustments: &'a mut [PositionAdjustment],
    written: bool,
}

impl PositionBuffer<'_> {
    fn add(&mut self, index: usize, adjustment: PositionAdjustment) {
        if adjustment.is_zero() {
            return;
        }
        self.adjustments[index] += adjustment;
        self.written = true;
    }

    /// Pen advance from the start of glyph `from` to the start of glyph `to`
    fn pen_advance(&self, from: usize, to: usize) -> i32 {
        (from..to)
            .map(|i| i32::from(self.advances[i]) + self.adjustments[i].advance_x)
            .sum()
    }
}

impl GposLookup {
    pub fn new(subtables: Vec<GposSubtable>) -> Self {
        Self { lookup_flag: LookupFlag::default(), subtables }
    }

    /// Set lookup flag
    pub fn flag(mut self, flag: u16) -> Self {
        self.lookup_flag = LookupFlag(flag);
        self
    }

    fn next_unskipped(&self, glyphs: &[GlyphId], from: usize, gdef: Option<&GdefTable>) -> Option<usize> {
        (from..glyphs.len()).find(|&j| !self.lookup_flag.skips(glyphs[j], gdef))
    }

    /// Apply this lookup across the whole buffer
    fn apply(&self, buffer: &mut PositionBuffer<'_>, context: &LayoutContext<'_>) -> Result<()> {
        let gdef = context.gdef;
        let mut i = 0;

        while i < buffer.glyphs.len() {
            if self.lookup_flag.skips(buffer.glyphs[i], gdef) {
                i += 1;
                continue;
            }

            let mut step = 1;
            for subtable in &self.subtables {
                let applied = match subtable {
                    GposSubtable::Single(pos) => match pos.apply(buffer.glyphs[i])? {
                        Some(value) => {
                            buffer.add(i, value.to_adjustment());
                            true
                        }
                        None => false,
                    },
                    GposSubtable::Pair(pos) => {
                        let Some(j) = self.next_unskipped(buffer.glyphs, i + 1, gdef) else {
                            continue;
                        };
                        match pos.apply(buffer.glyphs[i], buffer.glyphs[j])? {
                            Some((value1, value2)) => {
                                buffer.add(i, value1.to_adjustment());
                                buffer.add(j, value2.to_adjustment());
                                if !value2.is_empty() {
                                    step = j - i + 1;
                                }
                                true
                            }
                            None => false,
                        }
                    }
                    GposSubtable::MarkToBase(pos) => self.attach_mark(pos, buffer, i, context)?,
                };

                if applied {
                    break;
                }
            }

            i += step;
        }

        Ok(())
    }

    /// Attach the mark at `index` to its base glyph
    ///
    /// The base is the nearest preceding non-mark, or the nearest following
    /// one once marks have been reordered in front of their base.
    fn attach_mark(
        &self,
        pos: &MarkToBasePos,
        buffer: &mut PositionBuffer<'_>,
        index: usize,
        context: &LayoutContext<'_>,
    ) -> Result<bool> {
        let gdef = context.gdef;
        let mark = buffer.glyphs[index];
        if !pos.covers_mark(mark) {
            return Ok(false);
        }

        // Marks between the base and this mark are passed over
        let is_mark = |glyph: GlyphId| match gdef {
            Some(gdef) => gdef.is_mark(glyph),
            None => pos.covers_mark(glyph),
        };
        let base = if context.marks_reordered {
            (index + 1..buffer.glyphs.len()).find(|&j| !is_mark(buffer.glyphs[j]))
        } else {
            (0..index).rev().find(|&j| !is_mark(buffer.glyphs[j]))
        };
        let Some(base) = base else {
            tracing::trace!(mark = mark.0, "mark without a base");
            return Ok(false);
        };

        let Some((mark_anchor, base_anchor)) = pos.apply(mark, buffer.glyphs[base])? else {
            return Ok(false);
        };

        // Signed distance from the mark's pen position to the base's
        let pen = if base < index {
            -buffer.pen_advance(base, index)
        } else {
            buffer.pen_advance(index, base)
        };
        let adjustment = PositionAdjustment::new(
            i32::from(base_anchor.x) - i32::from(mark_anchor.x) + pen,
            i32::from(base_anchor.y) - i32::from(mark_anchor.y),
            0,
            0,
        );
        buffer.add(index, adjustment);
        Ok(true)
    }
}

/// In-memory GPOS table
#[derive(Debug, Clone, Default)]
pub struct GposTable {
    header: LayoutHeader,
    lookups: Vec<GposLookup>,
}

impl GposTable {
    pub fn new(scripts: ScriptList, features: Vec<FeatureRecord>, lookups: Vec<GposLookup>) -> Self {
        Self { header: LayoutHeader::new(scripts, features), lookups }
    }

    /// Get lookup by index
    pub fn get_lookup(&self, index: u16) -> Option<&GposLookup> {
        self.lookups.get(index as usize)
    }

    /// Get number of lookups
    pub fn lookup_count(&self) -> usize {
        self.lookups.len()
    }

    /// Lookups active for a context, in application order
    pub fn active_lookups(&self, context: &LayoutContext<'_>) -> Result<Vec<ActiveLookup>> {
        self.header.lookups_for(
            Tag::GPOS,
            self.lookups.len(),
            context.script,
            context.language,
            &DEFAULT_FEATURES,
            context.features,
        )
    }

    /// Get kerning value between two glyphs from the first pair lookup that covers them
    pub fn get_kerning(&self, first: GlyphId, second: GlyphId) -> Result<Option<i16>> {
        for lookup in &self.lookups {
            for subtable in &lookup.subtables {
                if let GposSubtable::Pair(pos) = subtable {
                    if let Some((value1, _)) = pos.apply(first, second)? {
                        return Ok(Some(value1.x_advance));
                    }
                }
            }
        }
        Ok(None)
    }
}

impl PositioningStage for GposTable {
    fn position(
        &self,
        sequence: &GlyphSequence,
        context: &LayoutContext<'_>,
        advances: &[u16],
        adjustments: &mut [PositionAdjustment],
    ) -> Result<bool> {
        let glyphs = sequence.glyphs();
        if advances.len() != glyphs.len() || adjustments.len() != glyphs.len() {
            return Err(OtlError::BufferMismatch {
                glyphs: glyphs.len(),
                advances: advances.len(),
                adjustments: adjustments.len(),
            });
        }

        let mut buffer = PositionBuffer { glyphs, advances, adjustments, written: false };

        for active in self.active_lookups(context)? {
            self.lookups[active.index as usize].apply(&mut buffer, context)?;
            tracing::trace!(lookup = active.index, "applied GPOS lookup");
        }

        Ok(buffer.written && buffer.adjustments.iter().any(|adjustment| !adjustment.is_zero()))
    }
}
