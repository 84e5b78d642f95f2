//! OpenType GSUB (Glyph Substitution)
//!
//! Single, multiple, alternate and ligature substitution over a
//! [`GlyphSequence`]. Each applied lookup yields a new sequence whose
//! cluster map keeps every glyph tied to the characters it came from.

use crate::font::{GlyphId, Tag};
use crate::shaping::{Cluster, GlyphSequence, merge_clusters};
use crate::{OtlError, Result};
use super::common::{ActiveLookup, Coverage, FeatureRecord, LayoutHeader, LookupFlag, ScriptList};
use super::{GdefTable, LayoutContext};

/// Features applied unless the caller turns them off
pub const DEFAULT_FEATURES: [Tag; 6] = [
    Tag::new(b"ccmp"),
    Tag::new(b"locl"),
    Tag::new(b"rlig"),
    Tag::new(b"liga"),
    Tag::new(b"clig"),
    Tag::new(b"calt"),
];

/// Applies glyph substitution for a script, language and feature set
///
/// Implementations must be pure: identical inputs against the same table
/// always produce identical output, and no state survives between calls.
pub trait SubstitutionStage: Send + Sync {
    fn substitute(&self, sequence: &GlyphSequence, context: &LayoutContext<'_>) -> Result<GlyphSequence>;
}

/// GSUB lookup type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum LookupType {
    /// Type 1: Single substitution
    Single = 1,
    /// Type 2: Multiple substitution (one-to-many)
    Multiple = 2,
    /// Type 3: Alternate substitution (one-of-many)
    Alternate = 3,
    /// Type 4: Ligature substitution (many-to-one)
    Ligature = 4,
}

/// Substitution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    /// Replace with single glyph
    Single(GlyphId),
    /// Replace with multiple glyphs (possibly none)
    Multiple(Vec<GlyphId>),
    /// Replace the glyphs at these positions with one glyph
    Ligature { glyph: GlyphId, positions: Vec<usize> },
    /// No substitution needed
    None,
}

/// Single substitution subtable
#[derive(Debug, Clone)]
pub struct SingleSubst {
    coverage: Coverage,
    data: SingleSubstData,
}

#[derive(Debug, Clone)]
enum SingleSubstData {
    /// Format 1: Delta to add to glyph ID
    Delta(i16),
    /// Format 2: Array of substitute glyph IDs
    Array(Vec<GlyphId>),
}

impl SingleSubst {
    /// Format 1: every covered glyph shifts by `delta` (modulo 65536)
    pub fn delta(coverage: Coverage, delta: i16) -> Self {
        Self { coverage, data: SingleSubstData::Delta(delta) }
    }

    /// Format 2: substitutes indexed by coverage index
    pub fn array(coverage: Coverage, substitutes: Vec<GlyphId>) -> Self {
        Self { coverage, data: SingleSubstData::Array(substitutes) }
    }

    /// Apply substitution to a glyph
    pub fn apply(&self, glyph_id: GlyphId) -> Result<Substitution> {
        let Some(coverage_idx) = self.coverage.get(glyph_id) else {
            return Ok(Substitution::None);
        };

        match &self.data {
            SingleSubstData::Delta(delta) => Ok(Substitution::Single(GlyphId(glyph_id.0.wrapping_add(*delta as u16)))),
            SingleSubstData::Array(substitutes) => substitutes
                .get(coverage_idx as usize)
                .map(|&sub| Substitution::Single(sub))
                .ok_or_else(|| OtlError::malformed(Tag::GSUB, format!("single substitute {coverage_idx} missing"))),
        }
    }
}

/// Multiple substitution subtable (one-to-many)
#[derive(Debug, Clone)]
pub struct MultipleSubst {
    coverage: Coverage,
    sequences: Vec<Vec<GlyphId>>,
}

impl MultipleSubst {
    pub fn new(coverage: Coverage, sequences: Vec<Vec<GlyphId>>) -> Self {
        Self { coverage, sequences }
    }

    /// Apply substitution
    pub fn apply(&self, glyph_id: GlyphId) -> Result<Substitution> {
        let Some(coverage_idx) = self.coverage.get(glyph_id) else {
            return Ok(Substitution::None);
        };

        self.sequences
            .get(coverage_idx as usize)
            .map(|seq| Substitution::Multiple(seq.clone()))
            .ok_or_else(|| OtlError::malformed(Tag::GSUB, format!("multiple sequence {coverage_idx} missing")))
    }
}

/// Alternate substitution subtable (one-of-many)
#[derive(Debug, Clone)]
pub struct AlternateSubst {
    coverage: Coverage,
    alternate_sets: Vec<Vec<GlyphId>>,
}

impl AlternateSubst {
    pub fn new(coverage: Coverage, alternate_sets: Vec<Vec<GlyphId>>) -> Self {
        Self { coverage, alternate_sets }
    }

    /// Get alternates for a glyph
    pub fn get_alternates(&self, glyph_id: GlyphId) -> Result<Option<&[GlyphId]>> {
        let Some(coverage_idx) = self.coverage.get(glyph_id) else {
            return Ok(None);
        };

        self.alternate_sets
            .get(coverage_idx as usize)
            .map(|set| Some(set.as_slice()))
            .ok_or_else(|| OtlError::malformed(Tag::GSUB, format!("alternate set {coverage_idx} missing")))
    }

    /// Apply substitution; feature value `n` selects alternate `n - 1`
    pub fn apply(&self, glyph_id: GlyphId, feature_value: u32) -> Result<Substitution> {
        let Some(alternates) = self.get_alternates(glyph_id)? else {
            return Ok(Substitution::None);
        };

        let index = feature_value.saturating_sub(1) as usize;
        Ok(alternates.get(index).map_or(Substitution::None, |&alt| Substitution::Single(alt)))
    }
}

/// Ligature substitution subtable (many-to-one)
#[derive(Debug, Clone)]
pub struct LigatureSubst {
    coverage: Coverage,
    ligature_sets: Vec<Vec<Ligature>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ligature {
    /// Resulting ligature glyph
    pub ligature_glyph: GlyphId,
    /// Component glyphs (first is from coverage, rest are here)
    pub components: Vec<GlyphId>,
}

impl Ligature {
    pub fn new(ligature_glyph: GlyphId, components: Vec<GlyphId>) -> Self {
        Self { ligature_glyph, components }
    }
}

impl LigatureSubst {
    pub fn new(coverage: Coverage, ligature_sets: Vec<Vec<Ligature>>) -> Self {
        Self { coverage, ligature_sets }
    }

    /// Try to form a ligature starting at `start`
    ///
    /// Glyphs the lookup flag skips are stepped over while matching
    /// components. The first ligature in the set that matches wins.
    pub fn apply(&self, glyphs: &[GlyphId], start: usize, flag: LookupFlag, gdef: Option<&GdefTable>) -> Result<Substitution> {
        let Some(coverage_idx) = self.coverage.get(glyphs[start]) else {
            return Ok(Substitution::None);
        };
        let ligature_set = self
            .ligature_sets
            .get(coverage_idx as usize)
            .ok_or_else(|| OtlError::malformed(Tag::GSUB, format!("ligature set {coverage_idx} missing")))?;

        for ligature in ligature_set {
            let mut positions = vec![start];
            let mut next = start + 1;

            let matches = ligature.components.iter().all(|&component| {
                while next < glyphs.len() && flag.skips(glyphs[next], gdef) {
                    next += 1;
                }
                if next < glyphs.len() && glyphs[next] == component {
                    positions.push(next);
                    next += 1;
                    true
                } else {
                    false
                }
            });

            if matches {
                return Ok(Substitution::Ligature { glyph: ligature.ligature_glyph, positions });
            }
        }

        Ok(Substitution::None)
    }
}

/// GSUB subtable
#[derive(Debug, Clone)]
pub enum GsubSubtable {
    Single(SingleSubst),
    Multiple(MultipleSubst),
    Alternate(AlternateSubst),
    Ligature(LigatureSubst),
}

impl GsubSubtable {
    pub fn lookup_type(&self) -> LookupType {
        match self {
            Self::Single(_) => LookupType::Single,
            Self::Multiple(_) => LookupType::Multiple,
            Self::Alternate(_) => LookupType::Alternate,
            Self::Ligature(_) => LookupType::Ligature,
        }
    }

    fn apply(
        &self,
        glyphs: &[GlyphId],
        index: usize,
        feature_value: u32,
        flag: LookupFlag,
        gdef: Option<&GdefTable>,
    ) -> Result<Substitution> {
        match self {
            Self::Single(subst) => subst.apply(glyphs[index]),
            Self::Multiple(subst) => subst.apply(glyphs[index]),
            Self::Alternate(subst) => subst.apply(glyphs[index], feature_value),
            Self::Ligature(subst) => subst.apply(glyphs, index, flag, gdef),
        }
    }
}

/// GSUB lookup
#[derive(Debug, Clone)]
pub struct GsubLookup {
    pub lookup_flag: LookupFlag,
    pub subtables: Vec<GsubSubtable>,
}

impl GsubLookup {
    pub fn new(subtables: Vec<GsubSubtable>) -> Self {
        Self { lookup_flag: LookupFlag::default(), subtables }
    }

    /// Set lookup flag
    pub fn flag(mut self, flag: u16) -> Self {
        self.lookup_flag = LookupFlag(flag);
        self
    }

    /// Apply this lookup across the whole sequence
    fn apply(&self, sequence: &GlyphSequence, feature_value: u32, gdef: Option<&GdefTable>) -> Result<GlyphSequence> {
        let glyphs = sequence.glyphs();
        let clusters = sequence.cluster_slots();

        let mut out = SequenceWriter::with_capacity(glyphs.len());
        let mut i = 0;

        while i < glyphs.len() {
            if self.lookup_flag.skips(glyphs[i], gdef) {
                out.push(glyphs[i], clusters[i].clone());
                i += 1;
                continue;
            }

            let mut substitution = Substitution::None;
            for subtable in &self.subtables {
                substitution = subtable.apply(glyphs, i, feature_value, self.lookup_flag, gdef)?;
                if substitution != Substitution::None {
                    break;
                }
            }

            match substitution {
                Substitution::None => {
                    out.push(glyphs[i], clusters[i].clone());
                    i += 1;
                }
                Substitution::Single(glyph) => {
                    out.push(glyph, clusters[i].clone());
                    i += 1;
                }
                Substitution::Multiple(replacement) => {
                    if replacement.is_empty() {
                        out.delete(&clusters[i]);
                    }
                    for glyph in replacement {
                        out.push(glyph, clusters[i].clone());
                    }
                    i += 1;
                }
                Substitution::Ligature { glyph, positions } => {
                    let first = positions[0];
                    let last = positions[positions.len() - 1];
                    out.push(glyph, merge_clusters(positions.iter().map(|&p| &clusters[p])));

                    // Skipped glyphs inside the match keep their order after the ligature
                    for j in first..=last {
                        if !positions.contains(&j) {
                            out.push(glyphs[j], clusters[j].clone());
                        }
                    }
                    i = last + 1;
                }
            }
        }

        let (glyphs, clusters) = out.finish();
        sequence.derive(glyphs, sequence.clusters().map(|_| clusters))
    }
}

/// Output buffer that keeps deleted glyphs' characters attached to a neighbor
struct SequenceWriter {
    glyphs: Vec<GlyphId>,
    clusters: Vec<Cluster>,
    orphaned: Cluster,
}

impl SequenceWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            glyphs: Vec::with_capacity(capacity),
            clusters: Vec::with_capacity(capacity),
            orphaned: Vec::new(),
        }
    }

    fn push(&mut self, glyph: GlyphId, cluster: Cluster) {
        let cluster = if self.orphaned.is_empty() {
            cluster
        } else {
            merge_clusters([&std::mem::take(&mut self.orphaned), &cluster])
        };
        self.glyphs.push(glyph);
        self.clusters.push(cluster);
    }

    /// Drop a glyph, folding its characters into the preceding glyph (or the next one)
    fn delete(&mut self, cluster: &Cluster) {
        match self.clusters.last_mut() {
            Some(previous) => *previous = merge_clusters([&*previous, cluster]),
            None => self.orphaned.extend_from_slice(cluster),
        }
    }

    fn finish(self) -> (Vec<GlyphId>, Vec<Cluster>) {
        if !self.orphaned.is_empty() {
            tracing::trace!(chars = ?self.orphaned, "every glyph deleted, characters left without glyphs");
        }
        (self.glyphs, self.clusters)
    }
}

/// In-memory GSUB table
#[derive(Debug, Clone, Default)]
pub struct GsubTable {
    header: LayoutHeader,
    lookups: Vec<GsubLookup>,
}

impl GsubTable {
    pub fn new(scripts: ScriptList, features: Vec<FeatureRecord>, lookups: Vec<GsubLookup>) -> Self {
        Self { header: LayoutHeader::new(scripts, features), lookups }
    }

    /// Get lookup by index
    pub fn get_lookup(&self, index: u16) -> Option<&GsubLookup> {
        self.lookups.get(index as usize)
    }

    /// Get number of lookups
    pub fn lookup_count(&self) -> usize {
        self.lookups.len()
    }

    /// Lookups active for a context, in application order
    pub fn active_lookups(&self, context: &LayoutContext<'_>) -> Result<Vec<ActiveLookup>> {
        self.header.lookups_for(
            Tag::GSUB,
            self.lookups.len(),
            context.script,
            context.language,
            &DEFAULT_FEATURES,
            context.features,
        )
    }
}

impl SubstitutionStage for GsubTable {
    fn substitute(&self, sequence: &GlyphSequence, context: &LayoutContext<'_>) -> Result<GlyphSequence> {
        let mut current = sequence.clone();

        for active in self.active_lookups(context)? {
            let lookup = &self.lookups[active.index as usize];
            let next = lookup.apply(&current, active.value, context.gdef)?;
            tracing::trace!(
                lookup = active.index,
                before = current.glyph_count(),
                after = next.glyph_count(),
                "applied GSUB lookup"
            );
            current = next;
        }

        Ok(current)
    }
}
