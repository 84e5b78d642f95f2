//! Edge case tests for fos-otl
//!
//! Failure propagation, fallbacks, policies and custom stages.

use fos_otl::layout::gpos::{SinglePos, ValueRecord};
use fos_otl::layout::gsub::{MultipleSubst, SingleSubst};
use fos_otl::layout::{
    ClassDef, Coverage, FeatureRecord, GposLookup, GposSubtable, GsubLookup, GsubSubtable, LangSys, Script, ScriptList,
};
use fos_otl::*;

fn latin_scripts() -> ScriptList {
    ScriptList::new().script(Tag::LATN, Script::new().default_lang_sys(LangSys::new([0])))
}

fn base_font() -> AdvancedFontBuilder {
    AdvancedFont::builder(1000)
        .cmap(CharMap::from_iter([('a', GlyphId(1)), ('b', GlyphId(2)), ('\u{300}', GlyphId(9))]))
        .metrics(HorizontalMetrics::from_iter([(GlyphId(0), 300), (GlyphId(1), 400), (GlyphId(2), 450), (GlyphId(9), 0)]))
}

/// Substitution stage that always fails, standing in for a corrupt table
struct CorruptGsub;

impl SubstitutionStage for CorruptGsub {
    fn substitute(&self, _sequence: &GlyphSequence, _context: &LayoutContext<'_>) -> fos_otl::Result<GlyphSequence> {
        Err(OtlError::MalformedTable { tag: Tag::GSUB, reason: "truncated lookup list".into() })
    }
}

/// Positioning stage that raises every glyph's advance vertically
struct VerticalGpos;

impl PositioningStage for VerticalGpos {
    fn position(
        &self,
        _sequence: &GlyphSequence,
        _context: &LayoutContext<'_>,
        _advances: &[u16],
        adjustments: &mut [PositionAdjustment],
    ) -> fos_otl::Result<bool> {
        for adjustment in adjustments.iter_mut() {
            *adjustment = PositionAdjustment::new(0, 0, 0, 100);
        }
        Ok(!adjustments.is_empty())
    }
}

/// Substitution stage that records the script and language it was asked for
struct EchoTags;

impl SubstitutionStage for EchoTags {
    fn substitute(&self, sequence: &GlyphSequence, context: &LayoutContext<'_>) -> fos_otl::Result<GlyphSequence> {
        let glyph = if context.script == Tag::LATN && context.language == Tag::DFLT_LANGUAGE { 1 } else { 2 };
        let clusters = sequence.clusters().map(|clusters| clusters.to_vec());
        sequence.derive(vec![GlyphId(glyph); sequence.glyph_count()], clusters)
    }
}

/// Substitution stage that rewrites glyphs without reporting a cluster map
struct Unclustered(Vec<GlyphId>);

impl SubstitutionStage for Unclustered {
    fn substitute(&self, sequence: &GlyphSequence, _context: &LayoutContext<'_>) -> fos_otl::Result<GlyphSequence> {
        GlyphSequence::new(sequence.characters().to_vec(), self.0.clone(), None)
    }
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_malformed_substitution_aborts() {
    let font = base_font().gsub(CorruptGsub).build().unwrap();
    let result = font.create_shaped_run("ab");
    assert!(matches!(result, Err(OtlError::MalformedTable { tag, .. }) if tag == Tag::GSUB));
}

#[test]
fn test_malformed_stage_not_consulted_for_empty_text() {
    let font = base_font().gsub(CorruptGsub).build().unwrap();
    assert!(font.create_shaped_run("").unwrap().is_empty());
}

#[test]
fn test_feature_pointing_at_missing_lookup_aborts() {
    let gsub = GsubTable::new(latin_scripts(), vec![FeatureRecord::new(Tag::new(b"liga"), [3])], vec![]);
    let font = base_font().gsub(gsub).build().unwrap();

    let err = font.create_shaped_run("ab").unwrap_err();
    assert!(err.to_string().contains("GSUB"), "unexpected error: {err}");
}

#[test]
fn test_truncated_substitute_array_aborts() {
    let gsub = GsubTable::new(
        latin_scripts(),
        vec![FeatureRecord::new(Tag::new(b"ccmp"), [0])],
        vec![GsubLookup::new(vec![GsubSubtable::Single(SingleSubst::array(
            Coverage::glyphs([GlyphId(1), GlyphId(2)]),
            vec![GlyphId(5)],
        ))])],
    );
    let font = base_font().gsub(gsub).build().unwrap();

    assert!(font.create_shaped_run("a").is_ok());
    assert!(matches!(font.create_shaped_run("b"), Err(OtlError::MalformedTable { .. })));
}

#[test]
fn test_zero_units_per_em_rejected() {
    assert!(AdvancedFont::builder(0).build().is_err());
}

#[test]
fn test_garbage_font_file() {
    let result = fos_otl::font::ttf::load(b"not a font at all", 0);
    assert!(matches!(result, Err(OtlError::FontParsing(_))));
}

// ============================================================================
// FALLBACKS
// ============================================================================

#[test]
fn test_unmapped_character_is_notdef() {
    let font = base_font().build().unwrap();
    let run = font.create_shaped_run("a?b").unwrap();

    assert_eq!(run.glyphs, vec![GlyphId(1), GlyphId::NOTDEF, GlyphId(2)]);
    assert_eq!(run.width, 400.0 + 300.0 + 450.0);
}

#[test]
fn test_metrics_past_table_reuse_last_advance() {
    let font = base_font().cmap(CharMap::from_iter([('z', GlyphId(40))])).build().unwrap();
    let run = font.create_shaped_run("z").unwrap();
    assert_eq!(run.advances, vec![0]);

    let metrics = HorizontalMetrics::new(vec![500, 700]);
    assert_eq!(metrics.advance_width(GlyphId(40)), 700);
    assert_eq!(HorizontalMetrics::default().advance_width(GlyphId(1)), 0);
}

#[test]
fn test_non_bmp_characters_are_single_clusters() {
    let font = base_font().cmap(CharMap::from_iter([('\u{1F600}', GlyphId(2))])).build().unwrap();
    let run = font.create_shaped_run("\u{1F600}\u{1F600}").unwrap();

    assert_eq!(run.glyphs, vec![GlyphId(2), GlyphId(2)]);
    assert_eq!(run.clusters, Some(vec![vec![0], vec![1]]));
}

#[test]
fn test_default_tags_passed_to_stage() {
    let font = base_font().gsub(EchoTags).build().unwrap();
    assert_eq!(font.create_shaped_run("b").unwrap().glyphs, vec![GlyphId(1)]);

    let options = ShapingOptions::new().script("grek".parse().unwrap());
    assert_eq!(font.create_shaped_run_with("b", &options).unwrap().glyphs, vec![GlyphId(2)]);
}

#[test]
fn test_dflt_script_fallback() {
    let gsub = GsubTable::new(
        ScriptList::new().script(Tag::DFLT_SCRIPT, Script::new().default_lang_sys(LangSys::new([0]))),
        vec![FeatureRecord::new(Tag::new(b"ccmp"), [0])],
        vec![GsubLookup::new(vec![GsubSubtable::Single(SingleSubst::delta(Coverage::glyphs([GlyphId(1)]), 1))])],
    );
    let font = base_font().gsub(gsub).build().unwrap();

    let options = ShapingOptions::new().script("hebr".parse().unwrap()).language("IWR".parse().unwrap());
    assert_eq!(font.create_shaped_run_with("a", &options).unwrap().glyphs, vec![GlyphId(2)]);
}

// ============================================================================
// LAYOUT TABLE DETECTION
// ============================================================================

#[test]
fn test_layout_table_detection() {
    let plain = base_font().table(Tag::new(b"cmap")).table(Tag::new(b"hmtx")).build().unwrap();
    assert!(!plain.has_layout_tables());

    let base = base_font().table(Tag::BASE).build().unwrap();
    assert!(base.has_layout_tables());

    let jstf = base_font().table(Tag::JSTF).build().unwrap();
    assert!(jstf.has_layout_tables());

    let gdef_only = base_font().gdef(GdefTable::new()).build().unwrap();
    assert!(gdef_only.has_layout_tables());
    assert!(gdef_only.has_table(Tag::GDEF));
}

// ============================================================================
// CLUSTERS
// ============================================================================

#[test]
fn test_deleted_glyph_keeps_its_character() {
    let gsub = GsubTable::new(
        latin_scripts(),
        vec![FeatureRecord::new(Tag::new(b"ccmp"), [0])],
        vec![GsubLookup::new(vec![GsubSubtable::Multiple(MultipleSubst::new(
            Coverage::glyphs([GlyphId(9)]),
            vec![vec![]],
        ))])],
    );
    let font = base_font().gsub(gsub).build().unwrap();
    let run = font.create_shaped_run("a\u{300}b").unwrap();

    assert_eq!(run.glyphs, vec![GlyphId(1), GlyphId(2)]);
    assert_eq!(run.clusters, Some(vec![vec![0, 1], vec![2]]));
}

#[test]
fn test_one_to_many_shares_cluster() {
    let gsub = GsubTable::new(
        latin_scripts(),
        vec![FeatureRecord::new(Tag::new(b"ccmp"), [0])],
        vec![GsubLookup::new(vec![GsubSubtable::Multiple(MultipleSubst::new(
            Coverage::glyphs([GlyphId(2)]),
            vec![vec![GlyphId(1), GlyphId(9)]],
        ))])],
    );
    let font = base_font().gsub(gsub).build().unwrap();
    let run = font.create_shaped_run("b").unwrap();

    assert_eq!(run.glyphs, vec![GlyphId(1), GlyphId(9)]);
    assert_eq!(run.clusters, Some(vec![vec![0], vec![0]]));
    assert_eq!(run.width, 400.0);
}

#[test]
fn test_stage_without_cluster_map_merging_glyphs() {
    let font = base_font().gsub(Unclustered(vec![GlyphId(2)])).build().unwrap();
    let run = font.create_shaped_run("ab").unwrap();

    assert_eq!(run.glyphs, vec![GlyphId(2)]);
    assert_eq!(run.clusters, None);
    assert_eq!(run.glyph_for_char(1), None);
}

#[test]
fn test_stage_without_cluster_map_expanding_glyphs() {
    let font = base_font().gsub(Unclustered(vec![GlyphId(1), GlyphId(9), GlyphId(2)])).build().unwrap();
    let run = font.create_shaped_run("a").unwrap();

    assert_eq!(run.glyphs, vec![GlyphId(1), GlyphId(9), GlyphId(2)]);
    assert_eq!(run.clusters, None);
    assert_eq!(run.width, 850.0);
}

#[test]
fn test_reordering_stage_output_without_cluster_map() {
    let gdef = GdefTable::new().glyph_classes(ClassDef::glyphs([(GlyphId(1), 1), (GlyphId(9), 3)]));
    let font = base_font()
        .gsub(Unclustered(vec![GlyphId(1), GlyphId(9), GlyphId(2)]))
        .gdef(gdef)
        .build()
        .unwrap();
    let options = ShapingOptions::new().reorder_marks(true);
    let run = font.create_shaped_run_with("a", &options).unwrap();

    assert_eq!(run.glyphs, vec![GlyphId(9), GlyphId(1), GlyphId(2)]);
    assert_eq!(run.clusters, None);
}

#[test]
fn test_sequence_rejects_mismatched_cluster_map() {
    let result = GlyphSequence::new(vec!['a', 'b'], vec![GlyphId(1)], Some(vec![vec![0], vec![1]]));
    assert!(matches!(result, Err(OtlError::ClusterMismatch { glyphs: 1, clusters: 2 })));

    let seq = GlyphSequence::new(vec!['a', 'b'], vec![GlyphId(1), GlyphId(2)], None).unwrap();
    assert!(seq.clusters().is_none());
    assert_eq!(seq.glyph_count(), 2);
}

// ============================================================================
// POLICIES
// ============================================================================

#[test]
fn test_vertical_advance_ignored_by_default() {
    let font = base_font().gpos(VerticalGpos).build().unwrap();
    let run = font.create_shaped_run("ab").unwrap();

    assert!(run.is_positioned());
    assert_eq!(run.adjustment(0).advance_y, 100);
    assert_eq!(run.width, 850.0);
}

#[test]
fn test_vertical_advance_included_on_request() {
    let font = base_font().gpos(VerticalGpos).build().unwrap();
    let options = ShapingOptions::new().vertical_advance(VerticalAdvance::Include);
    let run = font.create_shaped_run_with("ab", &options).unwrap();

    assert_eq!(run.width, 850.0 + 200.0);
}

#[test]
fn test_placement_only_adjustment_keeps_advance() {
    let gpos = GposTable::new(
        latin_scripts(),
        vec![FeatureRecord::new(Tag::new(b"kern"), [0])],
        vec![GposLookup::new(vec![GposSubtable::Single(SinglePos::shared(
            Coverage::glyphs([GlyphId(1)]),
            ValueRecord::new(30, 0, 0, 0),
        ))])],
    );
    let font = base_font().gpos(gpos).build().unwrap();
    let run = font.create_shaped_run("a").unwrap();

    assert_eq!(run.adjustment(0).placement_x, 30);
    assert_eq!(run.width, 400.0);
}

#[test]
fn test_mark_reordering_is_opt_in() {
    let gdef = GdefTable::new().glyph_classes(ClassDef::glyphs([(GlyphId(1), 1), (GlyphId(9), 3)]));
    let font = base_font().gdef(gdef).build().unwrap();

    let run = font.create_shaped_run("a\u{300}").unwrap();
    assert_eq!(run.glyphs, vec![GlyphId(1), GlyphId(9)]);

    let options = ShapingOptions::new().reorder_marks(true);
    let run = font.create_shaped_run_with("a\u{300}", &options).unwrap();
    assert_eq!(run.glyphs, vec![GlyphId(9), GlyphId(1)]);
    assert_eq!(run.clusters, Some(vec![vec![1], vec![0]]));
}

#[test]
fn test_mark_reordering_without_gdef_is_noop() {
    let font = base_font().build().unwrap();
    let options = ShapingOptions::new().reorder_marks(true);
    let run = font.create_shaped_run_with("a\u{300}", &options).unwrap();
    assert_eq!(run.glyphs, vec![GlyphId(1), GlyphId(9)]);
}
