//! Example: shape a string with fos-otl
//!
//! With a font path argument the cmap and metrics come from the file;
//! otherwise a small synthetic font with an "fi" ligature and kerning is used.
//!
//!     RUST_LOG=fos_otl=trace cargo run -p fos-otl --example shape -- [font.ttf] [text]

use anyhow::Context;
use fos_otl::layout::gpos::{PairPos, PairValueRecord, ValueRecord};
use fos_otl::layout::gsub::{Ligature, LigatureSubst};
use fos_otl::layout::{Coverage, FeatureRecord, GposLookup, GposSubtable, GsubLookup, GsubSubtable, LangSys, Script, ScriptList};
use fos_otl::{AdvancedFont, CharMap, GlyphId, GposTable, GsubTable, HorizontalMetrics, ShapingOptions, Tag};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut args = std::env::args().skip(1);
    let (font, text) = match (args.next(), args.next()) {
        (Some(path), text) => {
            let data = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
            let face = fos_otl::font::ttf::load(&data, 0)?;
            println!("{path}: layout tables present: {}", face.has_layout_tables());
            (face.into_builder().build()?, text.unwrap_or_else(|| "Hello".to_string()))
        }
        (None, _) => (synthetic_font()?, "office".to_string()),
    };

    let options = ShapingOptions::default();
    let run = font.create_shaped_run_with(&text, &options)?;

    println!("{text:?} -> {} glyphs, width {:.1}", run.len(), run.width);
    for glyph in run.positioned_glyphs(1.0) {
        println!("  glyph {:>5} at ({:>7.1}, {:>6.1}) from char {:?}", glyph.glyph_id.0, glyph.x, glyph.y, glyph.cluster);
    }

    Ok(())
}

fn synthetic_font() -> anyhow::Result<AdvancedFont> {
    let mut cmap = CharMap::new();
    cmap.insert_range('a', 'z', GlyphId(1));

    let mut metrics = HorizontalMetrics::new(vec![500; 27]);
    // "fi" ligature
    metrics.set(GlyphId(100), 560);

    let f = GlyphId(6);
    let i = GlyphId(9);
    let o = GlyphId(15);

    let scripts = ScriptList::new().script(Tag::LATN, Script::new().default_lang_sys(LangSys::new([0])));

    let gsub = GsubTable::new(
        scripts.clone(),
        vec![FeatureRecord::new(Tag::new(b"liga"), [0])],
        vec![GsubLookup::new(vec![GsubSubtable::Ligature(LigatureSubst::new(
            Coverage::glyphs([f]),
            vec![vec![Ligature::new(GlyphId(100), vec![i])]],
        ))])],
    );

    let gpos = GposTable::new(
        scripts,
        vec![FeatureRecord::new(Tag::new(b"kern"), [0])],
        vec![GposLookup::new(vec![GposSubtable::Pair(PairPos::pairs(
            Coverage::glyphs([o]),
            vec![vec![PairValueRecord::new(f, ValueRecord::advance(-40), ValueRecord::default())]],
        ))])],
    );

    Ok(AdvancedFont::builder(1000).cmap(cmap).metrics(metrics).gsub(gsub).gpos(gpos).build()?)
}
