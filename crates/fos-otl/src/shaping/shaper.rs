//! Shaping pipeline: cmap, GSUB, optional mark reordering, GPOS, width

use crate::font::{AdvancedFont, Tag};
use crate::layout::LayoutContext;
use crate::Result;
use super::{Feature, GlyphSequence, PositionAdjustment, ShapedGlyphRun, ShapingOptions, VerticalAdvance};

/// Canonical em size the run width is normalized to
const NORMALIZED_UNITS_PER_EM: f32 = 1000.0;

/// Text shaper with reusable options
#[derive(Debug, Clone, Default)]
pub struct Shaper {
    options: ShapingOptions,
}

impl Shaper {
    /// Create a new shaper with default options (`latn`/`dflt`, default features)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shaper from existing options
    pub fn with_options(options: ShapingOptions) -> Self {
        Self { options }
    }

    /// Set script (for feature selection)
    pub fn script(mut self, script: Tag) -> Self {
        self.options.script = script;
        self
    }

    /// Set language (for feature selection)
    pub fn language(mut self, language: Tag) -> Self {
        self.options.language = language;
        self
    }

    /// Append a feature override
    pub fn feature(mut self, feature: Feature) -> Self {
        self.options.features.push(feature);
        self
    }

    /// Set vertical advance policy
    pub fn vertical_advance(mut self, policy: VerticalAdvance) -> Self {
        self.options.vertical_advance = policy;
        self
    }

    /// Enable or disable combining-mark reordering
    pub fn reorder_marks(mut self, enabled: bool) -> Self {
        self.options.reorder_marks = enabled;
        self
    }

    pub fn options(&self) -> &ShapingOptions {
        &self.options
    }

    /// Shape text with a font
    pub fn shape(&self, font: &AdvancedFont, text: &str) -> Result<ShapedGlyphRun> {
        shape_run(font, text, &self.options)
    }
}

/// Run the full pipeline for one string
///
/// Every buffer is local to the call; the font is only read.
pub(crate) fn shape_run(font: &AdvancedFont, text: &str, options: &ShapingOptions) -> Result<ShapedGlyphRun> {
    if text.is_empty() {
        return Ok(ShapedGlyphRun::empty());
    }

    tracing::debug!(
        chars = text.chars().count(),
        script = %options.script,
        language = %options.language,
        "shaping run"
    );

    let context = LayoutContext::new(options, font.gdef());
    let mapped = GlyphSequence::from_text(text, font.cmap());

    let substituted = match font.gsub() {
        Some(gsub) => gsub.substitute(&mapped, &context)?,
        None => mapped,
    };

    let (sequence, marks_reordered) = match (options.reorder_marks, font.gdef()) {
        (true, Some(gdef)) => (gdef.reorder_combining_marks(&substituted)?, true),
        (true, None) => {
            tracing::trace!("mark reordering requested but font has no GDEF");
            (substituted, false)
        }
        (false, _) => {
            tracing::trace!("mark reordering disabled");
            (substituted, false)
        }
    };

    let metrics = font.metrics();
    let advances: Vec<u16> = sequence.glyphs().iter().map(|&glyph| metrics.advance_width(glyph)).collect();

    let adjustments = match font.gpos() {
        Some(gpos) => {
            let mut buffer = vec![PositionAdjustment::default(); sequence.glyph_count()];
            let context = LayoutContext { marks_reordered, ..context };
            if gpos.position(&sequence, &context, &advances, &mut buffer)? {
                Some(buffer)
            } else {
                None
            }
        }
        None => None,
    };

    let mut total: i64 = 0;
    for (i, &advance) in advances.iter().enumerate() {
        total += i64::from(advance);
        if let Some(adjust) = adjustments.as_ref().map(|adjustments| adjustments[i]) {
            if adjust.placement_x != 0 || adjust.advance_x != 0 {
                total += i64::from(adjust.advance_x);
            }
            if options.vertical_advance == VerticalAdvance::Include {
                total += i64::from(adjust.advance_y);
            }
        }
    }

    let units_per_em = font.units_per_em();
    let width = if units_per_em as f32 == NORMALIZED_UNITS_PER_EM {
        total as f32
    } else {
        total as f32 * (NORMALIZED_UNITS_PER_EM / f32::from(units_per_em))
    };

    tracing::debug!(
        chars = sequence.characters().len(),
        glyphs = sequence.glyph_count(),
        clustered = sequence.clusters().is_some(),
        positioned = adjustments.is_some(),
        width,
        "shaped run"
    );

    let (glyphs, clusters) = sequence.into_parts();
    Ok(ShapedGlyphRun {
        glyphs,
        clusters,
        advances,
        adjustments,
        width,
    })
}
