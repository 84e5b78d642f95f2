//! Horizontal glyph metrics

use super::GlyphId;

/// Supplies per-glyph advance widths in font design units
pub trait MetricsProvider: Send + Sync {
    fn advance_width(&self, glyph_id: GlyphId) -> u16;
}

/// Advance widths indexed by glyph ID, with hmtx semantics
///
/// Glyphs past the end of the array reuse the last advance, as
/// monospaced tails do in `hmtx`. An empty table reports 0.
#[derive(Debug, Clone, Default)]
pub struct HorizontalMetrics {
    advances: Vec<u16>,
}

impl HorizontalMetrics {
    pub fn new(advances: Vec<u16>) -> Self {
        Self { advances }
    }

    /// Set the advance of one glyph, growing the table with zeros if needed
    pub fn set(&mut self, glyph_id: GlyphId, advance: u16) {
        let index = glyph_id.0 as usize;
        if index >= self.advances.len() {
            self.advances.resize(index + 1, 0);
        }
        self.advances[index] = advance;
    }

    /// Number of explicit advance entries
    pub fn len(&self) -> usize {
        self.advances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advances.is_empty()
    }
}

impl MetricsProvider for HorizontalMetrics {
    fn advance_width(&self, glyph_id: GlyphId) -> u16 {
        self.advances
            .get(glyph_id.0 as usize)
            .or_else(|| self.advances.last())
            .copied()
            .unwrap_or(0)
    }
}

impl FromIterator<(GlyphId, u16)> for HorizontalMetrics {
    fn from_iter<I: IntoIterator<Item = (GlyphId, u16)>>(iter: I) -> Self {
        let mut metrics = Self::default();
        for (glyph, advance) in iter {
            metrics.set(glyph, advance);
        }
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_lookup() {
        let metrics: HorizontalMetrics = [(GlyphId(3), 500), (GlyphId(4), 600)].into_iter().collect();
        assert_eq!(metrics.advance_width(GlyphId(3)), 500);
        assert_eq!(metrics.advance_width(GlyphId(4)), 600);
        assert_eq!(metrics.advance_width(GlyphId(0)), 0);
    }

    #[test]
    fn test_trailing_glyphs_reuse_last_advance() {
        let metrics = HorizontalMetrics::new(vec![0, 250, 600]);
        assert_eq!(metrics.advance_width(GlyphId(40)), 600);
    }

    #[test]
    fn test_empty_table() {
        let metrics = HorizontalMetrics::default();
        assert_eq!(metrics.advance_width(GlyphId(1)), 0);
    }
}
