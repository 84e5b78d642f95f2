//! Font file loading via ttf-parser
//!
//! Extracts what the pipeline needs from a TrueType/OpenType file: the
//! Unicode cmap, horizontal advances, units per em and the table
//! directory. Layout table bytes are not interpreted here; GSUB/GPOS/GDEF
//! stages are attached to the resulting builder separately.

use std::collections::BTreeSet;

use ttf_parser::Face;

use super::{AdvancedFontBuilder, CharMap, GlyphId, HorizontalMetrics, Tag};
use crate::{OtlError, Result};

/// Owned data extracted from a parsed font face
#[derive(Debug, Clone)]
pub struct LoadedFace {
    pub units_per_em: u16,
    pub cmap: CharMap,
    pub metrics: HorizontalMetrics,
    pub tables: BTreeSet<Tag>,
}

/// Parse a font face from raw data
pub fn load(data: &[u8], face_index: u32) -> Result<LoadedFace> {
    let face = Face::parse(data, face_index).map_err(|e| OtlError::FontParsing(e.to_string()))?;

    let mut cmap = CharMap::new();
    if let Some(table) = face.tables().cmap {
        for subtable in table.subtables {
            if !subtable.is_unicode() {
                continue;
            }
            subtable.codepoints(|code_point| {
                let Some(c) = char::from_u32(code_point) else { return };
                if cmap.get(c).is_some() {
                    return;
                }
                if let Some(glyph) = subtable.glyph_index(code_point) {
                    cmap.insert(c, GlyphId(glyph.0));
                }
            });
        }
    }

    let advances = (0..face.number_of_glyphs())
        .map(|gid| face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0))
        .collect();

    let tables = face
        .raw_face()
        .table_records
        .into_iter()
        .map(|record| Tag(record.tag.to_bytes()))
        .collect();

    let loaded = LoadedFace {
        units_per_em: face.units_per_em(),
        cmap,
        metrics: HorizontalMetrics::new(advances),
        tables,
    };

    tracing::debug!(
        glyphs = loaded.metrics.len(),
        chars = loaded.cmap.len(),
        tables = loaded.tables.len(),
        "loaded font face"
    );

    Ok(loaded)
}

impl LoadedFace {
    /// Whether the file's table directory lists any advanced layout table
    pub fn has_layout_tables(&self) -> bool {
        Tag::LAYOUT_TABLES.iter().any(|tag| self.tables.contains(tag))
    }

    /// Seed an [`AdvancedFontBuilder`] with this face's cmap, metrics and directory
    pub fn into_builder(self) -> AdvancedFontBuilder {
        let mut builder = AdvancedFontBuilder::new(self.units_per_em)
            .cmap(self.cmap)
            .metrics(self.metrics);
        for tag in self.tables {
            builder = builder.table(tag);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_parse_error() {
        let data = [0u8; 12];
        let result = load(&data, 0);
        assert!(matches!(result, Err(OtlError::FontParsing(_))));
    }

    #[test]
    fn test_empty_data_is_parse_error() {
        assert!(load(&[], 0).is_err());
    }
}
