//! Glyph sequence with cluster tracking

use std::borrow::Cow;
use std::sync::Arc;

use crate::font::{CharacterToGlyphMapper, GlyphId};
use crate::{OtlError, Result};

/// Sorted, non-empty set of source character indices for one glyph
pub type Cluster = Vec<usize>;

/// Characters, current glyphs and the map from glyphs back to characters
///
/// A sequence is never edited in place. Every stage that changes glyphs
/// produces a new sequence through [`GlyphSequence::derive`]; the original
/// characters are shared between all sequences derived from the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphSequence {
    characters: Arc<[char]>,
    glyphs: Vec<GlyphId>,
    clusters: Option<Vec<Cluster>>,
}

impl GlyphSequence {
    /// Create a sequence, validating the cluster map when one is given
    ///
    /// Each cluster must be non-empty and only name existing characters.
    pub fn new(characters: impl Into<Arc<[char]>>, glyphs: Vec<GlyphId>, clusters: Option<Vec<Cluster>>) -> Result<Self> {
        let characters = characters.into();
        if let Some(clusters) = &clusters {
            validate_clusters(&glyphs, clusters, characters.len())?;
        }
        Ok(Self { characters, glyphs, clusters })
    }

    /// Map every character of `text` through `cmap`, one glyph per character
    pub fn from_text(text: &str, cmap: &dyn CharacterToGlyphMapper) -> Self {
        let characters: Arc<[char]> = text.chars().collect();
        let glyphs = characters.iter().map(|&c| cmap.glyph_id(c)).collect();
        let clusters = (0..characters.len()).map(|i| vec![i]).collect();
        Self { characters, glyphs, clusters: Some(clusters) }
    }

    /// New sequence over the same characters with replaced glyphs and clusters
    ///
    /// `None` leaves the new sequence without a cluster map.
    pub fn derive(&self, glyphs: Vec<GlyphId>, clusters: Option<Vec<Cluster>>) -> Result<Self> {
        if let Some(clusters) = &clusters {
            validate_clusters(&glyphs, clusters, self.characters.len())?;
        }
        Ok(Self {
            characters: Arc::clone(&self.characters),
            glyphs,
            clusters,
        })
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyphs(&self) -> &[GlyphId] {
        &self.glyphs
    }

    pub fn characters(&self) -> &[char] {
        &self.characters
    }

    pub fn clusters(&self) -> Option<&[Cluster]> {
        self.clusters.as_deref()
    }

    /// One cluster per glyph, all empty when the sequence has no cluster map
    ///
    /// Stages that rearrange glyphs carry these slots along and hand the
    /// result back through [`GlyphSequence::derive`] only when
    /// [`GlyphSequence::clusters`] was present.
    pub(crate) fn cluster_slots(&self) -> Cow<'_, [Cluster]> {
        match &self.clusters {
            Some(clusters) => Cow::Borrowed(clusters.as_slice()),
            None => Cow::Owned(vec![Cluster::new(); self.glyphs.len()]),
        }
    }

    /// Consume the sequence, yielding its glyphs and cluster map
    pub fn into_parts(self) -> (Vec<GlyphId>, Option<Vec<Cluster>>) {
        (self.glyphs, self.clusters)
    }
}

fn validate_clusters(glyphs: &[GlyphId], clusters: &[Cluster], char_count: usize) -> Result<()> {
    if clusters.len() != glyphs.len() {
        return Err(OtlError::ClusterMismatch { glyphs: glyphs.len(), clusters: clusters.len() });
    }

    for (glyph, cluster) in clusters.iter().enumerate() {
        if cluster.is_empty() || cluster.iter().any(|&c| c >= char_count) {
            return Err(OtlError::InvalidCluster { glyph });
        }
    }

    Ok(())
}

/// Sorted union of several clusters
pub(crate) fn merge_clusters<'a>(clusters: impl IntoIterator<Item = &'a Cluster>) -> Cluster {
    let mut merged: Cluster = clusters.into_iter().flatten().copied().collect();
    merged.sort_unstable();
    merged.dedup();
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::CharMap;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_cluster_length_must_match() {
        let result = GlyphSequence::new(chars("ab"), vec![GlyphId(1), GlyphId(2)], Some(vec![vec![0]]));
        assert!(matches!(result, Err(OtlError::ClusterMismatch { glyphs: 2, clusters: 1 })));
    }

    #[test]
    fn test_cluster_without_source_rejected() {
        let result = GlyphSequence::new(chars("ab"), vec![GlyphId(1)], Some(vec![vec![]]));
        assert!(matches!(result, Err(OtlError::InvalidCluster { glyph: 0 })));

        let result = GlyphSequence::new(chars("ab"), vec![GlyphId(1)], Some(vec![vec![5]]));
        assert!(matches!(result, Err(OtlError::InvalidCluster { glyph: 0 })));
    }

    #[test]
    fn test_absent_cluster_map_allowed() {
        let seq = GlyphSequence::new(chars("ab"), vec![GlyphId(1), GlyphId(2)], None).unwrap();
        assert!(seq.clusters().is_none());
        assert_eq!(seq.cluster_slots().as_ref(), &[Cluster::new(), Cluster::new()]);
    }

    #[test]
    fn test_absent_cluster_map_not_invented_for_fewer_glyphs() {
        let seq = GlyphSequence::new(chars("ab"), vec![GlyphId(7)], None).unwrap();
        let derived = seq.derive(vec![GlyphId(8)], None).unwrap();
        assert!(derived.clusters().is_none());
        assert_eq!(derived.into_parts(), (vec![GlyphId(8)], None));
    }

    #[test]
    fn test_from_text_identity_clusters() {
        let cmap: CharMap = [('A', GlyphId(3)), ('B', GlyphId(4))].into_iter().collect();
        let seq = GlyphSequence::from_text("AB?", &cmap);
        assert_eq!(seq.glyphs(), &[GlyphId(3), GlyphId(4), GlyphId::NOTDEF]);
        assert_eq!(seq.characters(), &['A', 'B', '?']);
        assert_eq!(seq.clusters().unwrap(), &[vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_derive_shares_characters() {
        let seq = GlyphSequence::new(chars("fi"), vec![GlyphId(1), GlyphId(2)], None).unwrap();
        let lig = seq.derive(vec![GlyphId(9)], Some(vec![vec![0, 1]])).unwrap();
        assert_eq!(lig.glyph_count(), 1);
        assert_eq!(lig.characters(), seq.characters());
        assert_eq!(seq.glyph_count(), 2);
    }

    #[test]
    fn test_merge_clusters_sorted_unique() {
        let merged = merge_clusters([&vec![2], &vec![0, 2], &vec![1]]);
        assert_eq!(merged, vec![0, 1, 2]);
    }
}
