//! Shaping configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::font::Tag;
use crate::OtlError;

/// Feature setting: a tag and its value
///
/// Value 0 turns the feature off, 1 turns it on, larger values select an
/// alternate (value `n` picks alternate `n - 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feature {
    pub tag: Tag,
    pub value: u32,
}

impl Feature {
    pub fn new(tag: Tag, value: u32) -> Self {
        Self { tag, value }
    }

    /// Enable a feature
    pub fn on(tag: Tag) -> Self {
        Self::new(tag, 1)
    }

    /// Disable a feature
    pub fn off(tag: Tag) -> Self {
        Self::new(tag, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.value != 0
    }
}

impl FromStr for Feature {
    type Err = OtlError;

    /// Parse `liga`, `+liga`, `-liga` or `salt=2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(tag) = s.strip_prefix('-') {
            return Ok(Feature::off(tag.parse()?));
        }
        let s = s.strip_prefix('+').unwrap_or(s);

        match s.split_once('=') {
            Some((tag, value)) => {
                let value = value.trim().parse().map_err(|_| OtlError::InvalidTag(s.to_string()))?;
                Ok(Feature::new(tag.trim().parse()?, value))
            }
            None => Ok(Feature::on(s.parse()?)),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            0 => write!(f, "-{}", self.tag),
            1 => write!(f, "{}", self.tag),
            n => write!(f, "{}={}", self.tag, n),
        }
    }
}

/// Whether vertical advance adjustments contribute to the run width
///
/// Positioning reports both axes per glyph either way; this only decides
/// what the scalar width accumulates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAdvance {
    /// Width sums horizontal advances only
    #[default]
    Ignore,
    /// Width also adds each glyph's vertical advance adjustment
    Include,
}

/// Options for one shaping call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapingOptions {
    /// OpenType script tag
    pub script: Tag,
    /// OpenType language system tag
    pub language: Tag,
    /// Ordered feature overrides; later entries win over earlier ones and over defaults
    pub features: Vec<Feature>,
    /// Vertical advance policy for the run width
    pub vertical_advance: VerticalAdvance,
    /// Run the GDEF combining-mark reordering stage after substitution
    ///
    /// Reordered marks sit in front of their base, so GPOS mark-to-base
    /// then looks for the base after the mark. A mark that opens the text
    /// has no base of its own and attaches to the first base that follows.
    pub reorder_marks: bool,
    /// Font size handed to positioning stages
    pub font_size: f32,
}

impl Default for ShapingOptions {
    fn default() -> Self {
        Self {
            script: Tag::LATN,
            language: Tag::DFLT_LANGUAGE,
            features: Vec::new(),
            vertical_advance: VerticalAdvance::Ignore,
            reorder_marks: false,
            font_size: 20.0,
        }
    }
}

impl ShapingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set script
    pub fn script(mut self, script: Tag) -> Self {
        self.script = script;
        self
    }

    /// Set language system
    pub fn language(mut self, language: Tag) -> Self {
        self.language = language;
        self
    }

    /// Append a feature override
    pub fn feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    /// Replace all feature overrides
    pub fn features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.features = features.into_iter().collect();
        self
    }

    /// Set vertical advance policy
    pub fn vertical_advance(mut self, policy: VerticalAdvance) -> Self {
        self.vertical_advance = policy;
        self
    }

    /// Enable or disable combining-mark reordering
    pub fn reorder_marks(mut self, enabled: bool) -> Self {
        self.reorder_marks = enabled;
        self
    }

    /// Set font size
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }
}
