//! Shaping pipeline
//!
//! Turns a string into a [`ShapedGlyphRun`] by mapping characters to
//! glyphs, applying substitution and positioning, and measuring the result.

mod options;
mod run;
mod sequence;
mod shaper;

pub use options::{Feature, ShapingOptions, VerticalAdvance};
pub use run::{PositionAdjustment, PositionedGlyph, ShapedGlyphRun};
pub use sequence::{Cluster, GlyphSequence};
pub use shaper::Shaper;

pub(crate) use sequence::merge_clusters;
pub(crate) use shaper::shape_run;
