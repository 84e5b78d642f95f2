//! OpenType tags

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::OtlError;

/// Four-byte OpenType identifier (table, script, language or feature)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(pub [u8; 4]);

impl Tag {
    // Tables
    pub const BASE: Tag = Tag(*b"BASE");
    pub const GDEF: Tag = Tag(*b"GDEF");
    pub const GPOS: Tag = Tag(*b"GPOS");
    pub const GSUB: Tag = Tag(*b"GSUB");
    pub const JSTF: Tag = Tag(*b"JSTF");

    /// Default script
    pub const DFLT_SCRIPT: Tag = Tag(*b"DFLT");
    /// Default language system
    pub const DFLT_LANGUAGE: Tag = Tag(*b"dflt");
    /// Latin script
    pub const LATN: Tag = Tag(*b"latn");

    /// Tables whose presence marks a font as using advanced layout
    pub const LAYOUT_TABLES: [Tag; 5] = [Tag::BASE, Tag::GDEF, Tag::GPOS, Tag::GSUB, Tag::JSTF];

    /// Create a tag from its four bytes
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Tag(*bytes)
    }

    /// Raw bytes
    pub fn to_bytes(self) -> [u8; 4] {
        self.0
    }

    /// Whether this is the default script or default language tag
    pub fn is_default(self) -> bool {
        self == Tag::DFLT_SCRIPT || self == Tag::DFLT_LANGUAGE
    }
}

impl FromStr for Tag {
    type Err = OtlError;

    /// Parse 1-4 printable ASCII characters, space padded on the right
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 || !bytes.iter().all(|b| (0x20..=0x7E).contains(b)) {
            return Err(OtlError::InvalidTag(s.to_string()));
        }

        let mut tag = [b' '; 4];
        tag[..bytes.len()].copy_from_slice(bytes);
        Ok(Tag(tag))
    }
}

impl TryFrom<String> for Tag {
    type Error = OtlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.to_string()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self.0.iter().map(|&b| b as char).collect();
        f.write_str(text.trim_end_matches(' '))
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({:?})", self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        let tag: Tag = "liga".parse().unwrap();
        assert_eq!(tag, Tag::new(b"liga"));
        assert_eq!(tag.to_string(), "liga");
    }

    #[test]
    fn test_short_tag_is_space_padded() {
        let tag: Tag = "cv".parse().unwrap();
        assert_eq!(tag.to_bytes(), *b"cv  ");
        assert_eq!(tag.to_string(), "cv");
    }

    #[test]
    fn test_invalid_tags() {
        assert!("".parse::<Tag>().is_err());
        assert!("toolong".parse::<Tag>().is_err());
        assert!("l\u{e9}".parse::<Tag>().is_err());
    }

    #[test]
    fn test_default_tags() {
        assert!(Tag::DFLT_SCRIPT.is_default());
        assert!(Tag::DFLT_LANGUAGE.is_default());
        assert!(!Tag::LATN.is_default());
    }
}
