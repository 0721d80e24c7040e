//! Canonical content hashing.

use crate::document::{CellSource, Element};
use sha2::{Digest, Sha256};

/// Prefix naming the digest algorithm in every canonical hash.
pub const HASH_PREFIX: &str = "sha256:";

/// Normalize cell content for hashing.
///
/// Fragments are concatenated, `\r\n` and lone `\r` become `\n`, and trailing
/// whitespace (including trailing blank lines) is dropped. Leading and
/// internal whitespace are kept.
pub fn normalize_content(source: &CellSource) -> String {
    let joined = source.joined();
    let unified = joined.replace("\r\n", "\n").replace('\r', "\n");
    unified.trim_end().to_string()
}

/// Hash of an element's normalized content, e.g. `sha256:9f86d0...`.
///
/// Kind and attributes never participate.
pub fn canonical_hash(element: &Element) -> String {
    hash_text(&normalize_content(&element.source))
}

/// Prefixed lowercase SHA-256 hex digest of `text`.
pub fn hash_text(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{}{}", HASH_PREFIX, hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fragments(parts: &[&str]) -> CellSource {
        CellSource::Fragments(parts.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn hash_has_prefix_and_lowercase_hex() {
        let hash = canonical_hash(&Element::code("x = 1"));
        let hex_part = hash.strip_prefix(HASH_PREFIX).unwrap();
        assert_eq!(hex_part.len(), 64);
        assert!(
            hex_part
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn known_digest() {
        // sha256("test")
        assert_eq!(
            hash_text("test"),
            "sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn fragment_splitting_does_not_matter() {
        let whole = Element::code("import os\nprint(os.sep)\n");
        let split = Element::code(fragments(&["import os\n", "print(os.sep)\n"]));
        let odd_split = Element::code(fragments(&["imp", "ort os\nprint(", "os.sep)", "\n"]));

        assert_eq!(canonical_hash(&whole), canonical_hash(&split));
        assert_eq!(canonical_hash(&whole), canonical_hash(&odd_split));
    }

    #[test]
    fn line_endings_do_not_matter() {
        let lf = Element::code("a = 1\nb = 2");
        let crlf = Element::code("a = 1\r\nb = 2");
        let cr = Element::code("a = 1\rb = 2");
        let crlf_fragments = Element::code(fragments(&["a = 1\r\n", "b = 2"]));

        assert_eq!(canonical_hash(&lf), canonical_hash(&crlf));
        assert_eq!(canonical_hash(&lf), canonical_hash(&cr));
        assert_eq!(canonical_hash(&lf), canonical_hash(&crlf_fragments));
    }

    #[test]
    fn trailing_whitespace_does_not_matter() {
        let base = Element::code("x = 1");
        assert_eq!(canonical_hash(&base), canonical_hash(&Element::code("x = 1   ")));
        assert_eq!(
            canonical_hash(&base),
            canonical_hash(&Element::code("x = 1\n\n\r\n\t \n"))
        );
    }

    #[test]
    fn leading_and_internal_whitespace_matter() {
        let base = canonical_hash(&Element::code("x = 1"));
        assert_ne!(base, canonical_hash(&Element::code("  x = 1")));
        assert_ne!(base, canonical_hash(&Element::code("x  = 1")));
        assert_ne!(base, canonical_hash(&Element::code("\nx = 1")));
    }

    #[test]
    fn different_content_differs() {
        assert_ne!(
            canonical_hash(&Element::code("x = 1")),
            canonical_hash(&Element::code("x = 2"))
        );
    }

    #[test]
    fn kind_and_attributes_are_ignored() {
        let code = Element::code("# Notes");
        let mut markdown = Element::markdown("# Notes");
        markdown
            .attributes
            .insert("tags".to_string(), json!(["intro"]));
        markdown.identifier = Some("cell-00000000".to_string());

        assert_eq!(canonical_hash(&code), canonical_hash(&markdown));
    }

    #[test]
    fn normalization_output() {
        assert_eq!(
            normalize_content(&fragments(&["  a\r\n", "b  \r\n", "\r\n"])),
            "  a\nb"
        );
    }
}
