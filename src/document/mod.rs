//! Persisted documents (notebooks) and their cells.
//!
//! A document is an ordered list of cells plus document metadata and a
//! `major.minor` format version, stored as notebook-style JSON:
//!
//! ```json
//! {
//!  "cells": [
//!   {"cell_type": "code", "id": "cell-1a2b3c4d", "metadata": {}, "source": ["x = 1\n", "x"]}
//!  ],
//!  "metadata": {},
//!  "nbformat": 4,
//!  "nbformat_minor": 5
//! }
//! ```
//!
//! Fields this crate does not interpret (`outputs`, `execution_count`, ...)
//! are kept verbatim so a load/save round trip loses nothing.

mod io;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// A cell's source: one string, or fragments that concatenate to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellSource {
    Text(String),
    Fragments(Vec<String>),
}

impl CellSource {
    /// The logical content with fragments concatenated.
    pub fn joined(&self) -> Cow<'_, str> {
        match self {
            CellSource::Text(text) => Cow::Borrowed(text),
            CellSource::Fragments(parts) => Cow::Owned(parts.concat()),
        }
    }
}

impl Default for CellSource {
    fn default() -> Self {
        CellSource::Text(String::new())
    }
}

impl From<&str> for CellSource {
    fn from(text: &str) -> Self {
        CellSource::Text(text.to_string())
    }
}

impl From<Vec<String>> for CellSource {
    fn from(parts: Vec<String>) -> Self {
        CellSource::Fragments(parts)
    }
}

/// One structural element (cell) of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Discriminator such as `code` or `markdown`.
    #[serde(rename = "cell_type")]
    pub kind: String,

    /// Stable external identifier.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Opaque per-cell attributes; never part of identity.
    #[serde(rename = "metadata", alias = "attributes", default)]
    pub attributes: Map<String, Value>,

    #[serde(default)]
    pub source: CellSource,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    pub fn new(kind: &str, source: impl Into<CellSource>) -> Self {
        Self {
            kind: kind.to_string(),
            identifier: None,
            attributes: Map::new(),
            source: source.into(),
            extra: Map::new(),
        }
    }

    pub fn code(source: impl Into<CellSource>) -> Self {
        Self::new("code", source)
    }

    pub fn markdown(source: impl Into<CellSource>) -> Self {
        Self::new("markdown", source)
    }
}

/// A document format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
}

impl FormatVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

fn default_format_major() -> u32 {
    4
}

/// An ordered sequence of elements with metadata and a format version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub cells: Vec<Element>,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    #[serde(rename = "nbformat", default = "default_format_major")]
    format_major: u32,

    #[serde(rename = "nbformat_minor", default)]
    format_minor: u32,

    /// Unknown top-level fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn new(version: FormatVersion) -> Self {
        Self {
            cells: Vec::new(),
            metadata: Map::new(),
            format_major: version.major,
            format_minor: version.minor,
            extra: Map::new(),
        }
    }

    pub fn with_cells(version: FormatVersion, cells: Vec<Element>) -> Self {
        Self {
            cells,
            ..Self::new(version)
        }
    }

    pub fn format_version(&self) -> FormatVersion {
        FormatVersion::new(self.format_major, self.format_minor)
    }

    pub fn set_format_version(&mut self, version: FormatVersion) {
        self.format_major = version.major;
        self.format_minor = version.minor;
    }

    /// Number of cells without an identifier.
    pub fn missing_identifiers(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.identifier.is_none())
            .count()
    }
}
