//! File I/O operations for documents.

use super::Document;
use crate::error::{CellsyncError, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::Path;

impl Document {
    /// Load a document from disk.
    ///
    /// An unreadable file, invalid JSON, or a missing `cells` array is a
    /// `CorruptRecord`; documents are never silently treated as empty.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| CellsyncError::CorruptRecord {
            path: path.to_path_buf(),
            reason: format!("failed to read document: {}", e),
        })?;
        Self::parse(&content).map_err(|reason| CellsyncError::CorruptRecord {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse a document from a JSON string.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        serde_json::from_str(content).map_err(|e| format!("failed to parse document: {}", e))
    }

    /// Durably save the document to disk.
    ///
    /// Uses the durable writer (validate, temp file, fsync, rename) so the
    /// document on disk is always a complete version.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_json_string()?;
        crate::fs::durable_write_str(path, &content)
    }

    /// Serialize as notebook-style JSON: one-space indent, trailing newline.
    pub fn to_json_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
        self.serialize(&mut serializer)
            .map_err(|e| CellsyncError::Io(format!("failed to serialize document: {}", e)))?;
        buf.push(b'\n');
        String::from_utf8(buf)
            .map_err(|e| CellsyncError::Io(format!("document is not valid UTF-8: {}", e)))
    }
}
