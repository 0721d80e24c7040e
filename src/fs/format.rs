//! Structured-format detection and pre-commit validation.
//!
//! The durable writer consults this module before touching the destination:
//! a target whose extension names a structured format must receive content
//! that parses as that format.

use std::path::Path;

/// A structured format recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredFormat {
    /// Plain JSON (`.json`).
    Json,
    /// Notebook JSON (`.ipynb`): a JSON object with a `cells` array.
    Notebook,
    /// YAML (`.yaml`, `.yml`).
    Yaml,
}

impl StructuredFormat {
    /// Detect the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "ipynb" => Some(Self::Notebook),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Notebook => "notebook",
            Self::Yaml => "yaml",
        }
    }

    /// Check that `content` parses as this format.
    ///
    /// Returns the parser's message on failure.
    pub fn validate(&self, content: &[u8]) -> Result<(), String> {
        match self {
            Self::Json => serde_json::from_slice::<serde_json::Value>(content)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Self::Notebook => {
                let value = serde_json::from_slice::<serde_json::Value>(content)
                    .map_err(|e| e.to_string())?;
                match value.get("cells") {
                    Some(serde_json::Value::Array(_)) => Ok(()),
                    Some(_) => Err("`cells` must be an array".to_string()),
                    None => Err("missing `cells` array".to_string()),
                }
            }
            Self::Yaml => serde_yaml::from_slice::<serde_yaml::Value>(content)
                .map(|_| ())
                .map_err(|e| e.to_string()),
        }
    }
}
