//! Deterministic identifier assignment and document migration.

use super::hash::canonical_hash;
use crate::config::Config;
use crate::document::{Document, Element, FormatVersion};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use tracing::{debug, info};

/// Prefix of generated identifiers.
pub const DEFAULT_ID_PREFIX: &str = "cell";

/// Minor format version meaning "every cell carries an identifier".
pub const TARGET_FORMAT_MINOR: u32 = 5;

/// Number of hex characters kept from the identifier digest.
const ID_HEX_LEN: usize = 8;

/// Regex pattern for generated identifiers.
static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9]+)-([0-9a-f]{8})$").expect("Invalid identifier regex")
});

/// Whether `id` matches `<prefix>-<8 lowercase hex>`.
pub fn is_valid_identifier(id: &str, prefix: &str) -> bool {
    IDENTIFIER_REGEX
        .captures(id)
        .is_some_and(|caps| &caps[1] == prefix)
}

/// Derive the identifier for content at `position` in the document `document_key`.
///
/// A pure function of its inputs: the same triple yields the same identifier
/// in every process and on every run.
pub fn derive_identifier(
    document_key: &str,
    position: usize,
    content_hash: &str,
    prefix: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_key.as_bytes());
    hasher.update(b":");
    hasher.update(position.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(content_hash.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}-{}", prefix, &digest[..ID_HEX_LEN])
}

/// Outcome of migrating one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Number of cells that received an identifier.
    pub migrated: usize,
    pub version_before: FormatVersion,
    pub version_after: FormatVersion,
}

impl MigrationReport {
    pub fn changed(&self) -> bool {
        self.migrated > 0
    }
}

/// Assigns identifiers with a given prefix and records the target format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAssigner {
    prefix: String,
    target_minor: u32,
}

impl Default for IdentityAssigner {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ID_PREFIX.to_string(),
            target_minor: TARGET_FORMAT_MINOR,
        }
    }
}

impl From<&Config> for IdentityAssigner {
    fn from(config: &Config) -> Self {
        Self {
            prefix: config.cell_id_prefix.clone(),
            target_minor: config.target_format_minor,
        }
    }
}

impl IdentityAssigner {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Return the element's identifier, assigning a derived one if missing.
    ///
    /// An existing identifier is never overwritten.
    pub fn ensure_identifier(
        &self,
        element: &mut Element,
        position: usize,
        document_key: &str,
    ) -> String {
        if let Some(existing) = &element.identifier {
            return existing.clone();
        }
        let id = derive_identifier(
            document_key,
            position,
            &canonical_hash(element),
            &self.prefix,
        );
        debug!(position, id = %id, "assigned cell identifier");
        element.identifier = Some(id.clone());
        id
    }

    /// Give every cell lacking an identifier one derived from its position.
    ///
    /// When any cell changed, the minor format version is raised to the
    /// target; otherwise the version is left alone. The document is mutated
    /// in place and not persisted.
    pub fn migrate_document(&self, document: &mut Document, document_key: &str) -> MigrationReport {
        let version_before = document.format_version();
        let mut migrated = 0;

        for (position, cell) in document.cells.iter_mut().enumerate() {
            if cell.identifier.is_none() {
                self.ensure_identifier(cell, position, document_key);
                migrated += 1;
            }
        }

        if migrated > 0 {
            let target = FormatVersion::new(
                version_before.major,
                version_before.minor.max(self.target_minor),
            );
            document.set_format_version(target);
            info!(
                document = document_key,
                migrated,
                from = %version_before,
                to = %target,
                "migrated document identifiers"
            );
        }

        MigrationReport {
            migrated,
            version_before,
            version_after: document.format_version(),
        }
    }
}

/// [`IdentityAssigner::ensure_identifier`] with the default prefix.
pub fn ensure_identifier(element: &mut Element, position: usize, document_key: &str) -> String {
    IdentityAssigner::default().ensure_identifier(element, position, document_key)
}

/// [`IdentityAssigner::migrate_document`] with the default prefix and target.
pub fn migrate_document(document: &mut Document, document_key: &str) -> MigrationReport {
    IdentityAssigner::default().migrate_document(document, document_key)
}
