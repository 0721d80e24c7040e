//! Content-addressed identity for document cells.
//!
//! Identity is derived from content only: kind and attributes never feed
//! the digest. Identifiers additionally fold in the document key and the
//! cell's position, so migrating the same unmodified document twice assigns
//! nothing the second time and leaves every identifier as it was.

mod assign;
mod hash;


// Re-export public API
pub use assign::{
    DEFAULT_ID_PREFIX, IdentityAssigner, MigrationReport, TARGET_FORMAT_MINOR, derive_identifier,
    ensure_identifier, is_valid_identifier, migrate_document,
};
pub use hash::{HASH_PREFIX, canonical_hash, hash_text, normalize_content};
