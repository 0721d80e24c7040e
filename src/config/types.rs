//! Configuration defaults for cellsync.
//!
//! Default value functions used by the Config struct.

// Default value functions for serde
pub(crate) fn default_lock_stale_minutes() -> u32 {
    5
}
pub(crate) fn default_lock_poll_interval_ms() -> u64 {
    100
}
pub(crate) fn default_lock_max_poll_interval_ms() -> u64 {
    1000
}
pub(crate) fn default_lock_timeout_secs() -> u64 {
    30
}
pub(crate) fn default_cell_id_prefix() -> String {
    crate::identity::DEFAULT_ID_PREFIX.to_string()
}
pub(crate) fn default_target_format_minor() -> u32 {
    crate::identity::TARGET_FORMAT_MINOR
}
