//! Exit code constants for the cellsync CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, I/O failure)
//! - 2: Validation failure (content rejected before write)
//! - 3: Corrupt record on disk
//! - 4: Lock failure (timeout, re-entrant acquire, unreachable holder)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or I/O failure.
pub const USER_ERROR: i32 = 1;

/// Validation failure: content does not parse as its destination format.
pub const VALIDATION_FAILURE: i32 = 2;

/// A document or record on disk could not be read.
pub const CORRUPT_RECORD: i32 = 3;

/// Lock acquisition failure.
pub const LOCK_FAILURE: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            VALIDATION_FAILURE,
            CORRUPT_RECORD,
            LOCK_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }
}
