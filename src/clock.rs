//! Single source of truth for "now" across the store. Every `created_at`,
//! `updated_at`, `started_at` and `completed_at` column is stamped from here
//! so that a whole transaction agrees on one instant.

use std::time::{SystemTime, UNIX_EPOCH};

/// 2020-01-01T00:00:00Z
const MIN_EPOCH_SECONDS: i64 = 1_577_836_800;
/// 2100-01-01T00:00:00Z
const MAX_EPOCH_SECONDS: i64 = 4_102_444_800;

/// Returns the current wall-clock time as Unix epoch seconds.
///
/// Panics if the system clock is unusable (set before the epoch, or so far
/// out of a sane range that trusting it would silently corrupt timestamp
/// invariants). This is the one place in the store allowed to panic: a
/// broken host clock is a catastrophic environment failure, not a
/// recoverable store error.
pub fn now_unix() -> i64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is set before the Unix epoch")
        .as_secs() as i64;
    assert!(
        (MIN_EPOCH_SECONDS..=MAX_EPOCH_SECONDS).contains(&secs),
        "system clock reads {secs}, outside the sane range [{MIN_EPOCH_SECONDS}, {MAX_EPOCH_SECONDS}]"
    );
    secs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_within_sane_range() {
        let t = now_unix();
        assert!(t > MIN_EPOCH_SECONDS);
        assert!(t < MAX_EPOCH_SECONDS);
    }
}
