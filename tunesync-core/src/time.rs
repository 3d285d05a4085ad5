//! Wall-clock helpers.
//!
//! Backend snapshots are anchored to epoch milliseconds. Clock math takes
//! `now_ms` as an argument everywhere; this is the single place that actually
//! reads the wall clock.

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_is_recent() {
        // 2020-01-01 in epoch milliseconds; anything earlier means a broken
        // clock source, not a flaky test.
        assert!(now_ms() > 1_577_836_800_000);
    }
}
