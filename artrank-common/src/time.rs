//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current epoch time in milliseconds
pub fn now_ms() -> i64 {
    now().timestamp_millis()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_is_reasonable() {
        let ts = now_ms();
        // After 2000-01-01, before 2100-01-01
        assert!(ts > 946_684_800_000);
        assert!(ts < 4_102_444_800_000);
    }

    #[test]
    fn test_now_matches_now_ms() {
        let a = now().timestamp_millis();
        let b = now_ms();
        assert!((b - a) < 1_000);
    }
}
