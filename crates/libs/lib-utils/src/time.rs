//! # Time Utilities
//!
//! Utilities for time formatting using chrono.

use chrono::{DateTime, Utc};

/// Get current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Format time as RFC3339 string.
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339()
}

/// Format time as `HH:MM:SS` for terminal output.
pub fn short_time(time: DateTime<Utc>) -> String {
    time.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_short_time() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 13, 4, 9).unwrap();
        assert_eq!(short_time(t), "13:04:09");
        assert_eq!(format_time(t), "2024-05-01T13:04:09+00:00");
    }
}
