//! Time utilities for fxrate.

use chrono::{DateTime, Utc};

/// A timestamp with timezone (always UTC for fxrate).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Format a timestamp the way HTTP `Date` headers expect.
pub fn http_date(ts: Timestamp) -> String {
    ts.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_http_date_format() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 45).unwrap();
        assert_eq!(http_date(ts), "Sat, 09 Mar 2024 12:30:45 GMT");
    }
}
