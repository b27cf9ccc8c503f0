use chrono::{DateTime, Utc};

use crate::tz::{self, DstPolicy};

/// Parse a `--baseline` value; naive values are read as UTC.
pub fn parse_baseline(s: &str) -> Result<DateTime<Utc>, String> {
    tz::parse_timestamp(s, chrono_tz::UTC, DstPolicy::Strict).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_only_is_midnight_utc() {
        assert_eq!(
            parse_baseline("2025-01-31").unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap()
        );
        assert!(parse_baseline("last week").is_err());
    }
}
