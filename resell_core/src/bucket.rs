//! UTC bucket mapping utilities.
//!
//! - One stable epoch: Unix (1970-01-01T00:00:00Z).
//! - Both widths are fixed-size frames, so bucket math is second-based.
//! - Four-hour windows are aligned to 00:00Z (00, 04, 08, 12, 16, 20).
//!
//! All functions assume the input timestamp is UTC.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unix epoch start (1970-01-01T00:00:00Z).
pub const EPOCH_UNIX: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Number of seconds in an hour.
pub const SECS_PER_HOUR: i64 = 60 * 60;
/// Number of seconds in a day.
pub const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Error returned when a bucket width string cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown bucket width: {0:?} (expected 1D or 4h)")]
pub struct ParseBucketWidthError(pub String);

/// Width of the time window transactions are grouped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketWidth {
    /// UTC calendar day (the coarse pass).
    Daily,
    /// 4-hour window aligned to midnight UTC (the fine pass).
    FourHour,
}

impl BucketWidth {
    /// Width of one bucket in seconds.
    pub const fn secs(self) -> i64 {
        match self {
            BucketWidth::Daily => SECS_PER_DAY,
            BucketWidth::FourHour => 4 * SECS_PER_HOUR,
        }
    }

    /// Whether the market series for this width is resampled onto a dense grid
    /// with explicit zero buckets.
    pub const fn dense_market_grid(self) -> bool {
        matches!(self, BucketWidth::FourHour)
    }

    /// Compute the bucket id for a UTC timestamp.
    pub fn bucket_id(self, ts_utc: DateTime<Utc>) -> i64 {
        let secs = ts_utc.signed_duration_since(EPOCH_UNIX).num_seconds();
        secs.div_euclid(self.secs())
    }

    /// Get the UTC start instant for a bucket id.
    pub fn start_of(self, id: i64) -> DateTime<Utc> {
        EPOCH_UNIX + Duration::seconds(id * self.secs())
    }

    /// Truncate a timestamp to the start of its bucket.
    pub fn truncate(self, ts_utc: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of(self.bucket_id(ts_utc))
    }

    /// Every bucket start from `first` through `last` inclusive.
    ///
    /// Both bounds are truncated first, so callers can pass raw timestamps.
    /// Yields nothing when `last` precedes `first`.
    pub fn grid(
        self,
        first: DateTime<Utc>,
        last: DateTime<Utc>,
    ) -> impl Iterator<Item = DateTime<Utc>> {
        let lo = self.bucket_id(first);
        let hi = self.bucket_id(last);
        (lo..=hi).map(move |id| self.start_of(id))
    }
}

/// Display/parse for CLI ergonomics (`"1D"`, `"4h"`)
impl fmt::Display for BucketWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketWidth::Daily => write!(f, "1D"),
            BucketWidth::FourHour => write!(f, "4h"),
        }
    }
}

impl FromStr for BucketWidth {
    type Err = ParseBucketWidthError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1D" | "1d" | "D" | "24h" | "daily" => Ok(BucketWidth::Daily),
            "4h" | "4H" | "4-hour" | "four_hour" => Ok(BucketWidth::FourHour),
            other => Err(ParseBucketWidthError(other.to_string())),
        }
    }
}
